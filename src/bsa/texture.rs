//! Texture variant data carried by DX10 entries.
//!
//! These structs are handed over by the archive layer and stored with the
//! entry as-is. Nothing in this crate reads or changes their content.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureHeader {
    pub name_hash: u32,
    pub extension: [u8; 4],
    pub dir_hash: u32,
    pub unknown: u8,
    pub chunk_count: u8,
    pub chunk_header_size: u16,
    pub height: u16,
    pub width: u16,
    pub mip_count: u8,
    pub format: u8,
    pub unknown2: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureChunk {
    pub offset: u64,
    pub packed_size: u32,
    pub unpacked_size: u32,
    pub start_mip: u16,
    pub end_mip: u16,
    pub align: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureVariant {
    pub header: TextureHeader,
    pub chunks: Vec<TextureChunk>,
}
