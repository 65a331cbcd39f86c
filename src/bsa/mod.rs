mod file;
pub mod hash;
mod record;
mod texture;
mod transfer;

pub use file::{sort_by_data_offset, BsaFileEntry};
pub use hash::{bsa_hash, bsa_hash_bytes};
pub use record::{
    pack_size_word, parse_file_record, unpack_size_word, write_file_record, FileRecord,
    COMPRESSED_FLAG, SIZE_MASK,
};
pub use texture::{TextureChunk, TextureHeader, TextureVariant};
pub use transfer::{transfer_entries, TransferReport};

use serde::Deserialize;

/// Payloads are copied through a buffer of this size
pub const CHUNK_SIZE: usize = 128 * 1024;
/// Separator used in folder and file paths
pub const PATH_SEPARATOR: char = '\\';

/// Width of the name hash field in file records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashWidth {
    U32,
    U64,
}

impl HashWidth {
    /// Size in bytes of a file record using this hash width
    pub fn record_size(self) -> usize {
        match self {
            HashWidth::U32 => 3 * std::mem::size_of::<u32>(),
            HashWidth::U64 => std::mem::size_of::<u64>() + 2 * std::mem::size_of::<u32>(),
        }
    }

    /// Keeps the part of `hash` a record of this width can hold
    pub fn truncate(self, hash: u64) -> u64 {
        match self {
            HashWidth::U32 => hash & u64::from(u32::MAX),
            HashWidth::U64 => hash,
        }
    }
}

impl Default for HashWidth {
    fn default() -> Self {
        HashWidth::U64
    }
}

/// Position of a folder in the storage of the archive owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderIndex(pub usize);

/// Resolves folders to their full path.
///
/// Folders own their entries, entries only keep a `FolderIndex`.
pub trait FolderPaths {
    fn full_path(&self, folder: FolderIndex) -> &str;
}

impl<S: AsRef<str>> FolderPaths for [S] {
    fn full_path(&self, folder: FolderIndex) -> &str {
        self[folder.0].as_ref()
    }
}

impl<S: AsRef<str>> FolderPaths for Vec<S> {
    fn full_path(&self, folder: FolderIndex) -> &str {
        self.as_slice().full_path(folder)
    }
}
