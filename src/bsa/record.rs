use std::io::Write;

use crate::bsa::HashWidth;
use crate::{BsaError, Result};
use nom::number::complete::{le_u32, le_u64};
use nom::*;
use serde::Serialize;

/// Bits of the size word holding the payload size
pub const SIZE_MASK: u32 = 0x3FFF_FFFF;
/// Bit of the size word telling that the payload is compressed
pub const COMPRESSED_FLAG: u32 = 1 << 30;

/// Fixed-size file record, as stored in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    pub name_hash: u64,
    pub size_word: u32,
    pub offset: u32,
}

#[derive(Debug, Serialize)]
struct SerializableFileRecord64 {
    name_hash: u64,
    size_word: u32,
    offset: u32,
}

#[derive(Debug, Serialize)]
struct SerializableFileRecord32 {
    name_hash: u32,
    size_word: u32,
    offset: u32,
}

/// Splits a size word into the payload size and the compression flag.
pub fn unpack_size_word(size_word: u32) -> (u32, bool) {
    (size_word & SIZE_MASK, size_word & COMPRESSED_FLAG != 0)
}

/// Builds a size word from the payload size and the compression flag.
pub fn pack_size_word(size: u32, compressed: bool) -> u32 {
    let size_word = size & SIZE_MASK;
    if compressed {
        size_word | COMPRESSED_FLAG
    } else {
        size_word
    }
}

named!(parse_file_record_64<&[u8], FileRecord>,
    do_parse!(
        name_hash: le_u64
            >> size_word: le_u32
            >> offset: le_u32
            >> (FileRecord {
                name_hash,
                size_word,
                offset,
            }
        )
    )
);

named!(parse_file_record_32<&[u8], FileRecord>,
    do_parse!(
        name_hash: le_u32
            >> size_word: le_u32
            >> offset: le_u32
            >> (FileRecord {
                name_hash: u64::from(name_hash),
                size_word,
                offset,
            }
        )
    )
);

pub fn parse_file_record(input: &[u8], hash_width: HashWidth) -> Result<FileRecord> {
    let parsed = match hash_width {
        HashWidth::U64 => parse_file_record_64(input),
        HashWidth::U32 => parse_file_record_32(input),
    };
    parsed.map(|(_, record)| record).map_err(|_| {
        BsaError::malformed_record(format!(
            "File record needs {} bytes, got {}",
            hash_width.record_size(),
            input.len()
        ))
    })
}

pub fn write_file_record<W: Write>(
    writer: &mut W,
    hash_width: HashWidth,
    record: &FileRecord,
) -> Result<()> {
    match hash_width {
        HashWidth::U64 => bincode::serialize_into(
            writer,
            &SerializableFileRecord64 {
                name_hash: record.name_hash,
                size_word: record.size_word,
                offset: record.offset,
            },
        )?,
        HashWidth::U32 => bincode::serialize_into(
            writer,
            &SerializableFileRecord32 {
                // Note: 32-bit records only keep the low half of the hash
                name_hash: record.name_hash as u32,
                size_word: record.size_word,
                offset: record.offset,
            },
        )?,
    }
    Ok(())
}
