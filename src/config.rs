use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::bsa::{BsaFileEntry, FolderIndex, HashWidth, CHUNK_SIZE};
use crate::{BsaError, Result};
use serde::Deserialize;

/// How file records are laid out and checked for a given archive flavor.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    #[serde(default)] // Defaults to u64
    pub hash_width: HashWidth,
    #[serde(default)] // Defaults to false
    pub verify_name_hashes: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize, // Copy buffer size, in bytes
}

fn default_chunk_size() -> usize {
    CHUNK_SIZE
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            hash_width: HashWidth::default(),
            verify_name_hashes: false,
            chunk_size: default_chunk_size(),
        }
    }
}

impl RecordLayout {
    /// Reads a file record with this layout's hash width.
    pub fn read_record<R: Read>(&self, reader: R, folder: FolderIndex) -> Result<BsaFileEntry> {
        BsaFileEntry::read_record(reader, self.hash_width, folder)
    }

    /// Reads `entry`'s name, checked against its hash if the layout asks for it.
    pub fn read_file_name<R: Read>(&self, entry: &mut BsaFileEntry, reader: R) -> Result<()> {
        entry.read_file_name(reader, self.verify_name_hashes)
    }
}

pub fn parse_record_layout(file_path: impl AsRef<Path>) -> Result<RecordLayout> {
    let file = File::open(file_path)?;
    let file_reader = BufReader::new(file);
    record_layout_from_reader(file_reader)
}

pub fn record_layout_from_reader<R: Read>(reader: R) -> Result<RecordLayout> {
    let layout: RecordLayout = serde_yaml::from_reader(reader)?;
    if layout.chunk_size == 0 {
        return Err(BsaError::invalid_config("chunk_size must not be 0"));
    }
    Ok(layout)
}
