use std::io;
use std::num;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BsaError>;

#[derive(Error, Debug)]
pub enum BsaError {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("bincode error: {0}")]
    BincodeError(#[from] bincode::Error),
    #[error("int conversion error: {0}")]
    TryFromIntError(#[from] num::TryFromIntError),
    #[error("yaml error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("invalid name hash for \"{name}\" ({actual:#x} vs {expected:#x})")]
    HashMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },
    #[error("source file {path:?} of \"{name}\" cannot be opened: {source}")]
    SourceFileMissing {
        name: String,
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to copy data of \"{name}\": {source}")]
    InvalidData { name: String, source: io::Error },
    #[error("\"{name}\" is too large to be stored ({size} bytes)")]
    EntryTooLarge { name: String, size: u64 },
    #[error("no write offset assigned to \"{0}\"")]
    OffsetNotAssigned(String),
    #[error("failed to serialize data: {0}")]
    SerializationError(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BsaError {
    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Faults that only concern one entry's payload. Sibling entries can
    /// still be transferred after one of these.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidData { .. } | Self::SourceFileMissing { .. } | Self::EntryTooLarge { .. }
        )
    }
}
