//! File entries of BSA game archives.
//!
//! An entry is parsed from its fixed-size record, gets its name from the
//! name table (optionally checked against the record's hash) and can copy
//! its payload into another archive, from the archive it was read from or
//! from a loose file on disk.

pub mod archive;
pub mod bsa;
pub mod config;
mod error;

pub use bsa::{BsaFileEntry, FolderIndex, FolderPaths, HashWidth};
pub use config::RecordLayout;
pub use error::{BsaError, Result};
