use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::archive::{read_cstr_bytes, serialize_as_win1252_cstr_into, string_from_win1252};
use crate::bsa::hash::bsa_hash;
use crate::bsa::record::{
    pack_size_word, parse_file_record, unpack_size_word, write_file_record, FileRecord, SIZE_MASK,
};
use crate::bsa::{FolderIndex, FolderPaths, HashWidth, TextureVariant, PATH_SEPARATOR};
use crate::{BsaError, Result};

/// A file stored in a BSA archive, or about to be stored in one.
///
/// The payload comes either from an existing archive (at `data_offset`) or
/// from a loose file on disk. Entries backed by a loose file are "new".
#[derive(Debug, Clone)]
pub struct BsaFileEntry {
    pub(crate) folder: FolderIndex,
    pub(crate) name: String,
    pub(crate) name_hash: u64,
    pub(crate) hash_width: HashWidth,
    pub(crate) size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) data_offset: u64,
    pub(crate) compressed: bool,
    pub(crate) compress_on_write: bool,
    pub(crate) source_file: Option<PathBuf>,
    pub(crate) write_offset: Option<u32>,
    pub(crate) texture: Option<TextureVariant>,
}

impl BsaFileEntry {
    /// Reads a file record from an existing archive.
    ///
    /// The name is left empty, it has to be read from the name table with
    /// `read_file_name`.
    pub fn read_record<R: Read>(
        mut reader: R,
        hash_width: HashWidth,
        folder: FolderIndex,
    ) -> Result<Self> {
        let mut record_buf = vec![0; hash_width.record_size()];
        reader.read_exact(&mut record_buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                BsaError::malformed_record("Truncated file record")
            } else {
                BsaError::IoError(e)
            }
        })?;
        let record = parse_file_record(&record_buf, hash_width)?;
        let (size, compressed) = unpack_size_word(record.size_word);
        Ok(Self {
            folder,
            name: String::new(),
            name_hash: record.name_hash,
            hash_width,
            size,
            uncompressed_size: 0,
            data_offset: u64::from(record.offset),
            compressed,
            compress_on_write: false,
            source_file: None,
            write_offset: None,
            texture: None,
        })
    }

    /// Describes a blob already stored in an archive.
    ///
    /// Entries declaring both a size and an uncompressed size are
    /// considered compressed.
    pub fn from_metadata(
        name: impl Into<String>,
        folder: FolderIndex,
        size: u32,
        data_offset: u64,
        uncompressed_size: u32,
        texture: Option<TextureVariant>,
    ) -> Result<Self> {
        let name = name.into();
        if size > SIZE_MASK {
            return Err(BsaError::EntryTooLarge {
                name,
                size: u64::from(size),
            });
        }
        let name_hash = bsa_hash(&name)?;
        Ok(Self {
            folder,
            name,
            name_hash,
            hash_width: HashWidth::default(),
            size,
            uncompressed_size,
            data_offset,
            compressed: size > 0 && uncompressed_size > 0,
            compress_on_write: false,
            source_file: None,
            write_offset: None,
            texture,
        })
    }

    /// Describes a new entry whose payload will be read from `source_file`.
    ///
    /// Its size stays 0 until the payload is transferred.
    pub fn from_loose_file(
        name: impl Into<String>,
        source_file: impl Into<PathBuf>,
        folder: FolderIndex,
        compress: bool,
    ) -> Result<Self> {
        let name = name.into();
        let name_hash = bsa_hash(&name)?;
        Ok(Self {
            folder,
            name,
            name_hash,
            hash_width: HashWidth::default(),
            size: 0,
            uncompressed_size: 0,
            data_offset: 0,
            compressed: compress,
            compress_on_write: compress,
            source_file: Some(source_file.into()),
            write_offset: None,
            texture: None,
        })
    }

    /// Sets the hash width used when writing the record back.
    pub fn with_hash_width(mut self, hash_width: HashWidth) -> Self {
        self.hash_width = hash_width;
        self.name_hash = hash_width.truncate(self.name_hash);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_hash(&self) -> u64 {
        self.name_hash
    }

    pub fn hash_width(&self) -> HashWidth {
        self.hash_width
    }

    /// Payload size, without the compression flag.
    ///
    /// For new entries this is only known after the first transfer.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Changes the compression flag written in the record.
    ///
    /// The payload is left untouched, keeping both in sync is up to the
    /// caller.
    pub fn set_compressed(&mut self, compressed: bool) {
        self.compressed = compressed;
    }

    /// Compression requested when the entry was created from a loose file
    pub fn compress_on_write(&self) -> bool {
        self.compress_on_write
    }

    pub fn is_new(&self) -> bool {
        self.source_file.is_some()
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Offset of the payload in the last archive it was written to
    pub fn write_offset(&self) -> Option<u32> {
        self.write_offset
    }

    pub fn folder(&self) -> FolderIndex {
        self.folder
    }

    pub fn texture(&self) -> Option<&TextureVariant> {
        self.texture.as_ref()
    }

    /// Full path of the entry, e.g. `meshes\armor\helmet.nif`.
    pub fn file_path<F: FolderPaths + ?Sized>(&self, folders: &F) -> String {
        let folder_path = folders.full_path(self.folder);
        let mut file_path = String::with_capacity(folder_path.len() + 1 + self.name.len());
        file_path.push_str(folder_path);
        file_path.push(PATH_SEPARATOR);
        file_path.push_str(&self.name);
        file_path
    }

    /// Writes the file record, pointing at the offset of the last transfer.
    pub fn write_record<W: Write>(&self, writer: &mut W) -> Result<()> {
        let offset = self
            .write_offset
            .ok_or_else(|| BsaError::OffsetNotAssigned(self.name.clone()))?;
        self.write_record_at(writer, offset)
    }

    /// Writes the file record with an offset tracked by the caller.
    pub fn write_record_at<W: Write>(&self, writer: &mut W, offset: u32) -> Result<()> {
        let record = FileRecord {
            name_hash: self.name_hash,
            size_word: pack_size_word(self.size, self.compressed),
            offset,
        };
        write_file_record(writer, self.hash_width, &record)
    }

    /// Reads the entry's name from the name table.
    ///
    /// With `verify`, the name must match the hash read with the record.
    pub fn read_file_name<R: Read>(&mut self, reader: R, verify: bool) -> Result<()> {
        let name_bytes = read_cstr_bytes(reader)?;
        self.name = string_from_win1252(&name_bytes)?;
        if verify {
            let actual = self.hash_width.truncate(bsa_hash(&self.name)?);
            if actual != self.name_hash {
                return Err(BsaError::HashMismatch {
                    name: self.name.clone(),
                    expected: self.name_hash,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Writes the entry's name as a name table item.
    pub fn write_file_name<W: Write>(&self, writer: W) -> Result<()> {
        serialize_as_win1252_cstr_into(writer, &self.name)
    }

    pub(crate) fn set_transferred(&mut self, write_offset: u32, size: u32) {
        self.write_offset = Some(write_offset);
        self.size = size;
    }
}

/// Orders entries by their offset in the source archive.
pub fn sort_by_data_offset(entries: &mut [BsaFileEntry]) {
    entries.sort_by_key(|entry| entry.data_offset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsa::{TextureChunk, TextureHeader, COMPRESSED_FLAG};
    use hex_literal::hex;
    use std::io::Cursor;

    const RECORD: [u8; 16] = hex!("74e50668e37ef5c46400004010203000");

    #[test]
    fn test_record_round_trip() {
        let entry = BsaFileEntry::read_record(&RECORD[..], HashWidth::U64, FolderIndex(0)).unwrap();
        assert_eq!(entry.name(), "");
        assert_eq!(entry.name_hash(), 0xc4f5_7ee3_6806_e574);
        assert_eq!(entry.size(), 100);
        assert!(entry.is_compressed());
        assert_eq!(entry.data_offset(), 0x0030_2010);
        assert!(!entry.is_new());
        assert_eq!(entry.write_offset(), None);

        let mut output = Vec::new();
        entry.write_record_at(&mut output, 0x0030_2010).unwrap();
        assert_eq!(output, RECORD.to_vec());
    }

    #[test]
    fn test_record_32_round_trip() {
        let bytes = hex!("74e506680a00000000010000");
        let entry = BsaFileEntry::read_record(&bytes[..], HashWidth::U32, FolderIndex(0)).unwrap();
        assert_eq!(entry.size(), 10);
        assert!(!entry.is_compressed());

        let mut output = Vec::new();
        entry.write_record_at(&mut output, 256).unwrap();
        assert_eq!(output, bytes.to_vec());
    }

    #[test]
    fn test_truncated_record() {
        match BsaFileEntry::read_record(&RECORD[..10], HashWidth::U64, FolderIndex(0)) {
            Err(BsaError::MalformedRecord(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_write_record_requires_offset() {
        let entry =
            BsaFileEntry::from_metadata("helmet.nif", FolderIndex(0), 5, 0, 0, None).unwrap();
        let mut output = Vec::new();
        match entry.write_record(&mut output) {
            Err(BsaError::OffsetNotAssigned(name)) => assert_eq!(name, "helmet.nif"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(output.is_empty());
    }

    #[test]
    fn test_compression_flag_is_not_derived_from_size() {
        let mut entry =
            BsaFileEntry::from_metadata("helmet.nif", FolderIndex(0), 100, 0, 0, None).unwrap();
        entry.set_compressed(true);
        let mut output = Vec::new();
        entry.write_record_at(&mut output, 0).unwrap();
        let size_word = u32::from_le_bytes([output[8], output[9], output[10], output[11]]);
        assert_eq!(size_word, 100 | COMPRESSED_FLAG);
    }

    #[test]
    fn test_read_file_name_verified() {
        let mut entry =
            BsaFileEntry::read_record(&RECORD[..], HashWidth::U64, FolderIndex(0)).unwrap();
        let mut name_table = Cursor::new(b"helmet.nif\0boots.nif\0".to_vec());
        entry.read_file_name(&mut name_table, true).unwrap();
        assert_eq!(entry.name(), "helmet.nif");
        assert_eq!(name_table.position(), 11);
    }

    #[test]
    fn test_read_file_name_hash_mismatch() {
        let constructed =
            BsaFileEntry::from_metadata("helmet.nif", FolderIndex(0), 1, 0, 0, None).unwrap();
        let mut entry = constructed.clone();
        entry.read_file_name(Cursor::new(b"Helmet.NIF\0".to_vec()), true).unwrap();

        let mut entry = constructed.clone();
        match entry.read_file_name(Cursor::new(b"gauntlets.nif\0".to_vec()), true) {
            Err(BsaError::HashMismatch {
                name,
                expected,
                actual,
            }) => {
                assert_eq!(name, "gauntlets.nif");
                assert_eq!(expected, constructed.name_hash());
                assert_eq!(actual, bsa_hash("gauntlets.nif").unwrap());
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // Without verification any name is accepted
        let mut entry = constructed;
        entry.read_file_name(Cursor::new(b"gauntlets.nif\0".to_vec()), false).unwrap();
        assert_eq!(entry.name(), "gauntlets.nif");
    }

    #[test]
    fn test_read_file_name_32() {
        let bytes = hex!("74e506680a00000000010000");
        let mut entry =
            BsaFileEntry::read_record(&bytes[..], HashWidth::U32, FolderIndex(0)).unwrap();
        entry.read_file_name(Cursor::new(b"helmet.nif\0".to_vec()), true).unwrap();
    }

    #[test]
    fn test_name_table_round_trip() {
        let entry =
            BsaFileEntry::from_metadata("caf\u{e9}.dds", FolderIndex(0), 1, 0, 0, None).unwrap();
        let mut name_table = Vec::new();
        entry.write_file_name(&mut name_table).unwrap();
        assert_eq!(name_table, b"caf\xe9.dds\0");

        let mut record = Vec::new();
        entry.write_record_at(&mut record, 0).unwrap();
        let mut parsed =
            BsaFileEntry::read_record(&record[..], HashWidth::U64, FolderIndex(0)).unwrap();
        parsed.read_file_name(name_table.as_slice(), true).unwrap();
        assert_eq!(parsed.name(), entry.name());
    }

    #[test]
    fn test_from_metadata_compression() {
        let entry =
            BsaFileEntry::from_metadata("a.dds", FolderIndex(0), 100, 0, 50, None).unwrap();
        assert!(entry.is_compressed());
        assert_eq!(entry.uncompressed_size(), 50);
        let entry = BsaFileEntry::from_metadata("c.dds", FolderIndex(0), 100, 0, 0, None).unwrap();
        assert!(!entry.is_compressed());
        let entry = BsaFileEntry::from_metadata("d.dds", FolderIndex(0), 0, 0, 50, None).unwrap();
        assert!(!entry.is_compressed());
    }

    #[test]
    fn test_from_metadata_too_large() {
        match BsaFileEntry::from_metadata("huge.dds", FolderIndex(0), SIZE_MASK + 1, 0, 0, None) {
            Err(BsaError::EntryTooLarge { name, size }) => {
                assert_eq!(name, "huge.dds");
                assert_eq!(size, u64::from(SIZE_MASK) + 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_texture_pass_through() {
        let texture = TextureVariant {
            header: TextureHeader {
                name_hash: 0xDEAD_BEEF,
                extension: *b"dds\0",
                chunk_count: 2,
                width: 512,
                height: 256,
                ..TextureHeader::default()
            },
            chunks: vec![
                TextureChunk {
                    offset: 0x100,
                    packed_size: 10,
                    unpacked_size: 20,
                    ..TextureChunk::default()
                },
                TextureChunk {
                    offset: 0x10A,
                    packed_size: 5,
                    unpacked_size: 8,
                    start_mip: 1,
                    end_mip: 3,
                    ..TextureChunk::default()
                },
            ],
        };
        let entry = BsaFileEntry::from_metadata(
            "wall.dds",
            FolderIndex(0),
            15,
            0x100,
            28,
            Some(texture.clone()),
        )
        .unwrap();
        assert!(entry.is_compressed());
        assert_eq!(entry.uncompressed_size(), 28);
        assert_eq!(entry.texture(), Some(&texture));
    }

    #[test]
    fn test_from_loose_file() {
        let entry =
            BsaFileEntry::from_loose_file("helmet.nif", "/tmp/helmet.nif", FolderIndex(1), true)
                .unwrap();
        assert!(entry.is_new());
        assert_eq!(entry.size(), 0);
        assert!(entry.compress_on_write());
        assert!(entry.is_compressed());
        assert_eq!(entry.name_hash(), 0xc4f5_7ee3_6806_e574);
        assert_eq!(entry.source_file(), Some(Path::new("/tmp/helmet.nif")));
    }

    #[test]
    fn test_file_path() {
        let folders = vec!["Meshes\\Armor", "Textures"];
        let entry =
            BsaFileEntry::from_metadata("helmet.nif", FolderIndex(0), 1, 0, 0, None).unwrap();
        assert_eq!(entry.file_path(&folders), "Meshes\\Armor\\helmet.nif");
        let entry = BsaFileEntry::from_metadata("wall.dds", FolderIndex(1), 1, 0, 0, None).unwrap();
        assert_eq!(entry.file_path(&folders[..]), "Textures\\wall.dds");
    }

    #[test]
    fn test_sort_by_data_offset() {
        let mut entries: Vec<BsaFileEntry> = [("c.nif", 300_u64), ("a.nif", 100), ("b.nif", 200)]
            .iter()
            .map(|&(name, offset)| {
                BsaFileEntry::from_metadata(name, FolderIndex(0), 1, offset, 0, None).unwrap()
            })
            .collect();
        sort_by_data_offset(&mut entries);
        let names: Vec<&str> = entries.iter().map(BsaFileEntry::name).collect();
        assert_eq!(names, vec!["a.nif", "b.nif", "c.nif"]);
    }

    #[test]
    fn test_with_hash_width() {
        let entry = BsaFileEntry::from_metadata("helmet.nif", FolderIndex(0), 10, 0, 0, None)
            .unwrap()
            .with_hash_width(HashWidth::U32);
        assert_eq!(entry.name_hash(), 0x6806_e574);
        let mut output = Vec::new();
        entry.write_record_at(&mut output, 256).unwrap();
        assert_eq!(output, hex!("74e506680a00000000010000").to_vec());
    }
}
