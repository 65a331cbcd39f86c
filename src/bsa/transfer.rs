use std::cmp;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::bsa::{BsaFileEntry, CHUNK_SIZE, SIZE_MASK};
use crate::config::RecordLayout;
use crate::{BsaError, Result};
use log::{debug, trace, warn};

impl BsaFileEntry {
    /// Copies the entry's payload at the current position of `target`.
    ///
    /// The payload is read from `source_archive` at the entry's data offset,
    /// or from the entry's loose file when it has one. On success the write
    /// offset points at the copied payload and, for loose files, the size
    /// is replaced by the measured file length.
    ///
    /// Payloads are copied byte for byte: nothing gets compressed or
    /// decompressed, whatever the entry's compression flag says.
    pub fn write_data<R, W>(&mut self, source_archive: &mut R, target: &mut W) -> Result<()>
    where
        R: Read + Seek + ?Sized,
        W: Write + Seek + ?Sized,
    {
        self.write_data_chunked(source_archive, target, CHUNK_SIZE)
    }

    /// Same as `write_data`, with a custom copy buffer size.
    ///
    /// The write offset of a previous transfer is forgotten first, so it is
    /// only set again when this transfer succeeds.
    pub fn write_data_chunked<R, W>(
        &mut self,
        source_archive: &mut R,
        target: &mut W,
        chunk_size: usize,
    ) -> Result<()>
    where
        R: Read + Seek + ?Sized,
        W: Write + Seek + ?Sized,
    {
        let chunk_size = cmp::max(chunk_size, 1);
        self.write_offset = None;
        match self.source_file.clone() {
            None => self.copy_from_archive(source_archive, target, chunk_size),
            Some(source_file) => self.copy_from_loose_file(&source_file, target, chunk_size),
        }
    }

    fn copy_from_archive<R, W>(
        &mut self,
        source_archive: &mut R,
        target: &mut W,
        chunk_size: usize,
    ) -> Result<()>
    where
        R: Read + Seek + ?Sized,
        W: Write + Seek + ?Sized,
    {
        // TODO: convert the payload when the target archive expects another
        // compression state than the source one.
        let start = target.seek(SeekFrom::Current(0))?;
        let write_offset = u32::try_from(start)?;
        let size = self.size;
        trace!(
            "Copying '{}': {} bytes from offset {} to offset {}",
            self.name,
            size,
            self.data_offset,
            start
        );

        let mut buf = vec![0; cmp::min(chunk_size, size as usize)];
        let copied = source_archive
            .seek(SeekFrom::Start(self.data_offset))
            .and_then(|_| copy_chunked(source_archive, target, u64::from(size), &mut buf));
        match copied {
            Ok(()) => {
                self.set_transferred(write_offset, size);
                Ok(())
            }
            Err(source) => {
                // Partial payload is dropped, the next entry starts here
                target.seek(SeekFrom::Start(start))?;
                Err(BsaError::InvalidData {
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }

    fn copy_from_loose_file<W>(
        &mut self,
        source_path: &Path,
        target: &mut W,
        chunk_size: usize,
    ) -> Result<()>
    where
        W: Write + Seek + ?Sized,
    {
        let mut source_file =
            File::open(source_path).map_err(|e| self.source_file_missing(source_path, e))?;
        let metadata = source_file
            .metadata()
            .map_err(|e| self.source_file_missing(source_path, e))?;
        if !metadata.is_file() {
            let not_a_file = io::Error::new(io::ErrorKind::Other, "not a regular file");
            return Err(self.source_file_missing(source_path, not_a_file));
        }
        let file_size = metadata.len();
        if file_size > u64::from(SIZE_MASK) {
            return Err(BsaError::EntryTooLarge {
                name: self.name.clone(),
                size: file_size,
            });
        }
        debug!("Measured {} bytes for '{}'", file_size, self.name);

        let start = target.seek(SeekFrom::Current(0))?;
        let write_offset = u32::try_from(start)?;
        trace!(
            "Copying '{}': {} bytes from {:?} to offset {}",
            self.name,
            file_size,
            source_path,
            start
        );

        let mut buf = vec![0; cmp::min(chunk_size, file_size as usize)];
        copy_chunked(&mut source_file, target, file_size, &mut buf)?;
        self.set_transferred(write_offset, file_size as u32);
        Ok(())
    }

    fn source_file_missing(&self, source_path: &Path, source: io::Error) -> BsaError {
        BsaError::SourceFileMissing {
            name: self.name.clone(),
            path: source_path.to_path_buf(),
            source,
        }
    }
}

/// Moves exactly `len` bytes from `reader` to `writer`, one `buf` at a time.
fn copy_chunked<R, W>(reader: &mut R, writer: &mut W, len: u64, buf: &mut [u8]) -> io::Result<()>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut size_left = len;
    while size_left > 0 {
        let chunk_len = cmp::min(size_left, buf.len() as u64) as usize;
        let chunk = &mut buf[..chunk_len];
        reader.read_exact(chunk)?;
        writer.write_all(chunk)?;
        size_left -= chunk_len as u64;
    }
    Ok(())
}

/// Outcome of `transfer_entries`
#[derive(Debug, Default)]
pub struct TransferReport {
    pub transferred: usize,
    pub bytes_written: u64,
    /// Entries that could not be copied, by index, with the reason
    pub failures: Vec<(usize, BsaError)>,
}

impl TransferReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Appends the payloads of `entries` to `target`, in order.
///
/// An entry whose payload cannot be read is skipped and reported, the
/// following entries are still copied. Any other fault stops the transfer.
pub fn transfer_entries<R, W>(
    entries: &mut [BsaFileEntry],
    source_archive: &mut R,
    target: &mut W,
    layout: &RecordLayout,
) -> Result<TransferReport>
where
    R: Read + Seek + ?Sized,
    W: Write + Seek + ?Sized,
{
    let mut report = TransferReport::default();
    for (index, entry) in entries.iter_mut().enumerate() {
        match entry.write_data_chunked(source_archive, target, layout.chunk_size) {
            Ok(()) => {
                report.transferred += 1;
                report.bytes_written += u64::from(entry.size());
            }
            Err(e) if e.is_entry_local() => {
                warn!("Skipping '{}': {}", entry.name(), e);
                report.failures.push((index, e));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}
