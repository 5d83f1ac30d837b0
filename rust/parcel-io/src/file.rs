//! Parquet files on the local file system.

use std::{fs::File, ops::Range, path::Path};

use bytes::Bytes;

use crate::{ReadAt, StorageProfile, verify};

/// A local file opened for positional reads.
///
/// The length is captured when the file is opened; bytes appended afterwards are
/// not visible. The handle is closed when the `LocalFile` is dropped.
pub struct LocalFile {
    file: File,
    len: u64,
}

impl LocalFile {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<LocalFile> {
        LocalFile::from_file(File::open(path)?)
    }

    pub fn from_file(file: File) -> std::io::Result<LocalFile> {
        let len = file.metadata()?.len();
        Ok(LocalFile { file, len })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl ReadAt for LocalFile {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        verify!(range.end >= range.start);
        let end = range.end.min(self.len);
        if range.start >= end {
            return Ok(Bytes::new());
        }
        let mut buf = vec![0u8; (end - range.start) as usize];
        read_exact_at(&self.file, range.start, &mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 16 * 1024,
            max_io_size: 1024 * 1024,
        }
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut offset: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        let n = file.seek_read(buf, offset)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf = &mut buf[n..];
        offset += n as u64;
    }
    Ok(())
}
