//! Byte sources for the page decoder.
//!
//! [`ReadAt`] is the single seam between the decoder and storage. Implementations
//! are provided for in-memory buffers ([`memory`]), local files ([`LocalFile`]) and
//! a window over another source ([`SlicedFile`]), which is how a column chunk is
//! handed to its page reader.

use std::{ops::Range, sync::Arc};

use bytes::Bytes;

pub mod file;
pub mod memory;
pub mod utils;

pub use file::LocalFile;
pub use utils::sliced_file::SlicedFile;

/// Random-access, read-only byte source shared between readers.
pub trait ReadAt: Send + Sync + 'static {
    /// Total length of the source in bytes.
    fn size(&self) -> std::io::Result<u64>;

    /// Returns the bytes in `range`.
    ///
    /// The result is shorter than requested only when the range runs past the end
    /// of the source; a range starting at or after the end yields an empty buffer.
    /// An inverted range is an `InvalidInput` error.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes>;

    /// Preferred request sizes for this source.
    fn storage_profile(&self) -> StorageProfile;
}

/// Request sizes a source serves efficiently.
#[derive(Debug, Clone)]
pub struct StorageProfile {
    /// Smallest worthwhile request. Page header probes are rounded up to it.
    pub min_io_size: usize,

    /// Largest request the source wants to see at once.
    pub max_io_size: usize,
}

impl StorageProfile {
    /// Brings `size` into `min_io_size..=max_io_size`. A zero bound is treated
    /// as one byte.
    pub fn clamp_io_size(&self, size: usize) -> usize {
        let upper = self.max_io_size.max(1);
        let lower = self.min_io_size.clamp(1, upper);
        size.clamp(lower, upper)
    }
}

impl Default for StorageProfile {
    fn default() -> StorageProfile {
        StorageProfile {
            min_io_size: 4 * 1024,
            max_io_size: 4 * 1024 * 1024,
        }
    }
}

impl<T> ReadAt for Arc<T>
where
    T: ReadAt + ?Sized,
{
    fn size(&self) -> std::io::Result<u64> {
        self.as_ref().size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        self.as_ref().read_at(range)
    }

    fn storage_profile(&self) -> StorageProfile {
        self.as_ref().storage_profile()
    }
}
