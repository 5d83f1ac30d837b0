//! Restricting a source to one byte window.

use std::ops::Range;

use bytes::Bytes;

use crate::{ReadAt, StorageProfile, verify};

/// A window `range` of another source, addressed from zero.
///
/// Over a 100 byte source, `SlicedFile::new(source, 10..20)` reports a size of 10
/// and serves `read_at(0..5)` from bytes `10..15` of the source. Requests are
/// clipped to the window.
///
/// The window may extend past the end of the source (a legacy column chunk
/// padded by a few bytes, for instance); reads are then short just as they
/// would be on the source itself.
#[derive(Clone)]
pub struct SlicedFile<F> {
    inner: F,
    range: Range<u64>,
}

impl<F> SlicedFile<F> {
    /// Returns `InvalidInput` if the window is inverted.
    pub fn new(inner: F, range: Range<u64>) -> std::io::Result<Self> {
        verify!(range.start <= range.end);
        Ok(SlicedFile { inner, range })
    }

    /// Length of the window, regardless of the source size.
    pub fn slice_size(&self) -> u64 {
        self.range.end - self.range.start
    }

    /// The window, in source coordinates.
    pub fn slice_range(&self) -> Range<u64> {
        self.range.clone()
    }
}

impl<R: ReadAt> ReadAt for SlicedFile<R> {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.slice_size())
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        verify!(range.end >= range.start);
        let end = range.end.min(self.slice_size());
        if range.start >= end {
            return Ok(Bytes::new());
        }
        match (
            self.range.start.checked_add(range.start),
            self.range.start.checked_add(end),
        ) {
            (Some(from), Some(to)) => self.inner.read_at(from..to),
            _ => Ok(Bytes::new()),
        }
    }

    fn storage_profile(&self) -> StorageProfile {
        self.inner.storage_profile()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::SlicedFile;
    use crate::ReadAt;

    fn source() -> Bytes {
        Bytes::from_static(b"PAR1chunkPAR1")
    }

    #[test]
    fn test_window_reads() {
        let chunk = SlicedFile::new(source(), 4..9).unwrap();
        assert_eq!(chunk.size().unwrap(), 5);
        assert_eq!(chunk.slice_range(), 4..9);
        assert_eq!(chunk.read_at(0..5).unwrap().as_ref(), b"chunk");
        assert_eq!(chunk.read_at(2..100).unwrap().as_ref(), b"unk");
        assert!(chunk.read_at(5..6).unwrap().is_empty());
        assert!(chunk.read_at(1..1).unwrap().is_empty());
    }

    #[test]
    fn test_inverted_window() {
        let err = SlicedFile::new(source(), 9..4).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_window_past_source_end() {
        let padded = SlicedFile::new(source(), 9..40).unwrap();
        assert_eq!(padded.slice_size(), 31);
        assert_eq!(padded.read_at(0..31).unwrap().as_ref(), b"PAR1");
        assert!(padded.read_at(4..31).unwrap().is_empty());
    }

    #[test]
    fn test_window_near_u64_max() {
        let far = SlicedFile::new(source(), (u64::MAX - 2)..u64::MAX).unwrap();
        assert!(far.read_at(0..2).unwrap().is_empty());
    }
}
