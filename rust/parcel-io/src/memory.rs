//! In-memory sources: a whole Parquet file already loaded into a buffer.

use std::ops::Range;

use bytes::Bytes;

use crate::{ReadAt, StorageProfile, verify};

impl<T> ReadAt for T
where
    T: buffer::Buffer + Send + Sync + 'static,
{
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.byte_len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        verify!(range.end >= range.start);
        let len = self.byte_len() as u64;
        let end = range.end.min(len);
        if range.start >= end {
            return Ok(Bytes::new());
        }
        Ok(self.share(range.start as usize..end as usize))
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 1,
            max_io_size: self.byte_len().min(StorageProfile::default().max_io_size),
        }
    }
}

mod buffer {
    use std::ops::Range;

    use bytes::Bytes;

    pub trait Buffer {
        fn byte_len(&self) -> usize;

        /// The bytes in `range`, without copying where the buffer allows it.
        fn share(&self, range: Range<usize>) -> Bytes;
    }

    impl Buffer for Bytes {
        fn byte_len(&self) -> usize {
            self.len()
        }

        fn share(&self, range: Range<usize>) -> Bytes {
            self.slice(range)
        }
    }

    impl Buffer for Vec<u8> {
        fn byte_len(&self) -> usize {
            self.len()
        }

        fn share(&self, range: Range<usize>) -> Bytes {
            Bytes::copy_from_slice(&self[range])
        }
    }

    impl Buffer for &'static [u8] {
        fn byte_len(&self) -> usize {
            self.len()
        }

        fn share(&self, range: Range<usize>) -> Bytes {
            Bytes::from_static(&self[range])
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::ReadAt;

    #[test]
    fn test_vec_source() {
        let file = b"PAR1....PAR1".to_vec();
        assert_eq!(file.size().unwrap(), 12);
        assert_eq!(file.read_at(8..12).unwrap().as_ref(), b"PAR1");
        assert_eq!(file.read_at(10..64).unwrap().as_ref(), b"R1");
        assert!(file.read_at(12..16).unwrap().is_empty());

        let shared: Arc<dyn ReadAt> = Arc::new(file);
        assert_eq!(shared.read_at(0..4).unwrap().as_ref(), b"PAR1");
        assert_eq!(shared.storage_profile().min_io_size, 1);
    }

    #[test]
    fn test_bytes_source_shares_buffer() {
        let file = Bytes::from_static(b"0123456789");
        let slice = file.read_at(2..6).unwrap();
        assert_eq!(slice.as_ref(), b"2345");
        assert_eq!(slice.as_ptr(), file[2..].as_ptr());
    }

    #[test]
    fn test_inverted_range() {
        let file: &'static [u8] = b"abc";
        #[allow(clippy::reversed_empty_ranges)]
        let err = file.read_at(2..1).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
