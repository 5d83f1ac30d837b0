//! Whole-file construction.

use std::io::Write;

use bytes::Bytes;
use parcel_format::{
    descriptor::ColumnDescPtr,
    metadata::{FileMetaData, RowGroupMetaData},
};

use crate::chunk::ColumnChunk;

pub const MAGIC: &[u8; 4] = b"PAR1";

/// Lays out column chunks between the leading and trailing magic and produces the
/// matching metadata. The footer itself is not serialized: callers hand the
/// metadata to the reader directly, and a zero-filled block of `FOOTER_LEN` bytes
/// stands in for it.
pub struct FileBuilder {
    data: Vec<u8>,
    columns: Vec<ColumnDescPtr>,
    row_groups: Vec<RowGroupMetaData>,
    created_by: Option<String>,
    num_rows: i64,
}

impl FileBuilder {
    pub const FOOTER_LEN: usize = 256;

    pub fn new(columns: Vec<ColumnDescPtr>) -> FileBuilder {
        FileBuilder {
            data: MAGIC.to_vec(),
            columns,
            row_groups: Vec::new(),
            created_by: None,
            num_rows: 0,
        }
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Appends a row group made of `chunks`, one per column, in column order.
    pub fn add_row_group(&mut self, num_rows: i64, chunks: Vec<ColumnChunk>) -> &mut Self {
        assert_eq!(chunks.len(), self.columns.len(), "one chunk per column");
        let mut columns = Vec::with_capacity(chunks.len());
        let mut total_byte_size = 0;
        for chunk in chunks {
            let offset = self.data.len() as u64;
            columns.push(chunk.metadata_at(offset));
            total_byte_size += chunk.total_uncompressed_size;
            self.data.extend_from_slice(&chunk.data);
        }
        self.row_groups
            .push(RowGroupMetaData::new(num_rows, total_byte_size, columns));
        self.num_rows += num_rows;
        self
    }

    pub fn finish(mut self) -> (Bytes, FileMetaData) {
        self.data.resize(self.data.len() + Self::FOOTER_LEN, 0);
        self.data
            .extend_from_slice(&(Self::FOOTER_LEN as u32).to_le_bytes());
        self.data.extend_from_slice(MAGIC);
        let metadata = FileMetaData::new(
            1,
            self.num_rows,
            self.created_by,
            Self::FOOTER_LEN as u32,
            self.columns,
            self.row_groups,
        );
        (Bytes::from(self.data), metadata)
    }
}

/// Writes `data` to a fresh temporary file.
pub fn write_temp_file(data: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
