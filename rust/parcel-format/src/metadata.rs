//! Parsed footer metadata: file, row group and column chunk level descriptions.
//!
//! These objects are produced by a footer parser outside of this workspace (or built
//! directly by tests) and are treated as already validated, apart from the checks
//! performed by [`ColumnChunkMetaDataBuilder::build`].

use std::ops::Range;

use parcel_common::{Result, error::Error, verify_data};

use crate::{
    descriptor::{ColumnDescPtr, ColumnDescriptor},
    statistics::Statistics,
    types::{CompressionCodec, Encoding},
    version::ApplicationVersion,
};

/// File-level metadata.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    footer_size: u32,
    writer_version: ApplicationVersion,
    columns: Vec<ColumnDescPtr>,
    row_groups: Vec<RowGroupMetaData>,
}

impl FileMetaData {
    pub fn new(
        version: i32,
        num_rows: i64,
        created_by: Option<String>,
        footer_size: u32,
        columns: Vec<ColumnDescPtr>,
        row_groups: Vec<RowGroupMetaData>,
    ) -> FileMetaData {
        let writer_version = created_by
            .as_deref()
            .map(ApplicationVersion::parse)
            .unwrap_or_default();
        FileMetaData {
            version,
            num_rows,
            created_by,
            footer_size,
            writer_version,
            columns,
            row_groups,
        }
    }

    /// Format version declared by the writer.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Total number of rows across all row groups.
    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Length in bytes of the serialized footer, as recorded before the trailing magic.
    pub fn footer_size(&self) -> u32 {
        self.footer_size
    }

    /// Writer identification parsed from `created_by`.
    pub fn writer_version(&self) -> &ApplicationVersion {
        &self.writer_version
    }

    /// Returns the number of leaf columns in the schema.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the descriptor of the leaf column `i`.
    pub fn column(&self, i: usize) -> Option<&ColumnDescPtr> {
        self.columns.get(i)
    }

    pub fn columns(&self) -> &[ColumnDescPtr] {
        &self.columns
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn row_group(&self, i: usize) -> Option<&RowGroupMetaData> {
        self.row_groups.get(i)
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }
}

/// Row group metadata: a horizontal slice of the file holding one chunk per leaf column.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    num_rows: i64,
    total_byte_size: i64,
    columns: Vec<ColumnChunkMetaData>,
}

impl RowGroupMetaData {
    pub fn new(
        num_rows: i64,
        total_byte_size: i64,
        columns: Vec<ColumnChunkMetaData>,
    ) -> RowGroupMetaData {
        RowGroupMetaData {
            num_rows,
            total_byte_size,
            columns,
        }
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    /// Total uncompressed size of all column data in this row group.
    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> Option<&ColumnChunkMetaData> {
        self.columns.get(i)
    }

    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }
}

/// Metadata of one column chunk: the contiguous byte range holding one column's
/// pages within a row group.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    descriptor: ColumnDescPtr,
    codec: CompressionCodec,
    encodings: Vec<Encoding>,
    num_values: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    data_page_offset: i64,
    dictionary_page_offset: Option<i64>,
    statistics: Option<Statistics>,
}

impl ColumnChunkMetaData {
    /// Starts building chunk metadata for the given column.
    pub fn builder(descriptor: impl Into<ColumnDescPtr>) -> ColumnChunkMetaDataBuilder {
        ColumnChunkMetaDataBuilder::new(descriptor.into())
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    pub fn descriptor_ptr(&self) -> &ColumnDescPtr {
        &self.descriptor
    }

    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    /// Encodings used anywhere in this chunk (values and levels).
    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    /// Declared number of level slots (values including nulls) in the chunk.
    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn total_uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    pub fn total_compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    pub fn has_dictionary_page(&self) -> bool {
        self.dictionary_page_offset.is_some_and(|offset| offset > 0)
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    /// Returns `true` if the chunk carries statistics with at least one value set.
    pub fn is_stats_set(&self) -> bool {
        self.statistics.as_ref().is_some_and(Statistics::is_set)
    }

    /// Byte range of the chunk within the file as declared by the metadata.
    ///
    /// The chunk starts at the dictionary page when one precedes the first data page,
    /// and spans `total_compressed_size` bytes.
    pub fn byte_range(&self) -> Range<u64> {
        let start = match self.dictionary_page_offset {
            Some(dict_offset) if dict_offset > 0 && dict_offset < self.data_page_offset => {
                dict_offset
            }
            _ => self.data_page_offset,
        } as u64;
        start..start + self.total_compressed_size as u64
    }
}

/// Builder for [`ColumnChunkMetaData`].
pub struct ColumnChunkMetaDataBuilder {
    inner: ColumnChunkMetaData,
}

impl ColumnChunkMetaDataBuilder {
    fn new(descriptor: ColumnDescPtr) -> Self {
        ColumnChunkMetaDataBuilder {
            inner: ColumnChunkMetaData {
                descriptor,
                codec: CompressionCodec::Uncompressed,
                encodings: Vec::new(),
                num_values: 0,
                total_uncompressed_size: 0,
                total_compressed_size: 0,
                data_page_offset: 0,
                dictionary_page_offset: None,
                statistics: None,
            },
        }
    }

    pub fn codec(mut self, codec: CompressionCodec) -> Self {
        self.inner.codec = codec;
        self
    }

    pub fn encodings(mut self, encodings: Vec<Encoding>) -> Self {
        self.inner.encodings = encodings;
        self
    }

    pub fn num_values(mut self, num_values: i64) -> Self {
        self.inner.num_values = num_values;
        self
    }

    pub fn total_uncompressed_size(mut self, size: i64) -> Self {
        self.inner.total_uncompressed_size = size;
        self
    }

    pub fn total_compressed_size(mut self, size: i64) -> Self {
        self.inner.total_compressed_size = size;
        self
    }

    pub fn data_page_offset(mut self, offset: i64) -> Self {
        self.inner.data_page_offset = offset;
        self
    }

    pub fn dictionary_page_offset(mut self, offset: Option<i64>) -> Self {
        self.inner.dictionary_page_offset = offset;
        self
    }

    pub fn statistics(mut self, statistics: Option<Statistics>) -> Self {
        self.inner.statistics = statistics;
        self
    }

    /// Validates and returns the metadata.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if a count, size or offset is negative.
    pub fn build(self) -> Result<ColumnChunkMetaData> {
        let meta = self.inner;
        verify_data!(num_values, meta.num_values >= 0);
        verify_data!(total_compressed_size, meta.total_compressed_size >= 0);
        verify_data!(total_uncompressed_size, meta.total_uncompressed_size >= 0);
        verify_data!(data_page_offset, meta.data_page_offset >= 0);
        if let Some(offset) = meta.dictionary_page_offset {
            if offset < 0 {
                return Err(Error::invalid_format(
                    "dictionary_page_offset",
                    format!("negative offset {offset}"),
                ));
            }
        }
        Ok(meta)
    }
}
