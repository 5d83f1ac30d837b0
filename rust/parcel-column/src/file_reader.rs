//! Binds parsed file metadata to a byte source and hands out per-column readers.

use std::{ops::Range, path::Path, sync::Arc};

use log::debug;
use parcel_common::{Result, error::Error};
use parcel_format::metadata::{ColumnChunkMetaData, FileMetaData, RowGroupMetaData};
use parcel_io::ReadAt;

use crate::{column_reader::ColumnReader, page_reader::PageReader, properties::ReaderProperties};

/// Upper bound on the size of the dictionary page header missing from chunk lengths
/// recorded by old `parquet-mr` writers.
const MAX_DICTIONARY_HEADER_SIZE: u64 = 100;

/// A columnar file opened for reading.
///
/// Cheap to clone: clones share the byte source, the metadata and the properties.
/// The source is released when the last file, row group or column reader referring
/// to it is dropped.
#[derive(Clone)]
pub struct FileReader(Arc<FileContext>);

struct FileContext {
    source: Arc<dyn ReadAt>,
    metadata: FileMetaData,
    properties: ReaderProperties,
}

impl FileReader {
    /// Opens a file from an arbitrary byte source and its already parsed footer.
    ///
    /// # Arguments
    ///
    /// * `source` - Positional reader over the file's bytes.
    /// * `metadata` - The parsed file footer.
    /// * `properties` - Options applied to every reader created from this file.
    pub fn open(
        source: Arc<dyn ReadAt>,
        metadata: FileMetaData,
        properties: ReaderProperties,
    ) -> Result<FileReader> {
        debug!(
            "opening file: {} row groups, {} columns, {} byte footer, written by {:?}",
            metadata.num_row_groups(),
            metadata.num_columns(),
            metadata.footer_size(),
            metadata.created_by()
        );
        Ok(FileReader(Arc::new(FileContext {
            source,
            metadata,
            properties,
        })))
    }

    /// Opens a local file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be opened.
    pub fn open_path(
        path: impl AsRef<Path>,
        metadata: FileMetaData,
        properties: ReaderProperties,
    ) -> Result<FileReader> {
        let path = path.as_ref();
        let file = parcel_io::LocalFile::open(path)
            .map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        Self::open(Arc::new(file), metadata, properties)
    }

    pub fn metadata(&self) -> &FileMetaData {
        &self.0.metadata
    }

    pub fn properties(&self) -> &ReaderProperties {
        &self.0.properties
    }

    pub fn source(&self) -> &Arc<dyn ReadAt> {
        &self.0.source
    }

    pub fn num_row_groups(&self) -> usize {
        self.0.metadata.num_row_groups()
    }

    /// Returns a reader for row group `index`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `index` is out of range.
    pub fn row_group(&self, index: usize) -> Result<RowGroupReader> {
        let num_row_groups = self.num_row_groups();
        if index >= num_row_groups {
            return Err(Error::invalid_arg(
                "index",
                format!("row group {index} out of range for {num_row_groups} row groups"),
            ));
        }
        Ok(RowGroupReader {
            file: self.0.clone(),
            index,
        })
    }
}

/// Handle to one row group of a [`FileReader`].
#[derive(Clone)]
pub struct RowGroupReader {
    file: Arc<FileContext>,
    index: usize,
}

impl RowGroupReader {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn metadata(&self) -> &RowGroupMetaData {
        &self.file.metadata.row_groups()[self.index]
    }

    pub fn num_rows(&self) -> i64 {
        self.metadata().num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.metadata().num_columns()
    }

    /// Metadata of column chunk `index`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `index` is out of range.
    pub fn column_chunk(&self, index: usize) -> Result<&ColumnChunkMetaData> {
        let num_columns = self.num_columns();
        self.metadata().column(index).ok_or_else(|| {
            Error::invalid_arg(
                "index",
                format!("column {index} out of range for {num_columns} columns"),
            )
        })
    }

    /// Opens the raw page stream of column chunk `index`.
    pub fn page_reader(&self, index: usize) -> Result<PageReader> {
        let chunk = self.column_chunk(index)?;
        let range = self.chunk_range(chunk)?;
        debug!(
            "row group {}, column {}: chunk {}..{}, {} values, {}",
            self.index,
            chunk.descriptor().path(),
            range.start,
            range.end,
            chunk.num_values(),
            chunk.codec()
        );
        let pages = PageReader::new(
            self.file.source.clone(),
            range,
            chunk.codec(),
            &self.file.properties,
        )?;
        Ok(pages.with_total_values(chunk.num_values()))
    }

    /// Opens a reader for column chunk `index`, typed after its physical type.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if `index` is out of range.
    /// * `Codec` if the chunk's codec has no registered decompressor.
    pub fn column(&self, index: usize) -> Result<ColumnReader> {
        let pages = self.page_reader(index)?;
        let chunk = self.column_chunk(index)?;
        ColumnReader::new(
            chunk.descriptor_ptr().clone(),
            pages,
            chunk.num_values(),
            &self.file.properties,
        )
    }

    /// Byte range to read for a column chunk. Chunks from writers that under-report
    /// the length are padded by up to the size of a dictionary page header, bounded by
    /// the end of the source.
    fn chunk_range(&self, chunk: &ColumnChunkMetaData) -> Result<Range<u64>> {
        let mut range = chunk.byte_range();
        if self.file.metadata.writer_version().has_short_chunk_length() {
            let source_size = self
                .file
                .source
                .size()
                .map_err(|e| Error::io("source size", e))?;
            let padding = MAX_DICTIONARY_HEADER_SIZE.min(source_size.saturating_sub(range.end));
            range.end += padding;
        }
        Ok(range)
    }
}
