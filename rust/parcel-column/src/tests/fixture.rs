//! Helpers for opening testkit files and draining readers.

use std::sync::Arc;

use bytes::Bytes;
use parcel_common::Result;
use parcel_encodings::data_type::DataType;
use parcel_format::metadata::FileMetaData;
use parcel_testkit::{chunk::ColumnChunk, file::FileBuilder};

use crate::{ColumnValueType, FileReader, PageReader, ReaderProperties, TypedColumnReader};

pub fn open(file: (Bytes, FileMetaData)) -> FileReader {
    open_with(file, ReaderProperties::default())
}

pub fn open_with(file: (Bytes, FileMetaData), properties: ReaderProperties) -> FileReader {
    let (data, metadata) = file;
    FileReader::open(Arc::new(data), metadata, properties).unwrap()
}

/// A file holding `chunk` as the only column of its only row group.
pub fn single_chunk_file(chunk: ColumnChunk) -> (Bytes, FileMetaData) {
    let mut file = FileBuilder::new(vec![chunk.descriptor.clone()]);
    let num_rows = chunk.num_values;
    file.add_row_group(num_rows, vec![chunk]);
    file.finish()
}

pub fn typed_reader<T: ColumnValueType>(chunk: ColumnChunk) -> TypedColumnReader<T> {
    open(single_chunk_file(chunk))
        .row_group(0)
        .unwrap()
        .column(0)
        .unwrap()
        .into_typed::<T>()
        .unwrap()
}

/// Page reader over a chunk that starts at offset zero of its own buffer.
pub fn chunk_pages(chunk: &ColumnChunk, properties: &ReaderProperties) -> PageReader {
    let data = Bytes::from(chunk.data.clone());
    let len = data.len() as u64;
    PageReader::new(Arc::new(data), 0..len, chunk.codec, properties).unwrap()
}

/// Levels and values of a whole column chunk.
#[derive(Debug, Default, PartialEq)]
pub struct ColumnData<V> {
    pub def_levels: Vec<i16>,
    pub rep_levels: Vec<i16>,
    pub values: Vec<V>,
}

/// Reads the remainder of a column in batches of `batch_size`.
pub fn read_all<T: DataType>(
    reader: &mut TypedColumnReader<T>,
    batch_size: usize,
) -> Result<ColumnData<T::Value>> {
    let mut data = ColumnData::default();
    let mut def_levels = vec![0; batch_size];
    let mut rep_levels = vec![0; batch_size];
    let mut values = vec![T::Value::default(); batch_size];
    loop {
        let (levels_read, values_read) = reader.read_batch(
            batch_size,
            Some(&mut def_levels[..]),
            Some(&mut rep_levels[..]),
            &mut values,
        )?;
        if levels_read == 0 {
            return Ok(data);
        }
        data.def_levels.extend_from_slice(&def_levels[..levels_read]);
        data.rep_levels.extend_from_slice(&rep_levels[..levels_read]);
        data.values.extend_from_slice(&values[..values_read]);
    }
}
