//! Page header structures and their compact-protocol parsing.

use bytes::Bytes;
use parcel_common::{Result, error::Error};

use crate::{
    statistics::Statistics,
    thrift::{CompactReader, FieldHeader, FieldType},
    types::{Encoding, PageType},
};

/// Header preceding every page of a column chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub crc: Option<i32>,
    pub body: PageBody,
}

/// Page-type specific part of a [`PageHeader`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    Data(DataPageHeader),
    DataV2(DataPageHeaderV2),
    Dictionary(DictionaryPageHeader),
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPageHeader {
    /// Number of level slots (values including nulls) in the page.
    pub num_values: i32,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
    pub statistics: Option<Statistics>,
}

/// Data page layout where levels precede the (optionally compressed) values
/// uncompressed and with explicit byte lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: Encoding,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    pub is_compressed: bool,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub is_sorted: bool,
}

impl PageHeader {
    /// Parses a page header from the beginning of `buf`.
    ///
    /// # Returns
    ///
    /// The header and the number of bytes it occupies.
    ///
    /// # Errors
    ///
    /// * `ShortRead` if `buf` ends before the header does; the caller may retry with
    ///   a larger buffer.
    /// * `CorruptPage` if the header is malformed, names an unknown page type or
    ///   declares a negative size.
    pub fn read_from(buf: &[u8]) -> Result<(PageHeader, usize)> {
        let mut reader = CompactReader::new(buf);
        let header = read_page_header(&mut reader)?;
        Ok((header, reader.position()))
    }

    /// Number of level slots in a data or dictionary page, zero for index pages.
    pub fn num_values(&self) -> i32 {
        match &self.body {
            PageBody::Data(h) => h.num_values,
            PageBody::DataV2(h) => h.num_values,
            PageBody::Dictionary(h) => h.num_values,
            PageBody::Index => 0,
        }
    }

    /// Encoding of the page's values, if it has any.
    pub fn encoding(&self) -> Option<Encoding> {
        match &self.body {
            PageBody::Data(h) => Some(h.encoding),
            PageBody::DataV2(h) => Some(h.encoding),
            PageBody::Dictionary(h) => Some(h.encoding),
            PageBody::Index => None,
        }
    }

    /// Page-level statistics, if the writer recorded them.
    pub fn statistics(&self) -> Option<&Statistics> {
        match &self.body {
            PageBody::Data(h) => h.statistics.as_ref(),
            PageBody::DataV2(h) => h.statistics.as_ref(),
            PageBody::Dictionary(_) | PageBody::Index => None,
        }
    }
}

fn read_page_header(reader: &mut CompactReader) -> Result<PageHeader> {
    let mut page_type = None;
    let mut uncompressed_page_size = None;
    let mut compressed_page_size = None;
    let mut crc = None;
    let mut data = None;
    let mut data_v2 = None;
    let mut dictionary = None;

    reader.read_struct_begin();
    while let Some(field) = reader.read_field_begin()? {
        match (field.id, field.field_type) {
            (1, FieldType::I32) => {
                let tag = reader.read_i32()?;
                page_type = Some(
                    PageType::try_from(tag)
                        .map_err(|_| Error::corrupt_page(format!("invalid page type {tag}")))?,
                );
            }
            (2, FieldType::I32) => uncompressed_page_size = Some(reader.read_i32()?),
            (3, FieldType::I32) => compressed_page_size = Some(reader.read_i32()?),
            (4, FieldType::I32) => crc = Some(reader.read_i32()?),
            (5, FieldType::Struct) => data = Some(read_data_page_header(reader)?),
            (7, FieldType::Struct) => dictionary = Some(read_dictionary_page_header(reader)?),
            (8, FieldType::Struct) => data_v2 = Some(read_data_page_header_v2(reader)?),
            // 6: index page header (empty struct), and any unknown fields
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.read_struct_end();

    let page_type = required(page_type, "PageHeader.type")?;
    let uncompressed_page_size = required(uncompressed_page_size, "uncompressed_page_size")?;
    let compressed_page_size = required(compressed_page_size, "compressed_page_size")?;
    if uncompressed_page_size < 0 || compressed_page_size < 0 {
        return Err(Error::corrupt_page(format!(
            "negative page size: compressed {compressed_page_size}, \
             uncompressed {uncompressed_page_size}"
        )));
    }

    let body = match page_type {
        PageType::DataPage => PageBody::Data(required(data, "data_page_header")?),
        PageType::DataPageV2 => PageBody::DataV2(required(data_v2, "data_page_header_v2")?),
        PageType::DictionaryPage => {
            PageBody::Dictionary(required(dictionary, "dictionary_page_header")?)
        }
        PageType::IndexPage => PageBody::Index,
    };

    Ok(PageHeader {
        page_type,
        uncompressed_page_size,
        compressed_page_size,
        crc,
        body,
    })
}

fn read_data_page_header(reader: &mut CompactReader) -> Result<DataPageHeader> {
    let mut num_values = None;
    let mut encoding = None;
    let mut def_encoding = None;
    let mut rep_encoding = None;
    let mut statistics = None;

    reader.read_struct_begin();
    while let Some(field) = reader.read_field_begin()? {
        match (field.id, field.field_type) {
            (1, FieldType::I32) => num_values = Some(read_count(reader, "num_values")?),
            (2, FieldType::I32) => encoding = Some(read_encoding(reader)?),
            (3, FieldType::I32) => def_encoding = Some(read_encoding(reader)?),
            (4, FieldType::I32) => rep_encoding = Some(read_encoding(reader)?),
            (5, FieldType::Struct) => statistics = Some(read_statistics(reader)?),
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.read_struct_end();

    Ok(DataPageHeader {
        num_values: required(num_values, "DataPageHeader.num_values")?,
        encoding: required(encoding, "DataPageHeader.encoding")?,
        definition_level_encoding: required(def_encoding, "definition_level_encoding")?,
        repetition_level_encoding: required(rep_encoding, "repetition_level_encoding")?,
        statistics,
    })
}

fn read_data_page_header_v2(reader: &mut CompactReader) -> Result<DataPageHeaderV2> {
    let mut num_values = None;
    let mut num_nulls = None;
    let mut num_rows = None;
    let mut encoding = None;
    let mut def_len = None;
    let mut rep_len = None;
    let mut is_compressed = true;
    let mut statistics = None;

    reader.read_struct_begin();
    while let Some(field) = reader.read_field_begin()? {
        match (field.id, field.field_type) {
            (1, FieldType::I32) => num_values = Some(read_count(reader, "num_values")?),
            (2, FieldType::I32) => num_nulls = Some(read_count(reader, "num_nulls")?),
            (3, FieldType::I32) => num_rows = Some(read_count(reader, "num_rows")?),
            (4, FieldType::I32) => encoding = Some(read_encoding(reader)?),
            (5, FieldType::I32) => {
                def_len = Some(read_count(reader, "definition_levels_byte_length")?)
            }
            (6, FieldType::I32) => {
                rep_len = Some(read_count(reader, "repetition_levels_byte_length")?)
            }
            (7, FieldType::BoolTrue | FieldType::BoolFalse) => {
                is_compressed = bool_field(&field);
            }
            (8, FieldType::Struct) => statistics = Some(read_statistics(reader)?),
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.read_struct_end();

    Ok(DataPageHeaderV2 {
        num_values: required(num_values, "DataPageHeaderV2.num_values")?,
        num_nulls: required(num_nulls, "DataPageHeaderV2.num_nulls")?,
        num_rows: required(num_rows, "DataPageHeaderV2.num_rows")?,
        encoding: required(encoding, "DataPageHeaderV2.encoding")?,
        definition_levels_byte_length: required(def_len, "definition_levels_byte_length")?,
        repetition_levels_byte_length: required(rep_len, "repetition_levels_byte_length")?,
        is_compressed,
        statistics,
    })
}

fn read_dictionary_page_header(reader: &mut CompactReader) -> Result<DictionaryPageHeader> {
    let mut num_values = None;
    let mut encoding = None;
    let mut is_sorted = false;

    reader.read_struct_begin();
    while let Some(field) = reader.read_field_begin()? {
        match (field.id, field.field_type) {
            (1, FieldType::I32) => num_values = Some(read_count(reader, "num_values")?),
            (2, FieldType::I32) => encoding = Some(read_encoding(reader)?),
            (3, FieldType::BoolTrue | FieldType::BoolFalse) => is_sorted = bool_field(&field),
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.read_struct_end();

    Ok(DictionaryPageHeader {
        num_values: required(num_values, "DictionaryPageHeader.num_values")?,
        encoding: required(encoding, "DictionaryPageHeader.encoding")?,
        is_sorted,
    })
}

/// Reads a `Statistics` struct. The newer `min_value`/`max_value` fields take
/// precedence over the deprecated `min`/`max`.
fn read_statistics(reader: &mut CompactReader) -> Result<Statistics> {
    let mut stats = Statistics::default();
    let mut legacy_min = None;
    let mut legacy_max = None;

    reader.read_struct_begin();
    while let Some(field) = reader.read_field_begin()? {
        match (field.id, field.field_type) {
            (1, FieldType::Binary) => legacy_max = Some(read_bytes(reader)?),
            (2, FieldType::Binary) => legacy_min = Some(read_bytes(reader)?),
            (3, FieldType::I64) => stats.null_count = Some(reader.read_i64()?),
            (4, FieldType::I64) => stats.distinct_count = Some(reader.read_i64()?),
            (5, FieldType::Binary) => stats.max = Some(read_bytes(reader)?),
            (6, FieldType::Binary) => stats.min = Some(read_bytes(reader)?),
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.read_struct_end();

    stats.min = stats.min.or(legacy_min);
    stats.max = stats.max.or(legacy_max);
    Ok(stats)
}

fn read_encoding(reader: &mut CompactReader) -> Result<Encoding> {
    let tag = reader.read_i32()?;
    Encoding::try_from(tag).map_err(|_| Error::corrupt_page(format!("invalid encoding {tag}")))
}

fn read_count(reader: &mut CompactReader, name: &str) -> Result<i32> {
    let value = reader.read_i32()?;
    if value < 0 {
        return Err(Error::corrupt_page(format!("negative {name}: {value}")));
    }
    Ok(value)
}

fn read_bytes(reader: &mut CompactReader) -> Result<Bytes> {
    Ok(Bytes::copy_from_slice(reader.read_binary()?))
}

fn bool_field(field: &FieldHeader) -> bool {
    field.bool_value().unwrap_or_default()
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| Error::corrupt_page(format!("missing required field {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// field 1 type=0, 2 uncompressed=10, 3 compressed=10, 5 data header
    /// { num_values=4, PLAIN, RLE, RLE }
    const DATA_PAGE_HEADER: &[u8] = &[
        0x15, 0x00, 0x15, 0x14, 0x15, 0x14, 0x2c, 0x15, 0x08, 0x15, 0x00, 0x15, 0x06, 0x15,
        0x06, 0x00, 0x00,
    ];

    #[test]
    fn test_read_data_page_header() {
        let mut buf = DATA_PAGE_HEADER.to_vec();
        buf.extend_from_slice(&[0xff; 10]);
        let (header, len) = PageHeader::read_from(&buf).unwrap();
        assert_eq!(len, DATA_PAGE_HEADER.len());
        assert_eq!(header.page_type, PageType::DataPage);
        assert_eq!(header.compressed_page_size, 10);
        assert_eq!(header.num_values(), 4);
        assert_eq!(header.encoding(), Some(Encoding::Plain));
        match header.body {
            PageBody::Data(data) => {
                assert_eq!(data.definition_level_encoding, Encoding::Rle);
                assert!(data.statistics.is_none());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_truncated_header_is_short_read() {
        for len in 0..DATA_PAGE_HEADER.len() {
            let err = PageHeader::read_from(&DATA_PAGE_HEADER[..len]).unwrap_err();
            assert!(err.is_short_read(), "len {len}: {err}");
        }
    }

    #[test]
    fn test_invalid_page_type() {
        let mut buf = DATA_PAGE_HEADER.to_vec();
        buf[1] = 0x22; // zigzag(17)
        assert!(PageHeader::read_from(&buf).unwrap_err().is_corrupt_page());
    }

    #[test]
    fn test_negative_size() {
        let mut buf = DATA_PAGE_HEADER.to_vec();
        buf[5] = 0x01; // compressed size -1
        assert!(PageHeader::read_from(&buf).unwrap_err().is_corrupt_page());
    }

    #[test]
    fn test_missing_body() {
        // DATA_PAGE without a data page header
        let buf = [0x15, 0x00, 0x15, 0x14, 0x15, 0x14, 0x00];
        assert!(PageHeader::read_from(&buf).unwrap_err().is_corrupt_page());
    }
}
