//! Thrift compact-protocol writer and page header serialization.

use parcel_format::{
    page_header::{DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageBody, PageHeader},
    statistics::Statistics,
    thrift::FieldType,
};

/// Writes structs in the Thrift compact protocol.
#[derive(Debug, Default)]
pub struct CompactWriter {
    buf: Vec<u8>,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
}

impl CompactWriter {
    pub fn new() -> CompactWriter {
        CompactWriter::default()
    }

    pub fn write_struct_begin(&mut self) {
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn write_struct_end(&mut self) {
        self.buf.push(FieldType::Stop.to_nibble());
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    }

    pub fn write_field_begin(&mut self, field_type: FieldType, id: i16) {
        let delta = id - self.last_field_id;
        if delta > 0 && delta <= 15 {
            self.buf.push(((delta as u8) << 4) | field_type.to_nibble());
        } else {
            self.buf.push(field_type.to_nibble());
            self.write_varint(zigzag(id as i64));
        }
        self.last_field_id = id;
    }

    pub fn write_i32_field(&mut self, id: i16, value: i32) {
        self.write_field_begin(FieldType::I32, id);
        self.write_varint(zigzag(value as i64));
    }

    pub fn write_i64_field(&mut self, id: i16, value: i64) {
        self.write_field_begin(FieldType::I64, id);
        self.write_varint(zigzag(value));
    }

    pub fn write_bool_field(&mut self, id: i16, value: bool) {
        let field_type = if value {
            FieldType::BoolTrue
        } else {
            FieldType::BoolFalse
        };
        self.write_field_begin(field_type, id);
    }

    pub fn write_binary_field(&mut self, id: i16, value: &[u8]) {
        self.write_field_begin(FieldType::Binary, id);
        self.write_varint(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    /// Writes a nested struct field whose body is produced by `body`.
    pub fn write_struct_field(&mut self, id: i16, body: impl FnOnce(&mut CompactWriter)) {
        self.write_field_begin(FieldType::Struct, id);
        self.write_struct_begin();
        body(self);
        self.write_struct_end();
    }

    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Appends raw bytes, bypassing the protocol.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Serializes a page header.
pub fn write_page_header(header: &PageHeader) -> Vec<u8> {
    let mut w = CompactWriter::new();
    w.write_struct_begin();
    w.write_i32_field(1, header.page_type.as_i32());
    w.write_i32_field(2, header.uncompressed_page_size);
    w.write_i32_field(3, header.compressed_page_size);
    if let Some(crc) = header.crc {
        w.write_i32_field(4, crc);
    }
    match &header.body {
        PageBody::Data(data) => w.write_struct_field(5, |w| write_data_page_header(w, data)),
        PageBody::Index => w.write_struct_field(6, |_| {}),
        PageBody::Dictionary(dict) => {
            w.write_struct_field(7, |w| write_dictionary_page_header(w, dict))
        }
        PageBody::DataV2(data) => w.write_struct_field(8, |w| write_data_page_header_v2(w, data)),
    }
    w.write_struct_end();
    w.into_inner()
}

fn write_data_page_header(w: &mut CompactWriter, header: &DataPageHeader) {
    w.write_i32_field(1, header.num_values);
    w.write_i32_field(2, header.encoding.as_i32());
    w.write_i32_field(3, header.definition_level_encoding.as_i32());
    w.write_i32_field(4, header.repetition_level_encoding.as_i32());
    if let Some(stats) = &header.statistics {
        w.write_struct_field(5, |w| write_statistics(w, stats));
    }
}

fn write_data_page_header_v2(w: &mut CompactWriter, header: &DataPageHeaderV2) {
    w.write_i32_field(1, header.num_values);
    w.write_i32_field(2, header.num_nulls);
    w.write_i32_field(3, header.num_rows);
    w.write_i32_field(4, header.encoding.as_i32());
    w.write_i32_field(5, header.definition_levels_byte_length);
    w.write_i32_field(6, header.repetition_levels_byte_length);
    w.write_bool_field(7, header.is_compressed);
    if let Some(stats) = &header.statistics {
        w.write_struct_field(8, |w| write_statistics(w, stats));
    }
}

fn write_dictionary_page_header(w: &mut CompactWriter, header: &DictionaryPageHeader) {
    w.write_i32_field(1, header.num_values);
    w.write_i32_field(2, header.encoding.as_i32());
    w.write_bool_field(3, header.is_sorted);
}

fn write_statistics(w: &mut CompactWriter, stats: &Statistics) {
    if let Some(null_count) = stats.null_count {
        w.write_i64_field(3, null_count);
    }
    if let Some(distinct_count) = stats.distinct_count {
        w.write_i64_field(4, distinct_count);
    }
    if let Some(max) = &stats.max {
        w.write_binary_field(5, max);
    }
    if let Some(min) = &stats.min {
        w.write_binary_field(6, min);
    }
}

#[cfg(test)]
mod tests {
    use parcel_format::{
        Encoding, PageType,
        page_header::{DataPageHeader, PageBody, PageHeader},
        statistics::Statistics,
    };

    use super::write_page_header;

    #[test]
    fn test_page_header_round_trip() {
        let header = PageHeader {
            page_type: PageType::DataPage,
            uncompressed_page_size: 70000,
            compressed_page_size: 123,
            crc: Some(-5),
            body: PageBody::Data(DataPageHeader {
                num_values: 8,
                encoding: Encoding::RleDictionary,
                definition_level_encoding: Encoding::Rle,
                repetition_level_encoding: Encoding::BitPacked,
                statistics: Some(Statistics {
                    min: Some(vec![1, 0, 0, 0].into()),
                    max: Some(vec![9, 0, 0, 0].into()),
                    null_count: Some(0),
                    distinct_count: None,
                }),
            }),
        };
        let bytes = write_page_header(&header);
        let (parsed, len) = PageHeader::read_from(&bytes).unwrap();
        assert_eq!(len, bytes.len());
        assert_eq!(parsed, header);
    }
}
