//! Canned files shared by the reader test suites.
//!
//! Each function returns the file bytes together with the metadata a footer parser
//! would have produced for them.

use std::sync::Arc;

use bytes::Bytes;
use parcel_encodings::data_type::{ByteArray, Int96};
use parcel_format::{
    CompressionCodec, Encoding, PhysicalType, descriptor::ColumnDescriptor,
    metadata::FileMetaData,
};

use crate::{
    chunk::{ColumnChunkBuilder, DataPageBuilder},
    file::FileBuilder,
};

pub const ALLTYPES_CREATED_BY: &str =
    "impala version 1.3.0-INTERNAL (build 8a48ddb1eff84592b3fc06bc6f51ec120e1fffc9)";

pub const ALLTYPES_IDS: [i32; 8] = [4, 5, 6, 7, 2, 3, 0, 1];

pub const ALLTYPES_DATE_STRINGS: [&str; 8] = [
    "03/01/09", "03/01/09", "04/01/09", "04/01/09", "02/01/09", "02/01/09", "01/01/09",
    "01/01/09",
];

/// One row group of eight rows covering every physical type except
/// FIXED_LEN_BYTE_ARRAY:
///
/// | # | name | type | layout |
/// |---|---|---|---|
/// | 0 | `id` | INT32, required | dictionary page + `PLAIN_DICTIONARY` data page |
/// | 1 | `bool_col` | BOOLEAN, required | `PLAIN` |
/// | 2 | `tinyint_col` | INT32, optional | `PLAIN`, no nulls |
/// | 3 | `smallint_col` | INT32, optional | `PLAIN`, no nulls |
/// | 4 | `int_col` | INT32, optional | `PLAIN`, no nulls |
/// | 5 | `bigint_col` | INT64, optional | `PLAIN`, no nulls |
/// | 6 | `float_col` | FLOAT, optional | `PLAIN`, no nulls |
/// | 7 | `double_col` | DOUBLE, optional | `PLAIN`, no nulls |
/// | 8 | `date_string_col` | BYTE_ARRAY, optional | dictionary, no nulls |
/// | 9 | `string_col` | BYTE_ARRAY, optional | `PLAIN`, no nulls |
/// | 10 | `timestamp_col` | INT96, optional | `PLAIN`, no nulls |
pub fn alltypes_plain() -> (Bytes, FileMetaData) {
    let id = descriptor(ColumnDescriptor::required("id", PhysicalType::Int32));
    let bool_col = descriptor(ColumnDescriptor::required("bool_col", PhysicalType::Boolean));
    let tinyint_col = descriptor(ColumnDescriptor::optional("tinyint_col", PhysicalType::Int32));
    let smallint_col = descriptor(ColumnDescriptor::optional("smallint_col", PhysicalType::Int32));
    let int_col = descriptor(ColumnDescriptor::optional("int_col", PhysicalType::Int32));
    let bigint_col = descriptor(ColumnDescriptor::optional("bigint_col", PhysicalType::Int64));
    let float_col = descriptor(ColumnDescriptor::optional("float_col", PhysicalType::Float));
    let double_col = descriptor(ColumnDescriptor::optional("double_col", PhysicalType::Double));
    let date_string_col = descriptor(ColumnDescriptor::optional(
        "date_string_col",
        PhysicalType::ByteArray,
    ));
    let string_col = descriptor(ColumnDescriptor::optional(
        "string_col",
        PhysicalType::ByteArray,
    ));
    let timestamp_col = descriptor(ColumnDescriptor::optional(
        "timestamp_col",
        PhysicalType::Int96,
    ));

    let mut chunks = Vec::new();

    let mut sorted_ids = ALLTYPES_IDS;
    sorted_ids.sort_unstable();
    let mut b = ColumnChunkBuilder::new(id.clone());
    b.dictionary_page(&sorted_ids);
    let indices = ALLTYPES_IDS.map(|id| id as u32);
    b.data_page(
        DataPageBuilder::dictionary_indices(sorted_ids.len(), &indices)
            .with_encoding(Encoding::PlainDictionary),
    );
    chunks.push(b.finish());

    let bools: Vec<bool> = (0..8).map(|i| i % 2 == 0).collect();
    chunks.push(plain_chunk(bool_col.clone(), &bools));

    let ints: Vec<i32> = (0..8).map(|i| i % 2).collect();
    for column in [&tinyint_col, &smallint_col, &int_col] {
        chunks.push(plain_chunk(column.clone(), &ints));
    }

    let bigints: Vec<i64> = (0..8).map(|i| (i % 2) * 10).collect();
    chunks.push(plain_chunk(bigint_col.clone(), &bigints));

    let floats: Vec<f32> = (0..8).map(|i| (i % 2) as f32 * 1.1).collect();
    chunks.push(plain_chunk(float_col.clone(), &floats));

    let doubles: Vec<f64> = (0..8).map(|i| (i % 2) as f64 * 10.1).collect();
    chunks.push(plain_chunk(double_col.clone(), &doubles));

    let dates = ["01/01/09", "02/01/09", "03/01/09", "04/01/09"].map(ByteArray::from);
    let date_indices = ALLTYPES_DATE_STRINGS.map(|s| {
        dates
            .iter()
            .position(|d| d.as_bytes() == s.as_bytes())
            .expect("date in dictionary") as u32
    });
    let mut b = ColumnChunkBuilder::new(date_string_col.clone());
    b.dictionary_page(&dates);
    b.data_page(DataPageBuilder::dictionary_indices(dates.len(), &date_indices));
    chunks.push(b.finish());

    let strings: Vec<ByteArray> = (0..8)
        .map(|i| ByteArray::from((i % 2).to_string().into_bytes()))
        .collect();
    chunks.push(plain_chunk(string_col.clone(), &strings));

    let timestamps: Vec<Int96> = (0..8u32)
        .map(|i| Int96::new([i * 60_000_000, 0, 2_454_923 + i / 2]))
        .collect();
    chunks.push(plain_chunk(timestamp_col.clone(), &timestamps));

    let mut file = FileBuilder::new(vec![
        id,
        bool_col,
        tinyint_col,
        smallint_col,
        int_col,
        bigint_col,
        float_col,
        double_col,
        date_string_col,
        string_col,
        timestamp_col,
    ])
    .with_created_by(ALLTYPES_CREATED_BY);
    file.add_row_group(8, chunks);
    file.finish()
}

pub const NESTED_LISTS_CREATED_BY: &str =
    "parquet-mr version 1.8.2 (build c6522788629e590a53eb79874b95f6c3ff11f16c)";

/// Definition level, repetition level and value of every slot of the `element`
/// column of [`nested_lists`].
pub const NESTED_LISTS_GOLDEN: [(i16, i16, Option<&str>); 18] = [
    (7, 0, Some("a")),
    (7, 3, Some("b")),
    (7, 2, Some("c")),
    (4, 1, None),
    (7, 2, Some("d")),
    (7, 0, Some("a")),
    (7, 3, Some("b")),
    (7, 2, Some("c")),
    (7, 3, Some("d")),
    (4, 1, None),
    (7, 2, Some("e")),
    (7, 0, Some("a")),
    (7, 3, Some("b")),
    (7, 2, Some("c")),
    (7, 3, Some("d")),
    (7, 2, Some("e")),
    (4, 1, None),
    (7, 2, Some("f")),
];

/// Three rows of a triply nested list of strings plus a flat `b` column, both
/// Snappy compressed and dictionary encoded.
///
/// Column 0 (`a.list.element.list.element.list.element`) has maximum definition
/// level 7 and maximum repetition level 3; its slots are [`NESTED_LISTS_GOLDEN`].
/// Column 1 (`b`) is a required INT32 holding `1` three times, with levels declared
/// as `BIT_PACKED`.
pub fn nested_lists() -> (Bytes, FileMetaData) {
    let element = descriptor(ColumnDescriptor::try_new(
        "a.list.element.list.element.list.element",
        PhysicalType::ByteArray,
        None,
        7,
        3,
    ));
    let b_col = descriptor(ColumnDescriptor::required("b", PhysicalType::Int32));

    let dictionary = ["a", "b", "c", "d", "e", "f"].map(ByteArray::from);
    let def_levels = NESTED_LISTS_GOLDEN.map(|(d, _, _)| d);
    let rep_levels = NESTED_LISTS_GOLDEN.map(|(_, r, _)| r);
    let indices: Vec<u32> = NESTED_LISTS_GOLDEN
        .iter()
        .filter_map(|(_, _, v)| *v)
        .map(|v| (v.as_bytes()[0] - b'a') as u32)
        .collect();

    let mut b = ColumnChunkBuilder::new(element.clone()).with_codec(CompressionCodec::Snappy);
    b.dictionary_page(&dictionary);
    b.data_page(
        DataPageBuilder::dictionary_indices(dictionary.len(), &indices)
            .with_encoding(Encoding::PlainDictionary)
            .with_def_levels(&def_levels)
            .with_rep_levels(&rep_levels),
    );
    let element_chunk = b.finish();

    let mut b = ColumnChunkBuilder::new(b_col.clone()).with_codec(CompressionCodec::Snappy);
    b.dictionary_page(&[1i32]);
    b.data_page(
        DataPageBuilder::dictionary_indices(1, &[0, 0, 0])
            .with_encoding(Encoding::PlainDictionary)
            .bit_packed_levels(),
    );
    let b_chunk = b.finish();

    let mut file =
        FileBuilder::new(vec![element, b_col]).with_created_by(NESTED_LISTS_CREATED_BY);
    file.add_row_group(3, vec![element_chunk, b_chunk]);
    file.finish()
}

pub const NATION_CREATED_BY: &str = "parquet-mr version 1.2.8";

pub const NATION_NAMES: [&str; 25] = [
    "ALGERIA",
    "ARGENTINA",
    "BRAZIL",
    "CANADA",
    "EGYPT",
    "ETHIOPIA",
    "FRANCE",
    "GERMANY",
    "INDIA",
    "INDONESIA",
    "IRAN",
    "IRAQ",
    "JAPAN",
    "JORDAN",
    "KENYA",
    "MOROCCO",
    "MOZAMBIQUE",
    "PERU",
    "CHINA",
    "ROMANIA",
    "SAUDI ARABIA",
    "VIETNAM",
    "RUSSIA",
    "UNITED KINGDOM",
    "UNITED STATES",
];

pub const NATION_REGION_KEYS: [i32; 25] = [
    0, 1, 1, 1, 4, 0, 3, 3, 2, 2, 4, 4, 2, 4, 0, 0, 0, 1, 2, 3, 4, 2, 3, 3, 1,
];

/// A file as written by `parquet-mr` 1.2.8, whose chunk lengths omit the dictionary
/// page header.
///
/// Column 0 (`n_name`, BYTE_ARRAY) is dictionary encoded; its recorded
/// `total_compressed_size` is short by the size of the dictionary page header, so
/// the tail of its data page lies past the recorded chunk end. Column 1
/// (`n_regionkey`, INT32) is plain encoded and follows it directly.
pub fn nation_dict_truncated() -> (Bytes, FileMetaData) {
    nation_file(NATION_CREATED_BY)
}

/// The bytes and metadata of [`nation_dict_truncated`], attributed to `created_by`.
pub fn nation_file(created_by: &str) -> (Bytes, FileMetaData) {
    let name = descriptor(ColumnDescriptor::required("n_name", PhysicalType::ByteArray));
    let region_key = descriptor(ColumnDescriptor::required("n_regionkey", PhysicalType::Int32));

    let names = NATION_NAMES.map(ByteArray::from);
    let indices: Vec<u32> = (0..names.len() as u32).collect();
    let mut b = ColumnChunkBuilder::new(name.clone());
    b.dictionary_page(&names);
    b.data_page(
        DataPageBuilder::dictionary_indices(names.len(), &indices)
            .with_encoding(Encoding::PlainDictionary),
    );
    let mut name_chunk = b.finish();
    name_chunk.total_compressed_size -= name_chunk.header_lengths[0] as i64;

    let mut b = ColumnChunkBuilder::new(region_key.clone());
    b.data_page(DataPageBuilder::plain(&NATION_REGION_KEYS));
    let region_chunk = b.finish();

    let mut file = FileBuilder::new(vec![name, region_key]).with_created_by(created_by);
    file.add_row_group(25, vec![name_chunk, region_chunk]);
    file.finish()
}

fn plain_chunk<V: crate::encode::PlainEncode>(
    descriptor: Arc<ColumnDescriptor>,
    values: &[V],
) -> crate::chunk::ColumnChunk {
    let mut b = ColumnChunkBuilder::new(descriptor);
    b.data_page(DataPageBuilder::plain(values));
    b.finish()
}

fn descriptor(descriptor: parcel_common::Result<ColumnDescriptor>) -> Arc<ColumnDescriptor> {
    Arc::new(descriptor.expect("valid column descriptor"))
}
