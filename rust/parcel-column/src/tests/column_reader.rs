use std::sync::Arc;

use parcel_common::error::ErrorKind;
use parcel_encodings::data_type::{
    BoolType, ByteArray, ByteArrayType, FixedLenByteArray, FixedLenByteArrayType, Int32Type,
    Int64Type,
};
use parcel_format::{
    Encoding, PageType, PhysicalType,
    descriptor::ColumnDescriptor,
    page_header::{DictionaryPageHeader, PageBody, PageHeader},
};
use parcel_testkit::{
    chunk::{ColumnChunkBuilder, DataPageBuilder},
    encode,
};

use crate::{
    ReaderProperties, Scanner, TypedColumnReader,
    tests::fixture::{chunk_pages, read_all, typed_reader},
};

fn required(name: &str, physical_type: PhysicalType) -> Arc<ColumnDescriptor> {
    Arc::new(ColumnDescriptor::required(name, physical_type).unwrap())
}

fn optional(name: &str, physical_type: PhysicalType) -> Arc<ColumnDescriptor> {
    Arc::new(ColumnDescriptor::optional(name, physical_type).unwrap())
}

#[test]
fn test_page_spanning_batches() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int64));
    let mut expected = Vec::new();
    for page in 0..5i64 {
        let values: Vec<i64> = (0..7).map(|i| page * 100 + i).collect();
        expected.extend_from_slice(&values);
        b.data_page(DataPageBuilder::plain(&values));
    }
    let mut reader = typed_reader::<Int64Type>(b.finish());

    let mut values = [0i64; 10];
    let (levels_read, values_read) = reader.read_batch(10, None, None, &mut values).unwrap();
    assert_eq!((levels_read, values_read), (10, 10));
    assert_eq!(values[..], expected[..10]);

    let data = read_all(&mut reader, 16).unwrap();
    assert_eq!(data.values, expected[10..]);
    assert_eq!(reader.values_consumed(), 35);
    assert_eq!(reader.page_reader().pages_read(), 5);
}

#[test]
fn test_declared_total_bounds_reads() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::plain(&[1i32, 2, 3, 4, 5, 6]));
    let chunk = b.finish();
    let properties = ReaderProperties::default();
    let pages = chunk_pages(&chunk, &properties);
    let mut reader =
        TypedColumnReader::<Int32Type>::new(chunk.descriptor.clone(), pages, 4, &properties)
            .unwrap();

    let mut values = [0i32; 8];
    assert_eq!(reader.read_batch(8, None, None, &mut values).unwrap(), (4, 4));
    assert_eq!(values[..4], [1, 2, 3, 4]);
    assert!(!reader.has_next().unwrap());
    assert_eq!(reader.read_batch(8, None, None, &mut values).unwrap(), (0, 0));
}

#[test]
fn test_descriptor_type_checked() {
    let chunk = {
        let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
        b.data_page(DataPageBuilder::plain(&[1i32]));
        b.finish()
    };
    let properties = ReaderProperties::default();
    let err = TypedColumnReader::<Int64Type>::new(
        chunk.descriptor.clone(),
        chunk_pages(&chunk, &properties),
        1,
        &properties,
    )
    .err()
    .unwrap();
    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
}

#[test]
fn test_optional_column_with_nulls() {
    let def_levels = [1i16, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1];
    let values = [10i32, 20, 30, 40, 50];
    for bit_packed in [false, true] {
        let mut page = DataPageBuilder::plain(&values).with_def_levels(&def_levels);
        if bit_packed {
            page = page.bit_packed_levels();
        }
        let mut b = ColumnChunkBuilder::new(optional("v", PhysicalType::Int32));
        b.data_page(page);
        let mut reader = typed_reader::<Int32Type>(b.finish());

        let mut levels = [0i16; 4];
        let mut out = [0i32; 4];
        let read = reader
            .read_batch(4, Some(&mut levels[..]), None, &mut out)
            .unwrap();
        assert_eq!(read, (4, 2));
        assert_eq!(levels, [1, 0, 0, 1]);
        assert_eq!(out[..2], [10, 20]);

        let data = read_all(&mut reader, 3).unwrap();
        assert_eq!(data.def_levels, def_levels[4..]);
        assert_eq!(data.values, values[2..]);
    }
}

#[test]
fn test_all_null_page() {
    let mut b = ColumnChunkBuilder::new(optional("v", PhysicalType::ByteArray));
    b.data_page(DataPageBuilder::plain::<ByteArray>(&[]).with_def_levels(&[0; 20]));
    let mut reader = typed_reader::<ByteArrayType>(b.finish());
    let data = read_all(&mut reader, 8).unwrap();
    assert_eq!(data.def_levels, [0i16; 20]);
    assert!(data.values.is_empty());
}

#[test]
fn test_empty_data_pages_are_skipped() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::plain::<i32>(&[]))
        .data_page(DataPageBuilder::plain(&[1i32, 2]))
        .data_page(DataPageBuilder::plain::<i32>(&[]))
        .data_page(DataPageBuilder::plain(&[3i32]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    assert_eq!(read_all(&mut reader, 2).unwrap().values, [1, 2, 3]);
}

#[test]
fn test_rle_booleans() {
    let values: Vec<bool> = (0..100).map(|i| i % 3 == 0 || i > 80).collect();
    let mut b = ColumnChunkBuilder::new(required("flag", PhysicalType::Boolean));
    b.data_page(DataPageBuilder::encoded(
        Encoding::Rle,
        encode::rle_booleans(&values),
        values.len(),
    ));
    b.data_page(DataPageBuilder::plain(&values[..9]));
    let mut reader = typed_reader::<BoolType>(b.finish());
    let data = read_all(&mut reader, 64).unwrap();
    assert_eq!(data.values[..100], values[..]);
    assert_eq!(data.values[100..], values[..9]);
}

#[test]
fn test_fixed_length_values() {
    let descriptor = Arc::new(
        ColumnDescriptor::try_new("f", PhysicalType::FixedLenByteArray, Some(4), 1, 0).unwrap(),
    );
    let values: Vec<FixedLenByteArray> = (0..6)
        .map(|i| FixedLenByteArray::from(format!("id{i:02}").into_bytes()))
        .collect();
    let mut b = ColumnChunkBuilder::new(descriptor);
    b.data_page(DataPageBuilder::plain(&values).with_def_levels(&[1, 1, 0, 1, 1, 1, 0, 1]));
    let mut reader = typed_reader::<FixedLenByteArrayType>(b.finish());
    assert_eq!(reader.descriptor().type_length(), 4);

    let data = read_all(&mut reader, 3).unwrap();
    assert_eq!(data.def_levels, [1, 1, 0, 1, 1, 1, 0, 1]);
    assert_eq!(data.values, values);
    assert_eq!(data.values[5].as_bytes(), b"id05");
}

#[test]
fn test_unsupported_value_encoding() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::encoded(
        Encoding::DeltaBinaryPacked,
        vec![0; 16],
        4,
    ));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let mut values = [0i32; 4];
    let err = reader.read_batch(4, None, None, &mut values).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Encoding { .. }), "{err}");

    // RLE values are only defined for booleans.
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::encoded(Encoding::Rle, vec![0; 16], 4));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let err = reader.read_batch(4, None, None, &mut values).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Encoding { .. }), "{err}");
}

#[test]
fn test_dictionary_pages() {
    let dictionary = ["red", "green", "blue"].map(ByteArray::from);
    let indices = [2u32, 2, 0, 1, 0, 2, 2, 2, 2, 2, 2, 2, 1];
    let mut b = ColumnChunkBuilder::new(required("color", PhysicalType::ByteArray));
    b.dictionary_page(&dictionary);
    b.data_page(DataPageBuilder::dictionary_indices(3, &indices[..6]));
    b.data_page(DataPageBuilder::plain(&[ByteArray::from("plain")]));
    b.data_page(
        DataPageBuilder::dictionary_indices(3, &indices[6..])
            .with_encoding(Encoding::PlainDictionary)
            .v2(),
    );
    let mut reader = typed_reader::<ByteArrayType>(b.finish());
    let data = read_all(&mut reader, 5).unwrap();

    let mut expected: Vec<&str> = indices[..6]
        .iter()
        .map(|&i| ["red", "green", "blue"][i as usize])
        .collect();
    expected.push("plain");
    expected.extend(
        indices[6..]
            .iter()
            .map(|&i| ["red", "green", "blue"][i as usize]),
    );
    let actual: Vec<&str> = data.values.iter().map(|v| v.as_utf8().unwrap()).collect();
    assert_eq!(actual, expected);
    assert_eq!(reader.dictionary().unwrap().values(), dictionary);
}

#[test]
fn test_dictionary_encoded_page_without_dictionary() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::dictionary_indices(4, &[0, 1, 2, 3]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let err = reader.has_next().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Encoding { .. }), "{err}");
}

#[test]
fn test_dictionary_index_out_of_range() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.dictionary_page(&[5i32, 6]);
    b.data_page(DataPageBuilder::dictionary_indices(4, &[0, 1, 3, 1]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let mut values = [0i32; 4];
    let err = reader.read_batch(4, None, None, &mut values).unwrap_err();
    assert!(err.is_corrupt_page(), "{err}");
}

#[test]
fn test_reader_exhausted_after_decode_error() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.dictionary_page(&[5i32, 6]);
    b.data_page(DataPageBuilder::dictionary_indices(2, &[0, 1, 3, 1]));
    b.data_page(DataPageBuilder::plain(&[7i32, 8]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let mut values = [0i32; 4];
    assert!(reader.read_batch(4, None, None, &mut values).is_err());
    assert_eq!(reader.read_batch(4, None, None, &mut values).unwrap(), (0, 0));
    assert!(!reader.has_next().unwrap());

    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.dictionary_page(&[5i32, 6]);
    b.dictionary_page(&[7i32]);
    b.data_page(DataPageBuilder::dictionary_indices(2, &[0, 1]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    assert!(reader.has_next().is_err());
    assert!(!reader.has_next().unwrap());
    assert_eq!(reader.read_batch(4, None, None, &mut values).unwrap(), (0, 0));
}

#[test]
fn test_dictionary_count_beyond_page() {
    let header = PageHeader {
        page_type: PageType::DictionaryPage,
        uncompressed_page_size: 8,
        compressed_page_size: 8,
        crc: None,
        body: PageBody::Dictionary(DictionaryPageHeader {
            num_values: i32::MAX,
            encoding: Encoding::Plain,
            is_sorted: false,
        }),
    };
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::ByteArray));
    b.raw_page(&header, &[0u8; 8]);
    b.data_page(DataPageBuilder::dictionary_indices(1, &[0, 0]));
    let mut reader = typed_reader::<ByteArrayType>(b.finish());
    let err = reader.has_next().unwrap_err();
    assert!(err.is_short_read(), "{err}");
    assert!(reader.dictionary().is_none());
}

#[test]
fn test_second_dictionary_page() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.dictionary_page(&[5i32, 6]);
    b.dictionary_page(&[7i32]);
    b.data_page(DataPageBuilder::dictionary_indices(2, &[0, 1]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let err = reader.has_next().unwrap_err();
    assert!(err.is_corrupt_page(), "{err}");
}

#[test]
fn test_dictionary_page_after_data() {
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::plain(&[1i32]));
    b.dictionary_page(&[5i32, 6]);
    b.data_page(DataPageBuilder::dictionary_indices(2, &[0, 1]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let mut values = [0i32; 3];
    let err = reader.read_batch(3, None, None, &mut values).unwrap_err();
    assert!(err.is_corrupt_page(), "{err}");
    assert_eq!(values[0], 1);
}

#[test]
fn test_dictionary_page_encoding() {
    let header = PageHeader {
        page_type: PageType::DictionaryPage,
        uncompressed_page_size: 8,
        compressed_page_size: 8,
        crc: None,
        body: PageBody::Dictionary(DictionaryPageHeader {
            num_values: 2,
            encoding: Encoding::Rle,
            is_sorted: false,
        }),
    };
    let mut b = ColumnChunkBuilder::new(required("v", PhysicalType::Int32));
    b.raw_page(&header, &encode::plain(&[5i32, 6]));
    b.data_page(DataPageBuilder::dictionary_indices(2, &[0, 1]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let err = reader.has_next().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Encoding { .. }), "{err}");
}

#[test]
fn test_level_above_max() {
    let descriptor = Arc::new(
        ColumnDescriptor::try_new("v", PhysicalType::Int32, None, 2, 0).unwrap(),
    );
    let mut b = ColumnChunkBuilder::new(descriptor);
    // Level 3 still fits the two-bit width of a max level of 2.
    b.data_page(DataPageBuilder::plain(&[1i32, 2]).with_def_levels(&[2, 3, 2]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let err = read_all(&mut reader, 3).unwrap_err();
    assert!(err.is_corrupt_page(), "{err}");
}

#[test]
fn test_random_pages_and_batches() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..10 {
        let mut b = ColumnChunkBuilder::new(optional("v", PhysicalType::Int64));
        let mut def_levels = Vec::new();
        let mut values = Vec::new();
        let num_pages = rng.usize(1..6);
        for _ in 0..num_pages {
            let n = rng.usize(0..300);
            let page_defs: Vec<i16> = (0..n).map(|_| rng.bool() as i16).collect();
            let page_values: Vec<i64> = page_defs
                .iter()
                .filter(|&&d| d == 1)
                .map(|_| rng.i64(..))
                .collect();
            let mut page = DataPageBuilder::plain(&page_values).with_def_levels(&page_defs);
            if rng.bool() {
                page = page.v2();
            }
            b.data_page(page);
            def_levels.extend(page_defs);
            values.extend(page_values);
        }
        let chunk = b.finish();
        let declared = chunk.num_values as usize;
        assert_eq!(declared, def_levels.len());

        let mut reader = typed_reader::<Int64Type>(chunk);
        let mut levels_total = 0;
        let mut values_total = 0;
        let mut level_buf = vec![0i16; 512];
        let mut value_buf = vec![0i64; 512];
        while reader.has_next().unwrap() {
            let batch_size = rng.usize(1..=512);
            let (levels_read, values_read) = reader
                .read_batch(
                    batch_size,
                    Some(&mut level_buf[..]),
                    None,
                    &mut value_buf,
                )
                .unwrap();
            assert!(levels_read > 0 && levels_read <= batch_size);
            assert_eq!(
                level_buf[..levels_read],
                def_levels[levels_total..levels_total + levels_read]
            );
            assert_eq!(
                value_buf[..values_read],
                values[values_total..values_total + values_read]
            );
            levels_total += levels_read;
            values_total += values_read;
        }
        assert_eq!(levels_total, declared);
        assert_eq!(values_total, values.len());
    }
}

#[test]
fn test_scanner_over_typed_reader() {
    let mut b = ColumnChunkBuilder::new(optional("v", PhysicalType::Int32));
    b.data_page(DataPageBuilder::plain(&[1i32, 2]).with_def_levels(&[1, 0, 1]));
    let mut reader = typed_reader::<Int32Type>(b.finish());
    let values = Scanner::new(&mut reader)
        .unwrap()
        .map(|v| v.unwrap().into_option())
        .collect::<Vec<_>>();
    assert_eq!(values, [Some(1), None, Some(2)]);
}
