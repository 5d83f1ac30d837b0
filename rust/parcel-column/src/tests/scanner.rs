use std::sync::Arc;

use parcel_common::error::ErrorKind;
use parcel_encodings::data_type::{ByteArray, ByteArrayType, DoubleType, Int32Type};
use parcel_format::{PhysicalType, descriptor::ColumnDescriptor};
use parcel_testkit::chunk::{ColumnChunkBuilder, DataPageBuilder};

use crate::{ScannedValue, Scanner, tests::fixture::typed_reader};

fn optional_int32_reader(
    def_levels: &[i16],
    pages: usize,
) -> crate::TypedColumnReader<Int32Type> {
    let descriptor = Arc::new(ColumnDescriptor::optional("v", PhysicalType::Int32).unwrap());
    let mut b = ColumnChunkBuilder::new(descriptor);
    let mut next = 0;
    for _ in 0..pages {
        let values: Vec<i32> = def_levels
            .iter()
            .filter(|&&d| d == 1)
            .map(|_| {
                next += 1;
                next
            })
            .collect();
        b.data_page(DataPageBuilder::plain(&values).with_def_levels(def_levels));
    }
    typed_reader(b.finish())
}

#[test]
fn test_scan_with_nulls() {
    let mut reader = optional_int32_reader(&[1, 0, 1, 1, 0, 0, 1], 2);
    let mut scanner = Scanner::with_batch_size(&mut reader, 3).unwrap();
    let mut slots = Vec::new();
    while let Some(slot) = scanner.next_value().unwrap() {
        slots.push(slot);
    }
    let expected = [
        Some(1),
        None,
        Some(2),
        Some(3),
        None,
        None,
        Some(4),
        Some(5),
        None,
        Some(6),
        Some(7),
        None,
        None,
        Some(8),
    ];
    assert_eq!(
        slots.into_iter().map(ScannedValue::into_option).collect::<Vec<_>>(),
        expected
    );
    assert!(!scanner.has_next().unwrap());
    assert!(scanner.next_value().unwrap().is_none());
}

#[test]
fn test_has_next_does_not_consume() {
    let mut reader = optional_int32_reader(&[0, 1], 1);
    let mut scanner = Scanner::with_batch_size(&mut reader, 1).unwrap();
    for _ in 0..3 {
        assert!(scanner.has_next().unwrap());
    }
    assert!(scanner.next_value().unwrap().unwrap().is_null());
    for _ in 0..3 {
        assert!(scanner.has_next().unwrap());
    }
    assert_eq!(
        scanner.next_value().unwrap(),
        Some(ScannedValue::Present(1))
    );
    assert!(!scanner.has_next().unwrap());
}

#[test]
fn test_set_batch_size_mid_scan() {
    let mut reader = optional_int32_reader(&[1; 50], 1);
    let mut scanner = Scanner::with_batch_size(&mut reader, 4).unwrap();
    assert_eq!(scanner.next_value().unwrap(), Some(ScannedValue::Present(1)));

    scanner.set_batch_size(16).unwrap();
    assert_eq!(scanner.batch_size(), 16);
    let err = scanner.set_batch_size(0).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    assert_eq!(scanner.batch_size(), 16);

    let rest: Vec<i32> = scanner
        .map(|slot| slot.unwrap().into_option().unwrap())
        .collect();
    assert_eq!(rest, (2..=50).collect::<Vec<_>>());
}

#[test]
fn test_zero_batch_size_rejected() {
    let mut reader = optional_int32_reader(&[1], 1);
    let err = Scanner::with_batch_size(&mut reader, 0).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_required_column_never_null() {
    let descriptor = Arc::new(ColumnDescriptor::required("v", PhysicalType::Double).unwrap());
    let mut b = ColumnChunkBuilder::new(descriptor);
    let values: Vec<f64> = (0..300).map(|i| i as f64 / 4.0).collect();
    b.data_page(DataPageBuilder::plain(&values[..100]));
    b.data_page(DataPageBuilder::plain(&values[100..]).v2());
    let mut reader = typed_reader::<DoubleType>(b.finish());
    let scanned: Vec<f64> = Scanner::with_batch_size(&mut reader, 64)
        .unwrap()
        .map(|slot| match slot.unwrap() {
            ScannedValue::Present(v) => v,
            ScannedValue::Null => panic!("null in a required column"),
        })
        .collect();
    assert_eq!(scanned, values);
}

#[test]
fn test_scanner_reports_decode_errors() {
    let descriptor = Arc::new(ColumnDescriptor::required("s", PhysicalType::ByteArray).unwrap());
    let mut b = ColumnChunkBuilder::new(descriptor);
    b.data_page(DataPageBuilder::plain(&[ByteArray::from("ok")]));
    b.data_page(DataPageBuilder::dictionary_indices(2, &[0, 1]));
    let mut reader = typed_reader::<ByteArrayType>(b.finish());
    let mut scanner = Scanner::with_batch_size(&mut reader, 1).unwrap();
    assert_eq!(
        scanner.next().unwrap().unwrap(),
        ScannedValue::Present(ByteArray::from("ok"))
    );
    let err = scanner.next().unwrap().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Encoding { .. }), "{err}");
}
