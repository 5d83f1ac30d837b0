use std::sync::Arc;

use parcel_encodings::data_type::{ByteArrayType, Int32Type};
use parcel_testkit::{
    file::write_temp_file,
    fixtures::{NATION_NAMES, NATION_REGION_KEYS, nation_dict_truncated, nation_file},
};

use crate::{
    FileReader, ReaderProperties,
    tests::fixture::{open, read_all},
};

fn read_names(file: &FileReader) -> parcel_common::Result<Vec<String>> {
    let mut col = file
        .row_group(0)?
        .column(0)?
        .into_typed::<ByteArrayType>()?;
    let data = read_all(&mut col, 10)?;
    Ok(data
        .values
        .iter()
        .map(|v| v.as_utf8().unwrap().to_string())
        .collect())
}

#[test]
fn test_short_chunk_length_is_padded() {
    let file = open(nation_dict_truncated());
    assert!(file.metadata().writer_version().has_short_chunk_length());

    let names = read_names(&file).unwrap();
    assert_eq!(names, NATION_NAMES);

    let mut keys = file
        .row_group(0)
        .unwrap()
        .column(1)
        .unwrap()
        .into_typed::<Int32Type>()
        .unwrap();
    assert_eq!(read_all(&mut keys, 25).unwrap().values, NATION_REGION_KEYS);
}

#[test]
fn test_padding_does_not_run_into_next_chunk() {
    let file = open(nation_dict_truncated());
    let group = file.row_group(0).unwrap();
    let pages = group.page_reader(0).unwrap().collect::<Vec<_>>();
    assert_eq!(pages.len(), 2);
    let data_page = pages[1].as_ref().unwrap();
    assert!(!data_page.is_truncated());
    assert_eq!(data_page.num_values(), 25);
}

#[test]
fn test_unpadded_chunk_fails_on_overrun() {
    let file = open(nation_file("parquet-mr version 1.8.2"));
    assert!(!file.metadata().writer_version().has_short_chunk_length());

    // The data page is still yielded, short of the bytes past the recorded chunk end.
    let pages = file
        .row_group(0)
        .unwrap()
        .page_reader(0)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[1].is_truncated());

    let err = read_names(&file).unwrap_err();
    assert!(err.is_short_read(), "{err}");
}

#[test]
fn test_file_and_memory_sources_agree() {
    let (data, metadata) = nation_dict_truncated();
    let temp = write_temp_file(&data);
    let from_disk =
        FileReader::open_path(temp.path(), metadata.clone(), ReaderProperties::default())
            .unwrap();
    let in_memory =
        FileReader::open(Arc::new(data), metadata, ReaderProperties::default()).unwrap();
    assert_eq!(
        read_names(&from_disk).unwrap(),
        read_names(&in_memory).unwrap()
    );
}
