mod common;

use std::io::Cursor;

use colframe::compression::CompressionOptions;
use colframe::parquet_read::{DecodeContext, ParquetDecoder};
use colframe::parquet_write::{DictionaryPolicy, ParquetWriter};
use colframe::table::{Column, Table};
use colframe::ParquetErrorCause;

use common::{int64_column, string_column, write_table, Null};

fn read_err(buf: &[u8]) -> colframe::ParquetError {
    ParquetDecoder::read(&mut Cursor::new(buf)).unwrap_err()
}

fn two_columns() -> Vec<u8> {
    let table = Table::try_new(vec![
        int64_column("i", 50, Null::Sparse),
        string_column("s", 50, Null::None),
    ])
    .unwrap();
    write_table(&table, CompressionOptions::Uncompressed, None, DictionaryPolicy::Auto)
}

#[test]
fn test_bad_magic() {
    let mut buf = two_columns();
    buf[0] = b'X';
    assert!(matches!(read_err(&buf).cause(), ParquetErrorCause::OutOfSpec));

    let mut buf = two_columns();
    let len = buf.len();
    buf[len - 1] = b'X';
    assert!(matches!(read_err(&buf).cause(), ParquetErrorCause::OutOfSpec));
}

#[test]
fn test_truncated_file() {
    let buf = two_columns();
    for len in [0, 3, 11, buf.len() / 2, buf.len() - 1] {
        let err = read_err(&buf[..len]);
        assert!(matches!(err.cause(), ParquetErrorCause::OutOfSpec), "length {len}: {err:?}");
    }
}

#[test]
fn test_footer_length_exceeds_file() {
    let mut buf = two_columns();
    let len = buf.len();
    buf[len - 8..len - 4].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(read_err(&buf).cause(), ParquetErrorCause::OutOfSpec));
}

#[test]
fn test_garbled_metadata() {
    let mut buf = two_columns();
    let len = buf.len();
    let metadata_len = u32::from_le_bytes(buf[len - 8..len - 4].try_into().unwrap()) as usize;
    let start = len - 8 - metadata_len;
    buf[start] = 0xFF;
    let err = read_err(&buf);
    assert!(err.to_string().contains("could not parse file metadata"), "{err}");
}

#[test]
fn test_out_of_range_dictionary_index() {
    let table = Table::try_new(vec![Column::string(
        "label",
        vec![Some("a"), Some("b"), Some("c"), Some("c")],
    )])
    .unwrap();
    let mut buf = vec![];
    ParquetWriter::new(&mut buf)
        .with_dictionary(DictionaryPolicy::Always)
        .finish(&table)
        .unwrap();

    // The chunk ends with the value byte of the last index run.
    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    let meta = decoder.metadata.row_groups[0].columns[0].meta_data.clone().unwrap();
    let chunk_end = (meta.dictionary_page_offset.unwrap() + meta.total_compressed_size) as usize;
    assert_eq!(buf[chunk_end - 1], 2);
    buf[chunk_end - 1] = 3;

    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    let mut ctx = DecodeContext::new(Cursor::new(&buf)).unwrap();
    let err = decoder.decode_column_chunk(&mut ctx, 0, 0).unwrap_err();
    assert!(matches!(err.cause(), ParquetErrorCause::OutOfSpec));
    assert!(
        err.to_string().contains(r#"could not decode page for column "label" in row group 0"#),
        "{err}"
    );
}

#[test]
fn test_corrupt_chunk_leaves_others_readable() {
    let mut buf = two_columns();
    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    let data_page_offset =
        decoder.metadata.row_groups[0].columns[0].meta_data.as_ref().unwrap().data_page_offset;
    buf[data_page_offset as usize] = 0xFF;

    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    let mut ctx = DecodeContext::new(Cursor::new(&buf)).unwrap();
    let results = decoder.decode_row_group(&mut ctx, 0).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    assert_eq!(
        results[1].as_ref().unwrap(),
        &string_column("s", 50, Null::None)
    );
    assert!(decoder.read_table(&mut ctx).is_err());
}

#[test]
fn test_decode_context_for_another_file() {
    let buf = two_columns();
    let other = {
        let table = Table::try_new(vec![int64_column("i", 5, Null::None)]).unwrap();
        write_table(&table, CompressionOptions::Uncompressed, None, DictionaryPolicy::Auto)
    };
    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    let mut ctx = DecodeContext::new(Cursor::new(&other)).unwrap();
    let err = decoder.decode_column_chunk(&mut ctx, 0, 0).unwrap_err();
    assert!(matches!(err.cause(), ParquetErrorCause::Layout));
}

#[test]
fn test_row_group_out_of_range() {
    let buf = two_columns();
    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    let mut ctx = DecodeContext::new(Cursor::new(&buf)).unwrap();
    assert!(decoder.decode_row_group(&mut ctx, 1).is_err());
    assert!(decoder.decode_column_chunk(&mut ctx, 0, 2).is_err());
}
