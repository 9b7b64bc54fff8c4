mod common;

use std::io::Cursor;

use colframe::compression::CompressionOptions;
use colframe::parquet_read::{DecodeContext, ParquetDecoder};
use colframe::parquet_write::DictionaryPolicy;
use colframe::table::Table;

use common::{binary_column, float64_column, int64_column, string_column, write_table, Null, COUNT};

const THREADS: usize = 4;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_decoder_is_shareable() {
    assert_send_sync::<ParquetDecoder>();
}

#[test]
fn test_parallel_decode() {
    let table = Table::try_new(vec![
        int64_column("i", COUNT, Null::Sparse),
        float64_column("f", COUNT, Null::None),
        string_column("s", COUNT, Null::Dense),
        binary_column("b", COUNT, Null::Sparse),
    ])
    .unwrap();
    let buf = write_table(&table, CompressionOptions::Snappy, Some(128), DictionaryPolicy::Auto);
    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|thread| {
                let decoder = &decoder;
                let buf = &buf;
                scope.spawn(move || {
                    let mut ctx = DecodeContext::new(Cursor::new(buf)).unwrap();
                    (0..decoder.columns.len())
                        .filter(|column| column % THREADS == thread)
                        .map(|column| (column, decoder.decode_column(&mut ctx, column).unwrap()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for (column, decoded) in handle.join().unwrap() {
                assert_eq!(&decoded, &table.columns()[column]);
            }
        }
    });
}

#[test]
fn test_parallel_row_groups() {
    let table = Table::try_new(vec![int64_column("i", COUNT, Null::Dense)]).unwrap();
    let buf = write_table(&table, CompressionOptions::Gzip(None), Some(100), DictionaryPolicy::Auto);
    let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(decoder.row_group_count, 10);

    let chunks: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..decoder.row_group_count as usize)
            .map(|row_group| {
                let decoder = &decoder;
                let buf = &buf;
                scope.spawn(move || {
                    let mut ctx = DecodeContext::new(Cursor::new(buf)).unwrap();
                    decoder.decode_column_chunk(&mut ctx, row_group, 0).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut merged = chunks[0].clone();
    for chunk in chunks.into_iter().skip(1) {
        merged.append(chunk).unwrap();
    }
    assert_eq!(&merged, &table.columns()[0]);
}
