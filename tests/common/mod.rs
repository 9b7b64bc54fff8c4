#![allow(dead_code)]

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use colframe::compression::CompressionOptions;
use colframe::parquet_read::{DecodeContext, ParquetDecoder};
use colframe::parquet_write::{DictionaryPolicy, ParquetWriter};
use colframe::table::{Column, Table};

pub const COUNT: usize = 1000;

pub const ALL_COMPRESSIONS: [CompressionOptions; 3] = [
    CompressionOptions::Uncompressed,
    CompressionOptions::Snappy,
    CompressionOptions::Gzip(None),
];

#[derive(Debug, Clone, Copy)]
pub enum Null {
    None,
    Sparse,
    Dense,
}

pub const ALL_NULLS: [Null; 3] = [Null::None, Null::Dense, Null::Sparse];

pub fn generate_nulls(count: usize, null: Null) -> Vec<bool> {
    match null {
        Null::Dense => (0..count).map(|i| i % 2 == 0).collect(),
        Null::None => vec![false; count],
        Null::Sparse => (0..count).map(|i| i % 10 == 0).collect(),
    }
}

fn with_nulls<T>(values: impl Iterator<Item = T>, nulls: &[bool]) -> Vec<Option<T>> {
    values
        .zip(nulls)
        .map(|(value, &is_null)| if is_null { None } else { Some(value) })
        .collect()
}

pub fn int64_column(name: &str, count: usize, null: Null) -> Column {
    let nulls = generate_nulls(count, null);
    Column::int64(name, with_nulls((0..count as i64).map(|i| i * 7 - 300), &nulls))
}

pub fn float64_column(name: &str, count: usize, null: Null) -> Column {
    let nulls = generate_nulls(count, null);
    Column::float64(name, with_nulls((0..count).map(|i| i as f64 / 3.0), &nulls))
}

/// Strings over a small alphabet, so dictionaries pay off.
pub fn string_column(name: &str, count: usize, null: Null) -> Column {
    let nulls = generate_nulls(count, null);
    let values = (0..count).map(|i| format!("value-{}", i % 13));
    Column::string(name, with_nulls(values, &nulls))
}

pub fn binary_column(name: &str, count: usize, null: Null) -> Column {
    let nulls = generate_nulls(count, null);
    let values = (0..count).map(|i| (0..(i % 5) as u8).map(|b| b ^ i as u8).collect::<Vec<u8>>());
    Column::binary(name, with_nulls(values, &nulls))
}

pub fn write_table(
    table: &Table,
    compression: CompressionOptions,
    row_group_size: Option<usize>,
    dictionary: DictionaryPolicy,
) -> Vec<u8> {
    let mut buf = vec![];
    ParquetWriter::new(&mut buf)
        .with_compression(compression)
        .with_row_group_size(row_group_size)
        .with_dictionary(dictionary)
        .finish(table)
        .expect("write table");
    buf
}

pub fn read_table(buf: &[u8]) -> Table {
    let decoder = ParquetDecoder::read(&mut Cursor::new(buf)).expect("read metadata");
    let mut ctx = DecodeContext::new(Cursor::new(buf)).expect("decode context");
    decoder.read_table(&mut ctx).expect("read table")
}

pub fn write_file(path: &Path, table: &Table, compression: CompressionOptions) -> u64 {
    let file = File::create(path).expect("create file");
    ParquetWriter::new(file)
        .with_compression(compression)
        .finish(table)
        .expect("write file")
}

pub fn read_file(path: &Path) -> Table {
    let mut file = File::open(path).expect("open file");
    let decoder = ParquetDecoder::read(&mut file).expect("read metadata");
    let mut ctx = DecodeContext::new(file).expect("decode context");
    decoder.read_table(&mut ctx).expect("read table")
}
