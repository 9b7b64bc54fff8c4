use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use colframe::compression::{snappy, CompressionOptions};
use colframe::parquet_read::{DecodeContext, ParquetDecoder};
use colframe::parquet_write::{DictionaryPolicy, ParquetWriter};
use colframe::table::{Column, Table};

const ROW_COUNT: usize = 100_000;
const NULL_PCTS: [u8; 2] = [0, 20];
const DICT_CARDINALITIES: [usize; 3] = [10, 1000, ROW_COUNT];

fn is_null_at(i: usize, null_pct: u8) -> bool {
    null_pct > 0 && (i % 100) < null_pct as usize
}

fn build_table(null_pct: u8, cardinality: usize) -> Table {
    let ints = (0..ROW_COUNT)
        .map(|i| (!is_null_at(i, null_pct)).then_some((i % cardinality) as i64))
        .collect();
    let strings = (0..ROW_COUNT)
        .map(|i| (!is_null_at(i, null_pct)).then(|| format!("sym-{}", i % cardinality)))
        .collect();
    Table::try_new(vec![Column::int64("i", ints), Column::string("s", strings)])
        .expect("bench table")
}

fn write(table: &Table, compression: CompressionOptions) -> Vec<u8> {
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf)
        .with_compression(compression)
        .with_dictionary(DictionaryPolicy::Auto)
        .finish(table)
        .expect("write");
    buf
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Elements(ROW_COUNT as u64));
    for null_pct in NULL_PCTS {
        for cardinality in DICT_CARDINALITIES {
            let table = build_table(null_pct, cardinality);
            for compression in [CompressionOptions::Uncompressed, CompressionOptions::Snappy] {
                let name = format!("{compression}_nulls{null_pct}_card{cardinality}");
                group.bench_function(name, |b| b.iter(|| write(black_box(&table), compression)));
            }
        }
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Elements(ROW_COUNT as u64));
    for null_pct in NULL_PCTS {
        for cardinality in DICT_CARDINALITIES {
            let buf = write(&build_table(null_pct, cardinality), CompressionOptions::Snappy);
            let decoder = ParquetDecoder::read(&mut Cursor::new(&buf)).expect("metadata");
            let mut ctx = DecodeContext::new(Cursor::new(&buf)).expect("context");
            let name = format!("snappy_nulls{null_pct}_card{cardinality}");
            group.bench_function(name, |b| {
                b.iter(|| decoder.read_table(black_box(&mut ctx)).expect("read"))
            });
        }
    }
    group.finish();
}

fn bench_snappy(c: &mut Criterion) {
    let input: Vec<u8> = (0..1 << 20).map(|i: u32| (i % 251) as u8 ^ (i >> 12) as u8).collect();
    let mut compressed = Vec::new();
    snappy::compress(&input, &mut compressed).expect("compress");

    let mut group = c.benchmark_group("snappy");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("compress", |b| {
        b.iter(|| {
            let mut output = Vec::with_capacity(snappy::max_compressed_len(input.len()));
            snappy::compress(black_box(&input), &mut output).expect("compress");
            output
        })
    });
    let mut output = vec![0u8; input.len()];
    group.bench_function("decompress", |b| {
        b.iter(|| snappy::decompress(black_box(&compressed), &mut output).expect("decompress"))
    });
    group.finish();
}

criterion_group!(benches, bench_write, bench_read, bench_snappy);
criterion_main!(benches);
