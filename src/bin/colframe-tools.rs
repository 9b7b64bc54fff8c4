//! Inspects and rewrites colframe files.
//!
//! Usage:
//!   colframe-tools meta data.parquet
//!   colframe-tools dump data.parquet --columns 0,2 --limit 20
//!   COLFRAME_COMPRESSION=snappy colframe-tools rewrite in.parquet out.parquet

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

use colframe::compression::{Compression, CompressionOptions};
use colframe::encoding::Encoding;
use colframe::parquet_read::{DecodeContext, ParquetDecoder};
use colframe::parquet_write::{DictionaryPolicy, ParquetWriter};
use colframe::table::{Column, ColumnAccessor, ColumnValues};
use colframe::ParquetResult;

#[derive(Parser, Debug)]
#[command(name = "colframe-tools")]
#[command(about = "Inspect and rewrite colframe files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the schema, row groups and column chunk layout
    Meta { path: PathBuf },
    /// Print the number of rows
    Rowcount { path: PathBuf },
    /// Print rows, tab separated
    Dump {
        path: PathBuf,
        /// Comma-separated column indices (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<usize>>,
        /// Maximum number of rows to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Read a file and write it again with new settings
    Rewrite {
        input: PathBuf,
        output: PathBuf,
        /// uncompressed, snappy, gzip or gzip:<level>
        #[arg(long, env = "COLFRAME_COMPRESSION", default_value = "uncompressed")]
        compression: CompressionOptions,
        /// Rows per row group
        #[arg(long)]
        row_group_size: Option<usize>,
        /// auto, always or never
        #[arg(long, default_value = "auto")]
        dictionary: DictionaryPolicy,
    },
}

fn open(path: &Path) -> ParquetResult<(ParquetDecoder, DecodeContext<File>)> {
    let mut file = File::open(path)?;
    let decoder = ParquetDecoder::read(&mut file)?;
    let ctx = DecodeContext::new(file)?;
    Ok((decoder, ctx))
}

fn print_meta(path: &Path) -> ParquetResult<()> {
    let (decoder, _) = open(path)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "file: {}", path.display())?;
    writeln!(out, "version: {}", decoder.metadata.version)?;
    writeln!(out, "created by: {}", decoder.created_by().unwrap_or("-"))?;
    writeln!(out, "rows: {}", decoder.row_count)?;
    for kv in decoder.key_value_metadata() {
        writeln!(out, "metadata: {} = {}", kv.key, kv.value.as_deref().unwrap_or("-"))?;
    }
    writeln!(out, "columns:")?;
    for (index, column) in decoder.columns.iter().enumerate() {
        let column_type = match column.column_type {
            Some(column_type) => column_type.logical_type().to_string(),
            None => format!("unsupported (physical type {})", column.physical_type),
        };
        writeln!(out, "  {index}: {} {column_type} {:?}", column.name, column.repetition)?;
    }
    for (index, row_group) in decoder.metadata.row_groups.iter().enumerate() {
        writeln!(
            out,
            "row group {index}: {} rows, {} bytes",
            row_group.num_rows, row_group.total_byte_size
        )?;
        for (chunk, column) in row_group.columns.iter().zip(&decoder.columns) {
            let Some(meta) = &chunk.meta_data else {
                writeln!(out, "  {}: no metadata", column.name)?;
                continue;
            };
            let codec = Compression::try_from(meta.codec)
                .map(|c| c.to_string())
                .unwrap_or_else(|_| format!("codec {}", meta.codec));
            let encodings: Vec<String> = meta
                .encodings
                .iter()
                .map(|id| {
                    Encoding::try_from(*id)
                        .map(|e| e.to_string())
                        .unwrap_or_else(|_| id.to_string())
                })
                .collect();
            let dictionary = meta
                .dictionary_page_offset
                .map(|offset| format!(", dictionary at {offset}"))
                .unwrap_or_default();
            writeln!(
                out,
                "  {}: {codec} [{}], data at {}{dictionary}, {} / {} bytes",
                column.name,
                encodings.join(", "),
                meta.data_page_offset,
                meta.total_compressed_size,
                meta.total_uncompressed_size
            )?;
        }
    }
    Ok(())
}

fn format_value(column: &Column, row: usize) -> String {
    if column.is_null(row) {
        return "NULL".to_string();
    }
    match column.values() {
        ColumnValues::Int64(values) => values[row].map(|v| v.to_string()).unwrap_or_default(),
        ColumnValues::Float64(values) => values[row].map(|v| v.to_string()).unwrap_or_default(),
        ColumnValues::String(values) => values[row].clone().unwrap_or_default(),
        ColumnValues::Binary(values) => values[row]
            .as_ref()
            .map(|bytes| bytes.iter().map(|b| format!("{b:02x}")).collect())
            .unwrap_or_default(),
    }
}

fn dump(path: &Path, columns: Option<Vec<usize>>, limit: usize) -> ParquetResult<()> {
    let (decoder, mut ctx) = open(path)?;
    let indices = columns.unwrap_or_else(|| (0..decoder.columns.len()).collect());
    let columns = indices
        .iter()
        .map(|index| decoder.decode_column(&mut ctx, *index))
        .collect::<ParquetResult<Vec<_>>>()?;

    let mut out = std::io::stdout().lock();
    let header: Vec<&str> = columns.iter().map(|c| c.name()).collect();
    writeln!(out, "{}", header.join("\t"))?;
    for row in 0..decoder.row_count.min(limit) {
        let line: Vec<String> = columns.iter().map(|c| format_value(c, row)).collect();
        writeln!(out, "{}", line.join("\t"))?;
    }
    Ok(())
}

fn rewrite(
    input: &Path,
    output: &Path,
    compression: CompressionOptions,
    row_group_size: Option<usize>,
    dictionary: DictionaryPolicy,
) -> ParquetResult<()> {
    let (decoder, mut ctx) = open(input)?;
    let table = decoder.read_table(&mut ctx)?;
    let writer = BufWriter::new(File::create(output)?);
    let size = ParquetWriter::new(writer)
        .with_compression(compression)
        .with_row_group_size(row_group_size)
        .with_dictionary(dictionary)
        .with_key_value_metadata(decoder.key_value_metadata().to_vec())
        .finish(&table)?;
    info!(
        "rewrote {} rows to {} ({size} bytes, {compression})",
        decoder.row_count,
        output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let result = match args.command {
        Command::Meta { path } => print_meta(&path),
        Command::Rowcount { path } => open(&path).map(|(decoder, _)| println!("{}", decoder.row_count)),
        Command::Dump { path, columns, limit } => dump(&path, columns, limit),
        Command::Rewrite { input, output, compression, row_group_size, dictionary } => {
            rewrite(&input, &output, compression, row_group_size, dictionary)
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
