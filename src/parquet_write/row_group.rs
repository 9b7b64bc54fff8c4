use std::io::Write;
use std::ops::Range;

use log::debug;

use crate::compression::CompressionOptions;
use crate::format::{ColumnChunk, RowGroup};
use crate::parquet::error::{fmt_err, ParquetErrorExt, ParquetResult};
use crate::parquet_write::column_chunk::{check_column, column_chunk_to_pages, write_column_chunk};
use crate::parquet_write::dictionary::DictionaryPolicy;
use crate::parquet_write::schema::ColumnDescriptor;
use crate::table::TableAccessor;

pub struct ColumnOffsetsMetadata {
    pub dictionary_page_offset: Option<i64>,
    pub data_page_offset: Option<i64>,
}

impl ColumnOffsetsMetadata {
    pub fn from_column_chunk(column_chunk: &ColumnChunk) -> ColumnOffsetsMetadata {
        ColumnOffsetsMetadata {
            dictionary_page_offset: column_chunk
                .meta_data
                .as_ref()
                .and_then(|meta| meta.dictionary_page_offset),
            data_page_offset: column_chunk.meta_data.as_ref().map(|meta| meta.data_page_offset),
        }
    }

    pub fn calc_row_group_file_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
            .filter(|x| *x > 0_i64)
            .or(self.data_page_offset)
    }
}

/// Encodes and writes rows `rows` of every column of `table` as one row group
/// at `offset`. `policies` holds one dictionary policy per column.
///
/// Every column is checked against its descriptor before the first byte is
/// written, so a table that does not fit the schema leaves `writer` untouched.
#[allow(clippy::too_many_arguments)]
pub fn write_row_group<W, T>(
    writer: &mut W,
    mut offset: u64,
    table: &T,
    descriptors: &[ColumnDescriptor],
    policies: &[DictionaryPolicy],
    rows: Range<usize>,
    compression: CompressionOptions,
    ordinal: usize,
) -> ParquetResult<(RowGroup, u64)>
where
    W: Write,
    T: TableAccessor + ?Sized,
{
    if table.num_columns() != descriptors.len() || policies.len() != descriptors.len() {
        return Err(fmt_err!(
            Layout,
            "table has {} columns, file schema has {}",
            table.num_columns(),
            descriptors.len()
        ));
    }
    let num_rows = i64::try_from(rows.len())
        .map_err(|_| fmt_err!(Overflow, "row group of {} rows", rows.len()))?;

    for (index, descriptor) in descriptors.iter().enumerate() {
        check_column(table.column(index), descriptor, &rows).with_context(|_| {
            format!("could not encode column {:?} in row group {ordinal}", descriptor.name)
        })?;
    }

    let initial = offset;
    let columns = descriptors
        .iter()
        .zip(policies)
        .enumerate()
        .map(|(index, (descriptor, policy))| {
            let column = table.column(index);
            let (chunk, size) = column_chunk_to_pages(column, descriptor, rows.clone(), *policy)
                .and_then(|pages| {
                    write_column_chunk(writer, offset, descriptor, pages, compression)
                })
                .with_context(|_| {
                    format!(
                        "could not encode column {:?} in row group {ordinal}",
                        descriptor.name
                    )
                })?;
            offset += size;
            Ok(chunk)
        })
        .collect::<ParquetResult<Vec<_>>>()?;
    let bytes_written = offset - initial;

    let file_offset = columns
        .first()
        .and_then(|column_chunk| {
            ColumnOffsetsMetadata::from_column_chunk(column_chunk).calc_row_group_file_offset()
        });
    let total_byte_size = columns
        .iter()
        .filter_map(|c| c.meta_data.as_ref())
        .map(|meta| meta.total_uncompressed_size)
        .sum();
    let total_compressed_size = columns
        .iter()
        .filter_map(|c| c.meta_data.as_ref())
        .map(|meta| meta.total_compressed_size)
        .sum();

    debug!(
        "wrote row group {ordinal}: rows {rows:?}, {} columns, {bytes_written} bytes",
        columns.len()
    );
    Ok((
        RowGroup {
            columns,
            total_byte_size,
            num_rows,
            file_offset,
            total_compressed_size: Some(total_compressed_size),
            ordinal: ordinal.try_into().ok(),
        },
        bytes_written,
    ))
}
