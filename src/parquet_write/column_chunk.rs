use std::io::Write;
use std::ops::Range;

use log::trace;

use crate::compression::{Compression, CompressionOptions};
use crate::encoding::Encoding;
use crate::format::{ColumnChunk, ColumnMetaData};
use crate::page::{Page, PageType};
use crate::parquet::error::{fmt_err, ParquetResult};
use crate::parquet_write::dictionary::{encode_values, DictionaryPolicy, EncodedValues};
use crate::parquet_write::page::{compress_page, write_page, PageWriteSpec};
use crate::parquet_write::primitive::{float64_values, int64_values};
use crate::parquet_write::schema::ColumnDescriptor;
use crate::parquet_write::string::byte_array_values;
use crate::parquet_write::util::{build_data_page, check_required, encode_def_levels};
use crate::table::{ColumnAccessor, LogicalType};

/// Checks that `rows` of `column` can be stored under `descriptor`. Returns the
/// number of nulls in `rows`.
pub fn check_column(
    column: &dyn ColumnAccessor,
    descriptor: &ColumnDescriptor,
    rows: &Range<usize>,
) -> ParquetResult<usize> {
    if column.logical_type() != descriptor.logical_type {
        return Err(fmt_err!(
            Layout,
            "column {:?} is {}, the file schema declares {}",
            column.name(),
            column.logical_type(),
            descriptor.logical_type
        ));
    }
    if rows.end > column.len() {
        return Err(fmt_err!(
            Bounds,
            "rows {rows:?} exceed the {} rows of column {:?}",
            column.len(),
            column.name()
        ));
    }
    check_required(column, descriptor.is_optional(), rows)
}

/// Encodes `rows` of `column` into an optional dictionary page and one data page.
pub fn column_chunk_to_pages(
    column: &dyn ColumnAccessor,
    descriptor: &ColumnDescriptor,
    rows: Range<usize>,
    policy: DictionaryPolicy,
) -> ParquetResult<Vec<Page>> {
    let null_count = check_column(column, descriptor, &rows)?;

    let name = column.name();
    let EncodedValues { encoding, buffer: values, dictionary } = match descriptor.logical_type {
        LogicalType::Int64 => encode_values(name, &int64_values(column, rows.clone())?, policy)?,
        LogicalType::Float64 => {
            encode_values(name, &float64_values(column, rows.clone())?, policy)?
        }
        LogicalType::String | LogicalType::Binary => {
            encode_values(name, &byte_array_values(column, rows.clone())?, policy)?
        }
        LogicalType::Boolean => {
            return Err(fmt_err!(Unsupported, "column {name:?} has an unsupported type"))
        }
    };
    trace!(
        "column {name:?} rows {rows:?}: {encoding}, {null_count} nulls, {} value bytes",
        values.len()
    );

    let mut buffer = Vec::new();
    if descriptor.is_optional() {
        encode_def_levels(&mut buffer, rows.clone().map(|row| !column.is_null(row)))?;
    }
    buffer.try_reserve_exact(values.len())?;
    buffer.extend_from_slice(&values);

    let mut pages = Vec::with_capacity(2);
    if let Some(dict) = dictionary {
        pages.push(Page::Dict(dict));
    }
    pages.push(Page::Data(build_data_page(buffer, rows.len(), encoding)));
    Ok(pages)
}

/// Compresses and writes the pages of one column chunk starting at `offset`.
/// Returns the chunk metadata and the number of bytes written.
pub fn write_column_chunk<W: Write>(
    writer: &mut W,
    mut offset: u64,
    descriptor: &ColumnDescriptor,
    pages: Vec<Page>,
    compression: CompressionOptions,
) -> ParquetResult<(ColumnChunk, u64)> {
    let initial = offset;
    let mut specs = Vec::with_capacity(pages.len());
    let mut encodings = Vec::with_capacity(3);
    for page in pages {
        let compressed = compress_page(page, compression)?;
        if !encodings.contains(&compressed.encoding) {
            encodings.push(compressed.encoding);
        }
        let spec = write_page(writer, offset, &compressed)?;
        offset += spec.bytes_written;
        specs.push(spec);
    }
    if descriptor.is_optional() && !encodings.contains(&Encoding::Rle) {
        encodings.push(Encoding::Rle);
    }

    let column_chunk = build_column_chunk(&specs, descriptor, compression.into(), encodings)?;
    Ok((column_chunk, offset - initial))
}

fn build_column_chunk(
    specs: &[PageWriteSpec],
    descriptor: &ColumnDescriptor,
    compression: Compression,
    encodings: Vec<Encoding>,
) -> ParquetResult<ColumnChunk> {
    let mut dictionary_page_offset = None;
    let mut data_page_offset = None;
    let mut num_values = 0i64;
    for spec in specs {
        match spec.page_type()? {
            PageType::DictionaryPage => dictionary_page_offset = Some(spec.offset as i64),
            PageType::DataPage => {
                data_page_offset.get_or_insert(spec.offset as i64);
                num_values += spec
                    .header
                    .data_page_header
                    .as_ref()
                    .map(|header| header.num_values as i64)
                    .unwrap_or_default();
            }
        }
    }
    let data_page_offset = data_page_offset
        .ok_or_else(|| fmt_err!(Layout, "column chunk {:?} has no data page", descriptor.name))?;

    // the total sizes include the page headers
    let total_compressed_size = specs
        .iter()
        .map(|spec| spec.header_size as i64 + spec.header.compressed_page_size as i64)
        .sum();
    let total_uncompressed_size = specs
        .iter()
        .map(|spec| spec.header_size as i64 + spec.header.uncompressed_page_size as i64)
        .sum();

    let meta_data = ColumnMetaData {
        type_: descriptor.physical_type.into(),
        encodings: encodings.into_iter().map(i32::from).collect(),
        path_in_schema: vec![descriptor.name.clone()],
        codec: compression.into(),
        num_values,
        total_uncompressed_size,
        total_compressed_size,
        key_value_metadata: None,
        data_page_offset,
        dictionary_page_offset,
    };
    Ok(ColumnChunk {
        file_path: None,
        file_offset: dictionary_page_offset.unwrap_or(data_page_offset),
        meta_data: Some(meta_data),
    })
}
