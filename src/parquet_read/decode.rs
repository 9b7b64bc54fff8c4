use std::io::{Read, Seek};

use crate::compression::{decompress, snappy, Compression};
use crate::encoding::Encoding;
use crate::format::KeyValue;
use crate::page::{split_buffer_v1, DataPage, DictPage, Page, SlicedPage};
use crate::parquet::error::{fmt_err, ParquetError, ParquetErrorExt, ParquetResult};
use crate::parquet::io::read_range_into;
use crate::parquet::PARQUET_MAGIC;
use crate::parquet_read::decoders::{decode_def_levels, scatter, Dictionary, PlainDecode};
use crate::parquet_read::page::SlicePageReader;
use crate::parquet_read::{ColumnMeta, ColumnType, DecodeContext, ParquetDecoder};
use crate::table::{Column, ColumnValues, Table};

/// Upper bound of the deflate expansion ratio, used to reject absurd declared
/// sizes before allocating.
const MAX_DEFLATE_RATIO: usize = 1032;

/// Where a column chunk lives in the file and what it must contain.
struct ChunkLocation {
    start: u64,
    len: u64,
    data_page_offset: u64,
    compression: Compression,
    num_rows: usize,
}

impl ParquetDecoder {
    pub fn key_value_metadata(&self) -> &[KeyValue] {
        self.metadata.key_value_metadata.as_deref().unwrap_or(&[])
    }

    fn column_meta(&self, column: usize) -> ParquetResult<&ColumnMeta> {
        self.columns.get(column).ok_or_else(|| {
            fmt_err!(Bounds, "column index {column} is out of range for {} columns", self.col_count)
        })
    }

    fn check_row_group(&self, row_group: usize) -> ParquetResult<()> {
        if row_group >= self.row_group_sizes.len() {
            return Err(fmt_err!(
                Bounds,
                "row group index {row_group} is out of range for {} row groups",
                self.row_group_count
            ));
        }
        Ok(())
    }

    fn check_context<R>(&self, ctx: &DecodeContext<R>) -> ParquetResult<()> {
        if ctx.file_size != self.file_size {
            return Err(fmt_err!(
                Layout,
                "decode context has {} bytes, the metadata was read from a file of {}",
                ctx.file_size,
                self.file_size
            ));
        }
        Ok(())
    }

    fn locate_chunk(&self, row_group: usize, column: usize) -> ParquetResult<ChunkLocation> {
        self.check_row_group(row_group)?;
        let column_meta = self.column_meta(column)?;
        let chunk = &self.metadata.row_groups[row_group].columns[column];
        if let Some(path) = &chunk.file_path {
            return Err(fmt_err!(Unsupported, "column chunk stored in external file {path:?}"));
        }
        let meta = chunk
            .meta_data
            .as_ref()
            .ok_or_else(|| fmt_err!(OutOfSpec, "column chunk has no metadata"))?;
        if meta.path_in_schema.len() != 1 || meta.path_in_schema[0] != column_meta.name {
            return Err(fmt_err!(
                OutOfSpec,
                "column chunk path {:?} does not match the schema column",
                meta.path_in_schema
            ));
        }
        if meta.type_ != column_meta.physical_type {
            return Err(fmt_err!(
                OutOfSpec,
                "column chunk has physical type {}, the schema declares {}",
                meta.type_,
                column_meta.physical_type
            ));
        }
        let compression = Compression::try_from(meta.codec)?;

        let num_rows = self.row_group_sizes[row_group] as usize;
        if meta.num_values != num_rows as i64 {
            return Err(fmt_err!(
                OutOfSpec,
                "column chunk declares {} values, the row group has {num_rows} rows",
                meta.num_values
            ));
        }

        let offset = |value: i64, what: &str| {
            u64::try_from(value).map_err(|_| fmt_err!(OutOfSpec, "negative {what} {value}"))
        };
        let data_page_offset = offset(meta.data_page_offset, "data page offset")?;
        let start = match meta.dictionary_page_offset {
            Some(dict_offset) if dict_offset > 0 => offset(dict_offset, "dictionary page offset")?,
            _ => data_page_offset,
        };
        let len = offset(meta.total_compressed_size, "column chunk size")?;
        let end = start
            .checked_add(len)
            .ok_or_else(|| fmt_err!(Overflow, "column chunk {start}+{len} overflows"))?;
        if start < PARQUET_MAGIC.len() as u64 || end > self.data_end {
            return Err(fmt_err!(
                Bounds,
                "column chunk {start}..{end} lies outside the data region {}..{}",
                PARQUET_MAGIC.len(),
                self.data_end
            ));
        }
        if data_page_offset < start || data_page_offset >= end {
            return Err(fmt_err!(
                OutOfSpec,
                "data page offset {data_page_offset} lies outside the column chunk {start}..{end}"
            ));
        }
        Ok(ChunkLocation {
            start,
            len,
            data_page_offset,
            compression,
            num_rows,
        })
    }

    /// Reads the pages of one column chunk and decompresses their bodies.
    pub fn read_pages<R: Read + Seek>(
        &self,
        ctx: &mut DecodeContext<R>,
        row_group: usize,
        column: usize,
    ) -> ParquetResult<Vec<Page>> {
        self.read_pages_inner(ctx, row_group, column)
            .with_context(|_| self.chunk_context(row_group, column))
    }

    fn read_pages_inner<R: Read + Seek>(
        &self,
        ctx: &mut DecodeContext<R>,
        row_group: usize,
        column: usize,
    ) -> ParquetResult<Vec<Page>> {
        self.check_context(ctx)?;
        let location = self.locate_chunk(row_group, column)?;
        let optional = self.columns[column].is_optional();

        let DecodeContext { reader, file_size, chunk_buffer } = ctx;
        read_range_into(reader, *file_size, location.start, location.len, chunk_buffer)?;

        let mut page_reader = SlicePageReader::new(chunk_buffer, location.compression);
        let mut pages = Vec::with_capacity(2);
        let mut has_dict = false;
        let mut has_data = false;
        let mut num_values = 0usize;
        loop {
            let page_offset = location.start + page_reader.offset() as u64;
            let Some(page) = page_reader.next() else {
                break;
            };
            match page? {
                SlicedPage::Dict(dict) => {
                    if has_dict {
                        return Err(fmt_err!(OutOfSpec, "column chunk has more than one dictionary page"));
                    }
                    has_dict = true;
                    let buffer =
                        decompress_page_body(dict.compression, dict.buffer, dict.uncompressed_size)?;
                    pages.push(Page::Dict(DictPage {
                        num_values: dict.num_values,
                        buffer,
                    }));
                }
                SlicedPage::Data(data) => {
                    if !has_data && page_offset != location.data_page_offset {
                        return Err(fmt_err!(
                            OutOfSpec,
                            "first data page starts at {page_offset}, metadata records {}",
                            location.data_page_offset
                        ));
                    }
                    has_data = true;
                    let encoding = Encoding::try_from(data.header.encoding)?;
                    if optional && data.header.definition_level_encoding != i32::from(Encoding::Rle) {
                        return Err(fmt_err!(
                            Unsupported,
                            "definition level encoding {} is not supported",
                            data.header.definition_level_encoding
                        ));
                    }
                    num_values = num_values
                        .checked_add(data.num_values())
                        .ok_or_else(|| fmt_err!(Overflow, "page value counts overflow"))?;
                    let buffer =
                        decompress_page_body(data.compression, data.buffer, data.uncompressed_size)?;
                    pages.push(Page::Data(DataPage {
                        num_values: data.num_values(),
                        encoding,
                        buffer,
                    }));
                }
            }
        }
        if num_values != location.num_rows {
            return Err(fmt_err!(
                OutOfSpec,
                "data pages hold {num_values} rows, the row group has {}",
                location.num_rows
            ));
        }
        Ok(pages)
    }

    fn chunk_context(&self, row_group: usize, column: usize) -> String {
        match self.columns.get(column) {
            Some(meta) => format!(
                "could not decode page for column {:?} in row group {row_group}",
                meta.name
            ),
            None => format!("could not decode page for column {column} in row group {row_group}"),
        }
    }

    /// Decodes one column chunk.
    pub fn decode_column_chunk<R: Read + Seek>(
        &self,
        ctx: &mut DecodeContext<R>,
        row_group: usize,
        column: usize,
    ) -> ParquetResult<Column> {
        self.decode_column_chunk_inner(ctx, row_group, column)
            .with_context(|_| self.chunk_context(row_group, column))
    }

    fn decode_column_chunk_inner<R: Read + Seek>(
        &self,
        ctx: &mut DecodeContext<R>,
        row_group: usize,
        column: usize,
    ) -> ParquetResult<Column> {
        let column_meta = self.column_meta(column)?;
        let column_type = supported_type(column_meta)?;
        let pages = self.read_pages_inner(ctx, row_group, column)?;
        let optional = column_meta.is_optional();

        let values = match column_type {
            ColumnType::Int32 | ColumnType::Int64 => {
                ColumnValues::Int64(decode_pages(pages, column_type, optional)?)
            }
            ColumnType::Float | ColumnType::Double => {
                ColumnValues::Float64(decode_pages(pages, column_type, optional)?)
            }
            ColumnType::Utf8 => ColumnValues::String(
                decode_pages::<Vec<u8>>(pages, column_type, optional)?
                    .into_iter()
                    .map(|value| value.map(into_string).transpose())
                    .collect::<ParquetResult<_>>()?,
            ),
            ColumnType::Binary => ColumnValues::Binary(decode_pages(pages, column_type, optional)?),
        };
        Ok(Column::with_nullable(column_meta.name.clone(), values, optional))
    }

    /// Decodes one column across every row group.
    pub fn decode_column<R: Read + Seek>(
        &self,
        ctx: &mut DecodeContext<R>,
        column: usize,
    ) -> ParquetResult<Column> {
        let column_meta = self.column_meta(column)?;
        let column_type = supported_type(column_meta)
            .with_context(|_| format!("could not decode column {:?}", column_meta.name))?;
        let empty = ColumnValues::empty(column_type.logical_type())
            .ok_or_else(|| fmt_err!(Unsupported, "column {:?} cannot be decoded", column_meta.name))?;
        let mut result = Column::with_nullable(column_meta.name.clone(), empty, column_meta.is_optional());
        for row_group in 0..self.row_group_sizes.len() {
            result.append(self.decode_column_chunk(ctx, row_group, column)?)?;
        }
        Ok(result)
    }

    /// Decodes every column chunk of `row_group`. A failing chunk does not
    /// prevent the others from decoding.
    pub fn decode_row_group<R: Read + Seek>(
        &self,
        ctx: &mut DecodeContext<R>,
        row_group: usize,
    ) -> ParquetResult<Vec<ParquetResult<Column>>> {
        self.check_row_group(row_group)?;
        Ok((0..self.columns.len())
            .map(|column| self.decode_column_chunk(ctx, row_group, column))
            .collect())
    }

    /// Decodes the whole file. Fails on the first column that cannot be decoded.
    pub fn read_table<R: Read + Seek>(&self, ctx: &mut DecodeContext<R>) -> ParquetResult<Table> {
        let columns = (0..self.columns.len())
            .map(|column| self.decode_column(ctx, column))
            .collect::<ParquetResult<Vec<_>>>()?;
        Table::try_new(columns)
    }
}

fn supported_type(column_meta: &ColumnMeta) -> ParquetResult<ColumnType> {
    column_meta.column_type.ok_or_else(|| {
        fmt_err!(
            Unsupported,
            "column {:?} with physical type {} and repetition {:?} cannot be decoded",
            column_meta.name,
            column_meta.physical_type,
            column_meta.repetition
        )
    })
}

fn into_string(bytes: Vec<u8>) -> ParquetResult<String> {
    String::from_utf8(bytes).map_err(|err| ParquetError::from(err.utf8_error()))
}

fn check_declared_size(compression: Compression, input: &[u8], declared: usize) -> ParquetResult<()> {
    let consistent = match compression {
        Compression::Uncompressed => input.len() == declared,
        Compression::Snappy => snappy::decompress_len(input)? == declared,
        Compression::Gzip => declared <= input.len().saturating_mul(MAX_DEFLATE_RATIO),
    };
    if !consistent {
        return Err(fmt_err!(
            OutOfSpec,
            "{compression} page of {} bytes cannot hold the declared {declared} bytes",
            input.len()
        ));
    }
    Ok(())
}

fn decompress_page_body(
    compression: Compression,
    input: &[u8],
    uncompressed_size: usize,
) -> ParquetResult<Vec<u8>> {
    check_declared_size(compression, input, uncompressed_size)?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(uncompressed_size)?;
    buffer.resize(uncompressed_size, 0);
    decompress(compression, input, &mut buffer)?;
    Ok(buffer)
}

fn decode_pages<T: PlainDecode + Clone>(
    pages: Vec<Page>,
    column_type: ColumnType,
    optional: bool,
) -> ParquetResult<Vec<Option<T>>> {
    let mut dict: Option<Dictionary<T>> = None;
    let mut rows = Vec::new();
    for page in pages {
        match page {
            Page::Dict(page) => {
                dict = Some(Dictionary::try_new(&page.buffer, page.num_values, column_type)?);
            }
            Page::Data(page) => {
                let (def_levels, values) = split_buffer_v1(&page.buffer, optional)?;
                let present = if optional {
                    Some(decode_def_levels(def_levels, page.num_values)?)
                } else {
                    None
                };
                let num_non_null = present
                    .as_ref()
                    .map_or(page.num_values, |present| present.iter().filter(|p| **p).count());
                let values = match page.encoding {
                    Encoding::Plain => T::decode_plain(values, num_non_null, column_type)?,
                    Encoding::PlainDictionary | Encoding::RleDictionary => dict
                        .as_ref()
                        .ok_or_else(|| {
                            fmt_err!(OutOfSpec, "dictionary-encoded page without a dictionary page")
                        })?
                        .decode_indices(values, num_non_null)?,
                    encoding => {
                        return Err(fmt_err!(
                            Unsupported,
                            "data page encoding {encoding} is not supported"
                        ))
                    }
                };
                rows.try_reserve(page.num_values)?;
                rows.extend(scatter(values, present.as_deref())?);
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionOptions;
    use crate::format::PageHeader;
    use crate::parquet::ParquetErrorCause;
    use crate::parquet_write::{DictionaryPolicy, ParquetWriter};
    use crate::thrift::{TCompactInputProtocol, TCompactOutputProtocol};
    use std::io::Cursor;

    fn table() -> Table {
        Table::try_new(vec![
            Column::int64("id", vec![Some(1), None, Some(3), Some(4), None]),
            Column::string("label", vec![Some("a"), Some("a"), Some("b"), Some("a"), Some("b")]),
            Column::float64("score", vec![Some(0.5), Some(-1.0), None, None, Some(2.25)]),
        ])
        .unwrap()
    }

    fn write(table: &Table) -> Vec<u8> {
        let mut bytes = vec![];
        ParquetWriter::new(&mut bytes)
            .with_compression(CompressionOptions::Snappy)
            .with_row_group_size(Some(3))
            .with_column_encoding("label", DictionaryPolicy::Always)
            .finish(table)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_chunks_columns_and_tables() {
        let table = table();
        let bytes = write(&table);
        let decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        let mut ctx = DecodeContext::new(Cursor::new(&bytes)).unwrap();

        let chunk = decoder.decode_column_chunk(&mut ctx, 1, 0).unwrap();
        assert_eq!(chunk.values(), &ColumnValues::Int64(vec![Some(4), None]));

        let label = decoder.decode_column(&mut ctx, 1).unwrap();
        assert_eq!(&label, &table.columns()[1]);

        assert_eq!(decoder.read_table(&mut ctx).unwrap(), table);
    }

    #[test]
    fn corrupt_chunk_is_isolated() {
        let table = table();
        let mut bytes = write(&table);
        let decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        let meta = decoder.metadata.row_groups[0].columns[0].meta_data.clone().unwrap();
        // An invalid field type in the page header of "id".
        bytes[meta.data_page_offset as usize] = 0xFF;

        let mut ctx = DecodeContext::new(Cursor::new(&bytes)).unwrap();
        let results = decoder.decode_row_group(&mut ctx, 0).unwrap();
        let err = results[0].as_ref().unwrap_err();
        assert!(err
            .to_string()
            .starts_with("could not decode page for column \"id\" in row group 0"));
        assert!(results[1].is_ok());
        assert!(results[2].is_ok());
        assert!(decoder.decode_column_chunk(&mut ctx, 1, 0).is_ok());
    }

    #[test]
    fn row_count_mismatch_is_detected() {
        let bytes = write(&table());
        let mut decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        decoder.row_group_sizes[0] = 2;
        if let Some(meta) = decoder.metadata.row_groups[0].columns[1].meta_data.as_mut() {
            meta.num_values = 2;
        }
        let mut ctx = DecodeContext::new(Cursor::new(&bytes)).unwrap();
        let err = decoder.decode_column_chunk(&mut ctx, 0, 1).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::OutOfSpec));
        // The chunk metadata still says 3 for "id".
        assert!(decoder.decode_column_chunk(&mut ctx, 0, 0).is_err());
    }

    #[test]
    fn out_of_range_row_group_or_column_fails() {
        let bytes = write(&table());
        let decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        let mut ctx = DecodeContext::new(Cursor::new(&bytes)).unwrap();
        let err = decoder.decode_column_chunk(&mut ctx, 2, 0).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::Bounds));
        assert!(decoder.decode_row_group(&mut ctx, 2).is_err());
        assert!(decoder.decode_column_chunk(&mut ctx, 0, 3).is_err());
    }

    /// Re-encodes the page header at `offset` after `edit`, keeping its size.
    fn rewrite_page_header(bytes: &mut [u8], offset: usize, edit: impl FnOnce(&mut PageHeader)) {
        let mut input = TCompactInputProtocol::new(&bytes[offset..]);
        let mut header = PageHeader::read_from_in_protocol(&mut input).unwrap();
        let len = input.position();
        edit(&mut header);
        let mut rewritten = vec![];
        header
            .write_to_out_protocol(&mut TCompactOutputProtocol::new(&mut rewritten))
            .unwrap();
        assert_eq!(rewritten.len(), len);
        bytes[offset..offset + len].copy_from_slice(&rewritten);
    }

    #[test]
    fn legacy_plain_dictionary_ids_decode_like_current_ones() {
        let table = table();
        let mut bytes = write(&table);
        let decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        let legacy = i32::from(Encoding::PlainDictionary);
        for row_group in &decoder.metadata.row_groups {
            let meta = row_group.columns[1].meta_data.as_ref().unwrap();
            let dict_offset = meta.dictionary_page_offset.unwrap() as usize;
            rewrite_page_header(&mut bytes, dict_offset, |header| {
                header.dictionary_page_header.as_mut().unwrap().encoding = legacy;
            });
            rewrite_page_header(&mut bytes, meta.data_page_offset as usize, |header| {
                let data = header.data_page_header.as_mut().unwrap();
                assert_eq!(data.encoding, i32::from(Encoding::RleDictionary));
                data.encoding = legacy;
            });
        }

        let mut ctx = DecodeContext::new(Cursor::new(&bytes)).unwrap();
        let label = decoder.decode_column(&mut ctx, 1).unwrap();
        assert_eq!(&label, &table.columns()[1]);
        assert_eq!(decoder.read_table(&mut ctx).unwrap(), table);
    }

    #[test]
    fn mismatched_context_is_rejected() {
        let bytes = write(&table());
        let decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        let mut ctx = DecodeContext::with_size(Cursor::new(&bytes), 10);
        let err = decoder.decode_column_chunk(&mut ctx, 0, 0).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::Layout));
    }
}
