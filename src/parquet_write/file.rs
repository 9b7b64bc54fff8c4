use std::collections::HashMap;
use std::io::Write;
use std::ops::Range;

use crate::compression::CompressionOptions;
use crate::format::{FileMetaData, KeyValue, RowGroup};
use crate::parquet::error::{fmt_err, ParquetError, ParquetErrorCause, ParquetResult};
use crate::parquet::PARQUET_MAGIC;
use crate::parquet_write::dictionary::DictionaryPolicy;
use crate::parquet_write::row_group::write_row_group;
use crate::parquet_write::schema::{to_parquet_schema, to_schema_elements, ColumnDescriptor};
use crate::table::TableAccessor;
use crate::thrift::TCompactOutputProtocol;

pub const DEFAULT_ROW_GROUP_SIZE: usize = 50_000;

/// Format version recorded in the footer.
const FILE_VERSION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// The compression to apply to every page
    pub compression: CompressionOptions,
    /// If `None` will be DEFAULT_ROW_GROUP_SIZE rows
    pub row_group_size: Option<usize>,
    /// Encoding choice for columns without an override
    pub dictionary: DictionaryPolicy,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: CompressionOptions::Uncompressed,
            row_group_size: None,
            dictionary: DictionaryPolicy::Auto,
        }
    }
}

pub fn default_created_by() -> String {
    format!("colframe version {}", env!("CARGO_PKG_VERSION"))
}

pub struct ParquetWriter<W: Write> {
    writer: W,
    /// Data page compression
    compression: CompressionOptions,
    /// If `None` will be DEFAULT_ROW_GROUP_SIZE rows.
    row_group_size: Option<usize>,
    dictionary: DictionaryPolicy,
    /// Per-column dictionary policies, by column name.
    column_encodings: HashMap<String, DictionaryPolicy>,
    created_by: Option<String>,
    key_value_metadata: Vec<KeyValue>,
}

impl<W: Write> ParquetWriter<W> {
    /// Create a new writer
    pub fn new(writer: W) -> Self {
        ParquetWriter {
            writer,
            compression: CompressionOptions::Uncompressed,
            row_group_size: None,
            dictionary: DictionaryPolicy::Auto,
            column_encodings: HashMap::new(),
            created_by: None,
            key_value_metadata: Vec::new(),
        }
    }

    /// Set the compression used. Defaults to `Uncompressed`.
    pub fn with_compression(mut self, compression: CompressionOptions) -> Self {
        self.compression = compression;
        self
    }

    /// Set the row group size (in number of rows) during writing.
    pub fn with_row_group_size(mut self, size: Option<usize>) -> Self {
        self.row_group_size = size;
        self
    }

    /// Dictionary policy of every column without a per-column override.
    pub fn with_dictionary(mut self, policy: DictionaryPolicy) -> Self {
        self.dictionary = policy;
        self
    }

    pub fn with_column_encoding(mut self, name: impl Into<String>, policy: DictionaryPolicy) -> Self {
        self.column_encodings.insert(name.into(), policy);
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn with_key_value_metadata(mut self, key_value_metadata: Vec<KeyValue>) -> Self {
        self.key_value_metadata = key_value_metadata;
        self
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compression: self.compression,
            row_group_size: self.row_group_size,
            dictionary: self.dictionary,
        }
    }

    pub fn chunked(self, parquet_schema: Vec<ColumnDescriptor>) -> ParquetResult<ChunkedWriter<W>> {
        let options = self.write_options();
        if options.row_group_size == Some(0) {
            return Err(fmt_err!(Layout, "row group size must be at least one row"));
        }
        if let Some(name) = self
            .column_encodings
            .keys()
            .find(|name| !parquet_schema.iter().any(|d| &d.name == *name))
        {
            return Err(fmt_err!(Layout, "encoding override for unknown column {name:?}"));
        }
        let policies = parquet_schema
            .iter()
            .map(|d| self.column_encodings.get(&d.name).copied().unwrap_or(options.dictionary))
            .collect();

        let created_by = self.created_by.unwrap_or_else(default_created_by);
        let writer = FileWriter::new(self.writer, parquet_schema, policies, options, Some(created_by));
        Ok(ChunkedWriter {
            writer,
            key_value_metadata: self.key_value_metadata,
        })
    }

    /// Write the given table with the writer `W`. Returns the total size of the file.
    pub fn finish<T: TableAccessor + ?Sized>(self, table: &T) -> ParquetResult<u64> {
        let schema = to_parquet_schema(table)?;
        let mut chunked = self.chunked(schema)?;
        chunked.write_chunk(table)?;
        chunked.finish()
    }
}

pub struct ChunkedWriter<W: Write> {
    writer: FileWriter<W>,
    key_value_metadata: Vec<KeyValue>,
}

impl<W: Write> ChunkedWriter<W> {
    /// Write a chunk to the parquet writer, split into row groups of at most
    /// the configured size.
    pub fn write_chunk<T: TableAccessor + ?Sized>(&mut self, table: &T) -> ParquetResult<()> {
        self.check_schema(table)?;
        let row_group_size = self
            .writer
            .options
            .row_group_size
            .unwrap_or(DEFAULT_ROW_GROUP_SIZE);
        let table_length = table.num_rows();
        let row_group_range = (0..table_length).step_by(row_group_size).map(move |offset| {
            let length = row_group_size.min(table_length - offset);
            offset..offset + length
        });
        for rows in row_group_range {
            self.writer.write(table, rows)?;
        }
        Ok(())
    }

    fn check_schema<T: TableAccessor + ?Sized>(&self, table: &T) -> ParquetResult<()> {
        let schema = self.writer.schema();
        if table.num_columns() != schema.len() {
            return Err(fmt_err!(
                Layout,
                "chunk has {} columns, file schema has {}",
                table.num_columns(),
                schema.len()
            ));
        }
        for (index, descriptor) in schema.iter().enumerate() {
            let column = table.column(index);
            if column.name() != descriptor.name || column.logical_type() != descriptor.logical_type {
                return Err(fmt_err!(
                    Layout,
                    "chunk column {index} is {:?} ({}), file schema expects {:?} ({})",
                    column.name(),
                    column.logical_type(),
                    descriptor.name,
                    descriptor.logical_type
                ));
            }
            if column.len() != table.num_rows() {
                return Err(fmt_err!(
                    Layout,
                    "chunk column {:?} has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    table.num_rows()
                ));
            }
        }
        Ok(())
    }

    /// Write the footer of the parquet file. Returns the total size of the file.
    pub fn finish(&mut self) -> ParquetResult<u64> {
        let key_value_metadata = std::mem::take(&mut self.key_value_metadata);
        let key_value_metadata = (!key_value_metadata.is_empty()).then_some(key_value_metadata);
        self.writer.end(key_value_metadata)
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

fn failed() -> ParquetError {
    fmt_err!(Layout, "file writer failed on an earlier write")
}

/// Used to recall the state of the file writer.
#[derive(Debug, PartialEq)]
enum State {
    Initialised,
    Started,
    Finished,
    /// A write left bytes in the sink that no footer describes.
    Failed,
}

/// Counts the bytes accepted by the wrapped writer.
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Writes the file image in one pass: magic, row groups, then the footer.
pub struct FileWriter<W: Write> {
    writer: W,
    schema: Vec<ColumnDescriptor>,
    policies: Vec<DictionaryPolicy>,
    options: WriteOptions,
    created_by: Option<String>,

    offset: u64,
    row_groups: Vec<RowGroup>,
    state: State,
    /// Set once the footer is written.
    metadata: Option<FileMetaData>,
}

impl<W: Write> FileWriter<W> {
    pub fn new(
        writer: W,
        schema: Vec<ColumnDescriptor>,
        policies: Vec<DictionaryPolicy>,
        options: WriteOptions,
        created_by: Option<String>,
    ) -> Self {
        Self {
            writer,
            schema,
            policies,
            options,
            created_by,
            offset: 0,
            row_groups: vec![],
            state: State::Initialised,
            metadata: None,
        }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn schema(&self) -> &[ColumnDescriptor] {
        &self.schema
    }

    /// The footer metadata, available once [`FileWriter::end`] succeeded.
    pub fn metadata(&self) -> Option<&FileMetaData> {
        self.metadata.as_ref()
    }

    /// Writes the header of the file.
    ///
    /// This is automatically called by [`Self::write`] if not called
    /// explicitly before.
    pub fn start(&mut self) -> ParquetResult<()> {
        if self.state != State::Initialised {
            return Err(fmt_err!(Layout, "file writer is already started"));
        }
        if let Err(err) = self.writer.write_all(&PARQUET_MAGIC) {
            self.state = State::Failed;
            return Err(err.into());
        }
        self.offset = PARQUET_MAGIC.len() as u64;
        self.state = State::Started;
        Ok(())
    }

    /// Writes rows `rows` of `table` as the next row group.
    ///
    /// A table that does not fit the schema is rejected before any byte is
    /// written and the writer stays usable. Any later failure leaves the
    /// writer failed.
    pub fn write<T: TableAccessor + ?Sized>(
        &mut self,
        table: &T,
        rows: Range<usize>,
    ) -> ParquetResult<()> {
        match self.state {
            State::Initialised => self.start()?,
            State::Started => {}
            State::Finished => {
                return Err(fmt_err!(Layout, "cannot write a row group after the footer"))
            }
            State::Failed => return Err(failed()),
        }
        let ordinal = self.row_groups.len();
        let mut sink = CountingWriter {
            inner: &mut self.writer,
            written: 0,
        };
        let result = write_row_group(
            &mut sink,
            self.offset,
            table,
            &self.schema,
            &self.policies,
            rows,
            self.options.compression,
            ordinal,
        );
        let written = sink.written;
        match result {
            Ok((row_group, size)) => {
                self.offset += size;
                self.row_groups.push(row_group);
                Ok(())
            }
            Err(err) => {
                if written > 0 || matches!(err.cause(), ParquetErrorCause::Io(_)) {
                    self.state = State::Failed;
                }
                Err(err)
            }
        }
    }

    /// Writes the footer of the file. Returns the total size of the file.
    pub fn end(&mut self, key_value_metadata: Option<Vec<KeyValue>>) -> ParquetResult<u64> {
        match self.state {
            State::Initialised => self.start()?,
            State::Started => {}
            State::Finished => return Err(fmt_err!(Layout, "file writer is already finished")),
            State::Failed => return Err(failed()),
        }
        match self.write_footer(key_value_metadata) {
            Ok(size) => {
                self.state = State::Finished;
                Ok(size)
            }
            Err(err) => {
                self.state = State::Failed;
                Err(err)
            }
        }
    }

    fn write_footer(&mut self, key_value_metadata: Option<Vec<KeyValue>>) -> ParquetResult<u64> {
        let num_rows = self.row_groups.iter().map(|group| group.num_rows).sum();
        let metadata = FileMetaData {
            version: FILE_VERSION,
            schema: to_schema_elements(&self.schema)?,
            num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata,
            created_by: self.created_by.clone(),
        };

        let mut buffer = Vec::new();
        metadata.write_to_out_protocol(&mut TCompactOutputProtocol::new(&mut buffer))?;
        let metadata_len = u32::try_from(buffer.len())
            .map_err(|_| fmt_err!(Overflow, "file metadata of {} bytes", buffer.len()))?;
        self.writer.write_all(&buffer)?;
        self.writer.write_all(&metadata_len.to_le_bytes())?;
        self.writer.write_all(&PARQUET_MAGIC)?;
        self.writer.flush()?;

        self.offset += buffer.len() as u64 + 8;
        self.metadata = Some(metadata);
        Ok(self.offset)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
