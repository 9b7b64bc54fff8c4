//! Write path: table rows to pages, column chunks, row groups and the footer.

mod column_chunk;
mod dictionary;
mod page;
mod primitive;
mod row_group;
mod string;
mod util;

pub mod file;
pub mod schema;

pub use column_chunk::{column_chunk_to_pages, write_column_chunk};
pub use dictionary::{DictionaryBuilder, DictionaryPolicy};
pub use file::{ChunkedWriter, FileWriter, ParquetWriter, WriteOptions, DEFAULT_ROW_GROUP_SIZE};
pub use page::{compress_page, write_page, PageWriteSpec};
pub use row_group::write_row_group;
pub use schema::{to_parquet_schema, ColumnDescriptor, PhysicalType, Repetition};
