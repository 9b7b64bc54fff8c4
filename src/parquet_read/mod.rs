//! Read path: footer parsing, page slicing and column decoding.

use std::io::{Read, Seek};

use crate::format::FileMetaData;
use crate::parquet::error::ParquetResult;
use crate::parquet::io::stream_len;

pub mod decode;
pub mod decoders;
pub mod meta;
pub mod page;

pub use meta::{ColumnMeta, ColumnType};

// This struct contains only immutable metadata.
// The reader is passed as a parameter to decode methods.
#[derive(Debug, Clone)]
pub struct ParquetDecoder {
    pub col_count: u32,
    pub row_count: usize,
    pub row_group_count: u32,
    pub row_group_sizes: Vec<u32>,
    pub columns: Vec<ColumnMeta>,
    pub metadata: FileMetaData,
    /// Size of the file the metadata was read from.
    pub file_size: u64,
    /// First byte of the footer; every column chunk ends before it.
    pub(crate) data_end: u64,
    pub(crate) row_group_sizes_acc: Vec<usize>,
}

/// The caller-owned side of a decode: the file handle and reusable buffers.
///
/// A decoder may be shared between threads as long as each thread decodes
/// through its own context.
pub struct DecodeContext<R> {
    pub reader: R,
    pub file_size: u64,
    pub(crate) chunk_buffer: Vec<u8>,
}

impl<R: Read + Seek> DecodeContext<R> {
    pub fn new(mut reader: R) -> ParquetResult<Self> {
        let file_size = stream_len(&mut reader)?;
        Ok(Self::with_size(reader, file_size))
    }

    pub fn with_size(reader: R, file_size: u64) -> Self {
        Self {
            reader,
            file_size,
            chunk_buffer: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
