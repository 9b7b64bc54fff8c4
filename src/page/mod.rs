//! Pages: the unit of compression inside a column chunk.

use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::format::DataPageHeader;
use crate::parquet::error::{fmt_err, ParquetError, ParquetResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    DataPage,
    DictionaryPage,
}

impl TryFrom<i32> for PageType {
    type Error = ParquetError;

    fn try_from(type_: i32) -> ParquetResult<Self> {
        match type_ {
            0 => Ok(PageType::DataPage),
            2 => Ok(PageType::DictionaryPage),
            1 => Err(fmt_err!(Unsupported, "index pages are not supported")),
            3 => Err(fmt_err!(Unsupported, "v2 data pages are not supported")),
            _ => Err(fmt_err!(OutOfSpec, "unknown page type {type_}")),
        }
    }
}

impl From<PageType> for i32 {
    fn from(page_type: PageType) -> Self {
        match page_type {
            PageType::DataPage => 0,
            PageType::DictionaryPage => 2,
        }
    }
}

/// An encoded, uncompressed data page.
#[derive(Debug, Clone)]
pub struct DataPage {
    pub num_values: usize,
    pub encoding: Encoding,
    pub buffer: Vec<u8>,
}

/// An encoded, uncompressed dictionary page.
#[derive(Debug, Clone)]
pub struct DictPage {
    pub num_values: usize,
    pub buffer: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Page {
    Dict(DictPage),
    Data(DataPage),
}

/// A page with its body compressed, ready to be framed and written.
#[derive(Debug, Clone)]
pub struct CompressedPage {
    pub page_type: PageType,
    pub num_values: usize,
    pub encoding: Encoding,
    pub uncompressed_page_size: usize,
    pub compression: Compression,
    pub buffer: Vec<u8>,
}

impl CompressedPage {
    pub fn compressed_size(&self) -> usize {
        self.buffer.len()
    }
}

/// A dictionary page borrowed from a column chunk buffer, still compressed.
#[derive(Debug)]
pub struct SlicedDictPage<'a> {
    pub buffer: &'a [u8],
    pub compression: Compression,
    pub uncompressed_size: usize,
    pub num_values: usize,
    pub encoding: Encoding,
    pub is_sorted: bool,
}

/// A data page borrowed from a column chunk buffer, still compressed.
#[derive(Debug)]
pub struct SlicedDataPage<'a> {
    pub header: DataPageHeader,
    pub buffer: &'a [u8],
    pub compression: Compression,
    pub uncompressed_size: usize,
}

impl SlicedDataPage<'_> {
    pub fn num_values(&self) -> usize {
        self.header.num_values as usize
    }
}

#[derive(Debug)]
pub enum SlicedPage<'a> {
    Dict(SlicedDictPage<'a>),
    Data(SlicedDataPage<'a>),
}

/// Reads the 4-byte little-endian length prefix of a level stream.
#[inline]
pub fn get_length(values: &[u8]) -> Option<usize> {
    values
        .get(0..4)
        .map(|x| u32::from_le_bytes([x[0], x[1], x[2], x[3]]) as usize)
}

/// Splits an uncompressed v1 page body into (encoded def levels, encoded values).
/// Definition levels are only present when `has_def` is set.
#[inline]
pub fn split_buffer_v1(buffer: &[u8], has_def: bool) -> ParquetResult<(&[u8], &[u8])> {
    if !has_def {
        return Ok((&[] as &[u8], buffer));
    }
    let level_buffer_length = get_length(buffer).ok_or_else(|| {
        fmt_err!(OutOfSpec, "page of {} bytes is too short for a level length", buffer.len())
    })?;
    let end = level_buffer_length
        .checked_add(4)
        .filter(|end| *end <= buffer.len())
        .ok_or_else(|| {
            fmt_err!(
                OutOfSpec,
                "the {level_buffer_length} bytes declared in def levels exceed the page size {}",
                buffer.len()
            )
        })?;
    Ok((&buffer[4..end], &buffer[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_level_stream() {
        let buffer = [3, 0, 0, 0, 1, 2, 1, 9, 9];
        let (def, values) = split_buffer_v1(&buffer, true).unwrap();
        assert_eq!(def, &[1, 2, 1]);
        assert_eq!(values, &[9, 9]);

        let (def, values) = split_buffer_v1(&buffer, false).unwrap();
        assert!(def.is_empty());
        assert_eq!(values.len(), buffer.len());
    }

    #[test]
    fn rejects_oversized_level_length() {
        assert!(split_buffer_v1(&[10, 0, 0, 0, 1], true).is_err());
        assert!(split_buffer_v1(&[1, 0], true).is_err());
    }

    #[test]
    fn page_types() {
        assert_eq!(PageType::try_from(2).unwrap(), PageType::DictionaryPage);
        assert!(PageType::try_from(3).is_err());
        assert_eq!(i32::from(PageType::DataPage), 0);
    }
}
