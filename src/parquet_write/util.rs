use std::io;
use std::ops::Range;

use crate::encoding::hybrid_rle::encode_bool;
use crate::encoding::Encoding;
use crate::page::DataPage;
use crate::parquet::error::{fmt_err, ParquetResult};
use crate::table::ColumnAccessor;

/// A plain-encodable value and the key it is deduplicated by in a dictionary.
pub trait PlainValue: Copy {
    type Key: std::hash::Hash + Eq;

    fn dictionary_key(self) -> Self::Key;
    fn plain_size(self) -> usize;
    fn encode_plain(self, buffer: &mut Vec<u8>);
}

/// Writes a v1 definition-level stream: a 4-byte little-endian length followed by
/// the packed levels.
pub fn encode_def_levels<I: Iterator<Item = bool>>(buffer: &mut Vec<u8>, iter: I) -> io::Result<()> {
    buffer.extend_from_slice(&[0; 4]);
    let start = buffer.len();
    encode_bool(buffer, iter)?;
    let end = buffer.len();
    let length = end - start;

    // write the first 4 bytes as length
    let length = (length as u32).to_le_bytes();
    buffer[start - 4..start].copy_from_slice(&length);
    Ok(())
}

/// Counts the nulls of `column` in `rows`, failing when there are any and the
/// column is stored as required.
pub fn check_required(
    column: &dyn ColumnAccessor,
    optional: bool,
    rows: &Range<usize>,
) -> ParquetResult<usize> {
    let null_count = rows.clone().filter(|row| column.is_null(*row)).count();
    if null_count > 0 && !optional {
        return Err(fmt_err!(
            Layout,
            "column {:?} is required in the file schema but holds {null_count} nulls",
            column.name()
        ));
    }
    Ok(null_count)
}

/// Converts a size or count to the `i32` used by page headers.
pub fn to_i32(value: usize, what: &str) -> ParquetResult<i32> {
    i32::try_from(value).map_err(|_| fmt_err!(Overflow, "{what} of {value} does not fit i32"))
}

pub fn build_data_page(buffer: Vec<u8>, num_rows: usize, encoding: Encoding) -> DataPage {
    DataPage {
        num_values: num_rows,
        encoding,
        buffer,
    }
}

/// Collects the plain bytes of `values`.
pub fn encode_plain<T: PlainValue>(values: &[T]) -> ParquetResult<Vec<u8>> {
    let size: usize = values.iter().map(|v| v.plain_size()).sum();
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(size)?;
    for value in values {
        value.encode_plain(&mut buffer);
    }
    Ok(buffer)
}
