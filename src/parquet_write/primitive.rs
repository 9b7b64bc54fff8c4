use std::ops::Range;

use crate::parquet::error::{fmt_err, ParquetResult};
use crate::parquet_write::util::PlainValue;
use crate::table::ColumnAccessor;

impl PlainValue for i64 {
    type Key = i64;

    fn dictionary_key(self) -> i64 {
        self
    }

    fn plain_size(self) -> usize {
        std::mem::size_of::<i64>()
    }

    fn encode_plain(self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.to_le_bytes());
    }
}

impl PlainValue for f64 {
    // Bit patterns, so that NaN payloads and signed zeros survive the dictionary.
    type Key = u64;

    fn dictionary_key(self) -> u64 {
        self.to_bits()
    }

    fn plain_size(self) -> usize {
        std::mem::size_of::<f64>()
    }

    fn encode_plain(self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.to_le_bytes());
    }
}

/// The non-null int64 values of `rows`, in row order.
pub fn int64_values(column: &dyn ColumnAccessor, rows: Range<usize>) -> ParquetResult<Vec<i64>> {
    let mut values = Vec::new();
    values.try_reserve_exact(rows.len())?;
    for row in rows.filter(|row| !column.is_null(*row)) {
        let value = column.get_int64(row).ok_or_else(|| {
            fmt_err!(Layout, "column {:?} row {row} is not an int64", column.name())
        })?;
        values.push(value);
    }
    Ok(values)
}

/// The non-null float64 values of `rows`, in row order.
pub fn float64_values(column: &dyn ColumnAccessor, rows: Range<usize>) -> ParquetResult<Vec<f64>> {
    let mut values = Vec::new();
    values.try_reserve_exact(rows.len())?;
    for row in rows.filter(|row| !column.is_null(*row)) {
        let value = column.get_float64(row).ok_or_else(|| {
            fmt_err!(Layout, "column {:?} row {row} is not a float64", column.name())
        })?;
        values.push(value);
    }
    Ok(values)
}
