//! Value-stream decoders: plain values, dictionary lookups and definition levels.

use crate::parquet::error::{fmt_err, ParquetResult};
use crate::parquet_read::ColumnType;

pub mod dictionary;
pub mod levels;
pub mod plain;

pub use dictionary::Dictionary;
pub use levels::decode_def_levels;

/// A value type that can be read from a plain stream of a given column type.
pub trait PlainDecode: Sized {
    /// Decodes exactly `count` values, consuming the whole buffer.
    fn decode_plain(buffer: &[u8], count: usize, column_type: ColumnType) -> ParquetResult<Vec<Self>>;
}

/// Places the non-null `values` in row order, with a `None` wherever the
/// definition levels mark a null.
pub fn scatter<T>(values: Vec<T>, present: Option<&[bool]>) -> ParquetResult<Vec<Option<T>>> {
    let Some(present) = present else {
        return Ok(values.into_iter().map(Some).collect());
    };
    let mut rows = Vec::new();
    rows.try_reserve_exact(present.len())?;
    let mut values = values.into_iter();
    for is_present in present {
        if *is_present {
            let value = values
                .next()
                .ok_or_else(|| fmt_err!(OutOfSpec, "definition levels mark more values than decoded"))?;
            rows.push(Some(value));
        } else {
            rows.push(None);
        }
    }
    if values.next().is_some() {
        return Err(fmt_err!(OutOfSpec, "more values decoded than definition levels mark"));
    }
    Ok(rows)
}
