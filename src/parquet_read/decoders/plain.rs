//! Decoder for `PLAIN` encoded values.
//!
//! Fixed-width values are little-endian. Byte arrays carry a 4-byte
//! little-endian length before their bytes. Narrow physical types widen to the
//! 64-bit logical types.

use std::mem::size_of;

use crate::parquet::error::{fmt_err, ParquetResult};
use crate::parquet_read::decoders::PlainDecode;
use crate::parquet_read::ColumnType;

fn check_fixed_size(buffer: &[u8], count: usize, width: usize) -> ParquetResult<()> {
    let expected = count
        .checked_mul(width)
        .ok_or_else(|| fmt_err!(Overflow, "{count} values of {width} bytes"))?;
    if buffer.len() != expected {
        return Err(fmt_err!(
            OutOfSpec,
            "plain stream of {} bytes cannot hold {count} values of {width} bytes",
            buffer.len()
        ));
    }
    Ok(())
}

fn decode_fixed<const N: usize, T>(
    buffer: &[u8],
    count: usize,
    convert: impl Fn([u8; N]) -> T,
) -> ParquetResult<Vec<T>> {
    check_fixed_size(buffer, count, N)?;
    let mut values = Vec::new();
    values.try_reserve_exact(count)?;
    for chunk in buffer.chunks_exact(N) {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(chunk);
        values.push(convert(bytes));
    }
    Ok(values)
}

impl PlainDecode for i64 {
    fn decode_plain(buffer: &[u8], count: usize, column_type: ColumnType) -> ParquetResult<Vec<Self>> {
        match column_type {
            ColumnType::Int32 => {
                decode_fixed::<{ size_of::<i32>() }, _>(buffer, count, |b| i32::from_le_bytes(b) as i64)
            }
            ColumnType::Int64 => decode_fixed::<{ size_of::<i64>() }, _>(buffer, count, i64::from_le_bytes),
            _ => Err(fmt_err!(Layout, "cannot decode {column_type:?} values as int64")),
        }
    }
}

impl PlainDecode for f64 {
    fn decode_plain(buffer: &[u8], count: usize, column_type: ColumnType) -> ParquetResult<Vec<Self>> {
        match column_type {
            ColumnType::Float => {
                decode_fixed::<{ size_of::<f32>() }, _>(buffer, count, |b| f32::from_le_bytes(b) as f64)
            }
            ColumnType::Double => decode_fixed::<{ size_of::<f64>() }, _>(buffer, count, f64::from_le_bytes),
            _ => Err(fmt_err!(Layout, "cannot decode {column_type:?} values as float64")),
        }
    }
}

impl PlainDecode for Vec<u8> {
    fn decode_plain(buffer: &[u8], count: usize, column_type: ColumnType) -> ParquetResult<Vec<Self>> {
        if !matches!(column_type, ColumnType::Utf8 | ColumnType::Binary) {
            return Err(fmt_err!(Layout, "cannot decode {column_type:?} values as bytes"));
        }
        // Every value takes at least its length prefix.
        if count > buffer.len() / size_of::<u32>() {
            return Err(fmt_err!(
                OutOfSpec,
                "plain stream of {} bytes cannot hold {count} byte arrays",
                buffer.len()
            ));
        }
        let mut values = Vec::new();
        values.try_reserve_exact(count)?;
        let mut offset = 0usize;
        for i in 0..count {
            let prefix = buffer.get(offset..offset + size_of::<u32>()).ok_or_else(|| {
                fmt_err!(OutOfSpec, "plain stream is too short to read value length {i}")
            })?;
            let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
            offset += size_of::<u32>();
            if len > buffer.len() - offset {
                return Err(fmt_err!(
                    OutOfSpec,
                    "plain stream is too short to read value {i} of {len} bytes"
                ));
            }
            let mut value = Vec::new();
            value.try_reserve_exact(len)?;
            value.extend_from_slice(&buffer[offset..offset + len]);
            values.push(value);
            offset += len;
        }
        if offset != buffer.len() {
            return Err(fmt_err!(
                OutOfSpec,
                "plain stream has {} trailing bytes after {count} values",
                buffer.len() - offset
            ));
        }
        Ok(values)
    }
}
