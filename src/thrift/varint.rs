//! Base-128 varints and the zigzag mapping used for signed integers.

use crate::parquet::error::{fmt_err, ParquetResult};

/// Longest valid encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Encodes `value` into `container`, returning the number of bytes used.
#[inline]
pub fn encode(mut value: u64, container: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut consumed = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        container[consumed] = byte;
        consumed += 1;
        if value == 0 {
            return consumed;
        }
    }
}

pub fn write_uvarint(buf: &mut Vec<u8>, value: u64) {
    let mut container = [0u8; MAX_VARINT_LEN];
    let used = encode(value, &mut container);
    buf.extend_from_slice(&container[..used]);
}

/// Decodes one unsigned varint from the front of `bytes`.
/// Returns the value and the number of bytes consumed.
pub fn read_uvarint(bytes: &[u8]) -> ParquetResult<(u64, usize)> {
    let mut value = 0u64;
    for (index, &byte) in bytes.iter().enumerate() {
        if index == MAX_VARINT_LEN {
            break;
        }
        let payload = (byte & 0x7F) as u64;
        // The tenth byte may only carry the single remaining bit of a u64.
        if index == MAX_VARINT_LEN - 1 && payload > 1 {
            return Err(fmt_err!(OutOfSpec, "varint overflows 64 bits"));
        }
        value |= payload << (7 * index);
        if byte & 0x80 == 0 {
            return Ok((value, index + 1));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        Err(fmt_err!(
            OutOfSpec,
            "varint is longer than {MAX_VARINT_LEN} bytes"
        ))
    } else {
        Err(fmt_err!(OutOfSpec, "varint is truncated"))
    }
}

#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

pub fn write_varint(buf: &mut Vec<u8>, value: i64) {
    write_uvarint(buf, zigzag_encode(value));
}

pub fn read_varint(bytes: &[u8]) -> ParquetResult<(i64, usize)> {
    let (value, consumed) = read_uvarint(bytes)?;
    Ok((zigzag_decode(value), consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_unsigned_encodings() {
        let cases: [(u64, &[u8]); 5] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
        ];
        for (value, expected) in cases {
            let mut buf = vec![];
            write_uvarint(&mut buf, value);
            assert_eq!(buf, expected, "encoding {value}");
            assert_eq!(read_uvarint(&buf).unwrap(), (value, expected.len()));
        }
    }

    #[test]
    fn u64_max_uses_ten_bytes() {
        let mut buf = vec![];
        write_uvarint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
        assert_eq!(read_uvarint(&buf).unwrap(), (u64::MAX, MAX_VARINT_LEN));
    }

    #[test]
    fn zigzag_keeps_small_magnitudes_short() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        for value in [i64::MIN, -65, -1, 0, 63, 64, i64::MAX] {
            let mut buf = vec![];
            write_varint(&mut buf, value);
            assert_eq!(read_varint(&buf).unwrap(), (value, buf.len()));
        }
        let mut buf = vec![];
        write_varint(&mut buf, -64);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn truncated_input_fails() {
        assert!(read_uvarint(&[]).is_err());
        assert!(read_uvarint(&[0x80, 0x80]).is_err());
    }

    #[test]
    fn overlong_input_fails() {
        let bytes = [0xFFu8; 11];
        assert!(read_uvarint(&bytes).is_err());
        let mut bytes = [0xFFu8; 10];
        bytes[9] = 0x02;
        assert!(read_uvarint(&bytes).is_err());
    }
}
