use crate::encoding::{bit_width, ceil8};
use crate::parquet::error::{fmt_err, ParquetResult};
use crate::thrift::varint;

/// Iterates the runs of a packed stream, validating each against `max_value`.
pub struct HybridRleDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    num_bits: u8,
    value_bytes: usize,
    max_value: u32,
}

impl<'a> HybridRleDecoder<'a> {
    /// Reads the width byte. The width must lie in `1..=bit_width(max_value)`
    /// (at least 1).
    pub fn try_new(data: &'a [u8], max_value: u32) -> ParquetResult<Self> {
        let num_bits = *data
            .first()
            .ok_or_else(|| fmt_err!(OutOfSpec, "packed stream is empty, missing bit width"))?;
        let max_bits = bit_width(max_value as u64).max(1);
        if num_bits == 0 || num_bits as u32 > max_bits {
            return Err(fmt_err!(
                OutOfSpec,
                "bit width {num_bits} is inconsistent with maximum value {max_value}"
            ));
        }
        Ok(Self {
            data,
            pos: 1,
            num_bits,
            value_bytes: ceil8(num_bits as usize),
            max_value,
        })
    }

    pub fn num_bits(&self) -> u8 {
        self.num_bits
    }

    /// Whether every byte of the stream has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Returns the next `(value, run_length)`, or `None` at the end of the stream.
    pub fn next_run(&mut self) -> ParquetResult<Option<(u32, usize)>> {
        if self.is_exhausted() {
            return Ok(None);
        }
        let (header, consumed) = varint::read_uvarint(&self.data[self.pos..])?;
        self.pos += consumed;
        if header & 1 == 1 {
            return Err(fmt_err!(Unsupported, "bit-packed runs are not supported"));
        }
        let run_length = usize::try_from(header >> 1)
            .map_err(|_| fmt_err!(Overflow, "run length {} is not addressable", header >> 1))?;
        if run_length == 0 {
            return Err(fmt_err!(OutOfSpec, "zero-length run at byte {}", self.pos));
        }
        let end = self.pos + self.value_bytes;
        if end > self.data.len() {
            return Err(fmt_err!(
                OutOfSpec,
                "packed stream truncated in a run value at byte {}",
                self.pos
            ));
        }
        let mut le = [0u8; 4];
        le[..self.value_bytes].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        let value = u32::from_le_bytes(le);
        if value > self.max_value {
            return Err(fmt_err!(
                OutOfSpec,
                "packed value {value} exceeds the maximum {}",
                self.max_value
            ));
        }
        Ok(Some((value, run_length)))
    }
}

/// Decodes exactly `num_values` entries, each at most `max_value`.
/// The stream must end with the last run.
pub fn decode_u32(data: &[u8], max_value: u32, num_values: usize) -> ParquetResult<Vec<u32>> {
    let mut decoder = HybridRleDecoder::try_new(data, max_value)?;
    let mut values = Vec::new();
    values.try_reserve_exact(num_values)?;
    while values.len() < num_values {
        let (value, run_length) = decoder.next_run()?.ok_or_else(|| {
            fmt_err!(
                OutOfSpec,
                "packed stream holds {} entries, expected {num_values}",
                values.len()
            )
        })?;
        if run_length > num_values - values.len() {
            return Err(fmt_err!(
                OutOfSpec,
                "packed stream holds more than the expected {num_values} entries"
            ));
        }
        values.extend(std::iter::repeat(value).take(run_length));
    }
    if !decoder.is_exhausted() {
        return Err(fmt_err!(
            OutOfSpec,
            "packed stream has trailing bytes after {num_values} entries"
        ));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::super::encode_u32;
    use super::*;
    use crate::parquet::error::ParquetErrorCause;

    fn pack(values: &[u32], num_bits: u8) -> Vec<u8> {
        let mut buf = vec![];
        encode_u32(&mut buf, values.iter().copied(), num_bits).unwrap();
        buf
    }

    #[test]
    fn decodes_levels() {
        let buf = pack(&[1, 0, 1], 1);
        assert_eq!(decode_u32(&buf, 1, 3).unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn every_width_round_trips() {
        for num_bits in 1..=32u8 {
            let max = if num_bits == 32 { u32::MAX } else { (1u32 << num_bits) - 1 };
            let values = [0, max, max, 1 & max, max / 2, 0, 0];
            let buf = pack(&values, num_bits);
            assert_eq!(decode_u32(&buf, max, values.len()).unwrap(), values);
        }
    }

    #[test]
    fn rejects_width_wider_than_maximum() {
        let buf = pack(&[0, 1], 2);
        assert!(decode_u32(&buf, 1, 2).is_err());
        assert!(decode_u32(&[0], 1, 0).is_err());
    }

    #[test]
    fn rejects_value_above_maximum() {
        // width 2 admits 3, but the dictionary only has 3 entries (max index 2)
        let buf = pack(&[0, 3], 2);
        assert!(decode_u32(&buf, 2, 2).is_err());
    }

    #[test]
    fn rejects_count_mismatch() {
        let buf = pack(&[1, 1, 0], 1);
        assert!(decode_u32(&buf, 1, 2).is_err());
        assert!(decode_u32(&buf, 1, 4).is_err());
    }

    #[test]
    fn rejects_bitpacked_runs() {
        let err = decode_u32(&[1, (1 << 1) | 1, 0xFF], 1, 8).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::Unsupported));
    }

    #[test]
    fn rejects_truncated_run_value() {
        assert!(decode_u32(&[9, 2 << 1, 0x01], 511, 2).is_err());
    }
}
