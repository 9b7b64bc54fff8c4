use std::io::Write;

use crate::encoding::{bit_width, ceil8};
use crate::thrift::varint;

/// Smallest width holding `max_value`, at least one bit.
pub fn num_bits_for(max_value: u32) -> u8 {
    bit_width(max_value as u64).max(1) as u8
}

fn write_run<W: Write>(
    writer: &mut W,
    value: u32,
    run_length: usize,
    value_bytes: usize,
) -> std::io::Result<()> {
    let mut container = [0u8; varint::MAX_VARINT_LEN];
    let used = varint::encode((run_length as u64) << 1, &mut container);
    writer.write_all(&container[..used])?;
    writer.write_all(&value.to_le_bytes()[..value_bytes])
}

/// Packs `iterator` with the declared width `num_bits` (1..=32).
/// Values must fit the width.
pub fn encode_u32<W: Write, I: Iterator<Item = u32>>(
    writer: &mut W,
    iterator: I,
    num_bits: u8,
) -> std::io::Result<()> {
    debug_assert!((1..=32).contains(&num_bits));
    writer.write_all(&[num_bits])?;
    let value_bytes = ceil8(num_bits as usize);

    let mut run: Option<(u32, usize)> = None;
    for value in iterator {
        debug_assert!(bit_width(value as u64) <= num_bits as u32);
        run = match run {
            Some((current, length)) if current == value => Some((current, length + 1)),
            Some((current, length)) => {
                write_run(writer, current, length, value_bytes)?;
                Some((value, 1))
            }
            None => Some((value, 1)),
        };
    }
    if let Some((current, length)) = run {
        write_run(writer, current, length, value_bytes)?;
    }
    Ok(())
}

/// Packs definition levels: 1 for present, 0 for null.
pub fn encode_bool<W: Write, I: Iterator<Item = bool>>(
    writer: &mut W,
    iterator: I,
) -> std::io::Result<()> {
    encode_u32(writer, iterator.map(u32::from), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_of_levels() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_bool(&mut vec, [true, false, true].into_iter())?;
        assert_eq!(vec, vec![1, 1 << 1, 1, 1 << 1, 0, 1 << 1, 1]);
        Ok(())
    }

    #[test]
    fn long_run_uses_varint_header() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_u32(&mut vec, std::iter::repeat(5).take(100), 3)?;
        // 200 = 0xC8 0x01 as a varint
        assert_eq!(vec, vec![3, 0xC8, 0x01, 5]);
        Ok(())
    }

    #[test]
    fn wide_values_take_several_bytes() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_u32(&mut vec, [0x0102_0304u32, 7].into_iter(), 25)?;
        assert_eq!(vec, vec![25, 2, 0x04, 0x03, 0x02, 0x01, 2, 7, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn empty_stream_is_only_the_width() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_u32(&mut vec, std::iter::empty(), 1)?;
        assert_eq!(vec, vec![1]);
        Ok(())
    }

    #[test]
    fn widths() {
        assert_eq!(num_bits_for(0), 1);
        assert_eq!(num_bits_for(1), 1);
        assert_eq!(num_bits_for(2), 2);
        assert_eq!(num_bits_for(u32::MAX), 32);
    }
}
