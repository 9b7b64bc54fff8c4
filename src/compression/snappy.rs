//! Block format of the Snappy compressor.
//!
//! A block is the uncompressed length as a varint followed by tagged elements.
//! The low two bits of each tag select a literal run or one of three copy forms:
//!
//! | tag & 3 | element | length | offset |
//! |---|---|---|---|
//! | `00` | literal | `(tag >> 2) + 1`, or 1..=4 trailing bytes when `tag >> 2 >= 60` | |
//! | `01` | copy | `4 + ((tag >> 2) & 7)` | `(tag >> 5) << 8` + 1 byte |
//! | `10` | copy | `(tag >> 2) + 1` | 2 bytes LE |
//! | `11` | copy | `(tag >> 2) + 1` | 4 bytes LE |

use crate::parquet::error::{fmt_err, ParquetResult};
use crate::thrift::varint;

const TAG_LITERAL: u8 = 0b00;
const TAG_COPY1: u8 = 0b01;
const TAG_COPY2: u8 = 0b10;
const TAG_COPY4: u8 = 0b11;

const MIN_MATCH: usize = 4;
const MAX_COPY2_LEN: usize = 64;
const MAX_COPY2_OFFSET: usize = u16::MAX as usize;
const MAX_COPY1_OFFSET: usize = 2047;
const MAX_HASH_BITS: u32 = 14;

/// Reservation hint for the compressed size of `input_len` bytes.
pub fn max_compressed_len(input_len: usize) -> usize {
    32 + input_len + input_len / 6
}

#[inline]
fn load_u32(input: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([input[pos], input[pos + 1], input[pos + 2], input[pos + 3]])
}

#[inline]
fn hash(value: u32, shift: u32) -> usize {
    (value.wrapping_mul(0x1E35_A7BD) >> shift) as usize
}

fn emit_literal(literal: &[u8], output: &mut Vec<u8>) {
    if literal.is_empty() {
        return;
    }
    let n = literal.len() - 1;
    if n < 60 {
        output.push(((n as u8) << 2) | TAG_LITERAL);
    } else {
        let len_bytes = (n as u32).to_le_bytes();
        let count = match n {
            0..=0xFF => 1,
            0x100..=0xFFFF => 2,
            0x1_0000..=0xFF_FFFF => 3,
            _ => 4,
        };
        output.push(((59 + count as u8) << 2) | TAG_LITERAL);
        output.extend_from_slice(&len_bytes[..count]);
    }
    output.extend_from_slice(literal);
}

fn emit_copy(offset: usize, mut len: usize, output: &mut Vec<u8>) {
    while len > 0 {
        let chunk = len.min(MAX_COPY2_LEN);
        if (MIN_MATCH..=11).contains(&chunk) && offset <= MAX_COPY1_OFFSET {
            output.push(
                (((offset >> 8) as u8) << 5) | (((chunk - MIN_MATCH) as u8) << 2) | TAG_COPY1,
            );
            output.push(offset as u8);
        } else {
            output.push((((chunk - 1) as u8) << 2) | TAG_COPY2);
            output.extend_from_slice(&(offset as u16).to_le_bytes());
        }
        len -= chunk;
    }
}

/// Compresses `input`, appending the block to `output`.
///
/// A greedy single-probe hash matcher finds back-references of at least four
/// bytes within the last 64 KiB; everything else is emitted as literals.
pub fn compress(input: &[u8], output: &mut Vec<u8>) -> ParquetResult<()> {
    if input.len() > u32::MAX as usize {
        return Err(fmt_err!(
            Overflow,
            "snappy block of {} bytes exceeds the 32-bit length limit",
            input.len()
        ));
    }
    output.try_reserve(max_compressed_len(input.len()))?;
    varint::write_uvarint(output, input.len() as u64);

    if input.len() < MIN_MATCH {
        emit_literal(input, output);
        return Ok(());
    }

    let hash_bits = (usize::BITS - input.len().leading_zeros()).clamp(8, MAX_HASH_BITS);
    let shift = 32 - hash_bits;
    let mut table = vec![usize::MAX; 1 << hash_bits];

    let mut literal_start = 0;
    let mut pos = 0;
    while pos + MIN_MATCH <= input.len() {
        let current = load_u32(input, pos);
        let slot = hash(current, shift);
        let candidate = table[slot];
        table[slot] = pos;

        let is_match = candidate != usize::MAX
            && pos - candidate <= MAX_COPY2_OFFSET
            && load_u32(input, candidate) == current;
        if !is_match {
            pos += 1;
            continue;
        }

        let mut match_len = MIN_MATCH;
        while pos + match_len < input.len() && input[candidate + match_len] == input[pos + match_len]
        {
            match_len += 1;
        }
        emit_literal(&input[literal_start..pos], output);
        emit_copy(pos - candidate, match_len, output);
        pos += match_len;
        literal_start = pos;
    }
    emit_literal(&input[literal_start..], output);
    Ok(())
}

/// Reads the uncompressed length from the block header.
pub fn decompress_len(input: &[u8]) -> ParquetResult<usize> {
    let (declared, _) = read_header(input)?;
    Ok(declared)
}

fn read_header(input: &[u8]) -> ParquetResult<(usize, usize)> {
    let (declared, header_len) = varint::read_uvarint(input)?;
    if declared > u32::MAX as u64 {
        return Err(fmt_err!(
            OutOfSpec,
            "snappy block declares {declared} bytes, more than 32 bits"
        ));
    }
    Ok((declared as usize, header_len))
}

fn take<'a>(input: &'a [u8], pos: &mut usize, n: usize) -> ParquetResult<&'a [u8]> {
    if n > input.len() - *pos {
        return Err(fmt_err!(
            OutOfSpec,
            "snappy block truncated at byte {}, {n} more bytes needed",
            *pos
        ));
    }
    let bytes = &input[*pos..*pos + n];
    *pos += n;
    Ok(bytes)
}

fn le_usize(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rev()
        .fold(0usize, |acc, &byte| (acc << 8) | byte as usize)
}

/// Decompresses a block into `output`, whose length must equal the declared
/// uncompressed length.
pub fn decompress(input: &[u8], output: &mut [u8]) -> ParquetResult<()> {
    let (declared, mut pos) = read_header(input)?;
    if declared != output.len() {
        return Err(fmt_err!(
            OutOfSpec,
            "snappy block declares {declared} bytes, page header declares {}",
            output.len()
        ));
    }

    let mut written = 0usize;
    while pos < input.len() {
        let tag = input[pos];
        pos += 1;
        let (len, offset) = match tag & 0b11 {
            TAG_LITERAL => {
                let mut len = (tag >> 2) as usize;
                if len >= 60 {
                    len = le_usize(take(input, &mut pos, len - 59)?);
                }
                let len = len + 1;
                let literal = take(input, &mut pos, len)?;
                if len > output.len() - written {
                    return Err(fmt_err!(
                        Bounds,
                        "snappy literal of {len} bytes overruns output at {written}"
                    ));
                }
                output[written..written + len].copy_from_slice(literal);
                written += len;
                continue;
            }
            TAG_COPY1 => {
                let len = MIN_MATCH + ((tag >> 2) & 0b111) as usize;
                let low = take(input, &mut pos, 1)?[0] as usize;
                (len, (((tag >> 5) as usize) << 8) | low)
            }
            TAG_COPY2 => {
                let len = (tag >> 2) as usize + 1;
                (len, le_usize(take(input, &mut pos, 2)?))
            }
            _ => {
                debug_assert_eq!(tag & 0b11, TAG_COPY4);
                let len = (tag >> 2) as usize + 1;
                (len, le_usize(take(input, &mut pos, 4)?))
            }
        };

        if offset == 0 || offset > written {
            return Err(fmt_err!(
                OutOfSpec,
                "snappy copy offset {offset} is invalid with {written} bytes decoded"
            ));
        }
        if len > output.len() - written {
            return Err(fmt_err!(
                Bounds,
                "snappy copy of {len} bytes overruns output at {written}"
            ));
        }
        // Source and destination may overlap; each byte must see the previous ones.
        for i in written..written + len {
            output[i] = output[i - offset];
        }
        written += len;
    }

    if written != output.len() {
        return Err(fmt_err!(
            OutOfSpec,
            "snappy block decoded {written} bytes, declared {}",
            output.len()
        ));
    }
    Ok(())
}
