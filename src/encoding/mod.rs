use std::fmt::{Display, Formatter};

use crate::parquet::error::{fmt_err, ParquetError, ParquetResult};

pub mod hybrid_rle;

/// Value and level encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    /// Legacy name for dictionary pages and dictionary indices.
    PlainDictionary,
    Rle,
    BitPacked,
    RleDictionary,
}

impl TryFrom<i32> for Encoding {
    type Error = ParquetError;

    fn try_from(encoding: i32) -> ParquetResult<Self> {
        match encoding {
            0 => Ok(Encoding::Plain),
            2 => Ok(Encoding::PlainDictionary),
            3 => Ok(Encoding::Rle),
            4 => Ok(Encoding::BitPacked),
            8 => Ok(Encoding::RleDictionary),
            // DELTA_BINARY_PACKED, DELTA_LENGTH_BYTE_ARRAY, DELTA_BYTE_ARRAY, BYTE_STREAM_SPLIT
            5..=7 | 9 => Err(fmt_err!(Unsupported, "encoding {encoding} is not supported")),
            _ => Err(fmt_err!(OutOfSpec, "unknown encoding id {encoding}")),
        }
    }
}

impl From<Encoding> for i32 {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Plain => 0,
            Encoding::PlainDictionary => 2,
            Encoding::Rle => 3,
            Encoding::BitPacked => 4,
            Encoding::RleDictionary => 8,
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Encoding::Plain => "PLAIN",
            Encoding::PlainDictionary => "PLAIN_DICTIONARY",
            Encoding::Rle => "RLE",
            Encoding::BitPacked => "BIT_PACKED",
            Encoding::RleDictionary => "RLE_DICTIONARY",
        };
        f.write_str(name)
    }
}

/// Number of bits needed to represent `max`.
#[inline]
pub fn bit_width(max: u64) -> u32 {
    64 - max.leading_zeros()
}

/// Returns the ceil of value / 8
#[inline]
pub fn ceil8(value: usize) -> usize {
    value.div_ceil(8)
}
