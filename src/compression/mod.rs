//! Page compression codecs.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::parquet::error::{fmt_err, ParquetError, ParquetResult};

pub mod gzip;
pub mod snappy;

/// Codec id recorded per column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    Uncompressed,
    Snappy,
    Gzip,
}

impl TryFrom<i32> for Compression {
    type Error = ParquetError;

    fn try_from(codec: i32) -> ParquetResult<Self> {
        match codec {
            0 => Ok(Compression::Uncompressed),
            1 => Ok(Compression::Snappy),
            2 => Ok(Compression::Gzip),
            // LZO, BROTLI, LZ4, ZSTD, LZ4_RAW
            3..=7 => Err(fmt_err!(Unsupported, "compression codec {codec} is not supported")),
            _ => Err(fmt_err!(OutOfSpec, "unknown compression codec id {codec}")),
        }
    }
}

impl From<Compression> for i32 {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Uncompressed => 0,
            Compression::Snappy => 1,
            Compression::Gzip => 2,
        }
    }
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Compression::Uncompressed => "UNCOMPRESSED",
            Compression::Snappy => "SNAPPY",
            Compression::Gzip => "GZIP",
        };
        f.write_str(name)
    }
}

/// Deflate level, 0 (store) to 9 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GzipLevel(u8);

impl GzipLevel {
    pub const MAX: u8 = 9;

    pub fn try_new(level: u8) -> ParquetResult<Self> {
        if level > Self::MAX {
            return Err(fmt_err!(
                Layout,
                "gzip level {level} is out of range 0..={}",
                Self::MAX
            ));
        }
        Ok(Self(level))
    }

    pub fn compression_level(&self) -> u8 {
        self.0
    }
}

impl Default for GzipLevel {
    fn default() -> Self {
        Self(6)
    }
}

/// File-wide compression setting chosen at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionOptions {
    #[default]
    Uncompressed,
    Snappy,
    Gzip(Option<GzipLevel>),
}

impl From<CompressionOptions> for Compression {
    fn from(options: CompressionOptions) -> Self {
        match options {
            CompressionOptions::Uncompressed => Compression::Uncompressed,
            CompressionOptions::Snappy => Compression::Snappy,
            CompressionOptions::Gzip(_) => Compression::Gzip,
        }
    }
}

impl FromStr for CompressionOptions {
    type Err = ParquetError;

    /// Accepts `uncompressed`, `none`, `snappy`, `gzip`, `deflate` and `gzip:<level>`.
    fn from_str(s: &str) -> ParquetResult<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let (name, level) = match normalized.split_once(':') {
            Some((name, level)) => (name, Some(level)),
            None => (normalized.as_str(), None),
        };
        let options = match name {
            "uncompressed" | "none" => CompressionOptions::Uncompressed,
            "snappy" => CompressionOptions::Snappy,
            "gzip" | "deflate" => CompressionOptions::Gzip(None),
            _ => return Err(fmt_err!(Layout, "unknown compression {s:?}")),
        };
        match (options, level) {
            (_, None) => Ok(options),
            (CompressionOptions::Gzip(_), Some(level)) => {
                let level: u8 = level
                    .parse()
                    .map_err(|_| fmt_err!(Layout, "invalid gzip level {level:?}"))?;
                Ok(CompressionOptions::Gzip(Some(GzipLevel::try_new(level)?)))
            }
            (_, Some(_)) => Err(fmt_err!(Layout, "compression {name:?} takes no level")),
        }
    }
}

impl Display for CompressionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionOptions::Uncompressed => f.write_str("uncompressed"),
            CompressionOptions::Snappy => f.write_str("snappy"),
            CompressionOptions::Gzip(None) => f.write_str("gzip"),
            CompressionOptions::Gzip(Some(level)) => {
                write!(f, "gzip:{}", level.compression_level())
            }
        }
    }
}

/// Compresses `input`, appending the result to `output`.
pub fn compress(
    options: CompressionOptions,
    input: &[u8],
    output: &mut Vec<u8>,
) -> ParquetResult<()> {
    match options {
        CompressionOptions::Uncompressed => {
            output.try_reserve(input.len())?;
            output.extend_from_slice(input);
            Ok(())
        }
        CompressionOptions::Snappy => snappy::compress(input, output),
        CompressionOptions::Gzip(level) => {
            gzip::compress(input, output, level.unwrap_or_default().compression_level())
        }
    }
}

/// Decompresses `input` into `output`, which must be sized to the declared
/// uncompressed length. Fails unless exactly that many bytes are produced.
pub fn decompress(compression: Compression, input: &[u8], output: &mut [u8]) -> ParquetResult<()> {
    match compression {
        Compression::Uncompressed => {
            if input.len() != output.len() {
                return Err(fmt_err!(
                    OutOfSpec,
                    "uncompressed page holds {} bytes, header declares {}",
                    input.len(),
                    output.len()
                ));
            }
            output.copy_from_slice(input);
            Ok(())
        }
        Compression::Snappy => snappy::decompress(input, output),
        Compression::Gzip => gzip::decompress(input, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compression_names() {
        assert_eq!(
            "none".parse::<CompressionOptions>().unwrap(),
            CompressionOptions::Uncompressed
        );
        assert_eq!(
            "Snappy".parse::<CompressionOptions>().unwrap(),
            CompressionOptions::Snappy
        );
        assert_eq!(
            "deflate".parse::<CompressionOptions>().unwrap(),
            CompressionOptions::Gzip(None)
        );
        let level = "gzip:9".parse::<CompressionOptions>().unwrap();
        assert_eq!(level, CompressionOptions::Gzip(Some(GzipLevel::try_new(9).unwrap())));
        assert_eq!(level.to_string(), "gzip:9");
    }

    #[test]
    fn rejects_bad_compression_names() {
        assert!("zstd".parse::<CompressionOptions>().is_err());
        assert!("gzip:10".parse::<CompressionOptions>().is_err());
        assert!("snappy:1".parse::<CompressionOptions>().is_err());
    }

    #[test]
    fn codec_ids() {
        for compression in [Compression::Uncompressed, Compression::Snappy, Compression::Gzip] {
            let id: i32 = compression.into();
            assert_eq!(Compression::try_from(id).unwrap(), compression);
        }
        assert!(Compression::try_from(6).is_err());
        assert!(Compression::try_from(-1).is_err());
    }

    #[test]
    fn uncompressed_requires_exact_size() {
        let mut output = vec![0u8; 4];
        assert!(decompress(Compression::Uncompressed, b"abc", &mut output).is_err());
        decompress(Compression::Uncompressed, b"abcd", &mut output).unwrap();
        assert_eq!(output, b"abcd");
    }
}
