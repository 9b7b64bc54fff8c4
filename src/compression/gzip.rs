use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::parquet::error::{fmt_err, ParquetResult};

/// Compresses `input` as one gzip member, appending it to `output`.
pub fn compress(input: &[u8], output: &mut Vec<u8>, level: u8) -> ParquetResult<()> {
    let mut encoder = GzEncoder::new(output, flate2::Compression::new(level as u32));
    encoder.write_all(input)?;
    encoder.finish()?;
    Ok(())
}

/// Inflates `input` into `output`. The stream must produce exactly
/// `output.len()` bytes.
pub fn decompress(input: &[u8], output: &mut [u8]) -> ParquetResult<()> {
    let expected = output.len();
    let mut decoder = GzDecoder::new(input);
    decoder.read_exact(output).map_err(|err| {
        fmt_err!(
            OutOfSpec,
            "gzip stream is shorter than the declared {expected} bytes: {err}"
        )
    })?;
    let mut probe = [0u8; 1];
    let extra = decoder
        .read(&mut probe)
        .map_err(|err| fmt_err!(OutOfSpec, "gzip stream is corrupt: {err}"))?;
    if extra != 0 {
        return Err(fmt_err!(
            OutOfSpec,
            "gzip stream is longer than the declared {expected} bytes"
        ));
    }
    Ok(())
}
