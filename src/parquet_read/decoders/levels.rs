use crate::encoding::hybrid_rle::decode_u32;
use crate::parquet::error::ParquetResult;

/// Maximum definition level of a flat optional column.
pub const MAX_DEF_LEVEL: u32 = 1;

/// Decodes one presence flag per row from a packed level stream.
pub fn decode_def_levels(buffer: &[u8], num_rows: usize) -> ParquetResult<Vec<bool>> {
    if num_rows == 0 && buffer.is_empty() {
        return Ok(Vec::new());
    }
    let levels = decode_u32(buffer, MAX_DEF_LEVEL, num_rows)?;
    Ok(levels.into_iter().map(|level| level == MAX_DEF_LEVEL).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hybrid_rle::encode_bool;

    #[test]
    fn decodes_presence() {
        let mut buffer = vec![];
        encode_bool(&mut buffer, [true, false, true].into_iter()).unwrap();
        assert_eq!(decode_def_levels(&buffer, 3).unwrap(), vec![true, false, true]);
        assert!(decode_def_levels(&buffer, 4).is_err());
        assert!(decode_def_levels(&buffer, 2).is_err());
    }

    #[test]
    fn level_above_one_is_rejected() {
        // width 2, run of 3 at level 2
        assert!(decode_def_levels(&[2, 6, 2], 3).is_err());
    }
}
