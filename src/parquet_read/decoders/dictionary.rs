//! Dictionary pages and the packed index streams that refer to them.

use crate::encoding::hybrid_rle::decode_u32;
use crate::parquet::error::{fmt_err, ParquetResult};
use crate::parquet_read::decoders::PlainDecode;
use crate::parquet_read::ColumnType;

/// The decoded entries of a dictionary page, in page order.
#[derive(Debug)]
pub struct Dictionary<T> {
    values: Vec<T>,
}

impl<T: PlainDecode + Clone> Dictionary<T> {
    pub fn try_new(buffer: &[u8], num_values: usize, column_type: ColumnType) -> ParquetResult<Self> {
        let values = T::decode_plain(buffer, num_values, column_type)?;
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Resolves `count` packed indices. Every index must be below the
    /// dictionary size.
    pub fn decode_indices(&self, buffer: &[u8], count: usize) -> ParquetResult<Vec<T>> {
        if self.values.is_empty() {
            return Err(fmt_err!(
                OutOfSpec,
                "dictionary-encoded page refers to an empty dictionary"
            ));
        }
        let max_index = u32::try_from(self.values.len() - 1)
            .map_err(|_| fmt_err!(Overflow, "dictionary of {} entries", self.values.len()))?;
        let indices = decode_u32(buffer, max_index, count)?;
        indices
            .into_iter()
            .map(|index| {
                self.values.get(index as usize).cloned().ok_or_else(|| {
                    fmt_err!(
                        Bounds,
                        "dictionary index {index} is out of range for {} entries",
                        self.values.len()
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hybrid_rle::encode_u32;
    use crate::parquet::ParquetErrorCause;

    fn dictionary() -> Dictionary<i64> {
        let mut buffer = 10i64.to_le_bytes().to_vec();
        buffer.extend_from_slice(&20i64.to_le_bytes());
        Dictionary::try_new(&buffer, 2, ColumnType::Int64).unwrap()
    }

    #[test]
    fn resolves_indices() {
        let mut indices = vec![];
        encode_u32(&mut indices, [1, 0, 0, 1].into_iter(), 1).unwrap();
        assert_eq!(dictionary().decode_indices(&indices, 4).unwrap(), vec![20, 10, 10, 20]);
    }

    #[test]
    fn out_of_range_index_is_a_parse_error() {
        let mut indices = vec![];
        encode_u32(&mut indices, [0, 1, 2].into_iter(), 2).unwrap();
        // width 2 exceeds what a 2-entry dictionary needs
        assert!(dictionary().decode_indices(&indices, 3).is_err());

        // width 1 is legal, but the value 1 with a 1-entry dictionary is not
        let single = Dictionary::<i64>::try_new(&5i64.to_le_bytes(), 1, ColumnType::Int64).unwrap();
        let err = single.decode_indices(&[1, 2, 1], 1).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::OutOfSpec));
    }

    #[test]
    fn empty_dictionary_is_rejected() {
        let empty = Dictionary::<i64>::try_new(&[], 0, ColumnType::Int64).unwrap();
        assert!(empty.decode_indices(&[1, 2, 0], 1).is_err());
    }
}
