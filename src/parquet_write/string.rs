/*******************************************************************************
 *     ___                  _   ____  ____
 *    / _ \ _   _  ___  ___| |_|  _ \| __ )
 *   | | | | | | |/ _ \/ __| __| | | |  _ \
 *   | |_| | |_| |  __/\__ \ |_| |_| | |_) |
 *    \__\_\\__,_|\___||___/\__|____/|____/
 *
 *  Copyright (c) 2014-2019 Appsicle
 *  Copyright (c) 2019-2026 QuestDB
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *  http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 *
 ******************************************************************************/

use std::ops::Range;

use crate::parquet::error::{fmt_err, ParquetResult};
use crate::parquet_write::util::PlainValue;
use crate::table::ColumnAccessor;

const LENGTH_PREFIX_SIZE: usize = std::mem::size_of::<u32>();

impl<'a> PlainValue for &'a [u8] {
    type Key = &'a [u8];

    fn dictionary_key(self) -> &'a [u8] {
        self
    }

    fn plain_size(self) -> usize {
        LENGTH_PREFIX_SIZE + self.len()
    }

    // BYTE_ARRAY: first 4 bytes denote length in little-endian.
    fn encode_plain(self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&(self.len() as u32).to_le_bytes());
        buffer.extend_from_slice(self);
    }
}

/// The non-null string or binary values of `rows`, in row order.
/// Each value must fit the 4-byte length prefix.
pub fn byte_array_values<'a>(
    column: &'a dyn ColumnAccessor,
    rows: Range<usize>,
) -> ParquetResult<Vec<&'a [u8]>> {
    let mut values = Vec::new();
    values.try_reserve_exact(rows.len())?;
    for row in rows.filter(|row| !column.is_null(*row)) {
        let value = column.get_string(row).ok_or_else(|| {
            fmt_err!(Layout, "column {:?} row {row} is not a byte array", column.name())
        })?;
        if value.len() > u32::MAX as usize {
            return Err(fmt_err!(
                Overflow,
                "column {:?} row {row} holds {} bytes, more than a 4-byte length",
                column.name(),
                value.len()
            ));
        }
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parquet_write::util::encode_plain;
    use crate::table::Column;

    #[test]
    fn plain_is_length_prefixed() {
        let column = Column::string("s", vec![Some("ab"), None, Some("")]);
        let values = byte_array_values(&column, 0..3).unwrap();
        assert_eq!(
            encode_plain(&values).unwrap(),
            vec![2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0]
        );
    }
}
