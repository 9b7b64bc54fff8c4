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

use std::io::{Read, Seek, SeekFrom};

use crate::parquet::error::{fmt_err, ParquetResult};

/// Reads exactly `len` bytes starting at `offset` into `buffer`, replacing its contents.
///
/// Fails with `Bounds` if the range does not lie within `file_size`, before any
/// allocation or read is attempted.
pub fn read_range_into<R: Read + Seek>(
    reader: &mut R,
    file_size: u64,
    offset: u64,
    len: u64,
    buffer: &mut Vec<u8>,
) -> ParquetResult<()> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| fmt_err!(Overflow, "byte range {offset}+{len} overflows"))?;
    if end > file_size {
        return Err(fmt_err!(
            Bounds,
            "byte range {offset}..{end} exceeds file size {file_size}"
        ));
    }
    let len = usize::try_from(len)
        .map_err(|_| fmt_err!(Overflow, "byte range length {len} is not addressable"))?;

    buffer.clear();
    buffer.try_reserve_exact(len)?;
    reader.seek(SeekFrom::Start(offset))?;
    reader.take(len as u64).read_to_end(buffer)?;
    if buffer.len() != len {
        return Err(fmt_err!(
            OutOfSpec,
            "expected {len} bytes at offset {offset}, read {}",
            buffer.len()
        ));
    }
    Ok(())
}

/// Size of a seekable handle. Leaves the cursor at the end.
pub fn stream_len<R: Seek>(reader: &mut R) -> ParquetResult<u64> {
    Ok(reader.seek(SeekFrom::End(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parquet::error::ParquetErrorCause;
    use std::io::Cursor;

    #[test]
    fn reads_exact_range() {
        let data: Vec<u8> = (0u8..32).collect();
        let mut cursor = Cursor::new(&data);
        let mut buf = vec![0xAA; 3];
        read_range_into(&mut cursor, 32, 4, 5, &mut buf).unwrap();
        assert_eq!(buf, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn rejects_range_past_end() {
        let data = [0u8; 8];
        let mut cursor = Cursor::new(&data);
        let mut buf = vec![];
        let err = read_range_into(&mut cursor, 8, 6, 4, &mut buf).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::Bounds));
    }
}
