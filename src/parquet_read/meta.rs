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

use std::io::{Read, Seek};

use log::debug;

use crate::format::{FileMetaData, LogicalTypeAnnotation, SchemaElement};
use crate::parquet::error::{fmt_err, ParquetErrorExt, ParquetResult};
use crate::parquet::io::{read_range_into, stream_len};
use crate::parquet::{FOOTER_SIZE, PARQUET_MAGIC};
use crate::parquet_read::ParquetDecoder;
use crate::parquet_write::schema::{PhysicalType, Repetition, CONVERTED_TYPE_UTF8};
use crate::table::LogicalType;
use crate::thrift::TCompactInputProtocol;

/// How a column's values are laid out on disk, which fixes the logical type
/// they decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 4-byte integers, widened to int64.
    Int32,
    Int64,
    /// 4-byte floats, widened to float64.
    Float,
    Double,
    /// Byte arrays annotated as UTF-8.
    Utf8,
    Binary,
}

impl ColumnType {
    pub fn logical_type(self) -> LogicalType {
        match self {
            ColumnType::Int32 | ColumnType::Int64 => LogicalType::Int64,
            ColumnType::Float | ColumnType::Double => LogicalType::Float64,
            ColumnType::Utf8 => LogicalType::String,
            ColumnType::Binary => LogicalType::Binary,
        }
    }

    pub fn physical_type(self) -> PhysicalType {
        match self {
            ColumnType::Int32 => PhysicalType::Int32,
            ColumnType::Int64 => PhysicalType::Int64,
            ColumnType::Float => PhysicalType::Float,
            ColumnType::Double => PhysicalType::Double,
            ColumnType::Utf8 | ColumnType::Binary => PhysicalType::ByteArray,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    // None means unsupported column type
    pub column_type: Option<ColumnType>,
    /// Raw physical type id from the schema.
    pub physical_type: i32,
    pub repetition: Repetition,
}

impl ColumnMeta {
    pub fn is_optional(&self) -> bool {
        self.repetition == Repetition::Optional
    }

    fn from_schema_element(element: &SchemaElement) -> ParquetResult<Self> {
        let physical_type = element.type_.ok_or_else(|| {
            fmt_err!(OutOfSpec, "leaf column {:?} has no physical type", element.name)
        })?;
        if element.num_children.is_some_and(|children| children > 0) {
            return Err(fmt_err!(
                Unsupported,
                "nested column {:?} is not supported",
                element.name
            ));
        }
        // A missing repetition reads as required.
        let repetition = element
            .repetition_type
            .map(Repetition::try_from)
            .transpose()?
            .unwrap_or(Repetition::Required);
        let is_utf8 = element.converted_type == Some(CONVERTED_TYPE_UTF8)
            || element.logical_type == Some(LogicalTypeAnnotation::String);

        let column_type = match (repetition, PhysicalType::try_from(physical_type)) {
            (Repetition::Repeated, _) | (_, Err(_)) => None,
            (_, Ok(PhysicalType::Int32)) => Some(ColumnType::Int32),
            (_, Ok(PhysicalType::Int64)) => Some(ColumnType::Int64),
            (_, Ok(PhysicalType::Float)) => Some(ColumnType::Float),
            (_, Ok(PhysicalType::Double)) => Some(ColumnType::Double),
            (_, Ok(PhysicalType::ByteArray)) if is_utf8 => Some(ColumnType::Utf8),
            (_, Ok(PhysicalType::ByteArray)) => Some(ColumnType::Binary),
            (_, Ok(_)) => None,
        };
        Ok(Self {
            name: element.name.clone(),
            column_type,
            physical_type,
            repetition,
        })
    }
}

/// Reads and validates the trailing footer: leading and trailing magic, the
/// metadata length and the metadata itself. Returns the metadata and the
/// offset where it starts.
pub fn read_metadata_with_size<R: Read + Seek>(
    reader: &mut R,
    file_size: u64,
) -> ParquetResult<(FileMetaData, u64)> {
    let min_size = PARQUET_MAGIC.len() as u64 + FOOTER_SIZE;
    if file_size < min_size {
        return Err(fmt_err!(
            OutOfSpec,
            "file of {file_size} bytes is smaller than the {min_size}-byte header and footer"
        ));
    }

    let mut buffer = Vec::new();
    read_range_into(reader, file_size, 0, PARQUET_MAGIC.len() as u64, &mut buffer)?;
    if buffer != PARQUET_MAGIC {
        return Err(fmt_err!(OutOfSpec, "file does not start with the PAR1 magic"));
    }

    read_range_into(reader, file_size, file_size - FOOTER_SIZE, FOOTER_SIZE, &mut buffer)?;
    if buffer[4..] != PARQUET_MAGIC {
        return Err(fmt_err!(OutOfSpec, "file does not end with the PAR1 magic"));
    }
    let metadata_len = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as u64;
    if metadata_len + min_size > file_size {
        return Err(fmt_err!(
            OutOfSpec,
            "footer declares {metadata_len} metadata bytes, the file has {file_size}"
        ));
    }

    let metadata_start = file_size - FOOTER_SIZE - metadata_len;
    read_range_into(reader, file_size, metadata_start, metadata_len, &mut buffer)?;
    let mut prot = TCompactInputProtocol::new(&buffer);
    let metadata = FileMetaData::read_from_in_protocol(&mut prot).context("could not parse file metadata")?;
    Ok((metadata, metadata_start))
}

impl ParquetDecoder {
    /// Parses the footer of the file behind `reader`.
    pub fn read<R: Read + Seek>(reader: &mut R) -> ParquetResult<Self> {
        let file_size = stream_len(reader)?;
        Self::read_with_size(reader, file_size)
    }

    pub fn read_with_size<R: Read + Seek>(reader: &mut R, file_size: u64) -> ParquetResult<Self> {
        let (metadata, data_end) = read_metadata_with_size(reader, file_size)?;
        Self::from_metadata(metadata, file_size, data_end)
    }

    fn from_metadata(metadata: FileMetaData, file_size: u64, data_end: u64) -> ParquetResult<Self> {
        let (root, leaves) = metadata
            .schema
            .split_first()
            .ok_or_else(|| fmt_err!(OutOfSpec, "file schema is empty"))?;
        let declared_children = root.num_children.unwrap_or(0);
        if usize::try_from(declared_children).ok() != Some(leaves.len()) {
            return Err(fmt_err!(
                OutOfSpec,
                "schema root declares {declared_children} columns, the schema lists {}",
                leaves.len()
            ));
        }
        let columns = leaves
            .iter()
            .map(ColumnMeta::from_schema_element)
            .collect::<ParquetResult<Vec<_>>>()?;
        let col_count = u32::try_from(columns.len())
            .map_err(|_| fmt_err!(Overflow, "{} columns", columns.len()))?;

        let mut row_group_sizes = Vec::with_capacity(metadata.row_groups.len());
        let mut row_group_sizes_acc = Vec::with_capacity(metadata.row_groups.len());
        let mut accumulated_size = 0usize;
        for (index, row_group) in metadata.row_groups.iter().enumerate() {
            if row_group.columns.len() != columns.len() {
                return Err(fmt_err!(
                    OutOfSpec,
                    "row group {index} has {} column chunks, the schema has {} columns",
                    row_group.columns.len(),
                    columns.len()
                ));
            }
            let row_group_size = u32::try_from(row_group.num_rows).map_err(|_| {
                fmt_err!(OutOfSpec, "row group {index} declares {} rows", row_group.num_rows)
            })?;
            row_group_sizes_acc.push(accumulated_size);
            row_group_sizes.push(row_group_size);
            accumulated_size = accumulated_size
                .checked_add(row_group_size as usize)
                .ok_or_else(|| fmt_err!(Overflow, "total row count overflows"))?;
        }
        if i64::try_from(accumulated_size).ok() != Some(metadata.num_rows) {
            return Err(fmt_err!(
                OutOfSpec,
                "row groups hold {accumulated_size} rows, the file declares {}",
                metadata.num_rows
            ));
        }
        let row_group_count = u32::try_from(row_group_sizes.len())
            .map_err(|_| fmt_err!(Overflow, "{} row groups", row_group_sizes.len()))?;

        debug!(
            "read footer: {} row groups, {} columns, {} rows",
            row_group_count, col_count, accumulated_size
        );
        Ok(Self {
            col_count,
            row_count: accumulated_size,
            row_group_count,
            row_group_sizes,
            columns,
            metadata,
            file_size,
            data_end,
            row_group_sizes_acc,
        })
    }

    /// Index of the first row of `row_group` within the file.
    pub fn row_group_start(&self, row_group: usize) -> Option<usize> {
        self.row_group_sizes_acc.get(row_group).copied()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn created_by(&self) -> Option<&str> {
        self.metadata.created_by.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parquet::ParquetErrorCause;
    use crate::parquet_write::ParquetWriter;
    use crate::table::{Column, Table};
    use std::io::Cursor;

    fn file_bytes() -> Vec<u8> {
        let table = Table::try_new(vec![
            Column::int64("id", vec![Some(1), None, Some(3)]),
            Column::string("label", vec![Some("a"), Some("a"), Some("b")]),
            Column::binary("raw", vec![Some(vec![0xFF]), None, Some(vec![])]),
        ])
        .unwrap();
        let mut bytes = vec![];
        ParquetWriter::new(&mut bytes).with_row_group_size(Some(2)).finish(&table).unwrap();
        bytes
    }

    #[test]
    fn reads_schema_and_row_groups() {
        let bytes = file_bytes();
        let decoder = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(decoder.col_count, 3);
        assert_eq!(decoder.row_count, 3);
        assert_eq!(decoder.row_group_sizes, vec![2, 1]);
        assert_eq!(decoder.row_group_start(1), Some(2));
        assert_eq!(decoder.columns[0].column_type, Some(ColumnType::Int64));
        assert!(decoder.columns[0].is_optional());
        assert_eq!(decoder.columns[1].column_type, Some(ColumnType::Utf8));
        assert!(!decoder.columns[1].is_optional());
        assert_eq!(decoder.columns[2].column_type, Some(ColumnType::Binary));
        assert_eq!(decoder.column_index("label"), Some(1));
        assert!(decoder.created_by().unwrap().starts_with("colframe version"));
    }

    #[test]
    fn rejects_bad_magic_and_short_files() {
        let mut bytes = file_bytes();
        let len = bytes.len();
        bytes[len - 1] = b'0';
        let err = ParquetDecoder::read(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err.cause(), ParquetErrorCause::OutOfSpec));

        let mut bytes = file_bytes();
        bytes[0] = b'X';
        assert!(ParquetDecoder::read(&mut Cursor::new(&bytes)).is_err());

        assert!(ParquetDecoder::read(&mut Cursor::new(b"PAR1PAR1")).is_err());
    }

    #[test]
    fn rejects_oversized_metadata_length() {
        let mut bytes = file_bytes();
        let at = bytes.len() - 8;
        let len = bytes.len() as u32;
        bytes[at..at + 4].copy_from_slice(&len.to_le_bytes());
        assert!(ParquetDecoder::read(&mut Cursor::new(&bytes)).is_err());
    }

    #[test]
    fn unsupported_types_are_marked_per_column() {
        let element = SchemaElement {
            type_: Some(PhysicalType::Boolean.into()),
            type_length: None,
            repetition_type: Some(Repetition::Required.into()),
            name: "flag".to_string(),
            num_children: None,
            converted_type: None,
            logical_type: None,
        };
        let meta = ColumnMeta::from_schema_element(&element).unwrap();
        assert_eq!(meta.column_type, None);

        let repeated = SchemaElement {
            type_: Some(PhysicalType::Int64.into()),
            repetition_type: Some(Repetition::Repeated.into()),
            ..element.clone()
        };
        assert_eq!(ColumnMeta::from_schema_element(&repeated).unwrap().column_type, None);

        let widened = SchemaElement {
            type_: Some(PhysicalType::Int32.into()),
            ..element
        };
        let meta = ColumnMeta::from_schema_element(&widened).unwrap();
        assert_eq!(meta.column_type.unwrap().logical_type(), LogicalType::Int64);
    }

    #[test]
    fn byte_arrays_need_a_text_annotation_to_be_strings() {
        let element = SchemaElement {
            type_: Some(PhysicalType::ByteArray.into()),
            type_length: None,
            repetition_type: None,
            name: "payload".to_string(),
            num_children: None,
            converted_type: None,
            logical_type: None,
        };
        let meta = ColumnMeta::from_schema_element(&element).unwrap();
        assert_eq!(meta.column_type, Some(ColumnType::Binary));
        assert!(!meta.is_optional());

        let annotated = SchemaElement {
            logical_type: Some(LogicalTypeAnnotation::String),
            ..element.clone()
        };
        assert_eq!(
            ColumnMeta::from_schema_element(&annotated).unwrap().column_type,
            Some(ColumnType::Utf8)
        );

        let converted = SchemaElement {
            converted_type: Some(CONVERTED_TYPE_UTF8),
            ..element
        };
        assert_eq!(
            ColumnMeta::from_schema_element(&converted).unwrap().column_type,
            Some(ColumnType::Utf8)
        );
    }
}
