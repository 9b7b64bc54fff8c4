//! File format structures serialized with the compact protocol.
//!
//! Field ids follow the file format definition. Enumerations are carried as raw
//! `i32` ids here; typed views live next to the code that interprets them.
//! Fields this crate does not model are skipped on read.

use crate::parquet::error::ParquetResult;
use crate::thrift::compact::{expect_type, required};
use crate::thrift::{FieldType, TCompactInputProtocol, TCompactOutputProtocol};

fn read_list_of<'a, T>(
    prot: &mut TCompactInputProtocol<'a>,
    struct_name: &str,
    field_id: i16,
    expected: FieldType,
    mut read: impl FnMut(&mut TCompactInputProtocol<'a>) -> ParquetResult<T>,
) -> ParquetResult<Vec<T>> {
    let (element_type, size) = prot.read_list_begin()?;
    if size > 0 {
        expect_type(struct_name, field_id, element_type, expected)?;
    }
    let mut items = Vec::new();
    items.try_reserve_exact(size)?;
    for _ in 0..size {
        items.push(read(prot)?);
    }
    Ok(items)
}

fn write_list_of<T>(
    prot: &mut TCompactOutputProtocol<'_>,
    field_id: i16,
    element_type: FieldType,
    items: &[T],
    mut write: impl FnMut(&mut TCompactOutputProtocol<'_>, &T) -> ParquetResult<()>,
) -> ParquetResult<()> {
    prot.write_field_begin(FieldType::List, field_id);
    prot.write_list_begin(element_type, items.len())?;
    for item in items {
        write(prot, item)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub definition_level_encoding: i32,
    pub repetition_level_encoding: i32,
}

impl DataPageHeader {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        prot.write_i32_field(1, self.num_values);
        prot.write_i32_field(2, self.encoding);
        prot.write_i32_field(3, self.definition_level_encoding);
        prot.write_i32_field(4, self.repetition_level_encoding);
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "DataPageHeader";
        let mut num_values = None;
        let mut encoding = None;
        let mut definition_level_encoding = None;
        let mut repetition_level_encoding = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    num_values = Some(prot.read_i32()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    encoding = Some(prot.read_i32()?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    definition_level_encoding = Some(prot.read_i32()?);
                }
                4 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    repetition_level_encoding = Some(prot.read_i32()?);
                }
                // 5: statistics
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            num_values: required(num_values, NAME, "num_values")?,
            encoding: required(encoding, NAME, "encoding")?,
            definition_level_encoding: required(
                definition_level_encoding,
                NAME,
                "definition_level_encoding",
            )?,
            repetition_level_encoding: required(
                repetition_level_encoding,
                NAME,
                "repetition_level_encoding",
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub is_sorted: Option<bool>,
}

impl DictionaryPageHeader {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        prot.write_i32_field(1, self.num_values);
        prot.write_i32_field(2, self.encoding);
        if let Some(is_sorted) = self.is_sorted {
            prot.write_bool_field(3, is_sorted);
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "DictionaryPageHeader";
        let mut num_values = None;
        let mut encoding = None;
        let mut is_sorted = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    num_values = Some(prot.read_i32()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    encoding = Some(prot.read_i32()?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::Bool)?;
                    is_sorted = Some(prot.read_bool()?);
                }
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            num_values: required(num_values, NAME, "num_values")?,
            encoding: required(encoding, NAME, "encoding")?,
            is_sorted,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub type_: i32,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub crc: Option<i32>,
    pub data_page_header: Option<DataPageHeader>,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
}

impl PageHeader {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        prot.write_i32_field(1, self.type_);
        prot.write_i32_field(2, self.uncompressed_page_size);
        prot.write_i32_field(3, self.compressed_page_size);
        if let Some(crc) = self.crc {
            prot.write_i32_field(4, crc);
        }
        if let Some(header) = &self.data_page_header {
            prot.write_field_begin(FieldType::Struct, 5);
            header.write_to_out_protocol(prot)?;
        }
        if let Some(header) = &self.dictionary_page_header {
            prot.write_field_begin(FieldType::Struct, 7);
            header.write_to_out_protocol(prot)?;
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "PageHeader";
        let mut type_ = None;
        let mut uncompressed_page_size = None;
        let mut compressed_page_size = None;
        let mut crc = None;
        let mut data_page_header = None;
        let mut dictionary_page_header = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    type_ = Some(prot.read_i32()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    uncompressed_page_size = Some(prot.read_i32()?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    compressed_page_size = Some(prot.read_i32()?);
                }
                4 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    crc = Some(prot.read_i32()?);
                }
                5 => {
                    expect_type(NAME, field_id, field_type, FieldType::Struct)?;
                    data_page_header = Some(DataPageHeader::read_from_in_protocol(prot)?);
                }
                7 => {
                    expect_type(NAME, field_id, field_type, FieldType::Struct)?;
                    dictionary_page_header =
                        Some(DictionaryPageHeader::read_from_in_protocol(prot)?);
                }
                // 6: index page header, 8: data page v2 header. The page type decides
                // whether the page is usable.
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            type_: required(type_, NAME, "type")?,
            uncompressed_page_size: required(
                uncompressed_page_size,
                NAME,
                "uncompressed_page_size",
            )?,
            compressed_page_size: required(compressed_page_size, NAME, "compressed_page_size")?,
            crc,
            data_page_header,
            dictionary_page_header,
        })
    }
}

/// The subset of the logical type union this crate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalTypeAnnotation {
    String,
    /// Any other union member, by field id.
    Other(i16),
}

impl LogicalTypeAnnotation {
    const STRING_FIELD_ID: i16 = 1;

    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        let field_id = match self {
            LogicalTypeAnnotation::String => Self::STRING_FIELD_ID,
            LogicalTypeAnnotation::Other(field_id) => *field_id,
        };
        prot.write_struct_begin();
        prot.write_field_begin(FieldType::Struct, field_id);
        prot.write_struct_begin();
        prot.write_struct_end();
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Option<Self>> {
        let mut annotation = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            annotation = Some(if field_id == Self::STRING_FIELD_ID {
                LogicalTypeAnnotation::String
            } else {
                LogicalTypeAnnotation::Other(field_id)
            });
            prot.skip(field_type)?;
        }
        prot.read_struct_end();
        Ok(annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    pub type_: Option<i32>,
    pub type_length: Option<i32>,
    pub repetition_type: Option<i32>,
    pub name: String,
    pub num_children: Option<i32>,
    pub converted_type: Option<i32>,
    pub logical_type: Option<LogicalTypeAnnotation>,
}

impl SchemaElement {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        if let Some(type_) = self.type_ {
            prot.write_i32_field(1, type_);
        }
        if let Some(type_length) = self.type_length {
            prot.write_i32_field(2, type_length);
        }
        if let Some(repetition_type) = self.repetition_type {
            prot.write_i32_field(3, repetition_type);
        }
        prot.write_string_field(4, &self.name);
        if let Some(num_children) = self.num_children {
            prot.write_i32_field(5, num_children);
        }
        if let Some(converted_type) = self.converted_type {
            prot.write_i32_field(6, converted_type);
        }
        if let Some(logical_type) = &self.logical_type {
            prot.write_field_begin(FieldType::Struct, 10);
            logical_type.write_to_out_protocol(prot)?;
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "SchemaElement";
        let mut type_ = None;
        let mut type_length = None;
        let mut repetition_type = None;
        let mut name = None;
        let mut num_children = None;
        let mut converted_type = None;
        let mut logical_type = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    type_ = Some(prot.read_i32()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    type_length = Some(prot.read_i32()?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    repetition_type = Some(prot.read_i32()?);
                }
                4 => {
                    expect_type(NAME, field_id, field_type, FieldType::Binary)?;
                    name = Some(prot.read_string()?);
                }
                5 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    num_children = Some(prot.read_i32()?);
                }
                6 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    converted_type = Some(prot.read_i32()?);
                }
                10 => {
                    expect_type(NAME, field_id, field_type, FieldType::Struct)?;
                    logical_type = LogicalTypeAnnotation::read_from_in_protocol(prot)?;
                }
                // 7 scale, 8 precision, 9 field_id
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            type_,
            type_length,
            repetition_type,
            name: required(name, NAME, "name")?,
            num_children,
            converted_type,
            logical_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        prot.write_string_field(1, &self.key);
        if let Some(value) = &self.value {
            prot.write_string_field(2, value);
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "KeyValue";
        let mut key = None;
        let mut value = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::Binary)?;
                    key = Some(prot.read_string()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::Binary)?;
                    value = Some(prot.read_string()?);
                }
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            key: required(key, NAME, "key")?,
            value,
        })
    }
}

fn write_key_values(
    prot: &mut TCompactOutputProtocol<'_>,
    field_id: i16,
    key_values: &[KeyValue],
) -> ParquetResult<()> {
    write_list_of(prot, field_id, FieldType::Struct, key_values, |prot, kv| {
        kv.write_to_out_protocol(prot)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetaData {
    pub type_: i32,
    pub encodings: Vec<i32>,
    pub path_in_schema: Vec<String>,
    pub codec: i32,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub data_page_offset: i64,
    pub dictionary_page_offset: Option<i64>,
}

impl ColumnMetaData {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        prot.write_i32_field(1, self.type_);
        write_list_of(prot, 2, FieldType::I32, &self.encodings, |prot, encoding| {
            prot.write_i32(*encoding);
            Ok(())
        })?;
        write_list_of(prot, 3, FieldType::Binary, &self.path_in_schema, |prot, part| {
            prot.write_binary(part.as_bytes());
            Ok(())
        })?;
        prot.write_i32_field(4, self.codec);
        prot.write_i64_field(5, self.num_values);
        prot.write_i64_field(6, self.total_uncompressed_size);
        prot.write_i64_field(7, self.total_compressed_size);
        if let Some(key_values) = &self.key_value_metadata {
            write_key_values(prot, 8, key_values)?;
        }
        prot.write_i64_field(9, self.data_page_offset);
        if let Some(offset) = self.dictionary_page_offset {
            prot.write_i64_field(11, offset);
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "ColumnMetaData";
        let mut type_ = None;
        let mut encodings = None;
        let mut path_in_schema = None;
        let mut codec = None;
        let mut num_values = None;
        let mut total_uncompressed_size = None;
        let mut total_compressed_size = None;
        let mut key_value_metadata = None;
        let mut data_page_offset = None;
        let mut dictionary_page_offset = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    type_ = Some(prot.read_i32()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    encodings = Some(read_list_of(prot, NAME, field_id, FieldType::I32, |p| {
                        p.read_i32()
                    })?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    path_in_schema =
                        Some(read_list_of(prot, NAME, field_id, FieldType::Binary, |p| {
                            p.read_string()
                        })?);
                }
                4 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    codec = Some(prot.read_i32()?);
                }
                5 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    num_values = Some(prot.read_i64()?);
                }
                6 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    total_uncompressed_size = Some(prot.read_i64()?);
                }
                7 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    total_compressed_size = Some(prot.read_i64()?);
                }
                8 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    key_value_metadata =
                        Some(read_list_of(prot, NAME, field_id, FieldType::Struct, |p| {
                            KeyValue::read_from_in_protocol(p)
                        })?);
                }
                9 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    data_page_offset = Some(prot.read_i64()?);
                }
                11 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    dictionary_page_offset = Some(prot.read_i64()?);
                }
                // 10 index page offset, 12 statistics, 13 encoding stats, 14 bloom filter
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            type_: required(type_, NAME, "type")?,
            encodings: required(encodings, NAME, "encodings")?,
            path_in_schema: required(path_in_schema, NAME, "path_in_schema")?,
            codec: required(codec, NAME, "codec")?,
            num_values: required(num_values, NAME, "num_values")?,
            total_uncompressed_size: required(
                total_uncompressed_size,
                NAME,
                "total_uncompressed_size",
            )?,
            total_compressed_size: required(total_compressed_size, NAME, "total_compressed_size")?,
            key_value_metadata,
            data_page_offset: required(data_page_offset, NAME, "data_page_offset")?,
            dictionary_page_offset,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChunk {
    pub file_path: Option<String>,
    pub file_offset: i64,
    pub meta_data: Option<ColumnMetaData>,
}

impl ColumnChunk {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        if let Some(file_path) = &self.file_path {
            prot.write_string_field(1, file_path);
        }
        prot.write_i64_field(2, self.file_offset);
        if let Some(meta_data) = &self.meta_data {
            prot.write_field_begin(FieldType::Struct, 3);
            meta_data.write_to_out_protocol(prot)?;
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "ColumnChunk";
        let mut file_path = None;
        let mut file_offset = None;
        let mut meta_data = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::Binary)?;
                    file_path = Some(prot.read_string()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    file_offset = Some(prot.read_i64()?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::Struct)?;
                    meta_data = Some(ColumnMetaData::read_from_in_protocol(prot)?);
                }
                // 4..=9: page index offsets, crypto metadata
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            file_path,
            file_offset: required(file_offset, NAME, "file_offset")?,
            meta_data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
    pub file_offset: Option<i64>,
    pub total_compressed_size: Option<i64>,
    pub ordinal: Option<i16>,
}

impl RowGroup {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        write_list_of(prot, 1, FieldType::Struct, &self.columns, |prot, column| {
            column.write_to_out_protocol(prot)
        })?;
        prot.write_i64_field(2, self.total_byte_size);
        prot.write_i64_field(3, self.num_rows);
        if let Some(file_offset) = self.file_offset {
            prot.write_i64_field(5, file_offset);
        }
        if let Some(total_compressed_size) = self.total_compressed_size {
            prot.write_i64_field(6, total_compressed_size);
        }
        if let Some(ordinal) = self.ordinal {
            prot.write_field_begin(FieldType::I16, 7);
            prot.write_i16(ordinal);
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "RowGroup";
        let mut columns = None;
        let mut total_byte_size = None;
        let mut num_rows = None;
        let mut file_offset = None;
        let mut total_compressed_size = None;
        let mut ordinal = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    columns = Some(read_list_of(prot, NAME, field_id, FieldType::Struct, |p| {
                        ColumnChunk::read_from_in_protocol(p)
                    })?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    total_byte_size = Some(prot.read_i64()?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    num_rows = Some(prot.read_i64()?);
                }
                5 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    file_offset = Some(prot.read_i64()?);
                }
                6 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    total_compressed_size = Some(prot.read_i64()?);
                }
                7 => {
                    expect_type(NAME, field_id, field_type, FieldType::I16)?;
                    ordinal = Some(prot.read_i16()?);
                }
                // 4: sorting columns
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            columns: required(columns, NAME, "columns")?,
            total_byte_size: required(total_byte_size, NAME, "total_byte_size")?,
            num_rows: required(num_rows, NAME, "num_rows")?,
            file_offset,
            total_compressed_size,
            ordinal,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetaData {
    pub version: i32,
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub created_by: Option<String>,
}

impl FileMetaData {
    pub fn write_to_out_protocol(&self, prot: &mut TCompactOutputProtocol<'_>) -> ParquetResult<()> {
        prot.write_struct_begin();
        prot.write_i32_field(1, self.version);
        write_list_of(prot, 2, FieldType::Struct, &self.schema, |prot, element| {
            element.write_to_out_protocol(prot)
        })?;
        prot.write_i64_field(3, self.num_rows);
        write_list_of(prot, 4, FieldType::Struct, &self.row_groups, |prot, row_group| {
            row_group.write_to_out_protocol(prot)
        })?;
        if let Some(key_values) = &self.key_value_metadata {
            write_key_values(prot, 5, key_values)?;
        }
        if let Some(created_by) = &self.created_by {
            prot.write_string_field(6, created_by);
        }
        prot.write_struct_end();
        Ok(())
    }

    pub fn read_from_in_protocol(prot: &mut TCompactInputProtocol<'_>) -> ParquetResult<Self> {
        const NAME: &str = "FileMetaData";
        let mut version = None;
        let mut schema = None;
        let mut num_rows = None;
        let mut row_groups = None;
        let mut key_value_metadata = None;
        let mut created_by = None;
        prot.read_struct_begin();
        while let Some((field_type, field_id)) = prot.read_field_begin()? {
            match field_id {
                1 => {
                    expect_type(NAME, field_id, field_type, FieldType::I32)?;
                    version = Some(prot.read_i32()?);
                }
                2 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    schema = Some(read_list_of(prot, NAME, field_id, FieldType::Struct, |p| {
                        SchemaElement::read_from_in_protocol(p)
                    })?);
                }
                3 => {
                    expect_type(NAME, field_id, field_type, FieldType::I64)?;
                    num_rows = Some(prot.read_i64()?);
                }
                4 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    row_groups =
                        Some(read_list_of(prot, NAME, field_id, FieldType::Struct, |p| {
                            RowGroup::read_from_in_protocol(p)
                        })?);
                }
                5 => {
                    expect_type(NAME, field_id, field_type, FieldType::List)?;
                    key_value_metadata =
                        Some(read_list_of(prot, NAME, field_id, FieldType::Struct, |p| {
                            KeyValue::read_from_in_protocol(p)
                        })?);
                }
                6 => {
                    expect_type(NAME, field_id, field_type, FieldType::Binary)?;
                    created_by = Some(prot.read_string()?);
                }
                _ => prot.skip_unknown(NAME, field_type, field_id)?,
            }
        }
        prot.read_struct_end();
        Ok(Self {
            version: required(version, NAME, "version")?,
            schema: required(schema, NAME, "schema")?,
            num_rows: required(num_rows, NAME, "num_rows")?,
            row_groups: required(row_groups, NAME, "row_groups")?,
            key_value_metadata,
            created_by,
        })
    }
}
