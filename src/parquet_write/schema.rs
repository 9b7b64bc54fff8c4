use std::collections::HashSet;

use crate::format::{LogicalTypeAnnotation, SchemaElement};
use crate::parquet::error::{fmt_err, ParquetError, ParquetResult};
use crate::table::{LogicalType, TableAccessor};

/// Converted type id of UTF-8 strings.
pub const CONVERTED_TYPE_UTF8: i32 = 0;

/// Name of the schema root element.
pub const ROOT_NAME: &str = "schema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl TryFrom<i32> for PhysicalType {
    type Error = ParquetError;

    fn try_from(type_: i32) -> ParquetResult<Self> {
        Ok(match type_ {
            0 => PhysicalType::Boolean,
            1 => PhysicalType::Int32,
            2 => PhysicalType::Int64,
            3 => PhysicalType::Int96,
            4 => PhysicalType::Float,
            5 => PhysicalType::Double,
            6 => PhysicalType::ByteArray,
            7 => PhysicalType::FixedLenByteArray,
            _ => return Err(fmt_err!(OutOfSpec, "unknown physical type {type_}")),
        })
    }
}

impl From<PhysicalType> for i32 {
    fn from(physical_type: PhysicalType) -> Self {
        match physical_type {
            PhysicalType::Boolean => 0,
            PhysicalType::Int32 => 1,
            PhysicalType::Int64 => 2,
            PhysicalType::Int96 => 3,
            PhysicalType::Float => 4,
            PhysicalType::Double => 5,
            PhysicalType::ByteArray => 6,
            PhysicalType::FixedLenByteArray => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    Required,
    Optional,
    Repeated,
}

impl TryFrom<i32> for Repetition {
    type Error = ParquetError;

    fn try_from(repetition: i32) -> ParquetResult<Self> {
        Ok(match repetition {
            0 => Repetition::Required,
            1 => Repetition::Optional,
            2 => Repetition::Repeated,
            _ => return Err(fmt_err!(OutOfSpec, "unknown repetition {repetition}")),
        })
    }
}

impl From<Repetition> for i32 {
    fn from(repetition: Repetition) -> Self {
        match repetition {
            Repetition::Required => 0,
            Repetition::Optional => 1,
            Repetition::Repeated => 2,
        }
    }
}

/// One leaf column of a file schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub logical_type: LogicalType,
    pub physical_type: PhysicalType,
    pub repetition: Repetition,
}

impl ColumnDescriptor {
    pub fn try_new(name: &str, logical_type: LogicalType, nullable: bool) -> ParquetResult<Self> {
        let physical_type = match logical_type {
            LogicalType::Int64 => PhysicalType::Int64,
            LogicalType::Float64 => PhysicalType::Double,
            LogicalType::String | LogicalType::Binary => PhysicalType::ByteArray,
            LogicalType::Boolean => {
                return Err(fmt_err!(
                    Unsupported,
                    "column {name:?} has type {logical_type}, which cannot be stored"
                ))
            }
        };
        let repetition = if nullable { Repetition::Optional } else { Repetition::Required };
        Ok(Self {
            name: name.to_string(),
            logical_type,
            physical_type,
            repetition,
        })
    }

    pub fn is_optional(&self) -> bool {
        self.repetition == Repetition::Optional
    }

    pub fn to_schema_element(&self) -> SchemaElement {
        let is_string = self.logical_type == LogicalType::String;
        SchemaElement {
            type_: Some(self.physical_type.into()),
            type_length: None,
            repetition_type: Some(self.repetition.into()),
            name: self.name.clone(),
            num_children: None,
            converted_type: is_string.then_some(CONVERTED_TYPE_UTF8),
            logical_type: is_string.then_some(LogicalTypeAnnotation::String),
        }
    }
}

/// Derives the file schema of `table`. Fails before anything is written when a
/// column cannot be stored or names repeat.
pub fn to_parquet_schema<T: TableAccessor + ?Sized>(table: &T) -> ParquetResult<Vec<ColumnDescriptor>> {
    let mut names = HashSet::new();
    let num_rows = table.num_rows();
    (0..table.num_columns())
        .map(|index| {
            let column = table.column(index);
            if !names.insert(column.name().to_string()) {
                return Err(fmt_err!(Layout, "duplicate column name {:?}", column.name()));
            }
            if column.len() != num_rows {
                return Err(fmt_err!(
                    Layout,
                    "column {:?} has {} rows, expected {num_rows}",
                    column.name(),
                    column.len()
                ));
            }
            ColumnDescriptor::try_new(column.name(), column.logical_type(), column.nullable())
        })
        .collect()
}

/// The flat schema list: a root group followed by one element per column.
pub fn to_schema_elements(descriptors: &[ColumnDescriptor]) -> ParquetResult<Vec<SchemaElement>> {
    let num_children = i32::try_from(descriptors.len())
        .map_err(|_| fmt_err!(Overflow, "{} columns do not fit i32", descriptors.len()))?;
    let root = SchemaElement {
        type_: None,
        type_length: None,
        repetition_type: None,
        name: ROOT_NAME.to_string(),
        num_children: Some(num_children),
        converted_type: None,
        logical_type: None,
    };
    Ok(std::iter::once(root)
        .chain(descriptors.iter().map(ColumnDescriptor::to_schema_element))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnValues, Table};

    #[test]
    fn nullable_columns_are_optional() {
        let table = Table::try_new(vec![
            Column::int64("id", vec![Some(1), None]),
            Column::string("label", vec![Some("a"), Some("b")]),
        ])
        .unwrap();
        let schema = to_parquet_schema(&table).unwrap();
        assert_eq!(schema[0].repetition, Repetition::Optional);
        assert_eq!(schema[1].repetition, Repetition::Required);
        assert_eq!(schema[1].physical_type, PhysicalType::ByteArray);

        let elements = to_schema_elements(&schema).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].num_children, Some(2));
        assert_eq!(elements[2].converted_type, Some(CONVERTED_TYPE_UTF8));
        assert_eq!(elements[2].logical_type, Some(LogicalTypeAnnotation::String));
    }

    #[test]
    fn binary_has_no_string_annotation() {
        let descriptor = ColumnDescriptor::try_new("b", LogicalType::Binary, false).unwrap();
        let element = descriptor.to_schema_element();
        assert_eq!(element.converted_type, None);
        assert_eq!(element.logical_type, None);
    }

    #[test]
    fn boolean_is_unsupported() {
        assert!(ColumnDescriptor::try_new("flag", LogicalType::Boolean, false).is_err());
        let declared = Column::with_nullable("x", ColumnValues::Float64(vec![]), true);
        let descriptor = to_parquet_schema(&Table::try_new(vec![declared]).unwrap()).unwrap();
        assert!(descriptor[0].is_optional());
    }
}
