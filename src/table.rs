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

//! Column and table interfaces the codec consumes and produces.
//!
//! The writer accepts anything implementing [`TableAccessor`]. The reader
//! materialises owned [`Column`]s.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::parquet::error::{fmt_err, ParquetResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Int64,
    Float64,
    /// UTF-8 text.
    String,
    /// Arbitrary bytes.
    Binary,
    /// Known to the table layer, not storable by this codec.
    Boolean,
}

impl Display for LogicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogicalType::Int64 => "int64",
            LogicalType::Float64 => "float64",
            LogicalType::String => "string",
            LogicalType::Binary => "binary",
            LogicalType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Read access to one column.
///
/// The typed getters return `None` for null rows and for rows of another type.
pub trait ColumnAccessor {
    fn name(&self) -> &str;
    fn logical_type(&self) -> LogicalType;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_null(&self, row: usize) -> bool;
    fn get_int64(&self, row: usize) -> Option<i64>;
    fn get_float64(&self, row: usize) -> Option<f64>;
    /// String and binary rows, as raw bytes.
    fn get_string(&self, row: usize) -> Option<&[u8]>;

    /// Declared nullability. Defaults to whether any row is null. The writer
    /// asks once per file, when it derives the schema.
    fn nullable(&self) -> bool {
        (0..self.len()).any(|row| self.is_null(row))
    }
}

/// Read access to an ordered set of uniquely named, equally long columns.
pub trait TableAccessor {
    fn num_columns(&self) -> usize;
    fn column(&self, index: usize) -> &dyn ColumnAccessor;

    fn num_rows(&self) -> usize {
        if self.num_columns() == 0 {
            0
        } else {
            self.column(0).len()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
}

impl ColumnValues {
    /// Empty values of the given type, or `None` for types the codec cannot hold.
    pub fn empty(logical_type: LogicalType) -> Option<Self> {
        match logical_type {
            LogicalType::Int64 => Some(ColumnValues::Int64(Vec::new())),
            LogicalType::Float64 => Some(ColumnValues::Float64(Vec::new())),
            LogicalType::String => Some(ColumnValues::String(Vec::new())),
            LogicalType::Binary => Some(ColumnValues::Binary(Vec::new())),
            LogicalType::Boolean => None,
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            ColumnValues::Int64(_) => LogicalType::Int64,
            ColumnValues::Float64(_) => LogicalType::Float64,
            ColumnValues::String(_) => LogicalType::String,
            ColumnValues::Binary(_) => LogicalType::Binary,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Int64(values) => values.len(),
            ColumnValues::Float64(values) => values.len(),
            ColumnValues::String(values) => values.len(),
            ColumnValues::Binary(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnValues::Int64(values) => values[row].is_none(),
            ColumnValues::Float64(values) => values[row].is_none(),
            ColumnValues::String(values) => values[row].is_none(),
            ColumnValues::Binary(values) => values[row].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|row| self.is_null(*row)).count()
    }

    /// Appends `other`, which must hold the same type.
    pub fn append(&mut self, other: ColumnValues) -> ParquetResult<()> {
        match (self, other) {
            (ColumnValues::Int64(values), ColumnValues::Int64(other)) => values.extend(other),
            (ColumnValues::Float64(values), ColumnValues::Float64(other)) => values.extend(other),
            (ColumnValues::String(values), ColumnValues::String(other)) => values.extend(other),
            (ColumnValues::Binary(values), ColumnValues::Binary(other)) => values.extend(other),
            (values, other) => {
                return Err(fmt_err!(
                    Layout,
                    "cannot append {} values to a {} column",
                    other.logical_type(),
                    values.logical_type()
                ))
            }
        }
        Ok(())
    }
}

/// An owned, named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
    nullable: bool,
}

impl Column {
    /// A column that is nullable exactly when it contains a null.
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        let nullable = values.null_count() > 0;
        Self {
            name: name.into(),
            values,
            nullable,
        }
    }

    pub fn with_nullable(name: impl Into<String>, values: ColumnValues, nullable: bool) -> Self {
        Self {
            name: name.into(),
            values,
            nullable,
        }
    }

    pub fn int64(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnValues::Int64(values))
    }

    pub fn float64(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnValues::Float64(values))
    }

    pub fn string<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        Self::new(name, ColumnValues::String(values))
    }

    pub fn binary(name: impl Into<String>, values: Vec<Option<Vec<u8>>>) -> Self {
        Self::new(name, ColumnValues::Binary(values))
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn into_values(self) -> ColumnValues {
        self.values
    }

    /// Appends the rows of `other` and widens nullability.
    pub fn append(&mut self, other: Column) -> ParquetResult<()> {
        self.nullable |= other.nullable;
        self.values.append(other.values)
    }
}

impl ColumnAccessor for Column {
    fn name(&self) -> &str {
        &self.name
    }

    fn logical_type(&self) -> LogicalType {
        self.values.logical_type()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn is_null(&self, row: usize) -> bool {
        self.values.is_null(row)
    }

    fn get_int64(&self, row: usize) -> Option<i64> {
        match &self.values {
            ColumnValues::Int64(values) => values[row],
            _ => None,
        }
    }

    fn get_float64(&self, row: usize) -> Option<f64> {
        match &self.values {
            ColumnValues::Float64(values) => values[row],
            _ => None,
        }
    }

    fn get_string(&self, row: usize) -> Option<&[u8]> {
        match &self.values {
            ColumnValues::String(values) => values[row].as_deref().map(str::as_bytes),
            ColumnValues::Binary(values) => values[row].as_deref(),
            _ => None,
        }
    }

    fn nullable(&self) -> bool {
        self.nullable
    }
}

/// An owned table of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn try_new(columns: Vec<Column>) -> ParquetResult<Self> {
        let mut names = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !names.insert(column.name()) {
                return Err(fmt_err!(Layout, "duplicate column name {:?}", column.name()));
            }
        }
        if let Some(first) = columns.first() {
            if let Some(column) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(fmt_err!(
                    Layout,
                    "column {:?} has {} rows, column {:?} has {}",
                    column.name(),
                    column.len(),
                    first.name(),
                    first.len()
                ));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }
}

impl TableAccessor for Table {
    fn num_columns(&self) -> usize {
        self.columns.len()
    }

    fn column(&self, index: usize) -> &dyn ColumnAccessor {
        &self.columns[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullability_follows_content_by_default() {
        assert!(Column::int64("a", vec![Some(1), None]).nullable());
        assert!(!Column::int64("a", vec![Some(1)]).nullable());
        let declared = Column::with_nullable("a", ColumnValues::Int64(vec![Some(1)]), true);
        assert!(declared.nullable());
    }

    #[test]
    fn string_rows_are_bytes() {
        let column = Column::string("s", vec![Some("hé"), None]);
        assert_eq!(column.get_string(0), Some("hé".as_bytes()));
        assert_eq!(column.get_string(1), None);
        assert_eq!(column.get_int64(0), None);
    }

    #[test]
    fn rejects_duplicate_names_and_ragged_columns() {
        let a = Column::int64("a", vec![Some(1)]);
        assert!(Table::try_new(vec![a.clone(), a.clone()]).is_err());
        let b = Column::int64("b", vec![Some(1), Some(2)]);
        assert!(Table::try_new(vec![a, b]).is_err());
    }

    #[test]
    fn append_checks_types() {
        let mut a = Column::int64("a", vec![Some(1)]);
        a.append(Column::int64("a", vec![None])).unwrap();
        assert_eq!(a.len(), 2);
        assert!(a.nullable());
        assert!(a.append(Column::float64("a", vec![Some(1.0)])).is_err());
    }
}
