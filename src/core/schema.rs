// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Schema types - table and column definitions
//!
//! A schema fixes the ordered list of columns a record cache stores. Each
//! column's declared type picks its store representation once, at table
//! creation.

use std::fmt;

use rustc_hash::FxHashMap;

use super::error::{Error, Result};
use super::types::DataType;

/// A column definition in a table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    /// Ordinal of the column (0-based index)
    pub id: usize,

    /// Column name
    pub name: String,

    /// Declared data type
    pub data_type: DataType,

    /// Maximum character length for string columns (None = unbounded)
    pub max_length: Option<usize>,
}

impl SchemaColumn {
    /// Create a new column definition
    pub fn new(id: usize, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            max_length: None,
        }
    }

    /// Create a string column limited to `max_length` characters
    pub fn with_max_length(id: usize, name: impl Into<String>, max_length: usize) -> Self {
        Self {
            id,
            name: name.into(),
            data_type: DataType::String,
            max_length: Some(max_length),
        }
    }
}

impl fmt::Display for SchemaColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if let Some(max) = self.max_length {
            write!(f, "({})", max)?;
        }
        Ok(())
    }
}

/// Table schema definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Name of the table
    pub table_name: String,

    /// Column definitions
    pub columns: Vec<SchemaColumn>,

    /// Lowercase column name -> ordinal
    column_index_map: FxHashMap<String, usize>,
}

impl Schema {
    /// Create a new schema, rejecting duplicate column names
    pub fn new(table_name: impl Into<String>, columns: Vec<SchemaColumn>) -> Result<Self> {
        let mut column_index_map = FxHashMap::default();
        for (i, col) in columns.iter().enumerate() {
            if column_index_map
                .insert(col.name.to_lowercase(), i)
                .is_some()
            {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self {
            table_name: table_name.into(),
            columns,
            column_index_map,
        })
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema has any columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a column by ordinal
    pub fn get_column(&self, index: usize) -> Option<&SchemaColumn> {
        self.columns.get(index)
    }

    /// Get the column ordinal by name (case-insensitive)
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.column_index_map.get(&name.to_lowercase()).copied()
    }

    /// Get the column ordinal by name, failing with ColumnNotFound
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.get_column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Check if a column exists by name
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column_index(name).is_some()
    }

    /// Get all column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Validate a value count against the column count
    pub fn validate_column_count(&self, got: usize) -> Result<()> {
        if self.columns.len() != got {
            return Err(Error::table_columns_not_match(self.columns.len(), got));
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.table_name)?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", col)?;
        }
        write!(f, ")")
    }
}

/// Builder for creating schemas more ergonomically
pub struct SchemaBuilder {
    table_name: String,
    columns: Vec<SchemaColumn>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column
    pub fn add(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        let id = self.columns.len();
        self.columns.push(SchemaColumn::new(id, name, data_type));
        self
    }

    /// Add a string column with a maximum length
    pub fn add_string(mut self, name: impl Into<String>, max_length: usize) -> Self {
        let id = self.columns.len();
        self.columns
            .push(SchemaColumn::with_max_length(id, name, max_length));
        self
    }

    /// Build the schema
    pub fn build(self) -> Result<Schema> {
        Schema::new(self.table_name, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_schema() -> Schema {
        SchemaBuilder::new("employees")
            .add("id", DataType::Int32)
            .add_string("dept", 8)
            .add("salary", DataType::Double)
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_creation() {
        let schema = create_test_schema();
        assert_eq!(schema.table_name, "employees");
        assert_eq!(schema.column_count(), 3);
        assert!(!schema.is_empty());
        assert_eq!(schema.column_names(), vec!["id", "dept", "salary"]);
    }

    #[test]
    fn test_column_lookup_case_insensitive() {
        let schema = create_test_schema();
        assert_eq!(schema.get_column_index("DEPT"), Some(1));
        assert_eq!(schema.column_index("Salary").unwrap(), 2);
        assert!(matches!(
            schema.column_index("bonus"),
            Err(Error::ColumnNotFound(_))
        ));
        assert_eq!(schema.get_column(1).unwrap().max_length, Some(8));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = SchemaBuilder::new("t")
            .add("a", DataType::Int32)
            .add("A", DataType::String)
            .build();
        assert!(matches!(result, Err(Error::DuplicateColumn(_))));
    }

    #[test]
    fn test_validate_column_count() {
        let schema = create_test_schema();
        assert!(schema.validate_column_count(3).is_ok());
        assert_eq!(
            schema.validate_column_count(2),
            Err(Error::table_columns_not_match(3, 2))
        );
    }

    #[test]
    fn test_display() {
        let schema = create_test_schema();
        assert_eq!(
            schema.to_string(),
            "employees (id INT32, dept STRING(8), salary DOUBLE)"
        );
    }
}
