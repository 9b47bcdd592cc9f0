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


//! Error types for the record cache
//!
//! This module defines all error types used by the column stores, the
//! record allocator, keys and indexes.

use thiserror::Error;

/// Result type alias for record cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for record cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Argument errors
    // =========================================================================
    /// Invalid argument supplied by the caller
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Number of key values does not match the key's column count
    #[error("expecting {expected} value(s) for the key being indexed, but received {got} value(s)")]
    KeyArityMismatch { expected: usize, got: usize },

    /// Record identifier is negative or outside the allocated range
    #[error("invalid record {0}")]
    InvalidRecord(i32),

    /// Value exceeds the column's maximum length
    #[error("value for column {column} is too long, max {max}, got {got}")]
    ValueTooLong {
        column: String,
        max: usize,
        got: usize,
    },

    /// Row values don't match the table's column count
    #[error("table columns don't match, expected {expected}, got {got}")]
    TableColumnsNotMatch { expected: usize, got: usize },

    // =========================================================================
    // Lookup errors
    // =========================================================================
    /// Column not found in the table schema
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Column ordinal outside the schema
    #[error("column index {index} out of bounds")]
    ColumnIndexOutOfBounds { index: usize },

    /// Duplicate column name in schema
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Row is not part of the table
    #[error("row {0} not found")]
    RowNotFound(usize),

    /// Row has no version of the requested kind
    #[error("row {row} has no {version} version")]
    VersionNotFound { row: usize, version: String },

    /// Index handle no longer registered with the table
    #[error("index {0} not found")]
    IndexNotFound(usize),

    // =========================================================================
    // Conversion errors
    // =========================================================================
    /// Type conversion error
    #[error("type conversion error: cannot convert {from} to {to}")]
    TypeConversion { from: String, to: String },

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// External record source failed to produce a field
    #[error("external record field {field}: {message}")]
    ExternalRead { field: usize, message: String },

    /// Column type cannot be used for the requested operation
    #[error("invalid column type")]
    InvalidColumnType,

    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create a new KeyArityMismatch error
    pub fn key_arity_mismatch(expected: usize, got: usize) -> Self {
        Error::KeyArityMismatch { expected, got }
    }

    /// Create a new ValueTooLong error
    pub fn value_too_long(column: impl Into<String>, max: usize, got: usize) -> Self {
        Error::ValueTooLong {
            column: column.into(),
            max,
            got,
        }
    }

    /// Create a new TableColumnsNotMatch error
    pub fn table_columns_not_match(expected: usize, got: usize) -> Self {
        Error::TableColumnsNotMatch { expected, got }
    }

    /// Create a new TypeConversion error
    pub fn type_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::TypeConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Create a new ExternalRead error
    pub fn external_read(field: usize, message: impl Into<String>) -> Self {
        Error::ExternalRead {
            field,
            message: message.into(),
        }
    }

    /// Create a new VersionNotFound error
    pub fn version_not_found(row: usize, version: impl Into<String>) -> Self {
        Error::VersionNotFound {
            row,
            version: version.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this error reports a caller-contract violation
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::KeyArityMismatch { .. }
                | Error::InvalidRecord(_)
                | Error::ValueTooLong { .. }
                | Error::TableColumnsNotMatch { .. }
        )
    }

    /// Check if this error comes from converting a value into a typed store
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            Error::TypeConversion { .. }
                | Error::Parse(_)
                | Error::ExternalRead { .. }
                | Error::InvalidColumnType
        )
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ColumnNotFound(_)
                | Error::RowNotFound(_)
                | Error::IndexNotFound(_)
                | Error::VersionNotFound { .. }
        )
    }
}
