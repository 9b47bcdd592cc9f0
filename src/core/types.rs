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


//! Core type definitions for the record cache
//!
//! This module defines the fundamental types: DataType, Operator, RowState,
//! RowVersion and RowStateFilter

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::error::Error;

/// Declared column types
///
/// Each type selects one concrete column store representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DataType {
    /// Boolean true/false, stored as a bitmap
    Boolean = 0,

    /// Unsigned 8-bit integer
    Byte = 1,

    /// 16-bit signed integer
    Int16 = 2,

    /// 32-bit signed integer
    Int32 = 3,

    /// 64-bit signed integer
    Int64 = 4,

    /// 32-bit floating point number
    Single = 5,

    /// 64-bit floating point number
    Double = 6,

    /// UTF-8 text string
    String = 7,

    /// Timestamp (stored as UTC)
    DateTime = 8,

    /// Raw byte array
    Binary = 9,

    /// Any value, compared by its natural order or its string form
    #[default]
    Object = 10,
}

impl DataType {
    /// Returns true if this type is an integer or floating point type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Byte
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Single
                | DataType::Double
        )
    }

    /// Returns true if this type is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Byte | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Returns the type ID as u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create DataType from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DataType::Boolean),
            1 => Some(DataType::Byte),
            2 => Some(DataType::Int16),
            3 => Some(DataType::Int32),
            4 => Some(DataType::Int64),
            5 => Some(DataType::Single),
            6 => Some(DataType::Double),
            7 => Some(DataType::String),
            8 => Some(DataType::DateTime),
            9 => Some(DataType::Binary),
            10 => Some(DataType::Object),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Byte => write!(f, "BYTE"),
            DataType::Int16 => write!(f, "INT16"),
            DataType::Int32 => write!(f, "INT32"),
            DataType::Int64 => write!(f, "INT64"),
            DataType::Single => write!(f, "SINGLE"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::String => write!(f, "STRING"),
            DataType::DateTime => write!(f, "DATETIME"),
            DataType::Binary => write!(f, "BINARY"),
            DataType::Object => write!(f, "OBJECT"),
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BOOLEAN" | "BOOL" | "BIT" => Ok(DataType::Boolean),
            "BYTE" | "TINYINT" | "UINT8" => Ok(DataType::Byte),
            "INT16" | "SMALLINT" | "SHORT" => Ok(DataType::Int16),
            "INT32" | "INT" | "INTEGER" => Ok(DataType::Int32),
            "INT64" | "BIGINT" | "LONG" => Ok(DataType::Int64),
            "SINGLE" | "REAL" | "FLOAT32" => Ok(DataType::Single),
            "DOUBLE" | "FLOAT" | "FLOAT64" => Ok(DataType::Double),
            "STRING" | "TEXT" | "VARCHAR" | "CHAR" => Ok(DataType::String),
            "DATETIME" | "TIMESTAMP" | "DATE" => Ok(DataType::DateTime),
            "BINARY" | "VARBINARY" | "BYTES" | "BLOB" => Ok(DataType::Binary),
            "OBJECT" | "ANY" | "VARIANT" => Ok(DataType::Object),
            _ => Err(Error::InvalidColumnType),
        }
    }
}

/// Comparison operators for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operator {
    /// Equality (=)
    Eq = 0,

    /// Inequality (!=)
    Ne = 1,

    /// Greater than (>)
    Gt = 2,

    /// Greater than or equal (>=)
    Gte = 3,

    /// Less than (<)
    Lt = 4,

    /// Less than or equal (<=)
    Lte = 5,

    /// Pattern matching (LIKE)
    Like = 6,

    /// Value in set (IN)
    In = 7,

    /// Value not in set (NOT IN)
    NotIn = 8,

    /// IS NULL check
    IsNull = 9,

    /// IS NOT NULL check
    IsNotNull = 10,
}

impl Operator {
    /// Returns true if this operator is a null check
    pub fn is_null_check(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// Returns the negation of this operator, if applicable
    pub fn negate(&self) -> Option<Self> {
        match self {
            Operator::Eq => Some(Operator::Ne),
            Operator::Ne => Some(Operator::Eq),
            Operator::Gt => Some(Operator::Lte),
            Operator::Gte => Some(Operator::Lt),
            Operator::Lt => Some(Operator::Gte),
            Operator::Lte => Some(Operator::Gt),
            Operator::In => Some(Operator::NotIn),
            Operator::NotIn => Some(Operator::In),
            Operator::IsNull => Some(Operator::IsNotNull),
            Operator::IsNotNull => Some(Operator::IsNull),
            Operator::Like => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::Ne => write!(f, "!="),
            Operator::Gt => write!(f, ">"),
            Operator::Gte => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::Lte => write!(f, "<="),
            Operator::Like => write!(f, "LIKE"),
            Operator::In => write!(f, "IN"),
            Operator::NotIn => write!(f, "NOT IN"),
            Operator::IsNull => write!(f, "IS NULL"),
            Operator::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "LIKE" => Ok(Operator::Like),
            "IN" => Ok(Operator::In),
            "NOT IN" | "NOTIN" => Ok(Operator::NotIn),
            "IS NULL" | "ISNULL" => Ok(Operator::IsNull),
            "IS NOT NULL" | "ISNOTNULL" => Ok(Operator::IsNotNull),
            _ => Err(Error::parse(format!("unknown operator: {}", s))),
        }
    }
}

/// Lifecycle state of a logical row, derived from its original/current records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    /// Not part of any table (no records)
    Detached,
    /// Original equals current, both valid
    Unchanged,
    /// Newly added, no original record
    Added,
    /// Deleted, no current record
    Deleted,
    /// Original and current differ, both valid
    Modified,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowState::Detached => write!(f, "Detached"),
            RowState::Unchanged => write!(f, "Unchanged"),
            RowState::Added => write!(f, "Added"),
            RowState::Deleted => write!(f, "Deleted"),
            RowState::Modified => write!(f, "Modified"),
        }
    }
}

/// Which of a row's records is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowVersion {
    /// Last accepted (baseline) values
    Original,
    /// Working values
    Current,
}

impl fmt::Display for RowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowVersion::Original => write!(f, "Original"),
            RowVersion::Current => write!(f, "Current"),
        }
    }
}

bitflags! {
    /// Selects which row states and versions participate in an index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RowStateFilter: u8 {
        /// Nothing participates.
        const NONE = 0;
        /// Current version of unchanged rows.
        const UNCHANGED = 2;
        /// Current version of added rows.
        const ADDED = 4;
        /// Original version of deleted rows.
        const DELETED = 8;
        /// Current version of modified rows.
        const MODIFIED_CURRENT = 16;
        /// Original version of modified rows.
        const MODIFIED_ORIGINAL = 32;
        /// Current view of the table.
        const CURRENT_ROWS = Self::UNCHANGED.bits() | Self::ADDED.bits() | Self::MODIFIED_CURRENT.bits();
        /// Original view of the table.
        const ORIGINAL_ROWS = Self::UNCHANGED.bits() | Self::DELETED.bits() | Self::MODIFIED_ORIGINAL.bits();
    }
}

impl Default for RowStateFilter {
    fn default() -> Self {
        RowStateFilter::CURRENT_ROWS
    }
}

impl RowStateFilter {
    /// Resolves which version of a row in `state` this filter selects.
    ///
    /// Modified rows prefer the current version when both are selected.
    pub fn version_for(&self, state: RowState) -> Option<RowVersion> {
        match state {
            RowState::Unchanged if self.contains(RowStateFilter::UNCHANGED) => {
                Some(RowVersion::Current)
            }
            RowState::Added if self.contains(RowStateFilter::ADDED) => Some(RowVersion::Current),
            RowState::Deleted if self.contains(RowStateFilter::DELETED) => {
                Some(RowVersion::Original)
            }
            RowState::Modified => {
                if self.contains(RowStateFilter::MODIFIED_CURRENT) {
                    Some(RowVersion::Current)
                } else if self.contains(RowStateFilter::MODIFIED_ORIGINAL) {
                    Some(RowVersion::Original)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns true if the given version of a row in `state` participates.
    pub fn contains_version(&self, state: RowState, version: RowVersion) -> bool {
        match state {
            // Both versions of an unchanged row are the same record
            RowState::Unchanged => self.contains(RowStateFilter::UNCHANGED),
            _ => self.version_for(state) == Some(version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_str() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Int32);
        assert_eq!("SMALLINT".parse::<DataType>().unwrap(), DataType::Int16);
        assert_eq!("text".parse::<DataType>().unwrap(), DataType::String);
        assert_eq!("timestamp".parse::<DataType>().unwrap(), DataType::DateTime);
        assert!("geometry".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_u8_roundtrip() {
        for v in 0..=10u8 {
            let dt = DataType::from_u8(v).unwrap();
            assert_eq!(dt.as_u8(), v);
        }
        assert_eq!(DataType::from_u8(11), None);
    }

    #[test]
    fn test_operator_negate() {
        assert_eq!(Operator::Lt.negate(), Some(Operator::Gte));
        assert_eq!(Operator::IsNull.negate(), Some(Operator::IsNotNull));
        assert_eq!(Operator::Like.negate(), None);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::Ne);
    }

    #[test]
    fn test_row_state_filter_versions() {
        let current = RowStateFilter::CURRENT_ROWS;
        assert_eq!(
            current.version_for(RowState::Unchanged),
            Some(RowVersion::Current)
        );
        assert_eq!(current.version_for(RowState::Added), Some(RowVersion::Current));
        assert_eq!(current.version_for(RowState::Deleted), None);
        assert_eq!(
            current.version_for(RowState::Modified),
            Some(RowVersion::Current)
        );

        let original = RowStateFilter::ORIGINAL_ROWS;
        assert_eq!(
            original.version_for(RowState::Deleted),
            Some(RowVersion::Original)
        );
        assert_eq!(original.version_for(RowState::Added), None);
        assert_eq!(
            original.version_for(RowState::Modified),
            Some(RowVersion::Original)
        );

        assert_eq!(RowStateFilter::NONE.version_for(RowState::Unchanged), None);
        assert_eq!(current.version_for(RowState::Detached), None);
    }

    #[test]
    fn test_contains_version() {
        let filter = RowStateFilter::MODIFIED_ORIGINAL;
        assert!(filter.contains_version(RowState::Modified, RowVersion::Original));
        assert!(!filter.contains_version(RowState::Modified, RowVersion::Current));
        assert!(!filter.contains_version(RowState::Unchanged, RowVersion::Current));

        let original = RowStateFilter::ORIGINAL_ROWS;
        assert!(original.contains_version(RowState::Unchanged, RowVersion::Current));
        assert!(original.contains_version(RowState::Deleted, RowVersion::Original));
        assert!(!original.contains_version(RowState::Added, RowVersion::Current));
    }
}
