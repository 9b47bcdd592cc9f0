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


//! External record sources
//!
//! Column stores can be filled straight from a cursor-like source (a result
//! row of some other data provider) through typed, positional getters. The
//! store picks the getter matching its declared type; any failure the source
//! reports propagates to the caller untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{Error, Result, Value};

/// A positional, typed view over one row of an external tabular source
pub trait ExternalRecord {
    /// Number of fields in the record
    fn field_count(&self) -> usize;

    /// Returns true if the field holds NULL
    fn is_null(&self, field: usize) -> Result<bool>;

    /// Read the field as a boolean
    fn get_boolean(&self, field: usize) -> Result<bool>;

    /// Read the field as an unsigned byte
    fn get_byte(&self, field: usize) -> Result<u8>;

    /// Read the field as a 16-bit integer
    fn get_int16(&self, field: usize) -> Result<i16>;

    /// Read the field as a 32-bit integer
    fn get_int32(&self, field: usize) -> Result<i32>;

    /// Read the field as a 64-bit integer
    fn get_int64(&self, field: usize) -> Result<i64>;

    /// Read the field as a 32-bit float
    fn get_float(&self, field: usize) -> Result<f32>;

    /// Read the field as a 64-bit float
    fn get_double(&self, field: usize) -> Result<f64>;

    /// Read the field as a string
    fn get_string(&self, field: usize) -> Result<String>;

    /// Read the field as a timestamp
    fn get_datetime(&self, field: usize) -> Result<DateTime<Utc>>;

    /// Read the field as raw bytes
    fn get_bytes(&self, field: usize) -> Result<Vec<u8>>;

    /// Read the field as an untyped value
    fn get_value(&self, field: usize) -> Result<Value>;
}

/// An external record backed by a slice of values
///
/// Getters are strict about the stored variant, the way a typed cursor is:
/// integer getters accept any integer that fits, float getters accept any
/// numeric value, and everything else is a conversion error.
#[derive(Debug, Clone, Default)]
pub struct ValuesRecord {
    values: Vec<Value>,
}

impl ValuesRecord {
    /// Wrap a list of field values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    fn field(&self, field: usize) -> Result<&Value> {
        self.values
            .get(field)
            .ok_or_else(|| Error::external_read(field, "field index out of range"))
    }

    fn non_null(&self, field: usize, target: &str) -> Result<&Value> {
        let value = self.field(field)?;
        if value.is_null() {
            return Err(Error::external_read(
                field,
                format!("NULL cannot be read as {}", target),
            ));
        }
        Ok(value)
    }

    fn integer<T: TryFrom<i64>>(&self, field: usize, target: &str) -> Result<T> {
        let value = self.non_null(field, target)?;
        value
            .as_i64()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| Error::type_conversion(value.type_name(), target))
    }
}

impl From<Vec<Value>> for ValuesRecord {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl ExternalRecord for ValuesRecord {
    fn field_count(&self) -> usize {
        self.values.len()
    }

    fn is_null(&self, field: usize) -> Result<bool> {
        Ok(self.field(field)?.is_null())
    }

    fn get_boolean(&self, field: usize) -> Result<bool> {
        let value = self.non_null(field, "BOOLEAN")?;
        value
            .as_bool()
            .ok_or_else(|| Error::type_conversion(value.type_name(), "BOOLEAN"))
    }

    fn get_byte(&self, field: usize) -> Result<u8> {
        self.integer(field, "BYTE")
    }

    fn get_int16(&self, field: usize) -> Result<i16> {
        self.integer(field, "INT16")
    }

    fn get_int32(&self, field: usize) -> Result<i32> {
        self.integer(field, "INT32")
    }

    fn get_int64(&self, field: usize) -> Result<i64> {
        self.integer(field, "INT64")
    }

    fn get_float(&self, field: usize) -> Result<f32> {
        let value = self.non_null(field, "SINGLE")?;
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| Error::type_conversion(value.type_name(), "SINGLE"))
    }

    fn get_double(&self, field: usize) -> Result<f64> {
        let value = self.non_null(field, "DOUBLE")?;
        value
            .as_f64()
            .ok_or_else(|| Error::type_conversion(value.type_name(), "DOUBLE"))
    }

    fn get_string(&self, field: usize) -> Result<String> {
        Ok(self.non_null(field, "STRING")?.to_string())
    }

    fn get_datetime(&self, field: usize) -> Result<DateTime<Utc>> {
        let value = self.non_null(field, "DATETIME")?;
        value
            .as_datetime()
            .ok_or_else(|| Error::type_conversion(value.type_name(), "DATETIME"))
    }

    fn get_bytes(&self, field: usize) -> Result<Vec<u8>> {
        let value = self.non_null(field, "BINARY")?;
        value
            .as_bytes()
            .map(|b| b.to_vec())
            .ok_or_else(|| Error::type_conversion(value.type_name(), "BINARY"))
    }

    fn get_value(&self, field: usize) -> Result<Value> {
        self.field(field).cloned()
    }
}

/// Convert external bytes into the shared representation used by stores
pub(crate) fn bytes_to_arc(bytes: Vec<u8>) -> Arc<[u8]> {
    Arc::from(bytes.into_boxed_slice())
}
