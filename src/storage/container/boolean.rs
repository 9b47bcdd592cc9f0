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


//! Boolean column store, kept entirely in bitmaps

use std::cmp::Ordering;

use super::bitmap::Bitmap;
use crate::core::{DataType, Error, Result, Value};
use crate::storage::external::ExternalRecord;

/// Boolean values as one bit per record slot, plus the null bitmap
#[derive(Debug, Clone)]
pub struct BooleanStore {
    values: Bitmap,
    nulls: Bitmap,
    capacity: usize,
}

impl Default for BooleanStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a non-null value into a boolean
fn bool_from_value(value: &Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") || s == "1" {
                Ok(true)
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                Ok(false)
            } else {
                Err(Error::parse(format!("'{}' is not a valid BOOLEAN", s)))
            }
        }
        _ => value
            .as_i64()
            .map(|v| v != 0)
            .ok_or_else(|| Error::type_conversion(value.type_name(), DataType::Boolean.to_string())),
    }
}

impl BooleanStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            values: Bitmap::new(false),
            nulls: Bitmap::new(true),
            capacity: 0,
        }
    }

    /// Number of record slots the store can address
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow to at least `capacity` slots
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.values.resize(capacity);
            self.nulls.resize(capacity);
            self.capacity = capacity;
        }
    }

    #[inline]
    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.capacity {
            return Err(Error::InvalidRecord(slot as i32));
        }
        Ok(())
    }

    /// Returns true if the slot holds NULL
    #[inline]
    pub fn is_null(&self, slot: usize) -> bool {
        slot >= self.capacity || self.nulls.get(slot)
    }

    /// Read a slot as an optional boolean
    #[inline]
    pub fn element(&self, slot: usize) -> Option<bool> {
        if self.is_null(slot) {
            None
        } else {
            Some(self.values.get(slot))
        }
    }

    /// Read a slot as a value
    pub fn get(&self, slot: usize) -> Value {
        match self.element(slot) {
            Some(b) => Value::Boolean(b),
            None => Value::Null,
        }
    }

    /// Write an optional boolean
    pub fn set_element(&mut self, slot: usize, element: Option<bool>) -> Result<()> {
        self.check_slot(slot)?;
        self.values.set(slot, element.unwrap_or(false));
        self.nulls.set(slot, element.is_none());
        Ok(())
    }

    /// Write a slot from a value
    pub fn set(&mut self, slot: usize, value: &Value) -> Result<()> {
        let element = if value.is_null() {
            None
        } else {
            Some(bool_from_value(value)?)
        };
        self.set_element(slot, element)
    }

    /// Compare two slots (NULL < false < true)
    #[inline]
    pub fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering {
        self.element(slot1).cmp(&self.element(slot2))
    }

    /// Compare a slot against a literal
    pub fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering> {
        let literal = if value.is_null() {
            None
        } else {
            Some(bool_from_value(value)?)
        };
        Ok(self.element(slot).cmp(&literal))
    }

    /// Copy null flag and value between slots
    pub fn copy_value(&mut self, from: usize, to: usize) -> Result<()> {
        let element = self.element(from);
        self.set_element(to, element)
    }

    /// Fill a slot from an external record field
    pub fn set_from_external(
        &mut self,
        slot: usize,
        source: &dyn ExternalRecord,
        field: usize,
    ) -> Result<()> {
        self.check_slot(slot)?;
        if source.is_null(field)? {
            return self.set_element(slot, None);
        }
        let value = source.get_boolean(field)?;
        self.set_element(slot, Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_store() {
        let mut store = BooleanStore::new();
        store.set_capacity(3);
        store.set(0, &Value::Boolean(true)).unwrap();
        store.set(1, &Value::from("FALSE")).unwrap();
        store.set(2, &Value::Null).unwrap();

        assert_eq!(store.get(0), Value::Boolean(true));
        assert_eq!(store.get(1), Value::Boolean(false));
        assert!(store.is_null(2));

        assert_eq!(store.compare_values(2, 1), Ordering::Less);
        assert_eq!(store.compare_values(1, 0), Ordering::Less);
        assert_eq!(
            store.compare_to_value(0, &Value::Int32(1)).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_boolean_conversion_errors() {
        let mut store = BooleanStore::new();
        store.set_capacity(1);
        assert!(matches!(store.set(0, &Value::from("maybe")), Err(Error::Parse(_))));
        assert!(store.set(0, &Value::Double(1.0)).is_err());
        assert!(matches!(
            store.set(5, &Value::Boolean(true)),
            Err(Error::InvalidRecord(5))
        ));
    }

    #[test]
    fn test_growth_keeps_bits() {
        let mut store = BooleanStore::new();
        store.set_capacity(2);
        store.set(1, &Value::Boolean(true)).unwrap();
        store.set_capacity(500);
        assert_eq!(store.get(1), Value::Boolean(true));
        assert!(store.is_null(0));
        assert!(store.is_null(499));
    }
}
