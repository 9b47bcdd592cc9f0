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


//! String column store with length limit and case-sensitivity mode

use std::cmp::Ordering;
use std::sync::Arc;

use super::typed::{Element, TypedStore};
use crate::core::{Error, Result, Value};
use crate::storage::external::ExternalRecord;

/// Compare two strings ignoring case, char by char
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compare two strings under the given case mode
#[inline]
pub fn compare_strings(a: &str, b: &str, case_sensitive: bool) -> Ordering {
    if case_sensitive {
        a.cmp(b)
    } else {
        compare_ignore_case(a, b)
    }
}

/// String values for one column
///
/// Non-string inputs are stringified. Writes longer than the column's
/// maximum length (in characters) fail with an argument error.
#[derive(Debug, Clone)]
pub struct StringStore {
    inner: TypedStore<Arc<str>>,
    column: String,
    max_length: Option<usize>,
    case_sensitive: bool,
}

impl StringStore {
    /// Create an empty store for `column`
    pub fn new(column: impl Into<String>, max_length: Option<usize>, case_sensitive: bool) -> Self {
        Self {
            inner: TypedStore::new(),
            column: column.into(),
            max_length,
            case_sensitive,
        }
    }

    /// Maximum length in characters, if any
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Whether comparisons are case-sensitive
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Switch the comparison mode
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    fn check_length(&self, s: &str) -> Result<()> {
        if let Some(max) = self.max_length {
            let len = s.chars().count();
            if len > max {
                return Err(Error::value_too_long(self.column.clone(), max, len));
            }
        }
        Ok(())
    }

    /// Number of record slots the store can address
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Grow to at least `capacity` slots
    pub fn set_capacity(&mut self, capacity: usize) {
        self.inner.set_capacity(capacity);
    }

    /// Returns true if the slot holds NULL
    #[inline]
    pub fn is_null(&self, slot: usize) -> bool {
        self.inner.is_null(slot)
    }

    /// Borrow the string at a non-null slot
    #[inline]
    pub fn element(&self, slot: usize) -> Option<&Arc<str>> {
        self.inner.element(slot)
    }

    /// Read a slot as a value
    pub fn get(&self, slot: usize) -> Value {
        self.inner.get(slot)
    }

    /// Write an optional string, enforcing the length limit
    pub fn set_element(&mut self, slot: usize, element: Option<Arc<str>>) -> Result<()> {
        if let Some(s) = &element {
            self.check_length(s)?;
        }
        self.inner.set_element(slot, element)
    }

    /// Write a slot from a value
    pub fn set(&mut self, slot: usize, value: &Value) -> Result<()> {
        let element = if value.is_null() {
            None
        } else {
            Some(<Arc<str> as Element>::from_value(value)?)
        };
        self.set_element(slot, element)
    }

    /// Compare two slots under the store's case mode
    #[inline]
    pub fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering {
        let case_sensitive = self.case_sensitive;
        self.inner
            .compare_by(slot1, slot2, |a, b| compare_strings(a, b, case_sensitive))
    }

    /// Compare a slot against a literal under the store's case mode
    pub fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering> {
        let literal = if value.is_null() {
            None
        } else {
            Some(<Arc<str> as Element>::from_value(value)?)
        };
        Ok(match (self.element(slot), literal.as_ref()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => compare_strings(a, b, self.case_sensitive),
        })
    }

    /// Copy null flag and value between slots
    pub fn copy_value(&mut self, from: usize, to: usize) -> Result<()> {
        self.inner.copy_value(from, to)
    }

    /// Copy from another string store, re-checking this column's limit
    pub fn copy_value_from(&mut self, source: &StringStore, from: usize, to: usize) -> Result<()> {
        self.set_element(to, source.element(from).cloned())
    }

    /// Fill a slot from an external record field
    pub fn set_from_external(
        &mut self,
        slot: usize,
        source: &dyn ExternalRecord,
        field: usize,
    ) -> Result<()> {
        if source.is_null(field)? {
            return self.set_element(slot, None);
        }
        let s = source.get_string(field)?;
        self.set_element(slot, Some(Arc::from(s.as_str())))
    }
}
