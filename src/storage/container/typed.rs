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


//! Typed column stores
//!
//! [`TypedStore`] keeps one column's values in a dense `Vec<T>` indexed by
//! record slot, with a parallel null bitmap. The element type decides how
//! incoming values convert, how two slots order, and which external getter
//! fills a slot.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::bitmap::Bitmap;
use crate::core::value::{compare_floats, parse_timestamp};
use crate::core::{DataType, Error, Result, Value};
use crate::storage::external::{bytes_to_arc, ExternalRecord};

/// An element type that can live in a [`TypedStore`]
pub trait Element: Clone + Debug + Default {
    /// Declared type this element represents
    const DATA_TYPE: DataType;

    /// Convert a non-null value into the element type
    fn from_value(value: &Value) -> Result<Self>;

    /// Convert the element back into a value
    fn to_value(&self) -> Value;

    /// Order two elements
    fn compare(&self, other: &Self) -> Ordering;

    /// Read a non-null element from an external record
    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self>;
}

fn conversion_error(value: &Value, target: DataType) -> Error {
    Error::type_conversion(value.type_name(), target.to_string())
}

/// Convert any numeric, boolean or string value into an integer type
fn integer_from_value<T: TryFrom<i64>>(value: &Value, target: DataType) -> Result<T> {
    let wide = match value {
        Value::Boolean(b) => Some(*b as i64),
        Value::Single(_) | Value::Double(_) => value.as_f64().and_then(|f| {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                Some(f as i64)
            } else {
                None
            }
        }),
        Value::String(s) => Some(
            s.trim()
                .parse::<i64>()
                .map_err(|_| Error::parse(format!("'{}' is not a valid {}", s, target)))?,
        ),
        _ => value.as_i64(),
    };
    wide.and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| conversion_error(value, target))
}

/// Convert any numeric, boolean or string value into a float
fn float_from_value(value: &Value, target: DataType) -> Result<f64> {
    match value {
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::parse(format!("'{}' is not a valid {}", s, target))),
        _ => value
            .as_f64()
            .ok_or_else(|| conversion_error(value, target)),
    }
}

macro_rules! integer_element {
    ($ty:ty, $dt:expr, $variant:ident, $getter:ident) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = $dt;

            fn from_value(value: &Value) -> Result<Self> {
                integer_from_value(value, $dt)
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
                source.$getter(field)
            }
        }
    };
}

integer_element!(u8, DataType::Byte, Byte, get_byte);
integer_element!(i16, DataType::Int16, Int16, get_int16);
integer_element!(i32, DataType::Int32, Int32, get_int32);
integer_element!(i64, DataType::Int64, Int64, get_int64);

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::Single;

    fn from_value(value: &Value) -> Result<Self> {
        float_from_value(value, DataType::Single).map(|v| v as f32)
    }

    fn to_value(&self) -> Value {
        Value::Single(*self)
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        compare_floats(*self as f64, *other as f64)
    }

    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
        source.get_float(field)
    }
}

impl Element for f64 {
    const DATA_TYPE: DataType = DataType::Double;

    fn from_value(value: &Value) -> Result<Self> {
        float_from_value(value, DataType::Double)
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        compare_floats(*self, *other)
    }

    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
        source.get_double(field)
    }
}

impl Element for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::DateTime;

    /// Accepts timestamps, parseable strings, and integers as nanoseconds
    /// since the Unix epoch.
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::DateTime(t) => Ok(*t),
            Value::String(s) => parse_timestamp(s),
            _ => value
                .as_i64()
                .and_then(|nanos| {
                    DateTime::from_timestamp(
                        nanos.div_euclid(1_000_000_000),
                        nanos.rem_euclid(1_000_000_000) as u32,
                    )
                })
                .ok_or_else(|| conversion_error(value, DataType::DateTime)),
        }
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
        source.get_datetime(field)
    }
}

/// Shared byte array element, compared element-wise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytes(pub Arc<[u8]>);

impl Default for Bytes {
    fn default() -> Self {
        Bytes(Arc::from(Vec::new().into_boxed_slice()))
    }
}

impl Element for Bytes {
    const DATA_TYPE: DataType = DataType::Binary;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Binary(b) => Ok(Bytes(Arc::clone(b))),
            Value::String(s) => Ok(Bytes(Arc::from(s.as_bytes()))),
            _ => Err(conversion_error(value, DataType::Binary)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Binary(Arc::clone(&self.0))
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }

    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
        source.get_bytes(field).map(|b| Bytes(bytes_to_arc(b)))
    }
}

impl Element for Arc<str> {
    const DATA_TYPE: DataType = DataType::String;

    /// Anything stringifies
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Arc::clone(s)),
            other => Ok(Arc::from(other.to_string().as_str())),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(Arc::clone(self))
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.as_ref().cmp(other.as_ref())
    }

    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
        source.get_string(field).map(|s| Arc::from(s.as_str()))
    }
}

impl Element for Value {
    const DATA_TYPE: DataType = DataType::Object;

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        Value::compare(self, other)
    }

    fn read_external(source: &dyn ExternalRecord, field: usize) -> Result<Self> {
        source.get_value(field)
    }
}

/// Dense per-record storage for one column of element type `T`
#[derive(Debug, Clone)]
pub struct TypedStore<T: Element> {
    values: Vec<T>,
    nulls: Bitmap,
}

impl<T: Element> Default for TypedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> TypedStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            nulls: Bitmap::new(true),
        }
    }

    /// Number of record slots the store can address
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Grow to at least `capacity` slots, keeping existing values
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity > self.values.len() {
            self.values.resize(capacity, T::default());
            self.nulls.resize(capacity);
        }
    }

    #[inline]
    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.values.len() {
            return Err(Error::InvalidRecord(slot as i32));
        }
        Ok(())
    }

    /// Returns true if the slot holds NULL (or was never written)
    #[inline]
    pub fn is_null(&self, slot: usize) -> bool {
        slot >= self.values.len() || self.nulls.get(slot)
    }

    /// Borrow the element at a non-null slot
    #[inline]
    pub fn element(&self, slot: usize) -> Option<&T> {
        if self.is_null(slot) {
            None
        } else {
            self.values.get(slot)
        }
    }

    /// Read a slot as a value
    pub fn get(&self, slot: usize) -> Value {
        match self.element(slot) {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    /// Write a slot; NULL stores the element default and marks the slot null
    pub fn set(&mut self, slot: usize, value: &Value) -> Result<()> {
        self.check_slot(slot)?;
        if value.is_null() {
            self.values[slot] = T::default();
            self.nulls.set(slot, true);
        } else {
            self.values[slot] = T::from_value(value)?;
            self.nulls.set(slot, false);
        }
        Ok(())
    }

    /// Write an already-converted element
    pub fn set_element(&mut self, slot: usize, element: Option<T>) -> Result<()> {
        self.check_slot(slot)?;
        match element {
            Some(v) => {
                self.values[slot] = v;
                self.nulls.set(slot, false);
            }
            None => {
                self.values[slot] = T::default();
                self.nulls.set(slot, true);
            }
        }
        Ok(())
    }

    /// Compare two slots with `cmp`, NULLs first
    #[inline]
    pub fn compare_by(
        &self,
        slot1: usize,
        slot2: usize,
        cmp: impl Fn(&T, &T) -> Ordering,
    ) -> Ordering {
        match (self.element(slot1), self.element(slot2)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => cmp(a, b),
        }
    }

    /// Compare two slots in the element's natural order
    #[inline]
    pub fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering {
        self.compare_by(slot1, slot2, T::compare)
    }

    /// Compare a slot against a literal, converting the literal first
    pub fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering> {
        let literal = if value.is_null() {
            None
        } else {
            Some(T::from_value(value)?)
        };
        Ok(match (self.element(slot), literal.as_ref()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.compare(b),
        })
    }

    /// Copy null flag and value between two slots of this store
    pub fn copy_value(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_slot(to)?;
        let element = self.element(from).cloned();
        self.set_element(to, element)
    }

    /// Copy null flag and value from a slot of another store of the same type
    pub fn copy_value_from(&mut self, source: &TypedStore<T>, from: usize, to: usize) -> Result<()> {
        self.set_element(to, source.element(from).cloned())
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
        let element = T::read_external(source, field)?;
        self.set_element(slot, Some(element))
    }
}
