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


//! Column value stores
//!
//! One store per column holds that column's value for every record slot,
//! plus a null bitmap. The representation is picked once from the declared
//! column type:
//!
//! - [`BooleanStore`] - bits only
//! - [`StringStore`] - strings with a length limit and case mode
//! - [`TypedStore`] - dense typed arrays for the numeric, date-time,
//!   binary and object types
//!
//! [`DataContainer`] closes over these variants; the [`ColumnStore`] trait
//! is the common surface the record cache and keys talk to.

pub mod bitmap;
pub mod boolean;
pub mod string;
pub mod typed;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

pub use bitmap::Bitmap;
pub use boolean::BooleanStore;
pub use string::{compare_ignore_case, compare_strings, StringStore};
pub use typed::{Bytes, Element, TypedStore};

use crate::core::{DataType, Result, SchemaColumn, Value};
use crate::storage::external::ExternalRecord;

/// Common surface of every column store
pub trait ColumnStore {
    /// Declared type of the column
    fn data_type(&self) -> DataType;

    /// Number of addressable record slots
    fn capacity(&self) -> usize;

    /// Grow to at least `capacity` slots, preserving existing values
    fn set_capacity(&mut self, capacity: usize);

    /// Returns true if the slot holds NULL
    fn is_null(&self, slot: usize) -> bool;

    /// Read a slot
    fn get(&self, slot: usize) -> Value;

    /// Write a slot, converting the value to the column type
    fn set(&mut self, slot: usize, value: &Value) -> Result<()>;

    /// Order two slots, NULLs first
    fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering;

    /// Order a slot against a literal converted to the column type
    fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering>;

    /// Copy null flag and value between two slots
    fn copy_value(&mut self, from: usize, to: usize) -> Result<()>;

    /// Fill a slot from an external record using the type's getter
    fn set_from_external(
        &mut self,
        slot: usize,
        source: &dyn ExternalRecord,
        field: usize,
    ) -> Result<()>;
}

impl<T: Element> ColumnStore for TypedStore<T> {
    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn capacity(&self) -> usize {
        TypedStore::capacity(self)
    }

    fn set_capacity(&mut self, capacity: usize) {
        TypedStore::set_capacity(self, capacity)
    }

    fn is_null(&self, slot: usize) -> bool {
        TypedStore::is_null(self, slot)
    }

    fn get(&self, slot: usize) -> Value {
        TypedStore::get(self, slot)
    }

    fn set(&mut self, slot: usize, value: &Value) -> Result<()> {
        TypedStore::set(self, slot, value)
    }

    fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering {
        TypedStore::compare_values(self, slot1, slot2)
    }

    fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering> {
        TypedStore::compare_to_value(self, slot, value)
    }

    fn copy_value(&mut self, from: usize, to: usize) -> Result<()> {
        TypedStore::copy_value(self, from, to)
    }

    fn set_from_external(
        &mut self,
        slot: usize,
        source: &dyn ExternalRecord,
        field: usize,
    ) -> Result<()> {
        TypedStore::set_from_external(self, slot, source, field)
    }
}

macro_rules! delegate_store {
    ($ty:ty, $dt:expr) => {
        impl ColumnStore for $ty {
            fn data_type(&self) -> DataType {
                $dt
            }

            fn capacity(&self) -> usize {
                <$ty>::capacity(self)
            }

            fn set_capacity(&mut self, capacity: usize) {
                <$ty>::set_capacity(self, capacity)
            }

            fn is_null(&self, slot: usize) -> bool {
                <$ty>::is_null(self, slot)
            }

            fn get(&self, slot: usize) -> Value {
                <$ty>::get(self, slot)
            }

            fn set(&mut self, slot: usize, value: &Value) -> Result<()> {
                <$ty>::set(self, slot, value)
            }

            fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering {
                <$ty>::compare_values(self, slot1, slot2)
            }

            fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering> {
                <$ty>::compare_to_value(self, slot, value)
            }

            fn copy_value(&mut self, from: usize, to: usize) -> Result<()> {
                <$ty>::copy_value(self, from, to)
            }

            fn set_from_external(
                &mut self,
                slot: usize,
                source: &dyn ExternalRecord,
                field: usize,
            ) -> Result<()> {
                <$ty>::set_from_external(self, slot, source, field)
            }
        }
    };
}

delegate_store!(BooleanStore, DataType::Boolean);
delegate_store!(StringStore, DataType::String);

/// One column's store, in the representation chosen for its declared type
#[derive(Debug, Clone)]
pub enum DataContainer {
    Boolean(BooleanStore),
    Byte(TypedStore<u8>),
    Int16(TypedStore<i16>),
    Int32(TypedStore<i32>),
    Int64(TypedStore<i64>),
    Single(TypedStore<f32>),
    Double(TypedStore<f64>),
    String(StringStore),
    DateTime(TypedStore<DateTime<Utc>>),
    Binary(TypedStore<Bytes>),
    Object(TypedStore<Value>),
}

/// Run `$body` with `$store` bound to the variant's store
macro_rules! with_store {
    ($container:expr, $store:ident => $body:expr) => {
        match $container {
            DataContainer::Boolean($store) => $body,
            DataContainer::Byte($store) => $body,
            DataContainer::Int16($store) => $body,
            DataContainer::Int32($store) => $body,
            DataContainer::Int64($store) => $body,
            DataContainer::Single($store) => $body,
            DataContainer::Double($store) => $body,
            DataContainer::String($store) => $body,
            DataContainer::DateTime($store) => $body,
            DataContainer::Binary($store) => $body,
            DataContainer::Object($store) => $body,
        }
    };
}

impl DataContainer {
    /// Create the store for a schema column
    pub fn for_column(column: &SchemaColumn, case_sensitive: bool) -> Self {
        match column.data_type {
            DataType::Boolean => DataContainer::Boolean(BooleanStore::new()),
            DataType::Byte => DataContainer::Byte(TypedStore::new()),
            DataType::Int16 => DataContainer::Int16(TypedStore::new()),
            DataType::Int32 => DataContainer::Int32(TypedStore::new()),
            DataType::Int64 => DataContainer::Int64(TypedStore::new()),
            DataType::Single => DataContainer::Single(TypedStore::new()),
            DataType::Double => DataContainer::Double(TypedStore::new()),
            DataType::String => DataContainer::String(StringStore::new(
                column.name.clone(),
                column.max_length,
                case_sensitive,
            )),
            DataType::DateTime => DataContainer::DateTime(TypedStore::new()),
            DataType::Binary => DataContainer::Binary(TypedStore::new()),
            DataType::Object => DataContainer::Object(TypedStore::new()),
        }
    }

    /// The store behind the common interface
    #[inline]
    pub fn store(&self) -> &dyn ColumnStore {
        with_store!(self, s => s as &dyn ColumnStore)
    }

    /// The store behind the common interface, mutably
    #[inline]
    pub fn store_mut(&mut self) -> &mut dyn ColumnStore {
        with_store!(self, s => s as &mut dyn ColumnStore)
    }

    /// Copy a slot from another container
    ///
    /// Containers of the same representation copy elements directly;
    /// anything else goes through a value conversion.
    pub fn copy_value_from(&mut self, source: &DataContainer, from: usize, to: usize) -> Result<()> {
        match (self, source) {
            (DataContainer::Boolean(dst), DataContainer::Boolean(src)) => {
                dst.set_element(to, src.element(from))
            }
            (DataContainer::Byte(dst), DataContainer::Byte(src)) => dst.copy_value_from(src, from, to),
            (DataContainer::Int16(dst), DataContainer::Int16(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::Int32(dst), DataContainer::Int32(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::Int64(dst), DataContainer::Int64(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::Single(dst), DataContainer::Single(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::Double(dst), DataContainer::Double(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::String(dst), DataContainer::String(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::DateTime(dst), DataContainer::DateTime(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::Binary(dst), DataContainer::Binary(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (DataContainer::Object(dst), DataContainer::Object(src)) => {
                dst.copy_value_from(src, from, to)
            }
            (dst, src) => dst.store_mut().set(to, &src.store().get(from)),
        }
    }

    /// Switch string comparison mode; other representations ignore it
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if let DataContainer::String(s) = self {
            s.set_case_sensitive(case_sensitive);
        }
    }
}

impl ColumnStore for DataContainer {
    fn data_type(&self) -> DataType {
        self.store().data_type()
    }

    fn capacity(&self) -> usize {
        self.store().capacity()
    }

    fn set_capacity(&mut self, capacity: usize) {
        self.store_mut().set_capacity(capacity)
    }

    fn is_null(&self, slot: usize) -> bool {
        self.store().is_null(slot)
    }

    fn get(&self, slot: usize) -> Value {
        self.store().get(slot)
    }

    fn set(&mut self, slot: usize, value: &Value) -> Result<()> {
        self.store_mut().set(slot, value)
    }

    fn compare_values(&self, slot1: usize, slot2: usize) -> Ordering {
        self.store().compare_values(slot1, slot2)
    }

    fn compare_to_value(&self, slot: usize, value: &Value) -> Result<Ordering> {
        self.store().compare_to_value(slot, value)
    }

    fn copy_value(&mut self, from: usize, to: usize) -> Result<()> {
        self.store_mut().copy_value(from, to)
    }

    fn set_from_external(
        &mut self,
        slot: usize,
        source: &dyn ExternalRecord,
        field: usize,
    ) -> Result<()> {
        self.store_mut().set_from_external(slot, source, field)
    }
}
