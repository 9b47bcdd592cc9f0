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

//! Record cache
//!
//! A record is a physical slot shared by every column store of a table.
//! The cache owns those stores, hands out record ids, and recycles disposed
//! ids through a LIFO free list. Ids are never compacted; a disposed id may
//! come back for an unrelated row.

use std::cmp::Ordering;
use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use super::config::CacheConfig;
use super::container::{Bitmap, ColumnStore, DataContainer};
use super::external::ExternalRecord;
use crate::core::{Error, Result, Schema, Value};

/// Physical record identifier
pub type RecordId = i32;

/// Marker for "no record"
pub const NO_RECORD: RecordId = -1;

/// Column stores of one table plus the record slot allocator
#[derive(Debug, Clone)]
pub struct RecordCache {
    columns: Vec<DataContainer>,
    /// Slots addressable in every store
    capacity: usize,
    /// Next never-issued id
    next_record: usize,
    free_list: Vec<RecordId>,
    /// Slots currently on the free list
    free: Bitmap,
    /// Owning row per slot, `None` for free and temporary slots
    row_of: Vec<Option<usize>>,
    config: CacheConfig,
}

impl RecordCache {
    /// Create the stores for every column of `schema`
    pub fn new(schema: &Schema, config: CacheConfig) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|c| DataContainer::for_column(c, config.case_sensitive))
            .collect();
        let mut cache = Self {
            columns,
            capacity: 0,
            next_record: 0,
            free_list: Vec::new(),
            free: Bitmap::new(false),
            row_of: Vec::new(),
            config,
        };
        if cache.config.initial_capacity > 0 {
            cache.set_capacity(cache.config.initial_capacity);
        }
        cache
    }

    /// Number of column stores
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Store of one column
    #[inline]
    pub fn column(&self, column: usize) -> Option<&DataContainer> {
        self.columns.get(column)
    }

    /// Current slot capacity shared by all stores
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of issued records not yet disposed
    pub fn live_records(&self) -> usize {
        self.next_record - self.free_list.len()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn case_sensitive(&self) -> bool {
        self.config.case_sensitive
    }

    /// Switch the string comparison mode of every store
    ///
    /// Indexes over this cache are stale afterwards and must be reset.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.config.case_sensitive = case_sensitive;
        for column in &mut self.columns {
            column.set_case_sensitive(case_sensitive);
        }
    }

    /// Grow every store to at least `capacity` slots
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        for column in &mut self.columns {
            column.set_capacity(capacity);
        }
        self.row_of.resize(capacity, None);
        self.capacity = capacity;
    }

    /// Issue a record id, reusing the most recently disposed one first
    pub fn new_record(&mut self) -> Result<RecordId> {
        if let Some(record) = self.free_list.pop() {
            self.free.set(record as usize, false);
            trace!(record, "reused record slot");
            return Ok(record);
        }

        let slot = self.next_record;
        let record =
            RecordId::try_from(slot).map_err(|_| Error::internal("record id space exhausted"))?;
        if slot >= self.capacity {
            let new_capacity = self.config.grown_record_capacity(self.capacity, slot + 1);
            debug!(
                old_capacity = self.capacity,
                new_capacity, "growing record stores"
            );
            self.set_capacity(new_capacity);
        }
        self.next_record += 1;
        Ok(record)
    }

    /// Return a record id to the free list
    ///
    /// Stored values are left in place; the next owner overwrites them.
    /// Disposing a record that is already free is an argument error.
    pub fn dispose_record(&mut self, record: RecordId) -> Result<()> {
        let slot = self.issued_slot(record)?;
        if self.free.get(slot) {
            return Err(Error::InvalidRecord(record));
        }
        self.free.set(slot, true);
        self.row_of[slot] = None;
        self.free_list.push(record);
        Ok(())
    }

    /// Borrow a temporary record released when the guard drops
    pub fn pooled_record(&mut self) -> Result<PooledRecord<'_>> {
        let record = self.new_record()?;
        Ok(PooledRecord {
            cache: self,
            record,
        })
    }

    /// Validate that `record` names an issued slot
    fn issued_slot(&self, record: RecordId) -> Result<usize> {
        if record < 0 || record as usize >= self.next_record {
            return Err(Error::InvalidRecord(record));
        }
        Ok(record as usize)
    }

    fn store(&self, column: usize) -> Result<&DataContainer> {
        self.columns
            .get(column)
            .ok_or(Error::ColumnIndexOutOfBounds { index: column })
    }

    fn store_mut(&mut self, column: usize) -> Result<&mut DataContainer> {
        self.columns
            .get_mut(column)
            .ok_or(Error::ColumnIndexOutOfBounds { index: column })
    }

    /// Read one column of a record
    pub fn get_value(&self, record: RecordId, column: usize) -> Result<Value> {
        let slot = self.issued_slot(record)?;
        Ok(self.store(column)?.get(slot))
    }

    /// Write one column of a record
    pub fn set_value(&mut self, record: RecordId, column: usize, value: &Value) -> Result<()> {
        let slot = self.issued_slot(record)?;
        self.store_mut(column)?.set(slot, value)
    }

    /// Returns true if a column of the record holds NULL
    pub fn is_null(&self, record: RecordId, column: usize) -> Result<bool> {
        let slot = self.issued_slot(record)?;
        Ok(self.store(column)?.is_null(slot))
    }

    /// Write every column of a record
    pub fn set_record_values(&mut self, record: RecordId, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::table_columns_not_match(
                self.columns.len(),
                values.len(),
            ));
        }
        let slot = self.issued_slot(record)?;
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.set(slot, value)?;
        }
        Ok(())
    }

    /// Read every column of a record
    pub fn record_values(&self, record: RecordId) -> Result<Vec<Value>> {
        let slot = self.issued_slot(record)?;
        Ok(self.columns.iter().map(|c| c.get(slot)).collect())
    }

    /// Copy every column of one record onto another
    pub fn copy_record(&mut self, from: RecordId, to: RecordId) -> Result<()> {
        let from = self.issued_slot(from)?;
        let to = self.issued_slot(to)?;
        if from == to {
            return Ok(());
        }
        for column in &mut self.columns {
            column.copy_value(from, to)?;
        }
        Ok(())
    }

    /// Fill every column of a record from an external source, field by field
    pub fn set_from_external(&mut self, record: RecordId, source: &dyn ExternalRecord) -> Result<()> {
        if source.field_count() < self.columns.len() {
            return Err(Error::table_columns_not_match(
                self.columns.len(),
                source.field_count(),
            ));
        }
        let slot = self.issued_slot(record)?;
        for (field, column) in self.columns.iter_mut().enumerate() {
            column.set_from_external(slot, source, field)?;
        }
        Ok(())
    }

    /// Compare one column of two records, NULLs first
    ///
    /// Both records must be issued; this sits on the index hot path.
    #[inline]
    pub fn compare_column(&self, column: usize, record1: RecordId, record2: RecordId) -> Ordering {
        match self.columns.get(column) {
            Some(store) => store.compare_values(record1 as usize, record2 as usize),
            None => Ordering::Equal,
        }
    }

    /// Row owning a record, if any
    #[inline]
    pub fn row_of(&self, record: RecordId) -> Option<usize> {
        if record < 0 {
            return None;
        }
        self.row_of.get(record as usize).copied().flatten()
    }

    /// Associate a record with its owning row
    pub fn set_row_of(&mut self, record: RecordId, row: Option<usize>) -> Result<()> {
        let slot = self.issued_slot(record)?;
        self.row_of[slot] = row;
        Ok(())
    }
}

/// A temporary record owned for the lifetime of the guard
///
/// Dereferences to the cache so lookups can write the record and compare
/// against it while the guard is alive. Dropping the guard disposes the
/// record on every exit path.
pub struct PooledRecord<'a> {
    cache: &'a mut RecordCache,
    record: RecordId,
}

impl PooledRecord<'_> {
    /// The temporary record id
    #[inline]
    pub fn record(&self) -> RecordId {
        self.record
    }
}

impl Deref for PooledRecord<'_> {
    type Target = RecordCache;

    fn deref(&self) -> &RecordCache {
        self.cache
    }
}

impl DerefMut for PooledRecord<'_> {
    fn deref_mut(&mut self) -> &mut RecordCache {
        self.cache
    }
}

impl Drop for PooledRecord<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.cache.dispose_record(self.record) {
            debug!(record = self.record, error = %err, "failed to release pooled record");
        }
    }
}
