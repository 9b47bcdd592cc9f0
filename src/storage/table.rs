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

//! In-memory data table
//!
//! [`DataTable`] owns the record cache, the row collection, and every index
//! registered over them. Each row mutation is turned into one notification
//! per index, so indexes stay in step without being rebuilt.
//!
//! Edits never overwrite a record in place: a new current record is
//! allocated, and records the row no longer points at are disposed once
//! every index has been told.

use tracing::{debug, trace};

use crate::core::{Error, Result, RowState, RowVersion, Schema, Value};
use crate::storage::config::CacheConfig;
use crate::storage::external::ExternalRecord;
use crate::storage::index::Index;
use crate::storage::key::Key;
use crate::storage::record_cache::{RecordCache, RecordId, NO_RECORD};
use crate::storage::row::{DataRow, RowCollection, RowId};

/// Handle of an index registered with a table
pub type IndexId = usize;

/// Rows of one schema with their version records and indexes
#[derive(Debug)]
pub struct DataTable {
    schema: Schema,
    cache: RecordCache,
    rows: RowCollection,
    indexes: Vec<Option<Index>>,
}

impl DataTable {
    /// Create an empty table with the default configuration
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, CacheConfig::default())
    }

    /// Create an empty table
    pub fn with_config(schema: Schema, config: CacheConfig) -> Self {
        let cache = RecordCache::new(&schema, config);
        Self {
            schema,
            cache,
            rows: RowCollection::new(),
            indexes: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn rows(&self) -> &RowCollection {
        &self.rows
    }

    /// Number of rows, including deleted rows not yet accepted
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, id: RowId) -> Result<&DataRow> {
        self.rows.get(id).ok_or(Error::RowNotFound(id))
    }

    pub fn row_state(&self, id: RowId) -> Result<RowState> {
        Ok(self.row(id)?.state())
    }

    /// Record holding a version of a row
    pub fn record(&self, id: RowId, version: RowVersion) -> Result<RecordId> {
        let record = self.row(id)?.record_for(version);
        if record == NO_RECORD {
            return Err(Error::version_not_found(id, version.to_string()));
        }
        Ok(record)
    }

    /// Read one column of a row version
    pub fn get_value(&self, id: RowId, column: usize, version: RowVersion) -> Result<Value> {
        let record = self.record(id, version)?;
        self.cache.get_value(record, column)
    }

    /// Read every column of a row version
    pub fn row_values(&self, id: RowId, version: RowVersion) -> Result<Vec<Value>> {
        let record = self.record(id, version)?;
        self.cache.record_values(record)
    }

    // =========================================================================
    // Row mutations
    // =========================================================================

    /// Allocate a record and fill it, disposing it again if filling fails
    fn new_filled_record(
        &mut self,
        fill: impl FnOnce(&mut RecordCache, RecordId) -> Result<()>,
    ) -> Result<RecordId> {
        let record = self.cache.new_record()?;
        if let Err(err) = fill(&mut self.cache, record) {
            self.cache.dispose_record(record)?;
            return Err(err);
        }
        Ok(record)
    }

    fn insert_row(&mut self, original: RecordId, current: RecordId) -> Result<RowId> {
        let id = self.rows.insert(original, current);
        for record in [original, current] {
            if record != NO_RECORD {
                self.cache.set_row_of(record, Some(id))?;
            }
        }
        let row = DataRow::new(id, original, current);
        for index in self.indexes.iter_mut().flatten() {
            index.add(&self.cache, &row);
        }
        trace!(row = id, state = %row.state(), "inserted row");
        Ok(id)
    }

    /// Add a new row in the `Added` state
    pub fn add_row(&mut self, values: &[Value]) -> Result<RowId> {
        self.schema.validate_column_count(values.len())?;
        let record = self.new_filled_record(|cache, r| cache.set_record_values(r, values))?;
        self.insert_row(NO_RECORD, record)
    }

    /// Add a row read from an external source, in the `Unchanged` state
    ///
    /// Field `i` of the source fills column `i`. A failed read leaves the
    /// table untouched.
    pub fn load_row(&mut self, source: &dyn ExternalRecord) -> Result<RowId> {
        let record = self.new_filled_record(|cache, r| cache.set_from_external(r, source))?;
        self.insert_row(record, record)
    }

    /// Replace every column of a row's current version
    pub fn set_values(&mut self, id: RowId, values: &[Value]) -> Result<()> {
        self.schema.validate_column_count(values.len())?;
        let row = *self.row(id)?;
        if row.current == NO_RECORD {
            return Err(Error::version_not_found(id, RowVersion::Current.to_string()));
        }
        let record = self.new_filled_record(|cache, r| cache.set_record_values(r, values))?;
        self.transition(id, row.original, record)
    }

    /// Replace one column of a row's current version
    pub fn set_value(&mut self, id: RowId, column: usize, value: &Value) -> Result<()> {
        let row = *self.row(id)?;
        if row.current == NO_RECORD {
            return Err(Error::version_not_found(id, RowVersion::Current.to_string()));
        }
        let record = self.new_filled_record(|cache, r| {
            cache.copy_record(row.current, r)?;
            cache.set_value(r, column, value)
        })?;
        self.transition(id, row.original, record)
    }

    /// Mark a row deleted; an added row is removed outright
    pub fn delete_row(&mut self, id: RowId) -> Result<()> {
        let row = *self.row(id)?;
        match row.state() {
            RowState::Added => self.transition(id, NO_RECORD, NO_RECORD),
            RowState::Deleted | RowState::Detached => Err(Error::version_not_found(
                id,
                RowVersion::Current.to_string(),
            )),
            RowState::Unchanged | RowState::Modified => self.transition(id, row.original, NO_RECORD),
        }
    }

    /// Make the current version of a row its baseline
    pub fn accept_row(&mut self, id: RowId) -> Result<()> {
        let row = *self.row(id)?;
        match row.state() {
            RowState::Added | RowState::Modified => self.transition(id, row.current, row.current),
            RowState::Deleted => self.transition(id, NO_RECORD, NO_RECORD),
            RowState::Unchanged | RowState::Detached => Ok(()),
        }
    }

    /// Roll a row back to its baseline; an added row is removed
    pub fn reject_row(&mut self, id: RowId) -> Result<()> {
        let row = *self.row(id)?;
        match row.state() {
            RowState::Added => self.transition(id, NO_RECORD, NO_RECORD),
            RowState::Modified | RowState::Deleted => {
                self.transition(id, row.original, row.original)
            }
            RowState::Unchanged | RowState::Detached => Ok(()),
        }
    }

    /// Accept the changes of every row
    pub fn accept_changes(&mut self) -> Result<()> {
        for id in self.rows.ids() {
            self.accept_row(id)?;
        }
        Ok(())
    }

    /// Reject the changes of every row
    pub fn reject_changes(&mut self) -> Result<()> {
        for id in self.rows.ids() {
            self.reject_row(id)?;
        }
        Ok(())
    }

    /// Remove a row from the table whatever its state
    pub fn remove_row(&mut self, id: RowId) -> Result<()> {
        self.row(id)?;
        self.transition(id, NO_RECORD, NO_RECORD)
    }

    /// Point a row at new version records, notify every index, then
    /// dispose the records the row dropped
    fn transition(&mut self, id: RowId, original: RecordId, current: RecordId) -> Result<()> {
        let old = *self.row(id)?;
        let new = DataRow::new(id, original, current);

        if new.state() == RowState::Detached {
            self.rows.remove(id);
        } else if let Some(row) = self.rows.get_mut(id) {
            *row = new;
        }
        for record in [original, current] {
            if record != NO_RECORD {
                self.cache.set_row_of(record, Some(id))?;
            }
        }

        let old_state = old.state();
        for index in self.indexes.iter_mut().flatten() {
            let (old_record, old_version) =
                match index.key().row_state_filter().version_for(old_state) {
                    Some(version) => (old.record_for(version), version),
                    None => (NO_RECORD, RowVersion::Current),
                };
            index.update(&self.cache, &new, old_record, old_version, old_state);
        }

        for (i, record) in [old.original, old.current].into_iter().enumerate() {
            let repeated = i == 1 && old.current == old.original;
            if record != NO_RECORD && !repeated && record != original && record != current {
                self.cache.dispose_record(record)?;
            }
        }
        trace!(row = id, from = %old_state, to = %new.state(), "row transition");
        Ok(())
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Get an index for `key`, sharing an existing one with an equal key
    ///
    /// Every call takes a reference that [`DataTable::release_index`] gives
    /// back.
    pub fn get_index(&mut self, key: Key) -> Result<IndexId> {
        key.validate(self.schema.column_count())?;
        if let Some(id) = self
            .indexes
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|index| *index.key() == key))
        {
            if let Some(index) = self.indexes[id].as_mut() {
                let refs = index.add_ref();
                trace!(index = id, refs, "shared index");
            }
            return Ok(id);
        }

        let mut index = Index::new(key, &self.cache, &self.rows);
        index.add_ref();
        debug!(key = %index.key(), records = index.len(), "registered index");
        match self.indexes.iter().position(Option::is_none) {
            Some(id) => {
                self.indexes[id] = Some(index);
                Ok(id)
            }
            None => {
                self.indexes.push(Some(index));
                Ok(self.indexes.len() - 1)
            }
        }
    }

    /// Give back a reference taken by [`DataTable::get_index`]
    ///
    /// The index is dropped when the last reference goes.
    pub fn release_index(&mut self, id: IndexId) -> Result<()> {
        let index = self.index_mut(id)?;
        if index.remove_ref() == 0 {
            self.indexes[id] = None;
            debug!(index = id, "dropped index");
        }
        Ok(())
    }

    pub fn index(&self, id: IndexId) -> Result<&Index> {
        self.indexes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(Error::IndexNotFound(id))
    }

    fn index_mut(&mut self, id: IndexId) -> Result<&mut Index> {
        self.indexes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(Error::IndexNotFound(id))
    }

    /// Number of live indexes
    pub fn index_count(&self) -> usize {
        self.indexes.iter().flatten().count()
    }

    /// Rebuild every index from the rows
    pub fn reset_indexes(&mut self) {
        for index in self.indexes.iter_mut().flatten() {
            index.reset(&self.cache, &self.rows);
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.cache.case_sensitive()
    }

    /// Change string comparison mode and rebuild every index
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if self.cache.case_sensitive() == case_sensitive {
            return;
        }
        self.cache.set_case_sensitive(case_sensitive);
        debug!(case_sensitive, "string comparison mode changed");
        self.reset_indexes();
    }

    fn rows_of(&self, records: &[RecordId]) -> Vec<RowId> {
        records
            .iter()
            .filter_map(|&record| self.cache.row_of(record))
            .collect()
    }

    /// Row whose indexed version has key values `values`
    pub fn find(&mut self, id: IndexId, values: &[Value]) -> Result<Option<RowId>> {
        let index = self
            .indexes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(Error::IndexNotFound(id))?;
        let record = index.find(&mut self.cache, values)?;
        Ok(self.cache.row_of(record))
    }

    /// Every row whose indexed version has key values `values`
    pub fn find_all(&mut self, id: IndexId, values: &[Value]) -> Result<Vec<RowId>> {
        let index = self
            .indexes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(Error::IndexNotFound(id))?;
        let records = index.find_all(&mut self.cache, values)?;
        Ok(self.rows_of(&records))
    }

    /// Rows between two key prefixes, both inclusive, in index order
    pub fn find_range(
        &mut self,
        id: IndexId,
        lower: &[Value],
        upper: &[Value],
    ) -> Result<Vec<RowId>> {
        let index = self
            .indexes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(Error::IndexNotFound(id))?;
        let range = index.find_range(&mut self.cache, lower, upper)?;
        let records = index.records()[range].to_vec();
        Ok(self.rows_of(&records))
    }

    /// Rows in index order
    pub fn sorted_rows(&self, id: IndexId) -> Result<Vec<RowId>> {
        Ok(self.index(id)?.get_all_rows(&self.cache))
    }

    /// Rows in index order, first of each run of equal keys
    pub fn distinct_rows(&self, id: IndexId) -> Result<Vec<RowId>> {
        Ok(self.index(id)?.get_distinct_rows(&self.cache))
    }

    pub fn has_duplicates(&mut self, id: IndexId) -> Result<bool> {
        let index = self
            .indexes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(Error::IndexNotFound(id))?;
        Ok(index.has_duplicates(&self.cache))
    }

    /// Rows sharing their key values with another row
    pub fn duplicates(&mut self, id: IndexId) -> Result<Vec<RowId>> {
        let index = self
            .indexes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(Error::IndexNotFound(id))?;
        let records = index.duplicates(&self.cache);
        Ok(self.rows_of(&records))
    }
}
