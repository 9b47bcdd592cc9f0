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

//! Row version model
//!
//! A row is a logical entity pointing at up to two physical records: the
//! original (baseline) version and the current (working) version. Its state
//! is derived from which of the two exist and whether they are the same.

use super::record_cache::{RecordId, NO_RECORD};
use crate::core::{RowState, RowVersion};

/// Logical row identifier, stable for the lifetime of the row
pub type RowId = usize;

/// A row and its version records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRow {
    pub id: RowId,
    pub original: RecordId,
    pub current: RecordId,
}

impl DataRow {
    pub fn new(id: RowId, original: RecordId, current: RecordId) -> Self {
        Self {
            id,
            original,
            current,
        }
    }

    /// Derive the row state from its version records
    pub fn state(&self) -> RowState {
        match (self.original, self.current) {
            (NO_RECORD, NO_RECORD) => RowState::Detached,
            (NO_RECORD, _) => RowState::Added,
            (_, NO_RECORD) => RowState::Deleted,
            (o, c) if o == c => RowState::Unchanged,
            _ => RowState::Modified,
        }
    }

    /// Record holding the given version, or [`NO_RECORD`]
    #[inline]
    pub fn record_for(&self, version: RowVersion) -> RecordId {
        match version {
            RowVersion::Original => self.original,
            RowVersion::Current => self.current,
        }
    }

    #[inline]
    pub fn has_version(&self, version: RowVersion) -> bool {
        self.record_for(version) != NO_RECORD
    }
}

/// Slab of rows; removed ids are handed out again, most recent first
#[derive(Debug, Clone, Default)]
pub struct RowCollection {
    slots: Vec<Option<DataRow>>,
    free_ids: Vec<RowId>,
    len: usize,
}

impl RowCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row with the given version records, returning its id
    pub fn insert(&mut self, original: RecordId, current: RecordId) -> RowId {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        self.slots[id] = Some(DataRow::new(id, original, current));
        self.len += 1;
        id
    }

    #[inline]
    pub fn get(&self, id: RowId) -> Option<&DataRow> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: RowId) -> Option<&mut DataRow> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    /// Remove a row, freeing its id
    pub fn remove(&mut self, id: RowId) -> Option<DataRow> {
        let row = self.slots.get_mut(id)?.take()?;
        self.free_ids.push(id);
        self.len -= 1;
        Some(row)
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rows in id order
    pub fn iter(&self) -> impl Iterator<Item = &DataRow> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Row ids in id order
    pub fn ids(&self) -> Vec<RowId> {
        self.iter().map(|r| r.id).collect()
    }
}
