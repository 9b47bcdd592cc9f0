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

//! Sorted record index
//!
//! An [`Index`] keeps the records selected by one [`Key`] in a dense array
//! sorted by that key. Row mutations are applied incrementally: inserts and
//! relocations binary-search their slot and shift the tail, so the array
//! is only fully sorted when the index is built or reset.

use std::cmp::Ordering;
use std::ops::Range;

use tracing::debug;

use super::search;
use crate::core::{Error, Result, RowState, RowVersion, Value};
use crate::storage::config::CacheConfig;
use crate::storage::key::Key;
use crate::storage::record_cache::{RecordCache, RecordId, NO_RECORD};
use crate::storage::row::{DataRow, RowCollection, RowId};

/// Cached answer to "does any pair of records compare equal"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateState {
    Unknown,
    True,
    False,
}

/// Sorted, duplicate-aware array of the records one key selects
#[derive(Debug, Clone)]
pub struct Index {
    key: Key,
    /// Allocated slots; entries at `size..` are unused
    records: Vec<RecordId>,
    size: usize,
    duplicates: DuplicateState,
    ref_count: usize,
    config: CacheConfig,
}

impl Index {
    /// Build an index over every row of `rows`
    pub fn new(key: Key, cache: &RecordCache, rows: &RowCollection) -> Self {
        let mut index = Self {
            key,
            records: Vec::new(),
            size: 0,
            duplicates: DuplicateState::Unknown,
            ref_count: 0,
            config: cache.config().clone(),
        };
        index.rebuild(cache, rows);
        index
    }

    #[inline]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Number of indexed records
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Allocated record slots, at least [`Index::len`]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Indexed records in key order
    #[inline]
    pub fn records(&self) -> &[RecordId] {
        &self.records[..self.size]
    }

    /// Record at a sorted position
    pub fn record_at(&self, pos: usize) -> Option<RecordId> {
        self.records().get(pos).copied()
    }

    pub fn duplicate_state(&self) -> DuplicateState {
        self.duplicates
    }

    // =========================================================================
    // Reference counting
    // =========================================================================

    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// Register one more holder, returning the new count
    pub fn add_ref(&mut self) -> usize {
        self.ref_count += 1;
        self.ref_count
    }

    /// Drop one holder, returning the new count
    pub fn remove_ref(&mut self) -> usize {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Discard the array and rebuild it from the rows
    pub fn reset(&mut self, cache: &RecordCache, rows: &RowCollection) {
        self.records = Vec::new();
        self.size = 0;
        self.duplicates = DuplicateState::Unknown;
        self.rebuild(cache, rows);
    }

    fn rebuild(&mut self, cache: &RecordCache, rows: &RowCollection) {
        let key = &self.key;
        let mut records: Vec<RecordId> = rows
            .iter()
            .map(|row| key.get_record(cache, row))
            .filter(|&record| record != NO_RECORD)
            .collect();
        let found_equal = search::merge_sort(&mut records, |a, b| key.compare_records(cache, a, b));

        self.size = records.len();
        self.records = records;
        self.duplicates = if found_equal {
            DuplicateState::True
        } else {
            DuplicateState::False
        };
        debug!(
            key = %self.key,
            records = self.size,
            duplicates = found_equal,
            "rebuilt index"
        );
    }

    /// Returns true if the records are in key order
    pub fn is_sorted(&self, cache: &RecordCache) -> bool {
        self.records()
            .windows(2)
            .all(|w| self.key.compare_records(cache, w[0], w[1]) != Ordering::Greater)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Write `values` into the key columns of a temporary record and run
    /// `f` against it; the record is released on every path
    fn with_probe<T>(
        &self,
        cache: &mut RecordCache,
        values: &[Value],
        f: impl FnOnce(&RecordCache, RecordId) -> T,
    ) -> Result<T> {
        let mut pooled = cache.pooled_record()?;
        let probe = pooled.record();
        for (&column, value) in self.key.columns().iter().zip(values) {
            pooled.set_value(probe, column, value)?;
        }
        Ok(f(&*pooled, probe))
    }

    fn exact_position(&self, cache: &RecordCache, probe: RecordId) -> Option<usize> {
        search::exact_search(self.records(), 0, self.size, |el| {
            self.key.compare_records(cache, el, probe)
        })
    }

    fn equal_positions(&self, cache: &RecordCache, probe: RecordId) -> Range<usize> {
        match self.exact_position(cache, probe) {
            Some(pos) => search::equal_run(self.records(), pos, |el| {
                self.key.compare_records(cache, el, probe)
            }),
            None => 0..0,
        }
    }

    /// Position of a record whose key columns equal `values`
    pub fn find_index(&self, cache: &mut RecordCache, values: &[Value]) -> Result<Option<usize>> {
        self.key.check_arity(values.len())?;
        self.with_probe(cache, values, |cache, probe| self.exact_position(cache, probe))
    }

    /// Stored record whose key columns equal `values`, or [`NO_RECORD`]
    pub fn find(&self, cache: &mut RecordCache, values: &[Value]) -> Result<RecordId> {
        Ok(self
            .find_index(cache, values)?
            .map_or(NO_RECORD, |pos| self.records[pos]))
    }

    /// Position of a stored record with the same key values as `record`
    pub fn find_record_index(&self, cache: &RecordCache, record: RecordId) -> Option<usize> {
        self.exact_position(cache, record)
    }

    /// Stored record with the same key values as `record`, or [`NO_RECORD`]
    pub fn find_record(&self, cache: &RecordCache, record: RecordId) -> RecordId {
        self.find_record_index(cache, record)
            .map_or(NO_RECORD, |pos| self.records[pos])
    }

    /// Positions of every record whose key columns equal `values`
    ///
    /// Values that don't convert to the column types match nothing.
    pub fn find_all_indexes(
        &self,
        cache: &mut RecordCache,
        values: &[Value],
    ) -> Result<Range<usize>> {
        self.key.check_arity(values.len())?;
        match self.with_probe(cache, values, |cache, probe| self.equal_positions(cache, probe)) {
            Ok(range) => Ok(range),
            Err(err) if err.is_conversion_error() => {
                debug!(key = %self.key, error = %err, "lookup values did not convert");
                Ok(0..0)
            }
            Err(err) => Err(err),
        }
    }

    /// Every record whose key columns equal `values`, in index order
    pub fn find_all(&self, cache: &mut RecordCache, values: &[Value]) -> Result<Vec<RecordId>> {
        let range = self.find_all_indexes(cache, values)?;
        Ok(self.records[range].to_vec())
    }

    /// Positions of every record with the same key values as `record`
    pub fn find_all_record_indexes(&self, cache: &RecordCache, record: RecordId) -> Range<usize> {
        self.equal_positions(cache, record)
    }

    /// Every record with the same key values as `record`
    pub fn find_all_records(&self, cache: &RecordCache, record: RecordId) -> Vec<RecordId> {
        self.records[self.equal_positions(cache, record)].to_vec()
    }

    /// Positions between two key prefixes, both bounds inclusive
    ///
    /// Bounds follow index order, so on a descending column `lower` holds
    /// the larger value. An empty bound is open.
    pub fn find_range(
        &self,
        cache: &mut RecordCache,
        lower: &[Value],
        upper: &[Value],
    ) -> Result<Range<usize>> {
        for bound in [lower, upper] {
            if bound.len() > self.key.column_count() {
                return Err(Error::key_arity_mismatch(
                    self.key.column_count(),
                    bound.len(),
                ));
            }
        }

        let start = if lower.is_empty() {
            0
        } else {
            self.with_probe(cache, lower, |cache, probe| {
                search::lower_bound(self.records(), |el| {
                    self.key.compare_prefix(cache, el, probe, lower.len())
                })
            })?
        };
        let end = if upper.is_empty() {
            self.size
        } else {
            self.with_probe(cache, upper, |cache, probe| {
                search::upper_bound(self.records(), |el| {
                    self.key.compare_prefix(cache, el, probe, upper.len())
                })
            })?
        };
        Ok(start..end.max(start))
    }

    /// Returns true if `record` itself is stored in the index
    pub fn contains_record(&self, cache: &RecordCache, record: RecordId) -> bool {
        self.position_of(cache, record).is_some()
    }

    // =========================================================================
    // Enumeration
    // =========================================================================

    /// All records in key order
    pub fn get_all(&self) -> Vec<RecordId> {
        self.records().to_vec()
    }

    /// Owning rows of all records in key order
    pub fn get_all_rows(&self, cache: &RecordCache) -> Vec<RowId> {
        self.records()
            .iter()
            .filter_map(|&record| cache.row_of(record))
            .collect()
    }

    /// Owning rows in key order, keeping the first row of each equal run
    pub fn get_distinct_rows(&self, cache: &RecordCache) -> Vec<RowId> {
        let records = self.records();
        let mut rows = Vec::with_capacity(records.len());
        for (i, &record) in records.iter().enumerate() {
            if i > 0 && self.key.compare_records(cache, records[i - 1], record) == Ordering::Equal {
                continue;
            }
            if let Some(row) = cache.row_of(record) {
                rows.push(row);
            }
        }
        rows
    }

    /// Returns true if any two records compare equal
    ///
    /// Resolves an unknown state with a scan over adjacent pairs.
    pub fn has_duplicates(&mut self, cache: &RecordCache) -> bool {
        if self.duplicates == DuplicateState::Unknown {
            let found = self
                .records()
                .windows(2)
                .any(|w| self.key.compare_records(cache, w[0], w[1]) == Ordering::Equal);
            self.duplicates = if found {
                DuplicateState::True
            } else {
                DuplicateState::False
            };
        }
        self.duplicates == DuplicateState::True
    }

    /// Every record belonging to a run of two or more equal records
    pub fn duplicates(&mut self, cache: &RecordCache) -> Vec<RecordId> {
        if !self.has_duplicates(cache) {
            return Vec::new();
        }
        let records = self.records();
        let mut out = Vec::new();
        let mut i = 0;
        while i < records.len() {
            let run = search::equal_run(records, i, |el| {
                self.key.compare_records(cache, el, records[i])
            });
            if run.len() > 1 {
                out.extend_from_slice(&records[run.clone()]);
            }
            i = run.end;
        }
        out
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Index the record `row` resolves to, if any
    ///
    /// Returns true if a record was inserted.
    pub fn add(&mut self, cache: &RecordCache, row: &DataRow) -> bool {
        let record = self.key.get_record(cache, row);
        if record == NO_RECORD {
            return false;
        }
        self.insert(cache, record);
        true
    }

    /// Remove the record `row` currently resolves to
    pub fn delete(&mut self, cache: &RecordCache, row: &DataRow) -> bool {
        let record = self.key.get_record(cache, row);
        self.delete_record(cache, record)
    }

    /// Remove a record by identity
    pub fn delete_record(&mut self, cache: &RecordCache, record: RecordId) -> bool {
        if record == NO_RECORD {
            return false;
        }
        match self.position_of(cache, record) {
            Some(pos) => {
                self.remove_at(cache, pos, false);
                true
            }
            None => false,
        }
    }

    /// Bring the index in line with a row that changed
    ///
    /// `old_record` is the record this index held for the row before the
    /// change, as the `old_version` of a row in `old_state`.
    pub fn update(
        &mut self,
        cache: &RecordCache,
        row: &DataRow,
        old_record: RecordId,
        old_version: RowVersion,
        old_state: RowState,
    ) {
        let old_pos = if old_record != NO_RECORD
            && self
                .key
                .row_state_filter()
                .contains_version(old_state, old_version)
        {
            self.position_of(cache, old_record)
        } else {
            None
        };
        let new_record = self.key.get_record(cache, row);

        match (old_pos, new_record) {
            (None, NO_RECORD) => {}
            (None, record) => {
                self.insert(cache, record);
            }
            (Some(pos), NO_RECORD) => {
                // The row may still hold the record with its values rewritten
                let in_place = old_record == row.current || old_record == row.original;
                self.remove_at(cache, pos, in_place);
            }
            (Some(pos), record) => self.relocate(cache, pos, record),
        }
    }

    /// Locate a record by identity
    ///
    /// Searches the run of records equal to it first, then falls back to a
    /// linear scan for records whose values changed since they were placed.
    fn position_of(&self, cache: &RecordCache, record: RecordId) -> Option<usize> {
        let records = self.records();
        if let Some(pos) = self.exact_position(cache, record) {
            let run = search::equal_run(records, pos, |el| {
                self.key.compare_records(cache, el, record)
            });
            if let Some(offset) = records[run.clone()].iter().position(|&r| r == record) {
                return Some(run.start + offset);
            }
        }
        records.iter().position(|&r| r == record)
    }

    /// Returns true if the record at `pos` equals a neighbour
    fn ties_neighbor(&self, cache: &RecordCache, pos: usize) -> bool {
        let records = self.records();
        let record = records[pos];
        (pos > 0 && self.key.compare_records(cache, records[pos - 1], record) == Ordering::Equal)
            || (pos + 1 < records.len()
                && self.key.compare_records(cache, record, records[pos + 1]) == Ordering::Equal)
    }

    fn note_placed(&mut self, cache: &RecordCache, pos: usize) {
        if self.duplicates != DuplicateState::True && self.ties_neighbor(cache, pos) {
            self.duplicates = DuplicateState::True;
        }
    }

    /// Slot for `record` within `lo..hi`, after an equal record if one is hit
    fn insertion_point(&self, cache: &RecordCache, record: RecordId, lo: usize, hi: usize) -> usize {
        let records = &self.records;
        let pos = search::lazy_search(records, lo, hi, |el| {
            self.key.compare_records(cache, el, record)
        });
        if pos < hi && self.key.compare_records(cache, records[pos], record) != Ordering::Greater {
            pos + 1
        } else {
            pos
        }
    }

    fn insert(&mut self, cache: &RecordCache, record: RecordId) -> usize {
        let pos = self.insertion_point(cache, record, 0, self.size);
        if self.size == self.records.len() {
            let capacity = self.config.grown_index_capacity(self.records.len());
            self.records.resize(capacity, NO_RECORD);
        }
        self.records.copy_within(pos..self.size, pos + 1);
        self.records[pos] = record;
        self.size += 1;
        self.note_placed(cache, pos);
        pos
    }

    /// Remove the record at `pos`
    ///
    /// When `in_place` is set the record's values may have changed since it
    /// was placed, so its old ties can't be recomputed.
    fn remove_at(&mut self, cache: &RecordCache, pos: usize, in_place: bool) {
        let tied = self.duplicates == DuplicateState::True
            && (in_place || self.ties_neighbor(cache, pos));
        self.records.copy_within(pos + 1..self.size, pos);
        self.size -= 1;
        self.records[self.size] = NO_RECORD;
        if tied {
            self.duplicates = DuplicateState::Unknown;
        }
    }

    /// Replace the record at `pos` with `record`, moving it if its order
    /// against the neighbours changed
    fn relocate(&mut self, cache: &RecordCache, pos: usize, record: RecordId) {
        let old_record = self.records[pos];
        // An in-place value change leaves nothing to compare the old value by
        let old_tied = self.duplicates == DuplicateState::True
            && (old_record == record || self.ties_neighbor(cache, pos));

        let size = self.size;
        let fits_left = pos == 0
            || self.key.compare_records(cache, self.records[pos - 1], record) != Ordering::Greater;
        let fits_right = pos + 1 >= size
            || self.key.compare_records(cache, record, self.records[pos + 1]) != Ordering::Greater;

        let new_pos = if fits_left && fits_right {
            self.records[pos] = record;
            pos
        } else {
            self.records.copy_within(pos + 1..size, pos);
            let (lo, hi) = if fits_right { (0, pos) } else { (pos, size - 1) };
            let target = self.insertion_point(cache, record, lo, hi);
            self.records.copy_within(target..size - 1, target + 1);
            self.records[target] = record;
            target
        };

        if old_tied {
            self.duplicates = DuplicateState::Unknown;
        }
        self.note_placed(cache, new_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    use crate::core::{DataType, Operator, RowStateFilter, SchemaBuilder};
    use crate::storage::filter::{ComparisonFilter, FnFilter, RowFilter};
    use crate::storage::key::SortDirection;

    struct Fixture {
        cache: RecordCache,
        rows: RowCollection,
    }

    impl Fixture {
        fn new() -> Self {
            let schema = SchemaBuilder::new("t")
                .add("id", DataType::Int32)
                .add_string("name", 16)
                .build()
                .unwrap();
            Self {
                cache: RecordCache::new(&schema, CacheConfig::default()),
                rows: RowCollection::new(),
            }
        }

        fn add(&mut self, id: i32, name: &str) -> RowId {
            let r = self.cache.new_record().unwrap();
            self.cache
                .set_record_values(r, &[Value::Int32(id), Value::from(name)])
                .unwrap();
            let row = self.rows.insert(NO_RECORD, r);
            self.cache.set_row_of(r, Some(row)).unwrap();
            row
        }

        fn row(&self, id: RowId) -> DataRow {
            *self.rows.get(id).unwrap()
        }

        fn ids(&self, index: &Index) -> Vec<i32> {
            index
                .records()
                .iter()
                .map(|&r| self.cache.get_value(r, 0).unwrap().as_i64().unwrap() as i32)
                .collect()
        }
    }

    #[test]
    fn test_build_sorts_and_flags_duplicates() {
        let mut f = Fixture::new();
        for id in [5, 3, 8, 3] {
            f.add(id, "x");
        }
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        assert_eq!(f.ids(&index), vec![3, 3, 5, 8]);
        assert_eq!(index.duplicate_state(), DuplicateState::True);
        assert!(index.has_duplicates(&f.cache));
        assert_eq!(index.duplicates(&f.cache).len(), 2);
    }

    #[test]
    fn test_build_without_duplicates() {
        let mut f = Fixture::new();
        for id in [2, 1, 3] {
            f.add(id, "x");
        }
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        assert_eq!(index.duplicate_state(), DuplicateState::False);
        assert!(index.duplicates(&f.cache).is_empty());
    }

    #[test]
    fn test_add_keeps_order_and_grows() {
        let mut f = Fixture::new();
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        assert_eq!(index.capacity(), 0);
        for id in [10, 4, 7, 4, 12, 1] {
            let row = f.add(id, "x");
            assert!(index.add(&f.cache, &f.row(row)));
            assert!(index.is_sorted(&f.cache));
        }
        assert_eq!(f.ids(&index), vec![1, 4, 4, 7, 10, 12]);
        assert_eq!(index.capacity(), 16);
        assert!(index.has_duplicates(&f.cache));
    }

    #[test]
    fn test_add_ignores_filtered_rows() {
        let mut f = Fixture::new();
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let row = f.add(1, "x");
        let deleted = DataRow::new(row, f.row(row).current, NO_RECORD);
        assert!(!index.add(&f.cache, &deleted));
        assert!(index.is_empty());
    }

    #[test]
    fn test_find_by_values() {
        let mut f = Fixture::new();
        let a = f.add(3, "a");
        f.add(9, "b");
        let index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let record = index.find(&mut f.cache, &[Value::Int32(3)]).unwrap();
        assert_eq!(record, f.row(a).current);
        assert_eq!(index.find(&mut f.cache, &[Value::Int32(4)]).unwrap(), NO_RECORD);
        assert_eq!(index.find_index(&mut f.cache, &[Value::Int32(9)]).unwrap(), Some(1));
        // Temporary records are released
        assert_eq!(f.cache.live_records(), 2);
    }

    #[test]
    fn test_find_arity_mismatch() {
        let mut f = Fixture::new();
        f.add(1, "a");
        let index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let err = index
            .find(&mut f.cache, &[Value::Int32(1), Value::Int32(2)])
            .unwrap_err();
        assert!(matches!(err, Error::KeyArityMismatch { expected: 1, got: 2 }));
        assert!(index.find_all(&mut f.cache, &[]).is_err());
    }

    #[test]
    fn test_find_conversion_error() {
        let mut f = Fixture::new();
        f.add(1, "a");
        let index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        // Point lookups propagate, bulk lookups degrade to no matches
        assert!(index.find(&mut f.cache, &[Value::from("one")]).is_err());
        assert!(index
            .find_all(&mut f.cache, &[Value::from("one")])
            .unwrap()
            .is_empty());
        assert_eq!(f.cache.live_records(), 1);
    }

    #[test]
    fn test_find_all_and_by_record() {
        let mut f = Fixture::new();
        for id in [5, 3, 8, 3, 3] {
            f.add(id, "x");
        }
        let index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let threes = index.find_all(&mut f.cache, &[Value::Int32(3)]).unwrap();
        assert_eq!(threes.len(), 3);
        assert_eq!(index.find_all_indexes(&mut f.cache, &[Value::Int32(3)]).unwrap(), 0..3);
        assert!(index.find_all(&mut f.cache, &[Value::Int32(4)]).unwrap().is_empty());

        let eight = index.record_at(4).unwrap();
        assert_eq!(index.find_record(&f.cache, eight), eight);
        assert_eq!(index.find_all_records(&f.cache, threes[0]).len(), 3);
        assert_eq!(index.find_all_record_indexes(&f.cache, eight), 4..5);
    }

    #[test]
    fn test_find_range() {
        let mut f = Fixture::new();
        for id in [1, 4, 4, 6, 9] {
            f.add(id, "x");
        }
        let index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let range = index
            .find_range(&mut f.cache, &[Value::Int32(4)], &[Value::Int32(6)])
            .unwrap();
        assert_eq!(range, 1..4);
        assert_eq!(index.find_range(&mut f.cache, &[], &[Value::Int32(4)]).unwrap(), 0..3);
        assert_eq!(index.find_range(&mut f.cache, &[Value::Int32(7)], &[]).unwrap(), 4..5);
        assert!(index
            .find_range(&mut f.cache, &[Value::Int32(7)], &[Value::Int32(5)])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_by_identity_among_duplicates() {
        let mut f = Fixture::new();
        let rows: Vec<RowId> = [3, 3, 3].iter().map(|&id| f.add(id, "x")).collect();
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let middle = f.row(rows[1]).current;
        assert!(index.delete_record(&f.cache, middle));
        assert!(!index.contains_record(&f.cache, middle));
        assert_eq!(index.len(), 2);
        assert!(!index.delete_record(&f.cache, middle));
        assert!(index.has_duplicates(&f.cache));

        assert!(index.delete(&f.cache, &f.row(rows[0])));
        assert!(!index.has_duplicates(&f.cache));
    }

    #[test]
    fn test_update_in_place_for_non_key_change() {
        let mut f = Fixture::new();
        let rows: Vec<RowId> = [1, 2, 3].iter().map(|&id| f.add(id, "x")).collect();
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let before = f.row(rows[1]);

        // New current record with the same key value
        let r = f.cache.new_record().unwrap();
        f.cache
            .set_record_values(r, &[Value::Int32(2), Value::from("changed")])
            .unwrap();
        let after = DataRow::new(before.id, NO_RECORD, r);
        index.update(&f.cache, &after, before.current, RowVersion::Current, RowState::Added);
        assert_eq!(index.record_at(1), Some(r));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_update_relocates_both_directions() {
        let mut f = Fixture::new();
        let rows: Vec<RowId> = [1, 2, 3, 4, 5].iter().map(|&id| f.add(id, "x")).collect();
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);

        let row = f.row(rows[1]);
        f.cache.set_value(row.current, 0, &Value::Int32(10)).unwrap();
        index.update(&f.cache, &row, row.current, RowVersion::Current, RowState::Added);
        assert_eq!(f.ids(&index), vec![1, 3, 4, 5, 10]);

        let row = f.row(rows[3]);
        f.cache.set_value(row.current, 0, &Value::Int32(0)).unwrap();
        index.update(&f.cache, &row, row.current, RowVersion::Current, RowState::Added);
        assert_eq!(f.ids(&index), vec![0, 1, 3, 5, 10]);
        assert!(index.is_sorted(&f.cache));
    }

    #[test]
    fn test_update_duplicate_flag() {
        let mut f = Fixture::new();
        let rows: Vec<RowId> = [1, 2, 2, 7].iter().map(|&id| f.add(id, "x")).collect();
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        assert!(index.has_duplicates(&f.cache));

        // Breaking the only tie
        let row = f.row(rows[2]);
        f.cache.set_value(row.current, 0, &Value::Int32(5)).unwrap();
        index.update(&f.cache, &row, row.current, RowVersion::Current, RowState::Added);
        assert!(!index.has_duplicates(&f.cache));

        // Creating a new tie
        let row = f.row(rows[0]);
        f.cache.set_value(row.current, 0, &Value::Int32(7)).unwrap();
        index.update(&f.cache, &row, row.current, RowVersion::Current, RowState::Added);
        assert_eq!(index.duplicate_state(), DuplicateState::True);
        assert_eq!(f.ids(&index), vec![2, 5, 7, 7]);
    }

    #[test]
    fn test_update_removes_record_changed_in_place() {
        let mut f = Fixture::new();
        let rows: Vec<RowId> = [2, 2].iter().map(|&id| f.add(id, "x")).collect();
        let under_five: Arc<dyn RowFilter> =
            Arc::new(ComparisonFilter::new(0, Operator::Lt, 5).unwrap());
        let mut index = Index::new(Key::new(&[0]).with_filter(under_five), &f.cache, &f.rows);
        assert_eq!(index.duplicate_state(), DuplicateState::True);

        // The record leaves the index after losing the tie it had
        let row = f.row(rows[1]);
        f.cache.set_value(row.current, 0, &Value::Int32(9)).unwrap();
        index.update(&f.cache, &row, row.current, RowVersion::Current, RowState::Added);
        assert_eq!(index.len(), 1);
        assert_ne!(index.duplicate_state(), DuplicateState::True);
        assert!(!index.has_duplicates(&f.cache));
        assert!(index.duplicates(&f.cache).is_empty());
    }

    #[test]
    fn test_add_runs_predicate_once() {
        let mut f = Fixture::new();
        let row = f.add(3, "x");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counted: Arc<dyn RowFilter> = Arc::new(FnFilter::new("counted", move |_, _| {
            counter.fetch_add(1, AtomicOrdering::Relaxed);
            true
        }));
        let mut index = Index::new(
            Key::new(&[0]).with_filter(counted),
            &f.cache,
            &RowCollection::new(),
        );
        assert!(index.add(&f.cache, &f.row(row)));
        assert_eq!(calls.load(AtomicOrdering::Relaxed), 1);
    }

    #[test]
    fn test_update_add_and_remove_cases() {
        let mut f = Fixture::new();
        let row = f.add(4, "x");
        let record = f.row(row).current;
        let mut index = Index::new(
            Key::new(&[0]).with_row_state_filter(RowStateFilter::ORIGINAL_ROWS),
            &f.cache,
            &f.rows,
        );
        assert!(index.is_empty());

        // Added -> Unchanged: now qualifies
        let unchanged = DataRow::new(row, record, record);
        index.update(&f.cache, &unchanged, record, RowVersion::Current, RowState::Added);
        assert_eq!(index.get_all(), vec![record]);

        // Unchanged -> Detached: no longer qualifies
        let detached = DataRow::new(row, NO_RECORD, NO_RECORD);
        index.update(&f.cache, &detached, record, RowVersion::Original, RowState::Unchanged);
        assert!(index.is_empty());
    }

    #[test]
    fn test_rows_and_distinct_rows() {
        let mut f = Fixture::new();
        let a = f.add(2, "x");
        let b = f.add(1, "x");
        let c = f.add(2, "y");
        let index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        assert_eq!(index.get_all_rows(&f.cache), vec![b, a, c]);
        assert_eq!(index.get_distinct_rows(&f.cache), vec![b, a]);

        let by_name = Index::new(
            Key::with_directions(&[(1, SortDirection::Descending)]),
            &f.cache,
            &f.rows,
        );
        assert_eq!(by_name.get_all_rows(&f.cache), vec![c, a, b]);
    }

    #[test]
    fn test_reset_and_refs() {
        let mut f = Fixture::new();
        for id in [3, 1, 2] {
            f.add(id, "x");
        }
        let mut index = Index::new(Key::new(&[0]), &f.cache, &f.rows);
        let first = index.get_all();
        index.reset(&f.cache, &f.rows);
        index.reset(&f.cache, &f.rows);
        assert_eq!(index.get_all(), first);

        assert_eq!(index.add_ref(), 1);
        assert_eq!(index.add_ref(), 2);
        assert_eq!(index.remove_ref(), 1);
        assert_eq!(index.remove_ref(), 0);
        assert_eq!(index.remove_ref(), 0);
        assert_eq!(index.ref_count(), 0);
    }
}
