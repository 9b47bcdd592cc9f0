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

//! Index key descriptors
//!
//! A [`Key`] names the columns an index sorts on, the direction of each,
//! which row versions participate, and an optional predicate. It resolves
//! a row to the record the index should hold and orders two records.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::filter::RowFilter;
use super::record_cache::{RecordCache, RecordId, NO_RECORD};
use super::row::DataRow;
use crate::core::{Error, Result, RowStateFilter};

/// Sort direction of one key column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Apply the direction to an ascending comparison result
    #[inline]
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ASC"),
            SortDirection::Descending => write!(f, "DESC"),
        }
    }
}

/// Sort order and row selection of one index
///
/// Immutable once built. Two keys are equal when they sort on the same
/// columns in the same directions, select the same row versions, and share
/// the same predicate instance.
#[derive(Debug, Clone)]
pub struct Key {
    columns: SmallVec<[usize; 4]>,
    directions: SmallVec<[SortDirection; 4]>,
    row_state_filter: RowStateFilter,
    filter: Option<Arc<dyn RowFilter>>,
}

impl Key {
    /// Ascending key over `columns`, current rows, no predicate
    pub fn new(columns: &[usize]) -> Self {
        Self {
            columns: columns.iter().copied().collect(),
            directions: columns.iter().map(|_| SortDirection::Ascending).collect(),
            row_state_filter: RowStateFilter::CURRENT_ROWS,
            filter: None,
        }
    }

    /// Key with an explicit direction per column
    pub fn with_directions(columns: &[(usize, SortDirection)]) -> Self {
        Self {
            columns: columns.iter().map(|(c, _)| *c).collect(),
            directions: columns.iter().map(|(_, d)| *d).collect(),
            row_state_filter: RowStateFilter::CURRENT_ROWS,
            filter: None,
        }
    }

    /// Select which row versions participate
    pub fn with_row_state_filter(mut self, row_state_filter: RowStateFilter) -> Self {
        self.row_state_filter = row_state_filter;
        self
    }

    /// Attach a predicate records must satisfy
    pub fn with_filter(mut self, filter: Arc<dyn RowFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    #[inline]
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    #[inline]
    pub fn directions(&self) -> &[SortDirection] {
        &self.directions
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn row_state_filter(&self) -> RowStateFilter {
        self.row_state_filter
    }

    pub fn filter(&self) -> Option<&Arc<dyn RowFilter>> {
        self.filter.as_ref()
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Check every key column exists in a table of `column_count` columns
    pub fn validate(&self, column_count: usize) -> Result<()> {
        match self.columns.iter().find(|&&c| c >= column_count) {
            Some(&index) => Err(Error::ColumnIndexOutOfBounds { index }),
            None => Ok(()),
        }
    }

    /// Check the number of lookup values matches the key
    pub fn check_arity(&self, got: usize) -> Result<()> {
        if got != self.columns.len() {
            return Err(Error::key_arity_mismatch(self.columns.len(), got));
        }
        Ok(())
    }

    /// Record of `row` this key selects, or [`NO_RECORD`]
    ///
    /// The predicate sees the row's current record whenever the row has
    /// one, even if the original version was selected. Rows without a
    /// current record are tested on the selected record.
    pub fn get_record(&self, cache: &RecordCache, row: &DataRow) -> RecordId {
        let record = match self.row_state_filter.version_for(row.state()) {
            Some(version) => row.record_for(version),
            None => return NO_RECORD,
        };
        if record == NO_RECORD {
            return NO_RECORD;
        }
        match &self.filter {
            Some(filter) => {
                let probe = if row.current != NO_RECORD {
                    row.current
                } else {
                    record
                };
                if filter.matches(cache, probe) {
                    record
                } else {
                    NO_RECORD
                }
            }
            None => record,
        }
    }

    /// Returns true if `record` is the record of `row` this key selects
    #[inline]
    pub fn can_contain(&self, cache: &RecordCache, row: &DataRow, record: RecordId) -> bool {
        record != NO_RECORD && self.get_record(cache, row) == record
    }

    /// Order two records column by column, honoring each direction
    #[inline]
    pub fn compare_records(&self, cache: &RecordCache, record1: RecordId, record2: RecordId) -> Ordering {
        if record1 == record2 {
            return Ordering::Equal;
        }
        self.compare_prefix(cache, record1, record2, self.columns.len())
    }

    /// Order two records on the first `len` key columns only
    pub fn compare_prefix(
        &self,
        cache: &RecordCache,
        record1: RecordId,
        record2: RecordId,
        len: usize,
    ) -> Ordering {
        for (&column, &direction) in self.columns.iter().zip(&self.directions).take(len) {
            let ord = direction.apply(cache.compare_column(column, record1, record2));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        let same_filter = match (&self.filter, &other.filter) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            _ => false,
        };
        self.columns == other.columns
            && self.directions == other.directions
            && self.row_state_filter == other.row_state_filter
            && same_filter
    }
}

impl Eq for Key {}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, direction)) in self.columns.iter().zip(&self.directions).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "#{} {}", column, direction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, SchemaBuilder, Value};
    use crate::storage::config::CacheConfig;
    use crate::storage::filter::ComparisonFilter;
    use crate::core::Operator;

    fn cache_with(rows: &[(&str, i32)]) -> (RecordCache, Vec<RecordId>) {
        let schema = SchemaBuilder::new("emp")
            .add_string("dept", 8)
            .add("salary", DataType::Int32)
            .build()
            .unwrap();
        let mut cache = RecordCache::new(&schema, CacheConfig::default());
        let records = rows
            .iter()
            .map(|(dept, salary)| {
                let r = cache.new_record().unwrap();
                cache
                    .set_record_values(r, &[Value::from(*dept), Value::Int32(*salary)])
                    .unwrap();
                r
            })
            .collect();
        (cache, records)
    }

    #[test]
    fn test_compare_records_directions() {
        let (cache, r) = cache_with(&[("A", 10), ("B", 5), ("A", 20)]);
        let key = Key::with_directions(&[
            (0, SortDirection::Ascending),
            (1, SortDirection::Descending),
        ]);
        assert_eq!(key.compare_records(&cache, r[0], r[1]), Ordering::Less);
        // Same dept, higher salary first
        assert_eq!(key.compare_records(&cache, r[2], r[0]), Ordering::Less);
        assert_eq!(key.compare_records(&cache, r[1], r[1]), Ordering::Equal);
        assert_eq!(key.compare_prefix(&cache, r[0], r[2], 1), Ordering::Equal);
    }

    #[test]
    fn test_get_record_by_state() {
        let (cache, r) = cache_with(&[("A", 1), ("B", 2)]);
        let current = Key::new(&[0]);
        let original = Key::new(&[0]).with_row_state_filter(RowStateFilter::ORIGINAL_ROWS);

        let unchanged = DataRow::new(0, r[0], r[0]);
        let added = DataRow::new(1, NO_RECORD, r[1]);
        let deleted = DataRow::new(2, r[0], NO_RECORD);
        let modified = DataRow::new(3, r[0], r[1]);

        assert_eq!(current.get_record(&cache, &unchanged), r[0]);
        assert_eq!(current.get_record(&cache, &added), r[1]);
        assert_eq!(current.get_record(&cache, &deleted), NO_RECORD);
        assert_eq!(current.get_record(&cache, &modified), r[1]);

        assert_eq!(original.get_record(&cache, &added), NO_RECORD);
        assert_eq!(original.get_record(&cache, &deleted), r[0]);
        assert_eq!(original.get_record(&cache, &modified), r[0]);

        assert!(current.can_contain(&cache, &modified, r[1]));
        assert!(!current.can_contain(&cache, &modified, r[0]));
        assert!(!current.can_contain(&cache, &deleted, NO_RECORD));
    }

    #[test]
    fn test_predicate_reads_current_version() {
        let (cache, r) = cache_with(&[("A", 100), ("B", 1)]);
        let rich: Arc<dyn RowFilter> =
            Arc::new(ComparisonFilter::new(1, Operator::Gt, 50).unwrap());
        let key = Key::new(&[0])
            .with_row_state_filter(RowStateFilter::ORIGINAL_ROWS)
            .with_filter(rich);

        // Original passes the predicate but the current does not
        let modified = DataRow::new(0, r[0], r[1]);
        assert_eq!(key.get_record(&cache, &modified), NO_RECORD);

        // And the other way around
        let modified = DataRow::new(0, r[1], r[0]);
        assert_eq!(key.get_record(&cache, &modified), r[1]);

        // No current record: the selected one is tested
        let deleted = DataRow::new(0, r[0], NO_RECORD);
        assert_eq!(key.get_record(&cache, &deleted), r[0]);
    }

    #[test]
    fn test_key_equality() {
        let filter: Arc<dyn RowFilter> = Arc::new(ComparisonFilter::is_null(0));
        let a = Key::new(&[0, 1]).with_filter(Arc::clone(&filter));
        let b = Key::new(&[0, 1]).with_filter(Arc::clone(&filter));
        assert_eq!(a, b);

        let other_instance: Arc<dyn RowFilter> = Arc::new(ComparisonFilter::is_null(0));
        assert_ne!(a, Key::new(&[0, 1]).with_filter(other_instance));
        assert_ne!(a, Key::new(&[0, 1]));
        assert_ne!(Key::new(&[0, 1]), Key::new(&[1, 0]));
        assert_ne!(
            Key::new(&[0]),
            Key::with_directions(&[(0, SortDirection::Descending)])
        );
        assert_ne!(
            Key::new(&[0]),
            Key::new(&[0]).with_row_state_filter(RowStateFilter::ORIGINAL_ROWS)
        );
    }

    #[test]
    fn test_validate_and_arity() {
        let key = Key::new(&[0, 3]);
        assert!(matches!(
            key.validate(2),
            Err(Error::ColumnIndexOutOfBounds { index: 3 })
        ));
        assert!(key.validate(4).is_ok());
        assert!(key.check_arity(2).is_ok());
        assert!(key.check_arity(1).unwrap_err().is_argument_error());
        assert_eq!(key.to_string(), "#0 ASC, #3 ASC");
    }
}
