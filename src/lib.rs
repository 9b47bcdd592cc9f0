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

//! # recordcache - in-memory record cache with sorted row indexes
//!
//! A table's rows live in per-column typed stores addressed by record slot.
//! Each logical row points at an original and a current record, and any
//! number of indexes keep the rows sorted, filtered and deduplicated while
//! the rows change.
//!
//! ## Key Features
//!
//! - **Columnar Record Cache** - Typed value stores with null bitmaps and slot reuse
//! - **Row Versions** - Added, modified, deleted and unchanged rows with accept/reject
//! - **Sorted Indexes** - Multi-column keys with per-column direction, maintained incrementally
//! - **Row-State Filters** - Index the current view, the original view, or any mix
//! - **Predicate Filters** - Comparison, LIKE, IN and boolean combinations over records
//! - **Duplicate Detection** - Tracked during sorting and kept up to date on every edit
//!
//! ## Quick Start
//!
//! ```rust
//! use recordcache::{DataTable, DataType, Key, SchemaBuilder, SortDirection, Value};
//!
//! let schema = SchemaBuilder::new("employees")
//!     .add_string("dept", 16)
//!     .add("salary", DataType::Int32)
//!     .build()
//!     .unwrap();
//! let mut table = DataTable::new(schema);
//!
//! table.add_row(&[Value::from("A"), Value::from(10)]).unwrap();
//! table.add_row(&[Value::from("B"), Value::from(5)]).unwrap();
//! table.add_row(&[Value::from("A"), Value::from(20)]).unwrap();
//!
//! let by_dept = table
//!     .get_index(Key::with_directions(&[
//!         (0, SortDirection::Ascending),
//!         (1, SortDirection::Descending),
//!     ]))
//!     .unwrap();
//! assert_eq!(table.sorted_rows(by_dept).unwrap(), vec![2, 0, 1]);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`DataType`], [`Value`], [`Schema`], [`Error`])
//! - [`storage`] - Column stores, record cache, keys, indexes and tables

pub mod core;
pub mod storage;

// Re-export main types for convenience
pub use core::{
    DataType, Error, Operator, Result, RowState, RowStateFilter, RowVersion, Schema,
    SchemaBuilder, SchemaColumn, Value,
};

// Re-export config types
pub use storage::CacheConfig;

// Re-export store types
pub use storage::{ColumnStore, DataContainer, ExternalRecord, ValuesRecord};

// Re-export engine types
pub use storage::{
    AndFilter, ComparisonFilter, DataRow, DataTable, DuplicateState, FnFilter, Index, IndexId,
    Key, NotFilter, OrFilter, PooledRecord, RecordCache, RecordId, RowCollection, RowFilter,
    RowId, SortDirection, NO_RECORD,
};
