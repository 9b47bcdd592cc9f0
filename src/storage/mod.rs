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

//! Storage module
//!
//! This module contains the record cache and index engine:
//! - Column value stores and the record slot allocator
//! - Row version model and the data table driving index maintenance
//! - Index keys, row filters and sorted indexes
//! - Configuration types

pub mod config;
pub mod container;
pub mod external;
pub mod filter;
pub mod index;
pub mod key;
pub mod record_cache;
pub mod row;
pub mod table;

// Re-export config types
pub use config::{CacheConfig, DEFAULT_MIN_INDEX_CAPACITY, DEFAULT_MIN_RECORD_GROWTH};

// Re-export column store types
pub use container::{BooleanStore, ColumnStore, DataContainer, StringStore, TypedStore};
pub use external::{ExternalRecord, ValuesRecord};

// Re-export record and row types
pub use record_cache::{PooledRecord, RecordCache, RecordId, NO_RECORD};
pub use row::{DataRow, RowCollection, RowId};

// Re-export key, filter and index types
pub use filter::{AndFilter, ComparisonFilter, FnFilter, NotFilter, OrFilter, RowFilter};
pub use index::{DuplicateState, Index};
pub use key::{Key, SortDirection};

// Re-export table types
pub use table::{DataTable, IndexId};
