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


//! Record cache configuration
//!

/// Minimum record capacity after the stores grow
pub const DEFAULT_MIN_RECORD_GROWTH: usize = 128;

/// Minimum capacity of an index's record array once it needs to grow
pub const DEFAULT_MIN_INDEX_CAPACITY: usize = 16;

/// Configuration options for a record cache and the indexes built over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Record capacity allocated in every column store up front
    /// Default: 0 (grow on first record)
    pub initial_capacity: usize,

    /// Smallest capacity the stores grow to once exhausted
    /// Default: 128
    pub min_record_growth: usize,

    /// Smallest capacity an index array grows to once full
    /// Default: 16
    pub min_index_capacity: usize,

    /// Whether string columns compare case-sensitively
    /// Default: false
    pub case_sensitive: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            min_record_growth: DEFAULT_MIN_RECORD_GROWTH,
            min_index_capacity: DEFAULT_MIN_INDEX_CAPACITY,
            case_sensitive: false,
        }
    }
}

impl CacheConfig {
    /// Creates a new CacheConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the initial record capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Builder method to set the minimum record growth (at least 1)
    pub fn with_min_record_growth(mut self, records: usize) -> Self {
        self.min_record_growth = records.max(1);
        self
    }

    /// Builder method to set the minimum index capacity (at least 1)
    pub fn with_min_index_capacity(mut self, entries: usize) -> Self {
        self.min_index_capacity = entries.max(1);
        self
    }

    /// Builder method to set string case sensitivity
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Next store capacity when `needed` records must fit in `current`
    ///
    /// Doubles the current capacity, never going below the configured
    /// minimum or below what is needed.
    pub fn grown_record_capacity(&self, current: usize, needed: usize) -> usize {
        current
            .saturating_mul(2)
            .max(self.min_record_growth)
            .max(needed)
    }

    /// Next index array capacity once `current` entries are full
    pub fn grown_index_capacity(&self, current: usize) -> usize {
        current.saturating_mul(2).max(self.min_index_capacity)
    }
}
