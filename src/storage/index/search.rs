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

//! Sorting and searching over index record arrays
//!
//! Comparators receive a stored element and return how it orders against
//! the target, so callers can close over any key and record cache.

use std::cmp::Ordering;
use std::ops::Range;

use crate::storage::record_cache::RecordId;

/// Stable bottom-up merge sort
///
/// Returns true if any comparison made while sorting found two equal
/// elements. Equal neighbours of the final order are always compared
/// directly, so this doubles as duplicate detection.
pub fn merge_sort<F>(items: &mut [RecordId], mut cmp: F) -> bool
where
    F: FnMut(RecordId, RecordId) -> Ordering,
{
    let n = items.len();
    if n < 2 {
        return false;
    }

    let mut buffer = items.to_vec();
    let mut found_equal = false;
    let mut in_items = true;
    let mut width = 1;
    while width < n {
        if in_items {
            found_equal |= merge_pass(items, &mut buffer, width, &mut cmp);
        } else {
            found_equal |= merge_pass(&buffer, items, width, &mut cmp);
        }
        in_items = !in_items;
        width = width.saturating_mul(2);
    }
    if !in_items {
        items.copy_from_slice(&buffer);
    }
    found_equal
}

/// Merge adjacent runs of `width` from `src` into `dst`
fn merge_pass<F>(src: &[RecordId], dst: &mut [RecordId], width: usize, cmp: &mut F) -> bool
where
    F: FnMut(RecordId, RecordId) -> Ordering,
{
    let n = src.len();
    let mut found_equal = false;
    let mut start = 0;
    while start < n {
        let mid = start.saturating_add(width).min(n);
        let end = mid.saturating_add(width).min(n);
        let (mut i, mut j, mut k) = (start, mid, start);
        while i < mid && j < end {
            // Left wins ties to keep the sort stable
            match cmp(src[i], src[j]) {
                Ordering::Greater => {
                    dst[k] = src[j];
                    j += 1;
                }
                ord => {
                    found_equal |= ord == Ordering::Equal;
                    dst[k] = src[i];
                    i += 1;
                }
            }
            k += 1;
        }
        let rest = mid - i;
        dst[k..k + rest].copy_from_slice(&src[i..mid]);
        k += rest;
        dst[k..end].copy_from_slice(&src[j..end]);
        start = end;
    }
    found_equal
}

/// Binary search over `items[lo..hi]` that stops at the first element it
/// probes comparing equal to the target
///
/// Returns that position, or where the search ran out: the insertion point
/// of the target.
pub fn lazy_search<F>(items: &[RecordId], mut lo: usize, mut hi: usize, mut probe: F) -> usize
where
    F: FnMut(RecordId) -> Ordering,
{
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match probe(items[mid]) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return mid,
        }
    }
    lo
}

/// [`lazy_search`] that only reports a position holding an equal element
pub fn exact_search<F>(items: &[RecordId], lo: usize, hi: usize, mut probe: F) -> Option<usize>
where
    F: FnMut(RecordId) -> Ordering,
{
    let pos = lazy_search(items, lo, hi, &mut probe);
    if pos < hi && probe(items[pos]) == Ordering::Equal {
        Some(pos)
    } else {
        None
    }
}

/// Widen an equal position to the whole run of equal elements around it
pub fn equal_run<F>(items: &[RecordId], pos: usize, mut probe: F) -> Range<usize>
where
    F: FnMut(RecordId) -> Ordering,
{
    let mut start = pos;
    while start > 0 && probe(items[start - 1]) == Ordering::Equal {
        start -= 1;
    }
    let mut end = pos + 1;
    while end < items.len() && probe(items[end]) == Ordering::Equal {
        end += 1;
    }
    start..end
}

/// First position whose element is not less than the target
pub fn lower_bound<F>(items: &[RecordId], mut probe: F) -> usize
where
    F: FnMut(RecordId) -> Ordering,
{
    items.partition_point(|&el| probe(el) == Ordering::Less)
}

/// First position whose element is greater than the target
pub fn upper_bound<F>(items: &[RecordId], mut probe: F) -> usize
where
    F: FnMut(RecordId) -> Ordering,
{
    items.partition_point(|&el| probe(el) != Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_merge_sort_orders_and_detects_equal() {
        let mut items = vec![5, 3, 8, 1, 9, 2];
        let dup = merge_sort(&mut items, |a, b| a.cmp(&b));
        assert_eq!(items, vec![1, 2, 3, 5, 8, 9]);
        assert!(!dup);

        let mut items = vec![4, 1, 4, 0];
        assert!(merge_sort(&mut items, |a, b| a.cmp(&b)));
        assert_eq!(items, vec![0, 1, 4, 4]);

        let mut empty: Vec<RecordId> = vec![];
        assert!(!merge_sort(&mut empty, |a, b| a.cmp(&b)));
        let mut single = vec![7];
        assert!(!merge_sort(&mut single, |a, b| a.cmp(&b)));
    }

    #[test]
    fn test_merge_sort_is_stable() {
        // Sort by tens digit only; ones digit records input order
        let mut items = vec![21, 10, 22, 11, 20, 12, 23];
        let dup = merge_sort(&mut items, |a, b| (a / 10).cmp(&(b / 10)));
        assert!(dup);
        assert_eq!(items, vec![10, 11, 12, 21, 22, 20, 23]);
    }

    #[test]
    fn test_merge_sort_random() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [2usize, 3, 17, 64, 100, 257] {
            let mut items: Vec<RecordId> = (0..len).map(|_| rng.gen_range(0..50)).collect();
            let mut expected = items.clone();
            expected.sort();
            let has_dup = expected.windows(2).any(|w| w[0] == w[1]);
            assert_eq!(merge_sort(&mut items, |a, b| a.cmp(&b)), has_dup);
            assert_eq!(items, expected);
        }
    }

    #[test]
    fn test_lazy_and_exact_search() {
        let items = [1, 3, 3, 5, 9];
        let pos = lazy_search(&items, 0, items.len(), |el| el.cmp(&3));
        assert_eq!(items[pos], 3);
        // Insertion point when absent
        assert_eq!(lazy_search(&items, 0, items.len(), |el| el.cmp(&4)), 3);
        assert_eq!(lazy_search(&items, 0, items.len(), |el| el.cmp(&10)), 5);
        assert_eq!(lazy_search(&items, 0, items.len(), |el| el.cmp(&0)), 0);
        // Restricted range
        assert_eq!(lazy_search(&items, 3, 5, |el| el.cmp(&4)), 3);

        assert_eq!(exact_search(&items, 0, items.len(), |el| el.cmp(&4)), None);
        assert_eq!(exact_search(&items, 0, items.len(), |el| el.cmp(&9)), Some(4));
        assert_eq!(exact_search(&items, 0, 0, |el| el.cmp(&1)), None);
    }

    #[test]
    fn test_equal_run_and_bounds() {
        let items = [1, 3, 3, 3, 5];
        assert_eq!(equal_run(&items, 2, |el| el.cmp(&3)), 1..4);
        assert_eq!(equal_run(&items, 0, |el| el.cmp(&1)), 0..1);
        assert_eq!(lower_bound(&items, |el| el.cmp(&3)), 1);
        assert_eq!(upper_bound(&items, |el| el.cmp(&3)), 4);
        assert_eq!(lower_bound(&items, |el| el.cmp(&6)), 5);
        assert_eq!(upper_bound(&items, |el| el.cmp(&0)), 0);
    }
}
