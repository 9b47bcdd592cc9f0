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

//! Index Scenario Tests
//!
//! End-to-end index behavior through a data table: ordering, duplicates,
//! lookups, slot reuse and store growth.

use recordcache::{
    CacheConfig, DataTable, DataType, Key, RowStateFilter, RowVersion, SchemaBuilder,
    SortDirection, Value, NO_RECORD,
};

fn id_table() -> DataTable {
    let schema = SchemaBuilder::new("items")
        .add("id", DataType::Int32)
        .build()
        .expect("Failed to build schema");
    DataTable::new(schema)
}

fn current_ids(table: &DataTable, rows: &[usize]) -> Vec<i64> {
    rows.iter()
        .map(|&row| {
            table
                .get_value(row, 0, RowVersion::Current)
                .expect("Failed to read value")
                .as_i64()
                .expect("Expected integer")
        })
        .collect()
}

/// Ascending integer key with a repeated value
#[test]
fn test_integer_key_with_duplicates() {
    let mut table = id_table();
    let idx = table.get_index(Key::new(&[0])).unwrap();

    let rows: Vec<usize> = [5, 3, 8, 3]
        .iter()
        .map(|&id| table.add_row(&[Value::Int32(id)]).unwrap())
        .collect();

    let sorted = table.sorted_rows(idx).unwrap();
    assert_eq!(current_ids(&table, &sorted), vec![3, 3, 5, 8]);
    assert!(table.has_duplicates(idx).unwrap());

    let mut threes = table.find_all(idx, &[Value::Int32(3)]).unwrap();
    threes.sort();
    assert_eq!(threes, vec![rows[1], rows[3]]);
}

/// Ascending string column, descending integer column
#[test]
fn test_descending_multi_column() {
    let schema = SchemaBuilder::new("emp")
        .add_string("dept", 8)
        .add("salary", DataType::Int32)
        .build()
        .unwrap();
    let mut table = DataTable::new(schema);
    let idx = table
        .get_index(Key::with_directions(&[
            (0, SortDirection::Ascending),
            (1, SortDirection::Descending),
        ]))
        .unwrap();

    for (dept, salary) in [("A", 10), ("B", 5), ("A", 20)] {
        table
            .add_row(&[Value::from(dept), Value::Int32(salary)])
            .unwrap();
    }

    let values: Vec<Vec<Value>> = table
        .sorted_rows(idx)
        .unwrap()
        .into_iter()
        .map(|row| table.row_values(row, RowVersion::Current).unwrap())
        .collect();
    assert_eq!(
        values,
        vec![
            vec![Value::from("A"), Value::Int32(20)],
            vec![Value::from("A"), Value::Int32(10)],
            vec![Value::from("B"), Value::Int32(5)],
        ]
    );
    assert!(!table.has_duplicates(idx).unwrap());
}

/// A deleted row's slot is reused without confusing lookups
#[test]
fn test_delete_then_reuse_slot() {
    let mut table = id_table();
    let idx = table.get_index(Key::new(&[0])).unwrap();

    let r1 = table.add_row(&[Value::Int32(1)]).unwrap();
    let slot1 = table.row(r1).unwrap().current;
    table.delete_row(r1).unwrap();
    assert_eq!(table.find(idx, &[Value::Int32(1)]).unwrap(), None);

    let r2 = table.add_row(&[Value::Int32(1)]).unwrap();
    let slot2 = table.row(r2).unwrap().current;
    assert_eq!(slot1, slot2);

    let found = table.find(idx, &[Value::Int32(1)]).unwrap();
    assert_eq!(found, Some(r2));
    let index = table.index(idx).unwrap();
    assert_eq!(index.get_all(), vec![slot2]);
    assert!(!index.get_all().contains(&NO_RECORD));
}

/// 200 rows through stores that start below the minimum growth
#[test]
fn test_capacity_growth_keeps_values() {
    let schema = SchemaBuilder::new("wide")
        .add("id", DataType::Int32)
        .add_string("name", 16)
        .add("score", DataType::Double)
        .build()
        .unwrap();
    let mut table = DataTable::with_config(schema, CacheConfig::new().with_initial_capacity(10));
    assert_eq!(table.cache().capacity(), 10);
    let idx = table
        .get_index(Key::with_directions(&[(0, SortDirection::Descending)]))
        .unwrap();

    let rows: Vec<usize> = (0..200)
        .map(|i| {
            table
                .add_row(&[
                    Value::Int32(i),
                    Value::from(format!("row-{i}")),
                    Value::Double(f64::from(i) / 2.0),
                ])
                .unwrap()
        })
        .collect();

    assert!(table.cache().capacity() >= 200);
    for (i, &row) in rows.iter().enumerate() {
        let i = i as i32;
        assert_eq!(
            table.row_values(row, RowVersion::Current).unwrap(),
            vec![
                Value::Int32(i),
                Value::from(format!("row-{i}")),
                Value::Double(f64::from(i) / 2.0),
            ]
        );
    }

    let sorted = table.sorted_rows(idx).unwrap();
    let expected: Vec<i64> = (0..200).rev().collect();
    assert_eq!(current_ids(&table, &sorted), expected);
    for i in [0, 127, 128, 199] {
        assert_eq!(
            table.find(idx, &[Value::Int32(i)]).unwrap(),
            Some(rows[i as usize])
        );
    }
}

/// Original-version index keeps the baseline of modified rows
#[test]
fn test_original_and_current_views() {
    let mut table = id_table();
    let current = table.get_index(Key::new(&[0])).unwrap();
    let original = table
        .get_index(Key::new(&[0]).with_row_state_filter(RowStateFilter::ORIGINAL_ROWS))
        .unwrap();

    let rows: Vec<usize> = [1, 2, 3]
        .iter()
        .map(|&id| table.add_row(&[Value::Int32(id)]).unwrap())
        .collect();
    table.accept_changes().unwrap();

    table.set_values(rows[0], &[Value::Int32(10)]).unwrap();
    table.delete_row(rows[1]).unwrap();
    let added = table.add_row(&[Value::Int32(0)]).unwrap();

    let cur = table.sorted_rows(current).unwrap();
    assert_eq!(cur, vec![added, rows[2], rows[0]]);
    let orig = table.sorted_rows(original).unwrap();
    assert_eq!(orig, vec![rows[0], rows[1], rows[2]]);

    table.reject_changes().unwrap();
    assert_eq!(table.sorted_rows(current).unwrap(), rows);
    assert_eq!(table.sorted_rows(original).unwrap(), rows);
}

/// Added and modified-current only
#[test]
fn test_custom_row_state_filter() {
    let mut table = id_table();
    let changed = table
        .get_index(
            Key::new(&[0])
                .with_row_state_filter(RowStateFilter::ADDED | RowStateFilter::MODIFIED_CURRENT),
        )
        .unwrap();

    let a = table.add_row(&[Value::Int32(1)]).unwrap();
    let b = table.add_row(&[Value::Int32(2)]).unwrap();
    assert_eq!(table.sorted_rows(changed).unwrap(), vec![a, b]);

    table.accept_changes().unwrap();
    assert!(table.sorted_rows(changed).unwrap().is_empty());

    table.set_value(b, 0, &Value::Int32(-5)).unwrap();
    assert_eq!(table.sorted_rows(changed).unwrap(), vec![b]);

    table.delete_row(b).unwrap();
    assert!(table.sorted_rows(changed).unwrap().is_empty());
}

/// Resetting twice gives the same order as resetting once
#[test]
fn test_reset_is_idempotent() {
    let mut table = id_table();
    let idx = table.get_index(Key::new(&[0])).unwrap();
    for id in [4, 4, 1, 9, 2, 4, 7] {
        table.add_row(&[Value::Int32(id)]).unwrap();
    }
    let incremental = table.sorted_rows(idx).unwrap();

    table.reset_indexes();
    let once = table.sorted_rows(idx).unwrap();
    table.reset_indexes();
    let twice = table.sorted_rows(idx).unwrap();

    assert_eq!(once, twice);
    assert_eq!(current_ids(&table, &once), current_ids(&table, &incremental));
}
