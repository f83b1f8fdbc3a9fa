//! Property-based tests for the cleaning engine.
//!
//! Invariants checked on generated tables:
//! 1. **No duplicates**: cleaned tables hold no exact duplicate rows
//! 2. **Median fill**: numeric nulls become the post-dedup median
//! 3. **Sentinel fill**: text nulls become `UNKNOWN`
//! 4. **Idempotence**: cleaning a cleaned table changes nothing

use std::collections::HashSet;

use proptest::prelude::*;

use retailflow::cleaning::UNKNOWN_SENTINEL;
use retailflow::profile::count_duplicate_rows;
use retailflow::{CleaningEngine, Column, ColumnType, Table, TableProfile, Value};

// =============================================================================
// Test Strategies
// =============================================================================

type RawRow = (Option<i64>, Option<String>);

fn raw_row() -> impl Strategy<Value = RawRow> {
    (
        prop::option::of(0i64..50),
        prop::option::of(prop_oneof![
            Just("delivered".to_string()),
            Just("shipped".to_string()),
            Just("canceled".to_string()),
        ]),
    )
}

/// Distinct rows (unique id) plus exact copies of some of them.
fn orders_table() -> impl Strategy<Value = (Table, Vec<RawRow>, usize)> {
    (
        prop::collection::vec(raw_row(), 1..40),
        prop::collection::vec(0usize..40, 0..10),
    )
        .prop_map(|(base, copies)| {
            let to_values = |id: usize, (quantity, status): &RawRow| {
                vec![
                    Value::Integer(id as i64),
                    quantity.map_or(Value::Null, Value::Integer),
                    status.clone().map_or(Value::Null, Value::Text),
                ]
            };

            let mut rows: Vec<Vec<Value>> =
                base.iter().enumerate().map(|(i, r)| to_values(i, r)).collect();
            for c in &copies {
                let i = c % base.len();
                rows.push(to_values(i, &base[i]));
            }

            let table = Table::with_rows(
                "orders_sample",
                vec![
                    Column::new("id", ColumnType::Integer),
                    Column::new("quantity", ColumnType::Integer),
                    Column::new("status", ColumnType::Text),
                ],
                rows,
            )
            .unwrap();
            (table, base, copies.len())
        })
}

fn clean(table: &Table) -> retailflow::CleaningOutcome {
    CleaningEngine::new()
        .clean(table, &TableProfile::of(table))
        .unwrap()
}

fn median(values: &[i64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn cleaned_tables_have_no_duplicates((table, _base, copies) in orders_table()) {
        let profile = TableProfile::of(&table);
        let outcome = clean(&table);

        prop_assert_eq!(count_duplicate_rows(&outcome.table.rows), 0);
        prop_assert_eq!(outcome.duplicates_removed, profile.duplicate_row_count);
        prop_assert_eq!(outcome.duplicates_removed, copies);
        prop_assert_eq!(outcome.table.row_count(), table.row_count() - copies);
    }

    #[test]
    fn numeric_nulls_take_the_median((table, base, _copies) in orders_table()) {
        let outcome = clean(&table);
        let present: Vec<i64> = base.iter().filter_map(|(q, _)| *q).collect();
        let quantity = outcome.table.column_index("quantity").unwrap();

        if present.is_empty() {
            prop_assert!(outcome.table.column_values(quantity).all(Value::is_null));
        } else {
            let expected = median(&present);
            prop_assert_eq!(outcome.table.column_null_count(quantity), 0);
            for (row, (q, _)) in outcome.table.rows.iter().zip(&base) {
                if q.is_none() {
                    prop_assert_eq!(row[quantity].as_f64(), Some(expected));
                }
            }
        }
    }

    #[test]
    fn text_nulls_take_the_sentinel((table, base, _copies) in orders_table()) {
        let outcome = clean(&table);
        let status = outcome.table.column_index("status").unwrap();

        prop_assert_eq!(outcome.table.column_null_count(status), 0);
        for (row, (_, s)) in outcome.table.rows.iter().zip(&base) {
            match s {
                None => prop_assert_eq!(&row[status], &Value::text(UNKNOWN_SENTINEL)),
                Some(s) => prop_assert_eq!(&row[status], &Value::text(s.as_str())),
            }
        }
    }

    #[test]
    fn cleaning_is_idempotent((table, _base, _copies) in orders_table()) {
        let once = clean(&table);
        let twice = clean(&once.table);

        prop_assert_eq!(twice.duplicates_removed, 0);
        prop_assert!(twice.operations.is_empty());
        prop_assert_eq!(twice.table, once.table);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order((table, base, _copies) in orders_table()) {
        let outcome = clean(&table);
        let ids: Vec<i64> = outcome
            .table
            .rows
            .iter()
            .filter_map(|r| match r[0] {
                Value::Integer(i) => Some(i),
                _ => None,
            })
            .collect();

        prop_assert_eq!(ids.len(), base.len());
        prop_assert!(ids.iter().enumerate().all(|(i, id)| *id == i as i64));
        prop_assert_eq!(ids.iter().collect::<HashSet<_>>().len(), base.len());
    }
}
