//! Per-table quality statistics.
//!
//! A profile is recomputed from the table on every run and drives both the
//! cleaning strategy and the before/after figures in audit reports.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::table::{ColumnType, Table, Value};

/// Derived facts for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub null_count: usize,
}

/// Derived facts for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    /// Name of the profiled table.
    pub table: String,
    /// Number of rows.
    pub row_count: usize,
    /// Null cells across all columns.
    pub null_count: usize,
    /// Rows that repeat an earlier row exactly.
    pub duplicate_row_count: usize,
    /// Per-column profiles in table order.
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    /// Profile a table without modifying it.
    pub fn of(table: &Table) -> Self {
        let columns = table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| ColumnProfile {
                name: column.name.clone(),
                column_type: column.column_type,
                null_count: table.column_null_count(idx),
            })
            .collect::<Vec<_>>();

        Self {
            table: table.name.clone(),
            row_count: table.row_count(),
            null_count: columns.iter().map(|c| c.null_count).sum(),
            duplicate_row_count: count_duplicate_rows(&table.rows),
            columns,
        }
    }

    /// Column name to declared type, in table order.
    pub fn column_types(&self) -> IndexMap<String, ColumnType> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.column_type))
            .collect()
    }

    /// Look up one column's profile.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Count rows that duplicate an earlier row (first occurrences excluded).
pub fn count_duplicate_rows(rows: &[Vec<Value>]) -> usize {
    let mut seen: HashSet<&[Value]> = HashSet::with_capacity(rows.len());
    rows.iter().filter(|row| !seen.insert(row.as_slice())).count()
}
