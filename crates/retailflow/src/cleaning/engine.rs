//! Cleaning engine that turns a raw table into a clean one plus an
//! ordered log of what was done.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::profile::TableProfile;
use crate::table::{parse_timestamp, ColumnType, Table, TIMESTAMP_FORMAT, Value};

use super::rules::TableRule;

/// Fill value for missing text and categorical cells.
pub const UNKNOWN_SENTINEL: &str = "UNKNOWN";

/// Column names that are candidates for timestamp coercion.
static TEMPORAL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)date|time").unwrap());

/// Result of cleaning one table.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    /// The cleaned table.
    pub table: Table,
    /// Human-readable operations, in the order they were applied.
    pub operations: Vec<String>,
    /// Rows removed by deduplication.
    pub duplicates_removed: usize,
}

/// Applies deduplication, null imputation, timestamp coercion and the
/// table-specific rules, in that order.
pub struct CleaningEngine {
    rules: Vec<TableRule>,
}

impl CleaningEngine {
    /// Create an engine with the default rules for the retail dataset.
    pub fn new() -> Self {
        Self::with_rules(TableRule::defaults())
    }

    /// Create an engine with a custom rule set.
    pub fn with_rules(rules: Vec<TableRule>) -> Self {
        Self { rules }
    }

    /// The table-specific rules this engine applies.
    pub fn rules(&self) -> &[TableRule] {
        &self.rules
    }

    /// Clean a table.
    ///
    /// The input is not modified. Timestamp coercion problems are logged
    /// and never fail the pass; any other failure aborts cleaning of this
    /// table and is returned to the caller.
    pub fn clean(&self, raw: &Table, profile: &TableProfile) -> Result<CleaningOutcome> {
        let mut table = raw.clone();
        let mut operations = Vec::new();

        let duplicates_removed = remove_duplicates(&mut table);
        if duplicates_removed > 0 {
            operations.push(format!("Removed {} duplicate rows", duplicates_removed));
        }

        for idx in 0..table.column_count() {
            let declared = profile
                .column(&table.columns[idx].name)
                .map_or(table.columns[idx].column_type, |c| c.column_type);
            if let Some(op) = impute_column(&mut table, idx, declared) {
                operations.push(op);
            }
        }

        for idx in 0..table.column_count() {
            if let Some(op) = coerce_timestamp_column(&mut table, idx) {
                operations.push(op);
            }
        }

        let name = table.name.clone();
        for rule in self.rules.iter().filter(|r| r.matches(&name)) {
            if let Some(op) = rule.transform.apply(&mut table)? {
                operations.push(op);
            }
        }

        for op in &operations {
            debug!(table = %table.name, "{}", op);
        }

        Ok(CleaningOutcome {
            table,
            operations,
            duplicates_removed,
        })
    }
}

impl Default for CleaningEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop rows that repeat an earlier row, keeping first occurrences.
fn remove_duplicates(table: &mut Table) -> usize {
    let before = table.rows.len();
    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(before);
    table.rows.retain(|row| seen.insert(row.clone()));
    before - table.rows.len()
}

/// Fill the nulls of one column according to its declared type.
fn impute_column(table: &mut Table, idx: usize, declared: ColumnType) -> Option<String> {
    let null_count = table.column_null_count(idx);
    if null_count == 0 {
        return None;
    }
    let name = table.columns[idx].name.clone();

    if declared.is_numeric() {
        let values: Vec<f64> = table.column_values(idx).filter_map(Value::as_f64).collect();
        let median = median(values)?;

        let fill = if table.columns[idx].column_type == ColumnType::Integer && median.fract() == 0.0 {
            Value::Integer(median as i64)
        } else {
            if table.columns[idx].column_type != ColumnType::Float {
                table.retype_column(idx, ColumnType::Float);
            }
            Value::Float(median)
        };
        fill_nulls(table, idx, &fill);
        Some(format!(
            "Imputed {} null values in '{}' with the median ({})",
            null_count, name, median
        ))
    } else if declared.is_temporal() {
        let mode = timestamp_mode(table.column_values(idx))?;
        fill_nulls(table, idx, &Value::Timestamp(mode));
        Some(format!(
            "Imputed {} null values in '{}' with the mode ({})",
            null_count,
            name,
            mode.format(TIMESTAMP_FORMAT)
        ))
    } else {
        fill_nulls(table, idx, &Value::text(UNKNOWN_SENTINEL));
        Some(format!(
            "Imputed {} null values in '{}' with '{}'",
            null_count, name, UNKNOWN_SENTINEL
        ))
    }
}

fn fill_nulls(table: &mut Table, idx: usize, fill: &Value) {
    for row in &mut table.rows {
        if row[idx].is_null() {
            row[idx] = fill.clone();
        }
    }
}

/// Median of the non-NaN values; the mean of the middle pair for even counts.
fn median(mut values: Vec<f64>) -> Option<f64> {
    values.retain(|v| !v.is_nan());
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Most frequent timestamp; ties go to the earliest value.
fn timestamp_mode<'a>(values: impl Iterator<Item = &'a Value>) -> Option<NaiveDateTime> {
    let mut counts: HashMap<NaiveDateTime, usize> = HashMap::new();
    for value in values {
        if let Value::Timestamp(ts) = value {
            *counts.entry(*ts).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(a_ts, a_count), (b_ts, b_count)| match a_count.cmp(b_count) {
            Ordering::Equal => b_ts.cmp(a_ts),
            other => other,
        })
        .map(|(ts, _)| ts)
}

/// Convert a text column whose name mentions a date or time to timestamps.
///
/// Unparseable cells become null, so a column where nothing parses ends up
/// all null. That case is logged as a warning.
fn coerce_timestamp_column(table: &mut Table, idx: usize) -> Option<String> {
    let column = &table.columns[idx];
    if column.column_type != ColumnType::Text || !TEMPORAL_NAME.is_match(&column.name) {
        return None;
    }
    let name = column.name.clone();

    let parsed: Vec<Option<NaiveDateTime>> = table
        .column_values(idx)
        .map(|v| v.as_str().and_then(parse_timestamp))
        .collect();
    let present = table.column_values(idx).filter(|v| !v.is_null()).count();
    let converted = parsed.iter().filter(|p| p.is_some()).count();

    if present > 0 && converted == 0 {
        warn!(
            table = %table.name,
            column = %name,
            values = present,
            "No value parsed as a timestamp"
        );
    }

    for (row, ts) in table.rows.iter_mut().zip(parsed) {
        row[idx] = ts.map_or(Value::Null, Value::Timestamp);
    }
    table.columns[idx].column_type = ColumnType::Timestamp;

    let coerced = present - converted;
    if coerced > 0 {
        Some(format!(
            "Converted column '{}' to timestamp ({} unparseable values set to null)",
            name, coerced
        ))
    } else {
        Some(format!("Converted column '{}' to timestamp", name))
    }
}
