//! Spreadsheet sources (XLSX/XLS/ODS), first sheet only.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{PipelineError, Result};
use crate::table::{parse_timestamp, Table, Value};

/// Read the first worksheet of a workbook; the first row is the header.
pub fn read_spreadsheet(name: &str, path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| PipelineError::source(name, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::source(name, "workbook has no sheets"))?
        .map_err(|e| PipelineError::source(name, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Data::Empty => format!("column_{idx}"),
                other => other.to_string(),
            })
            .collect(),
        None => return Err(PipelineError::source(name, "worksheet is empty")),
    };

    let data = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok(Table::from_value_rows(name, headers, data))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::Integer(*f as i64),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::text(b.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map_or(Value::Null, Value::Timestamp),
        Data::DateTimeIso(s) => parse_timestamp(s).map_or_else(|| Value::text(s.as_str()), Value::Timestamp),
        Data::String(s) | Data::DurationIso(s) => {
            if Value::is_null_marker(s) {
                Value::Null
            } else {
                Value::text(s.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Float(5.0)), Value::Integer(5));
        assert_eq!(cell_value(&Data::Float(5.5)), Value::Float(5.5));
        assert_eq!(cell_value(&Data::String("0-5kg".into())), Value::text("0-5kg"));
        assert_eq!(cell_value(&Data::String("N/A".into())), Value::Null);
        assert!(matches!(
            cell_value(&Data::DateTimeIso("2018-01-02T10:00:00".into())),
            Value::Timestamp(_)
        ));
    }

    #[test]
    fn test_corrupt_workbook_is_source_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.xlsx");
        fs::write(&path, b"not a workbook").unwrap();

        assert!(matches!(
            read_spreadsheet("shipping_rates", &path),
            Err(PipelineError::Source { .. })
        ));
    }
}
