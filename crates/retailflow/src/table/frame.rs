//! Named, row-oriented tables of typed values.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

use super::types::ColumnType;
use super::value::Value;

/// A column definition: name plus declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A named table. Every row holds exactly one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Column definitions in order.
    pub columns: Vec<Column>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table from columns and rows, checking row widths.
    pub fn with_rows(
        name: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let mut table = Self::new(name, columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from raw text cells, inferring one type per column.
    ///
    /// A column is Integer when every non-null cell parses as an integer,
    /// Float when every non-null cell is numeric, and Text otherwise.
    /// Short rows are padded with nulls and long rows truncated.
    pub fn from_text_rows(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let width = headers.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|h| Column::new(h, ColumnType::Text))
            .collect();

        let mut typed: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|i| row.get(i).map_or(Value::Null, |cell| Value::infer(cell)))
                    .collect()
            })
            .collect();

        for (idx, column) in columns.iter_mut().enumerate() {
            let mut saw_value = false;
            let mut all_integer = true;
            let mut all_numeric = true;
            for row in &typed {
                match &row[idx] {
                    Value::Null => {}
                    Value::Integer(_) => saw_value = true,
                    Value::Float(_) => {
                        saw_value = true;
                        all_integer = false;
                    }
                    _ => {
                        saw_value = true;
                        all_integer = false;
                        all_numeric = false;
                    }
                }
            }

            column.column_type = if saw_value && all_integer {
                ColumnType::Integer
            } else if saw_value && all_numeric {
                ColumnType::Float
            } else {
                ColumnType::Text
            };

            for (row_idx, row) in typed.iter_mut().enumerate() {
                let cell = &mut row[idx];
                *cell = match (column.column_type, std::mem::replace(cell, Value::Null)) {
                    (_, Value::Null) => Value::Null,
                    (ColumnType::Float, v) => v.cast(ColumnType::Float),
                    (ColumnType::Text, _) => {
                        Value::Text(rows[row_idx].get(idx).cloned().unwrap_or_default())
                    }
                    (_, v) => v,
                };
            }
        }

        Self {
            name: name.into(),
            columns,
            rows: typed,
        }
    }

    /// Build a table from already-typed cells, settling one type per column.
    ///
    /// Columns mixing integers and floats become Float; any other mix
    /// becomes Text. Short rows are padded with nulls.
    pub fn from_value_rows(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let width = headers.len();
        let mut rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();

        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, header)| {
                let mut kinds = rows.iter().filter_map(|r| r[idx].column_type());
                let column_type = match kinds.next() {
                    None => ColumnType::Text,
                    Some(first) => kinds.fold(first, |acc, ty| match (acc, ty) {
                        (a, b) if a == b => a,
                        (a, b) if a.is_numeric() && b.is_numeric() => ColumnType::Float,
                        _ => ColumnType::Text,
                    }),
                };
                Column::new(header, column_type)
            })
            .collect::<Vec<_>>();

        for row in &mut rows {
            for (cell, column) in row.iter_mut().zip(&columns) {
                let value = std::mem::replace(cell, Value::Null);
                *cell = value.cast(column.column_type);
            }
        }

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get a column definition by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get a cell by column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.get(row, col)
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::transform(
                &self.name,
                format!(
                    "row has {} values but table has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a column with one value per existing row.
    ///
    /// An existing column with the same name is replaced in place.
    pub fn add_column(&mut self, column: Column, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::transform(
                &self.name,
                format!(
                    "column '{}' has {} values but table has {} rows",
                    column.name,
                    values.len(),
                    self.rows.len()
                ),
            ));
        }

        match self.column_index(&column.name) {
            Some(idx) => {
                self.columns[idx] = column;
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(column);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Change a column's declared type, casting every value.
    pub fn retype_column(&mut self, index: usize, column_type: ColumnType) {
        self.columns[index].column_type = column_type;
        for row in &mut self.rows {
            let value = std::mem::replace(&mut row[index], Value::Null);
            row[index] = value.cast(column_type);
        }
    }

    /// Count null cells in one column.
    pub fn column_null_count(&self, index: usize) -> usize {
        self.column_values(index).filter(|v| v.is_null()).count()
    }

    /// Count null cells across the whole table.
    pub fn null_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|v| v.is_null()).count())
            .sum()
    }

    /// Return a copy of this table under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_text_rows_infers_types() {
        let table = Table::from_text_rows(
            "orders",
            strings(&["id", "price", "status", "empty"]),
            vec![
                strings(&["1", "10.5", "delivered", ""]),
                strings(&["2", "7", "shipped", ""]),
                strings(&["3", "", "01", ""]),
            ],
        );

        assert_eq!(table.columns[0].column_type, ColumnType::Integer);
        assert_eq!(table.columns[1].column_type, ColumnType::Float);
        assert_eq!(table.columns[2].column_type, ColumnType::Text);
        assert_eq!(table.columns[3].column_type, ColumnType::Text);

        assert_eq!(table.get(1, 1), Some(&Value::Float(7.0)));
        assert_eq!(table.get(2, 1), Some(&Value::Null));
        // Text columns keep the raw cell, including leading zeros.
        assert_eq!(table.get(2, 2), Some(&Value::text("01")));
        assert_eq!(table.null_count(), 4);
    }

    #[test]
    fn test_from_text_rows_pads_short_rows() {
        let table = Table::from_text_rows(
            "t",
            strings(&["a", "b"]),
            vec![strings(&["1"]), strings(&["2", "3", "4"])],
        );
        assert_eq!(table.rows[0], vec![Value::Integer(1), Value::Null]);
        assert_eq!(table.rows[1], vec![Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn test_from_value_rows_settles_types() {
        let table = Table::from_value_rows(
            "categories",
            strings(&["id", "tax_rate", "name"]),
            vec![
                vec![Value::Integer(1), Value::Integer(0), Value::text("toys")],
                vec![Value::Integer(2), Value::Float(0.12), Value::Integer(7)],
                vec![Value::Integer(3)],
            ],
        );

        assert_eq!(table.columns[0].column_type, ColumnType::Integer);
        assert_eq!(table.columns[1].column_type, ColumnType::Float);
        assert_eq!(table.columns[2].column_type, ColumnType::Text);
        assert_eq!(table.get(0, 1), Some(&Value::Float(0.0)));
        assert_eq!(table.get(1, 2), Some(&Value::text("7")));
        assert_eq!(table.get(2, 2), Some(&Value::Null));
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new("t", vec![Column::new("a", ColumnType::Integer)]);
        assert!(table.push_row(vec![Value::Integer(1)]).is_ok());
        assert!(table.push_row(vec![Value::Integer(1), Value::Null]).is_err());
    }

    #[test]
    fn test_add_column_replaces_existing() {
        let mut table = Table::with_rows(
            "t",
            vec![Column::new("a", ColumnType::Integer)],
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
        )
        .unwrap();

        table
            .add_column(
                Column::new("b", ColumnType::Text),
                vec![Value::text("x"), Value::text("y")],
            )
            .unwrap();
        table
            .add_column(
                Column::new("a", ColumnType::Float),
                vec![Value::Float(1.5), Value::Float(2.5)],
            )
            .unwrap();

        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.value(1, "a"), Some(&Value::Float(2.5)));
        assert!(table.add_column(Column::new("c", ColumnType::Text), vec![]).is_err());
    }
}
