//! SQLite-backed table store.
//!
//! One store file per stage. Writes are drop-and-recreate: a table written
//! to the store replaces any existing table of the same name, and
//! [`TableStore::create`] starts from an empty file.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ToSql};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::table::{parse_timestamp, Column, ColumnType, Table, Value, TIMESTAMP_FORMAT};

/// A relational store holding one SQL table per [`Table`].
pub struct TableStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl TableStore {
    /// Create a fresh store file, removing any existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
            }
        }

        if path.exists() {
            info!(path = %path.display(), "Removing existing store");
            fs::remove_file(path).map_err(|e| PipelineError::io(path, e))?;
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing store file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingResource(format!(
                "store not found at {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Location of the store file, if it is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Names of all user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Check whether a table exists.
    pub fn contains(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of rows in a table.
    pub fn row_count(&self, name: &str) -> Result<usize> {
        if !self.contains(name)? {
            return Err(PipelineError::TableNotFound(name.to_string()));
        }
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Read one table, restoring column types from their declarations.
    pub fn read_table(&self, name: &str) -> Result<Table> {
        if !self.contains(name)? {
            return Err(PipelineError::TableNotFound(name.to_string()));
        }

        let declared = self.declared_columns(name)?;
        let width = declared.len();

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
        let mut rows = Vec::new();
        let mut result_rows = stmt.query([])?;
        while let Some(row) = result_rows.next()? {
            let mut values = Vec::with_capacity(width);
            for (idx, (_, decl)) in declared.iter().enumerate() {
                values.push(from_sql_ref(row.get_ref(idx)?, *decl));
            }
            rows.push(values);
        }

        let mut columns = Vec::with_capacity(width);
        for (idx, (column_name, decl)) in declared.into_iter().enumerate() {
            let column_type = settle_column_type(decl, rows.iter().map(|r| &r[idx]));
            columns.push(Column::new(column_name, column_type));
        }

        let mut table = Table {
            name: name.to_string(),
            columns,
            rows,
        };
        for idx in 0..width {
            let column_type = table.columns[idx].column_type;
            table.retype_column(idx, column_type);
        }

        debug!(table = name, rows = table.row_count(), "Read table");
        Ok(table)
    }

    /// Read every table in the store, ordered by name.
    pub fn read_all(&self) -> Result<Vec<Table>> {
        self.table_names()?
            .iter()
            .map(|name| self.read_table(name))
            .collect()
    }

    /// Write a table, replacing any existing table of the same name.
    pub fn write_table(&mut self, table: &Table) -> Result<()> {
        if table.columns.is_empty() {
            return Err(PipelineError::EmptyData(format!(
                "table '{}' has no columns",
                table.name
            )));
        }

        let ident = quote_ident(&table.name);
        let column_defs = table
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=table.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", ident), [])?;
        tx.execute(&format!("CREATE TABLE {} ({})", ident, column_defs), [])?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", ident, placeholders))?;
            for row in &table.rows {
                stmt.execute(rusqlite::params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        debug!(table = %table.name, rows = table.row_count(), "Wrote table");
        Ok(())
    }

    /// Write several tables in order.
    pub fn write_all<'a>(&mut self, tables: impl IntoIterator<Item = &'a Table>) -> Result<()> {
        for table in tables {
            self.write_table(table)?;
        }
        Ok(())
    }

    /// Column names with their declared types.
    fn declared_columns(&self, name: &str) -> Result<Vec<(String, Option<ColumnType>)>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
        let columns = stmt
            .query_map([], |row| {
                let column_name: String = row.get(1)?;
                let decl: String = row.get(2)?;
                Ok((column_name, ColumnType::from_sql_decl(&decl)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Float(f) if f.is_nan() => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Timestamp(ts) => ToSqlOutput::Owned(rusqlite::types::Value::Text(
                ts.format(TIMESTAMP_FORMAT).to_string(),
            )),
        })
    }
}

/// Convert a stored cell into a value, honouring the declared type.
fn from_sql_ref(value: ValueRef<'_>, decl: Option<ColumnType>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match decl {
                Some(ColumnType::Timestamp) => {
                    parse_timestamp(&text).map_or(Value::Text(text), Value::Timestamp)
                }
                _ => Value::Text(text),
            }
        }
    }
}

/// Decide a column's type from its declaration and the values read back.
///
/// Integer declarations widen to Float when real values were stored, and
/// undeclared columns are inferred from their storage classes.
fn settle_column_type<'a>(
    decl: Option<ColumnType>,
    values: impl Iterator<Item = &'a Value>,
) -> ColumnType {
    let mut seen: Vec<ColumnType> = Vec::new();
    for value in values {
        if let Some(ty) = value.column_type() {
            if !seen.contains(&ty) {
                seen.push(ty);
            }
        }
    }

    match decl {
        Some(ColumnType::Integer) if seen.contains(&ColumnType::Float) => ColumnType::Float,
        Some(ColumnType::Timestamp) if seen.contains(&ColumnType::Text) => ColumnType::Text,
        Some(ty) => ty,
        None if seen.is_empty() => ColumnType::Text,
        None if seen.iter().all(|t| *t == ColumnType::Integer) => ColumnType::Integer,
        None if seen.iter().all(|t| t.is_numeric()) => ColumnType::Float,
        None => ColumnType::Text,
    }
}

/// Quote an identifier for use in SQL text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
