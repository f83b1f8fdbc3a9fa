//! Declared scalar types for table columns.

use serde::{Deserialize, Serialize};

/// Declared data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Text/categorical values.
    Text,
    /// Date and time values.
    Timestamp,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Timestamp)
    }

    /// SQL type used when declaring the column in the store.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Map a declared SQL type back to a column type.
    ///
    /// Follows SQLite affinity rules loosely; returns `None` when the
    /// declaration says nothing useful.
    pub fn from_sql_decl(decl: &str) -> Option<Self> {
        let decl = decl.trim().to_ascii_uppercase();
        if decl.is_empty() {
            None
        } else if decl.contains("TIMESTAMP") || decl.contains("DATETIME") {
            Some(ColumnType::Timestamp)
        } else if decl.contains("INT") {
            Some(ColumnType::Integer)
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            Some(ColumnType::Float)
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            Some(ColumnType::Text)
        } else {
            None
        }
    }

    /// Short lowercase label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Text
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
