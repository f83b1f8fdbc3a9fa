//! Error types for the retailflow pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error reading or writing a file.
    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required input (store file, source file, dataset files) is absent.
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// A table requested from the store does not exist.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// An auxiliary source could not be read or parsed.
    #[error("Source '{source_name}' failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// A cleaning or enrichment transform failed for a table.
    #[error("Transform failed for table '{table}': {message}")]
    Transform { table: String, message: String },

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the SQLite store.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error while reading a zip archive.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error while downloading the raw dataset.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a source failure for an auxiliary input.
    pub fn source(source_name: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Source {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Build a transform failure for a table.
    pub fn transform(table: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Transform {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
