//! Auxiliary reference data in heterogeneous formats.
//!
//! Each format family has its own loader producing the shared [`Table`]
//! model (free text is kept as an opaque document). Loaders are isolated:
//! one failing source is recorded and the rest still load, unless the
//! reconciler runs in strict mode.

mod markup;
mod records;
mod spreadsheet;

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SourcePaths;
use crate::error::{PipelineError, Result};
use crate::input::Parser;
use crate::table::Table;

pub use markup::{read_html_table, read_xml_records};
pub use records::read_json_records;
pub use spreadsheet::read_spreadsheet;

pub const CATEGORIES: &str = "categories";
pub const SHIPPING_RATES: &str = "shipping_rates";
pub const SEGMENTS: &str = "segments";
pub const PAYMENT_METHODS: &str = "payment_methods";
pub const DELIVERY_OPTIONS: &str = "delivery_options";
pub const SUPPLIER_RATINGS: &str = "supplier_ratings";

/// Format family of an auxiliary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Nested structured records (JSON).
    Records,
    /// Spreadsheet workbook (first sheet).
    Spreadsheet,
    /// Delimited text.
    Delimited,
    /// Markup tree with one child element per field (XML).
    MarkupTree,
    /// Table embedded in a markup document (HTML).
    MarkupTable,
    /// Free text, not tabularized.
    FreeText,
}

/// One auxiliary source to load.
#[derive(Debug, Clone)]
pub struct AuxiliarySource {
    pub name: String,
    pub format: SourceFormat,
    pub path: PathBuf,
}

impl AuxiliarySource {
    pub fn new(name: impl Into<String>, format: SourceFormat, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            format,
            path: path.into(),
        }
    }
}

/// A source that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub format: SourceFormat,
    pub message: String,
}

/// Whether every configured source loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Complete,
    Partial { failed: usize },
}

/// Loaded auxiliary data.
#[derive(Debug, Clone, Default)]
pub struct AuxiliarySet {
    /// Tabular sources by name.
    pub tables: IndexMap<String, Table>,
    /// Free-text sources by name.
    pub documents: IndexMap<String, String>,
    /// Sources that failed to load.
    pub failures: Vec<SourceFailure>,
}

impl AuxiliarySet {
    pub fn status(&self) -> LoadStatus {
        if self.failures.is_empty() {
            LoadStatus::Complete
        } else {
            LoadStatus::Partial {
                failed: self.failures.len(),
            }
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}

/// Loads every configured auxiliary source into the uniform table model.
pub struct SourceReconciler {
    sources: Vec<AuxiliarySource>,
    strict: bool,
}

impl SourceReconciler {
    /// Reconciler for the six standard sources.
    pub fn new(paths: &SourcePaths) -> Self {
        Self::with_sources(vec![
            AuxiliarySource::new(CATEGORIES, SourceFormat::Records, &paths.categories),
            AuxiliarySource::new(SHIPPING_RATES, SourceFormat::Spreadsheet, &paths.shipping_rates),
            AuxiliarySource::new(SEGMENTS, SourceFormat::Delimited, &paths.segments),
            AuxiliarySource::new(PAYMENT_METHODS, SourceFormat::MarkupTree, &paths.payment_methods),
            AuxiliarySource::new(DELIVERY_OPTIONS, SourceFormat::MarkupTable, &paths.delivery_options),
            AuxiliarySource::new(SUPPLIER_RATINGS, SourceFormat::FreeText, &paths.supplier_ratings),
        ])
    }

    /// Reconciler for a custom list of sources.
    pub fn with_sources(sources: Vec<AuxiliarySource>) -> Self {
        Self {
            sources,
            strict: false,
        }
    }

    /// In strict mode the first failing source aborts loading.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load all sources, collecting per-source failures.
    pub fn load_auxiliary_sources(&self) -> Result<AuxiliarySet> {
        let mut set = AuxiliarySet::default();

        for source in &self.sources {
            match load_source(source) {
                Ok(Loaded::Table(table)) => {
                    info!(
                        source = %source.name,
                        rows = table.row_count(),
                        columns = table.column_count(),
                        "Loaded auxiliary table"
                    );
                    set.tables.insert(source.name.clone(), table);
                }
                Ok(Loaded::Document(text)) => {
                    info!(source = %source.name, chars = text.len(), "Loaded auxiliary document");
                    set.documents.insert(source.name.clone(), text);
                }
                Err(e) if self.strict => return Err(e),
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Skipping auxiliary source");
                    set.failures.push(SourceFailure {
                        source: source.name.clone(),
                        format: source.format,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(set)
    }
}

enum Loaded {
    Table(Table),
    Document(String),
}

fn load_source(source: &AuxiliarySource) -> Result<Loaded> {
    let path = source.path.as_path();
    if !path.exists() {
        return Err(PipelineError::MissingResource(format!(
            "auxiliary source '{}' not found at {}",
            source.name,
            path.display()
        )));
    }

    let table = match source.format {
        SourceFormat::Records => read_json_records(&source.name, path)?,
        SourceFormat::Spreadsheet => read_spreadsheet(&source.name, path)?,
        SourceFormat::Delimited => read_delimited(&source.name, path)?,
        SourceFormat::MarkupTree => read_xml_records(&source.name, path)?,
        SourceFormat::MarkupTable => read_html_table(&source.name, path)?,
        SourceFormat::FreeText => return read_text(path).map(Loaded::Document),
    };
    Ok(Loaded::Table(table))
}

fn read_delimited(name: &str, path: &Path) -> Result<Table> {
    let (table, _) = Parser::new().parse_file(path)?;
    Ok(table.renamed(name))
}

/// Read a whole file as UTF-8 text.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}
