//! Pipeline configuration.
//!
//! Every location a stage reads or writes is named here, so components can
//! be pointed at temporary directories in tests.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::DEFAULT_DATASET;
use crate::error::{PipelineError, Result};

/// Store file locations, one per stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePaths {
    pub raw: PathBuf,
    pub cleaned: PathBuf,
    pub enriched: PathBuf,
}

/// Auxiliary source locations, one per format family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    /// Structured records (JSON): id, name, tax_rate.
    pub categories: PathBuf,
    /// Spreadsheet (XLSX): weight_range, base_rate, express_rate.
    pub shipping_rates: PathBuf,
    /// Delimited text (CSV): segment_id, name, min_purchase, discount_rate.
    pub segments: PathBuf,
    /// Markup tree (XML): id, name, processing_fee.
    pub payment_methods: PathBuf,
    /// Table embedded in markup (HTML).
    pub delivery_options: PathBuf,
    /// Free text.
    pub supplier_ratings: PathBuf,
}

/// Audit report locations, one per stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditPaths {
    pub ingestion: PathBuf,
    pub cleaning: PathBuf,
    pub enrichment: PathBuf,
}

/// Sample export locations, one per stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPaths {
    pub ingestion_sample: PathBuf,
    pub cleaning_sample: PathBuf,
    pub enrichment_sample: PathBuf,
}

/// Constants standing in for join keys that are not derived yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderKeys {
    /// Shipping weight bucket assigned to every order.
    pub weight_range: String,
    /// Minimum purchase threshold assigned to every customer.
    pub min_purchase: f64,
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dataset identifier handed to the raw-source fetcher.
    pub dataset: String,
    /// Directory holding the downloaded archive or CSV files.
    pub raw_dir: PathBuf,
    /// Optional URL of a zip archive to download into `raw_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub stores: StorePaths,
    pub sources: SourcePaths,
    pub audit: AuditPaths,
    pub exports: ExportPaths,
    /// Rows per CSV file in the ingestion sample.
    pub ingestion_sample_rows: usize,
    /// Maximum rows per table in the cleaning sample.
    pub cleaning_sample_rows: usize,
    /// Maximum rows per table in the enrichment sample.
    pub enrichment_sample_rows: usize,
    /// Seed for the random samples; unseeded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_seed: Option<u64>,
    /// Fail the enrichment stage if any auxiliary source fails to load.
    pub strict_sources: bool,
    /// Skip tables whose cleaning pass fails instead of aborting the run.
    pub skip_failed_tables: bool,
    pub placeholder_keys: PlaceholderKeys,
}

impl PipelineConfig {
    /// Lay every path out under one base directory.
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            raw_dir: base.join("raw"),
            download_url: None,
            stores: StorePaths {
                raw: base.join("db").join("ingestion.db"),
                cleaned: base.join("db").join("cleaned_data.db"),
                enriched: base.join("db").join("enriched_data.db"),
            },
            sources: SourcePaths {
                categories: base.join("json").join("categories.json"),
                shipping_rates: base.join("xlsx").join("shipping_rates.xlsx"),
                segments: base.join("csv").join("customer_segments.csv"),
                payment_methods: base.join("xml").join("payment_methods.xml"),
                delivery_options: base.join("html").join("delivery_options.html"),
                supplier_ratings: base.join("txt").join("supplier_ratings.txt"),
            },
            audit: AuditPaths {
                ingestion: base.join("audit").join("ingestion.txt"),
                cleaning: base.join("audit").join("cleaning_report.txt"),
                enrichment: base.join("audit").join("enrichment_report.txt"),
            },
            exports: ExportPaths {
                ingestion_sample: base.join("csv").join("ingestion_sample.csv"),
                cleaning_sample: base.join("csv").join("cleaned_sample.csv"),
                enrichment_sample: base.join("csv").join("enriched_sample.csv"),
            },
            ingestion_sample_rows: 10,
            cleaning_sample_rows: 100,
            enrichment_sample_rows: 100,
            sample_seed: None,
            strict_sources: false,
            skip_failed_tables: false,
            placeholder_keys: PlaceholderKeys::default(),
        }
    }

    /// Load a configuration from a JSON file; missing fields use defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PipelineError::Config(format!("Failed to open '{}': {}", path.display(), e))
        })?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(PipelineError::Config("dataset must not be empty".to_string()));
        }
        if !self.placeholder_keys.min_purchase.is_finite() {
            return Err(PipelineError::Config(
                "placeholder min_purchase must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::rooted_at("static")
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        PipelineConfig::default().stores
    }
}

impl Default for SourcePaths {
    fn default() -> Self {
        PipelineConfig::default().sources
    }
}

impl Default for AuditPaths {
    fn default() -> Self {
        PipelineConfig::default().audit
    }
}

impl Default for ExportPaths {
    fn default() -> Self {
        PipelineConfig::default().exports
    }
}

impl Default for PlaceholderKeys {
    fn default() -> Self {
        Self {
            weight_range: "0-5kg".to_string(),
            min_purchase: 100.0,
        }
    }
}
