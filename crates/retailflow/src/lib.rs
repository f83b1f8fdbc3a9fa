//! Retailflow: a three-stage batch pipeline for retail e-commerce tables.
//!
//! Raw delimited files are ingested into a relational store, cleaned
//! (deduplication, type-driven null imputation, timestamp coercion and a
//! handful of per-table transforms), then enriched by left-joining the
//! cleaned tables against auxiliary reference data read from several file
//! formats. Every stage writes a plain-text audit report.
//!
//! # Core Principles
//!
//! - **Wholesale rewrite**: each stage re-derives its output from scratch
//! - **Left rows are preserved**: enrichment never drops a domain row
//! - **Audited**: every cleaning operation is recorded in order
//!
//! # Example
//!
//! ```no_run
//! use retailflow::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::rooted_at("static"));
//! let summary = pipeline.clean().unwrap();
//!
//! println!("Tables cleaned: {}", summary.tables.len());
//! ```

pub mod audit;
pub mod cleaning;
pub mod config;
pub mod dataset;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod input;
pub mod profile;
pub mod sources;
pub mod store;
pub mod table;

mod pipeline;

pub use crate::pipeline::{CleaningSummary, EnrichmentSummary, IngestionSummary, Pipeline};
pub use cleaning::{CleaningEngine, CleaningOutcome, TableRule, TableTransform};
pub use config::PipelineConfig;
pub use enrichment::{EnrichmentEngine, JoinRule, KeyDerivation};
pub use error::{PipelineError, Result};
pub use profile::{ColumnProfile, TableProfile};
pub use sources::{AuxiliarySet, LoadStatus, SourceReconciler};
pub use store::TableStore;
pub use table::{Column, ColumnType, Table, Value};
