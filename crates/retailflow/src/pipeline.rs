//! Stage orchestration: ingestion, cleaning and enrichment.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::audit::{
    append_report, cleaning_footer, write_report, CleaningAudit, CleaningReport,
    EnrichedTableCounts, EnrichmentReport, FileCount, IngestionReport,
};
use crate::cleaning::CleaningEngine;
use crate::config::PipelineConfig;
use crate::dataset::{clean_name, enriched_name, original_name};
use crate::enrichment::{EnrichmentEngine, JoinSummary};
use crate::error::{PipelineError, Result};
use crate::export::SampleExporter;
use crate::input::{csv_files, locate_csv_dir, DatasetSource, HttpArchive, LocalDirectory, Parser};
use crate::profile::TableProfile;
use crate::sources::{LoadStatus, SourceFailure, SourceReconciler};
use crate::store::TableStore;
use crate::table::Table;

/// Result of the ingestion stage.
#[derive(Debug, Clone)]
pub struct IngestionSummary {
    /// Directory the CSV files were read from.
    pub csv_dir: PathBuf,
    /// Row count per table written to the raw store.
    pub tables: Vec<(String, usize)>,
    /// Files that could not be read, with the reason.
    pub failed_files: Vec<(String, String)>,
    pub report_path: PathBuf,
}

/// Result of the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleaningSummary {
    /// One audit entry per cleaned table.
    pub tables: Vec<CleaningAudit>,
    /// Tables whose cleaning failed and were skipped.
    pub skipped: Vec<(String, String)>,
    pub store_path: PathBuf,
    pub report_path: PathBuf,
}

/// Result of the enrichment stage.
#[derive(Debug, Clone)]
pub struct EnrichmentSummary {
    /// Every table written to the enriched store.
    pub tables: Vec<EnrichedTableCounts>,
    pub joins: Vec<JoinSummary>,
    pub status: LoadStatus,
    pub failures: Vec<SourceFailure>,
    pub store_path: PathBuf,
    pub report_path: PathBuf,
}

/// Runs the pipeline stages against one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    cleaning: CleaningEngine,
    enrichment: EnrichmentEngine,
}

impl Pipeline {
    /// Pipeline with the default cleaning rules and join pairings.
    pub fn new(config: PipelineConfig) -> Self {
        let enrichment = EnrichmentEngine::new(&config.placeholder_keys);
        Self {
            config,
            cleaning: CleaningEngine::new(),
            enrichment,
        }
    }

    /// Pipeline with custom engines.
    pub fn with_engines(
        config: PipelineConfig,
        cleaning: CleaningEngine,
        enrichment: EnrichmentEngine,
    ) -> Self {
        Self {
            config,
            cleaning,
            enrichment,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The raw-data source implied by the configuration.
    pub fn dataset_source(&self) -> Box<dyn DatasetSource> {
        match &self.config.download_url {
            Some(url) => Box::new(HttpArchive::new(url.as_str(), &self.config.raw_dir)),
            None => Box::new(LocalDirectory::new(&self.config.raw_dir)),
        }
    }

    /// Load every raw CSV file into a freshly created raw store.
    ///
    /// A file that fails to read or store is logged and skipped; finding no CSV
    /// files at all is fatal.
    pub fn ingest(&self, source: &dyn DatasetSource) -> Result<IngestionSummary> {
        let dataset_path = source.fetch(&self.config.dataset)?;
        let csv_dir = locate_csv_dir(&dataset_path)?;
        let files = csv_files(&csv_dir)?;
        if files.is_empty() {
            return Err(PipelineError::MissingResource(format!(
                "no CSV files found in {}",
                csv_dir.display()
            )));
        }

        info!(dir = %csv_dir.display(), files = files.len(), "Ingesting raw files");
        let mut store = TableStore::create(&self.config.stores.raw)?;
        let parser = Parser::new();
        let mut counts = Vec::new();
        let mut failed_files = Vec::new();
        let mut heads = Vec::new();

        for path in &files {
            let file = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            let loaded = parser.parse_file(path).and_then(|(table, raw)| {
                store.write_table(&table)?;
                Ok((table, raw))
            });
            match loaded {
                Ok((mut table, raw)) => {
                    info!(
                        table = %table.name,
                        rows = raw.rows,
                        digest = %raw.digest,
                        "Loaded raw file"
                    );
                    counts.push(FileCount {
                        file,
                        records: Ok(table.row_count()),
                    });
                    table.rows.truncate(self.config.ingestion_sample_rows);
                    heads.push(table);
                }
                Err(e) => {
                    warn!(file = %file, error = %e, "Skipping unreadable file");
                    failed_files.push((file.clone(), e.to_string()));
                    counts.push(FileCount {
                        file,
                        records: Err(e.to_string()),
                    });
                }
            }
        }

        let mut tables = Vec::new();
        for name in store.table_names()? {
            let rows = store.row_count(&name)?;
            tables.push((name, rows));
        }

        SampleExporter::head(self.config.ingestion_sample_rows)
            .export(&heads, &self.config.exports.ingestion_sample)?;

        let report = IngestionReport {
            dataset_path,
            files: counts,
            tables: tables.clone(),
        };
        write_report(&self.config.audit.ingestion, &report.render(now()))?;
        info!(
            csv_records = report.csv_total(),
            store_records = report.store_total(),
            "Ingestion complete"
        );

        Ok(IngestionSummary {
            csv_dir,
            tables,
            failed_files,
            report_path: self.config.audit.ingestion.clone(),
        })
    }

    /// Profile and clean every raw table into a freshly created cleaned store.
    pub fn clean(&self) -> Result<CleaningSummary> {
        let raw = TableStore::open(&self.config.stores.raw)?;
        let tables = raw.read_all()?;
        if tables.is_empty() {
            return Err(PipelineError::EmptyData(format!(
                "raw store {} holds no tables",
                self.config.stores.raw.display()
            )));
        }

        let mut store = TableStore::create(&self.config.stores.cleaned)?;
        let mut audits = Vec::new();
        let mut skipped = Vec::new();
        let mut cleaned = Vec::new();

        for table in &tables {
            let profile = TableProfile::of(table);
            info!(
                table = %table.name,
                rows = profile.row_count,
                nulls = profile.null_count,
                duplicates = profile.duplicate_row_count,
                "Profiled table"
            );

            let outcome = match self.cleaning.clean(table, &profile) {
                Ok(outcome) => outcome,
                Err(e) if self.config.skip_failed_tables => {
                    warn!(table = %table.name, error = %e, "Skipping table that failed cleaning");
                    skipped.push((table.name.clone(), e.to_string()));
                    continue;
                }
                Err(e) => return Err(e),
            };

            store.write_table(&outcome.table.renamed(clean_name(&table.name)))?;
            info!(
                table = %table.name,
                operations = outcome.operations.len(),
                "Cleaned table"
            );

            audits.push(CleaningAudit {
                table: table.name.clone(),
                rows_after: outcome.table.row_count(),
                nulls_after: outcome.table.null_count(),
                before: profile,
                operations: outcome.operations,
            });
            cleaned.push(outcome.table);
        }

        self.random_sampler(self.config.cleaning_sample_rows)
            .export(&cleaned, &self.config.exports.cleaning_sample)?;

        let report = CleaningReport { tables: audits };
        let report_path = &self.config.audit.cleaning;
        write_report(report_path, &report.render(now()))?;

        let generated: Vec<String> = report.tables.iter().map(|a| clean_name(&a.table)).collect();
        append_report(report_path, &cleaning_footer(&self.config.stores.cleaned, &generated))?;

        Ok(CleaningSummary {
            tables: report.tables,
            skipped,
            store_path: self.config.stores.cleaned.clone(),
            report_path: report_path.clone(),
        })
    }

    /// Join cleaned tables against the auxiliary sources into a freshly
    /// created enriched store. Tables no rule touches pass through.
    pub fn enrich(&self) -> Result<EnrichmentSummary> {
        let store = TableStore::open(&self.config.stores.cleaned)?;
        let cleaned: IndexMap<String, Table> = store
            .read_all()?
            .into_iter()
            .map(|t| {
                let name = original_name(&t.name).to_string();
                (name.clone(), t.renamed(name))
            })
            .collect();

        let auxiliary = SourceReconciler::new(&self.config.sources)
            .strict(self.config.strict_sources)
            .load_auxiliary_sources()?;
        if let LoadStatus::Partial { failed } = auxiliary.status() {
            warn!(failed, "Auxiliary sources partially loaded");
        }

        let outcome = self.enrichment.enrich(&cleaned, &auxiliary)?;

        let mut out = TableStore::create(&self.config.stores.enriched)?;
        let mut counts = Vec::new();
        for (name, table) in &cleaned {
            let (stored_as, result) = match outcome.tables.get(name) {
                Some(enriched) => (enriched_name(name), enriched),
                None => (clean_name(name), table),
            };
            out.write_table(&result.renamed(stored_as.as_str()))?;
            counts.push(EnrichedTableCounts {
                table: name.clone(),
                stored_as,
                rows_before: table.row_count(),
                rows_after: result.row_count(),
                columns_before: table.column_count(),
                columns_after: result.column_count(),
            });
        }

        if !outcome.tables.is_empty() {
            self.random_sampler(self.config.enrichment_sample_rows)
                .export(outcome.tables.values(), &self.config.exports.enrichment_sample)?;
        }

        let report = EnrichmentReport {
            tables: counts,
            joins: outcome.joins,
            failures: auxiliary.failures.clone(),
            auxiliary: auxiliary
                .tables
                .iter()
                .map(|(name, t)| (name.clone(), t.row_count()))
                .collect(),
            documents: auxiliary
                .documents
                .iter()
                .map(|(name, text)| (name.clone(), text.chars().count()))
                .collect(),
        };
        write_report(&self.config.audit.enrichment, &report.render(now()))?;
        info!(tables = report.tables.len(), "Enrichment complete");

        Ok(EnrichmentSummary {
            tables: report.tables,
            joins: report.joins,
            status: auxiliary.status(),
            failures: report.failures,
            store_path: self.config.stores.enriched.clone(),
            report_path: self.config.audit.enrichment.clone(),
        })
    }

    /// Run all three stages in order, stopping at the first fatal error.
    pub fn run_all(
        &self,
        source: &dyn DatasetSource,
    ) -> Result<(IngestionSummary, CleaningSummary, EnrichmentSummary)> {
        let ingestion = self.ingest(source)?;
        let cleaning = self.clean()?;
        let enrichment = self.enrich()?;
        Ok((ingestion, cleaning, enrichment))
    }

    fn random_sampler(&self, max_rows: usize) -> SampleExporter {
        let exporter = SampleExporter::random(max_rows);
        match self.config.sample_seed {
            Some(seed) => exporter.with_seed(seed),
            None => exporter,
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
