//! Plain-text audit reports, one per stage.
//!
//! Rendering is pure: every report takes the generation time as an argument
//! so the same inputs always produce the same text.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::dataset::ENRICHED_PREFIX;
use crate::enrichment::JoinSummary;
use crate::error::{PipelineError, Result};
use crate::profile::TableProfile;
use crate::sources::SourceFailure;
use crate::table::TIMESTAMP_FORMAT;

/// Before/after facts for one cleaned table.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningAudit {
    pub table: String,
    /// Profile of the raw table.
    pub before: TableProfile,
    pub rows_after: usize,
    pub nulls_after: usize,
    /// Operations in the order they were applied.
    pub operations: Vec<String>,
}

/// Cleaning-stage report input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub tables: Vec<CleaningAudit>,
}

impl CleaningReport {
    pub fn rows_before(&self) -> usize {
        self.tables.iter().map(|t| t.before.row_count).sum()
    }

    pub fn rows_after(&self) -> usize {
        self.tables.iter().map(|t| t.rows_after).sum()
    }

    pub fn nulls_before(&self) -> usize {
        self.tables.iter().map(|t| t.before.null_count).sum()
    }

    pub fn nulls_after(&self) -> usize {
        self.tables.iter().map(|t| t.nulls_after).sum()
    }

    /// Duplicate rows found by profiling the raw tables.
    pub fn duplicates(&self) -> usize {
        self.tables.iter().map(|t| t.before.duplicate_row_count).sum()
    }

    pub fn render(&self, generated_at: NaiveDateTime) -> String {
        let (rows_before, rows_after) = (self.rows_before(), self.rows_after());
        let (nulls_before, nulls_after) = (self.nulls_before(), self.nulls_after());

        let mut lines = vec![
            format!("Cleaning Audit Report - {}", generated_at.format(TIMESTAMP_FORMAT)),
            "=".repeat(50),
            String::new(),
            "SUMMARY:".to_string(),
            format!("- Rows before cleaning: {rows_before}"),
            format!("- Rows after cleaning: {rows_after}"),
            format!("- Null values before cleaning: {nulls_before}"),
            format!("- Null values after cleaning: {nulls_after}"),
            format!("- Rows removed: {}", rows_before.saturating_sub(rows_after)),
            format!("- Null values treated: {}", nulls_before.saturating_sub(nulls_after)),
            format!("- Duplicate rows removed: {}", self.duplicates()),
            String::new(),
            "DETAIL BY TABLE:".to_string(),
        ];

        for audit in &self.tables {
            lines.push(String::new());
            lines.push(format!("Table: {}", audit.table));
            lines.push(format!("- Rows before: {}", audit.before.row_count));
            lines.push(format!("- Rows after: {}", audit.rows_after));
            lines.push(format!("- Null values before: {}", audit.before.null_count));
            lines.push(format!("- Null values after: {}", audit.nulls_after));
            lines.push(format!("- Duplicate rows: {}", audit.before.duplicate_row_count));
            lines.push(String::new());
            lines.push("Operations performed:".to_string());
            if audit.operations.is_empty() {
                lines.push("  (none)".to_string());
            }
            for op in &audit.operations {
                lines.push(format!("  * {op}"));
            }
        }

        lines.join("\n")
    }
}

/// Footer appended to the cleaning report once the cleaned store exists.
pub fn cleaning_footer(store: &Path, tables: &[String]) -> String {
    format!(
        "\n\nCLEANED DATA SAVED TO STORE:\n- Path: {}\n- Tables generated: {}\n",
        store.display(),
        tables.join(", ")
    )
}

/// Record count for one raw CSV file, or the reason it could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct FileCount {
    pub file: String,
    pub records: std::result::Result<usize, String>,
}

/// Ingestion-stage report input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub dataset_path: PathBuf,
    pub files: Vec<FileCount>,
    /// Row count per table in the raw store.
    pub tables: Vec<(String, usize)>,
}

impl IngestionReport {
    pub fn csv_total(&self) -> usize {
        self.files.iter().filter_map(|f| f.records.as_ref().ok()).sum()
    }

    pub fn store_total(&self) -> usize {
        self.tables.iter().map(|(_, n)| n).sum()
    }

    pub fn render(&self, generated_at: NaiveDateTime) -> String {
        let mut lines = vec![
            format!("Ingestion Audit Report - {}", generated_at.format(TIMESTAMP_FORMAT)),
            format!("Dataset path: {}", self.dataset_path.display()),
            String::new(),
            "Records per CSV file:".to_string(),
        ];
        for file in &self.files {
            match &file.records {
                Ok(n) => lines.push(format!("{}: {} records", file.file, n)),
                Err(e) => lines.push(format!("{}: read error ({})", file.file, e)),
            }
        }
        lines.push(String::new());
        lines.push("Records per store table:".to_string());
        for (table, n) in &self.tables {
            lines.push(format!("Table '{table}': {n} records"));
        }
        lines.push(String::new());
        lines.push(format!("Total records in CSV files: {}", self.csv_total()));
        lines.push(format!("Total records in store: {}", self.store_total()));
        lines.join("\n")
    }
}

/// Row and column counts of one table before and after enrichment.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedTableCounts {
    pub table: String,
    pub stored_as: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
}

/// Enrichment-stage report input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichmentReport {
    pub tables: Vec<EnrichedTableCounts>,
    pub joins: Vec<JoinSummary>,
    pub failures: Vec<SourceFailure>,
    /// Auxiliary tables loaded, with row counts.
    pub auxiliary: Vec<(String, usize)>,
    /// Free-text documents loaded, with their length in characters.
    pub documents: Vec<(String, usize)>,
}

impl EnrichmentReport {
    pub fn render(&self, generated_at: NaiveDateTime) -> String {
        let mut lines = vec![
            format!("Enrichment Audit Report - {}", generated_at.format(TIMESTAMP_FORMAT)),
            "=".repeat(50),
            String::new(),
            format!(
                "Auxiliary sources: {}",
                if self.failures.is_empty() { "complete" } else { "partial" }
            ),
        ];
        for (name, rows) in &self.auxiliary {
            lines.push(format!("- {name}: {rows} records"));
        }
        for (name, chars) in &self.documents {
            lines.push(format!("- {name}: text document ({chars} characters)"));
        }
        for failure in &self.failures {
            lines.push(format!("- {}: FAILED ({})", failure.source, failure.message));
        }

        lines.push(String::new());
        lines.push("Joins:".to_string());
        for join in &self.joins {
            match &join.skipped {
                Some(reason) => lines.push(format!(
                    "- {} <- {}: skipped ({})",
                    join.domain_table, join.auxiliary, reason
                )),
                None => lines.push(format!(
                    "- {} <- {}: {} of {} rows matched",
                    join.domain_table, join.auxiliary, join.matched, join.rows
                )),
            }
        }

        lines.push(String::new());
        lines.push("Tables:".to_string());
        for t in &self.tables {
            lines.push(format!(
                "- {} -> {}: {} -> {} rows, {} -> {} columns",
                t.table, t.stored_as, t.rows_before, t.rows_after, t.columns_before, t.columns_after
            ));
        }
        lines.push(String::new());
        lines.push(format!(
            "Records in enriched tables: {}",
            self.tables
                .iter()
                .filter(|t| t.stored_as.starts_with(ENRICHED_PREFIX))
                .map(|t| t.rows_after)
                .sum::<usize>()
        ));
        lines.join("\n")
    }
}

/// Write a report, replacing any previous one.
pub fn write_report(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| PipelineError::io(path, e))
}

/// Append text to an existing report.
pub fn append_report(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| PipelineError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| PipelineError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ColumnProfile;
    use crate::table::ColumnType;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    fn profile(table: &str, rows: usize, nulls: usize, dups: usize) -> TableProfile {
        TableProfile {
            table: table.to_string(),
            row_count: rows,
            null_count: nulls,
            duplicate_row_count: dups,
            columns: vec![ColumnProfile {
                name: "price".to_string(),
                column_type: ColumnType::Float,
                null_count: nulls,
            }],
        }
    }

    #[test]
    fn test_cleaning_report_summary() {
        let report = CleaningReport {
            tables: vec![
                CleaningAudit {
                    table: "orders".to_string(),
                    before: profile("orders", 10, 4, 2),
                    rows_after: 8,
                    nulls_after: 0,
                    operations: vec![
                        "Removed 2 duplicate rows".to_string(),
                        "Imputed 4 null values in 'price' with the median (3)".to_string(),
                    ],
                },
                CleaningAudit {
                    table: "items".to_string(),
                    before: profile("items", 5, 0, 0),
                    rows_after: 5,
                    nulls_after: 0,
                    operations: vec![],
                },
            ],
        };

        let text = report.render(at());
        assert!(text.starts_with("Cleaning Audit Report - 2024-03-01 12:30:00"));
        assert!(text.contains("- Rows before cleaning: 15\n"));
        assert!(text.contains("- Rows after cleaning: 13\n"));
        assert!(text.contains("- Rows removed: 2\n"));
        assert!(text.contains("- Null values treated: 4\n"));
        assert!(text.contains("- Duplicate rows removed: 2\n"));
        assert!(text.contains("Table: items"));
        assert!(text.contains("  (none)"));

        let first = text.find("  * Removed 2 duplicate rows").unwrap();
        let second = text.find("  * Imputed 4 null values").unwrap();
        assert!(first < second);
        assert_eq!(text, report.render(at()));
    }

    #[test]
    fn test_ingestion_report_totals() {
        let report = IngestionReport {
            dataset_path: PathBuf::from("raw"),
            files: vec![
                FileCount {
                    file: "a.csv".to_string(),
                    records: Ok(3),
                },
                FileCount {
                    file: "b.csv".to_string(),
                    records: Err("bad quoting".to_string()),
                },
            ],
            tables: vec![("a".to_string(), 3)],
        };

        let text = report.render(at());
        assert!(text.contains("a.csv: 3 records"));
        assert!(text.contains("b.csv: read error (bad quoting)"));
        assert!(text.contains("Table 'a': 3 records"));
        assert!(text.ends_with("Total records in store: 3"));
    }

    #[test]
    fn test_enrichment_report_lists_failures() {
        let report = EnrichmentReport {
            failures: vec![SourceFailure {
                source: "shipping_rates".to_string(),
                format: crate::sources::SourceFormat::Spreadsheet,
                message: "not found".to_string(),
            }],
            joins: vec![JoinSummary {
                domain_table: "orders".to_string(),
                auxiliary: "shipping_rates".to_string(),
                rows: 4,
                matched: 0,
                skipped: Some("auxiliary source not loaded".to_string()),
            }],
            ..Default::default()
        };

        let text = report.render(at());
        assert!(text.contains("Auxiliary sources: partial"));
        assert!(text.contains("- shipping_rates: FAILED (not found)"));
        assert!(text.contains("- orders <- shipping_rates: skipped"));
    }

    #[test]
    fn test_write_then_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit").join("cleaning_report.txt");

        write_report(&path, "old").unwrap();
        write_report(&path, "body").unwrap();
        append_report(&path, &cleaning_footer(Path::new("db/clean.db"), &["clean_a".to_string()]))
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("body\n\nCLEANED DATA SAVED TO STORE:"));
        assert!(text.contains("- Tables generated: clean_a"));
    }
}
