//! Ingest command - load raw CSV files into the raw store.

use colored::Colorize;
use retailflow::{IngestionSummary, Pipeline, PipelineConfig};

use super::CommandResult;

pub fn run(mut config: PipelineConfig, download_url: Option<String>) -> CommandResult {
    if download_url.is_some() {
        config.download_url = download_url;
    }

    println!(
        "{} {}",
        "Ingesting".cyan().bold(),
        config.dataset.white()
    );

    let pipeline = Pipeline::new(config);
    let source = pipeline.dataset_source();
    let summary = pipeline.ingest(source.as_ref())?;
    print_summary(&summary);
    Ok(())
}

pub fn print_summary(summary: &IngestionSummary) {
    println!(
        "Read CSV files from {}",
        summary.csv_dir.display().to_string().cyan()
    );
    for (table, rows) in &summary.tables {
        println!("  {} {} ({} rows)", "✓".green(), table, rows);
    }
    for (file, reason) in &summary.failed_files {
        println!("  {} {} ({})", "✗".red(), file, reason.dimmed());
    }
    println!(
        "{} {}",
        "Audit report:".green().bold(),
        summary.report_path.display()
    );
}
