//! Run command - all three stages in order.

use colored::Colorize;
use retailflow::{Pipeline, PipelineConfig};

use super::{clean, enrich, ingest, CommandResult};

pub fn run(
    mut config: PipelineConfig,
    download_url: Option<String>,
    skip_failed: bool,
    strict: bool,
) -> CommandResult {
    if download_url.is_some() {
        config.download_url = download_url;
    }
    config.skip_failed_tables |= skip_failed;
    config.strict_sources |= strict;

    let pipeline = Pipeline::new(config);
    let source = pipeline.dataset_source();

    println!("{}", "[1/3] Ingestion".cyan().bold());
    ingest::print_summary(&pipeline.ingest(source.as_ref())?);

    println!();
    println!("{}", "[2/3] Cleaning".cyan().bold());
    clean::print_summary(&pipeline.clean()?);

    println!();
    println!("{}", "[3/3] Enrichment".cyan().bold());
    enrich::print_summary(&pipeline.enrich()?);

    println!();
    println!("{}", "Pipeline complete.".green().bold());
    Ok(())
}
