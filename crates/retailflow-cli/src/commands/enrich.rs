//! Enrich command - join cleaned tables with auxiliary sources.

use colored::Colorize;
use retailflow::{EnrichmentSummary, LoadStatus, Pipeline, PipelineConfig};

use super::CommandResult;

pub fn run(mut config: PipelineConfig, strict: bool) -> CommandResult {
    config.strict_sources |= strict;

    println!(
        "{} {}",
        "Enriching".cyan().bold(),
        config.stores.cleaned.display().to_string().white()
    );

    let summary = Pipeline::new(config).enrich()?;
    print_summary(&summary);
    Ok(())
}

pub fn print_summary(summary: &EnrichmentSummary) {
    match summary.status {
        LoadStatus::Complete => println!("  {} all auxiliary sources loaded", "✓".green()),
        LoadStatus::Partial { failed } => {
            println!(
                "  {} {} auxiliary source(s) failed to load",
                "!".yellow().bold(),
                failed
            );
            for failure in &summary.failures {
                println!("    {} {}", failure.source.yellow(), failure.message.dimmed());
            }
        }
    }

    for counts in &summary.tables {
        println!(
            "  {} {} ({} rows, {} -> {} columns)",
            "✓".green(),
            counts.stored_as.white().bold(),
            counts.rows_after,
            counts.columns_before,
            counts.columns_after
        );
    }
    println!(
        "{} {}",
        "Enriched store:".green().bold(),
        summary.store_path.display()
    );
    println!(
        "{} {}",
        "Audit report:".green().bold(),
        summary.report_path.display()
    );
}
