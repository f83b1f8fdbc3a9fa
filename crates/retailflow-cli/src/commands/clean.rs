//! Clean command - profile and clean the raw tables.

use colored::Colorize;
use retailflow::{CleaningSummary, Pipeline, PipelineConfig};

use super::CommandResult;

pub fn run(mut config: PipelineConfig, skip_failed: bool) -> CommandResult {
    config.skip_failed_tables |= skip_failed;

    println!(
        "{} {}",
        "Cleaning".cyan().bold(),
        config.stores.raw.display().to_string().white()
    );

    let summary = Pipeline::new(config).clean()?;
    print_summary(&summary);
    Ok(())
}

pub fn print_summary(summary: &CleaningSummary) {
    for audit in &summary.tables {
        println!(
            "  {} {}: {} -> {} rows, {} -> {} nulls, {} operations",
            "✓".green(),
            audit.table.white().bold(),
            audit.before.row_count,
            audit.rows_after,
            audit.before.null_count,
            audit.nulls_after,
            audit.operations.len()
        );
    }
    for (table, reason) in &summary.skipped {
        println!("  {} {} skipped ({})", "✗".red(), table, reason.dimmed());
    }
    println!(
        "{} {}",
        "Cleaned store:".green().bold(),
        summary.store_path.display()
    );
    println!(
        "{} {}",
        "Audit report:".green().bold(),
        summary.report_path.display()
    );
}
