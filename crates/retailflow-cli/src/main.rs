//! Retailflow CLI - run the ingestion, cleaning and enrichment stages.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = commands::load_config(cli.config.as_deref(), cli.root.as_deref()).and_then(
        |config| match cli.command {
            Commands::Ingest { download_url } => commands::ingest::run(config, download_url),
            Commands::Clean { skip_failed } => commands::clean::run(config, skip_failed),
            Commands::Enrich { strict } => commands::enrich::run(config, strict),
            Commands::Run {
                download_url,
                skip_failed,
                strict,
            } => commands::run::run(config, download_url, skip_failed, strict),
        },
    );

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "retailflow=debug"
    } else {
        "retailflow=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
