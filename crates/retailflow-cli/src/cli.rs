//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Retailflow: batch ingestion, cleaning and enrichment of retail tables
#[derive(Parser)]
#[command(name = "retailflow")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file (fields not given use defaults)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base directory for the default path layout (ignored with --config)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the raw CSV files into the raw store
    Ingest {
        /// Download the dataset archive from this URL first
        #[arg(long)]
        download_url: Option<String>,
    },

    /// Profile and clean the raw tables into the cleaned store
    Clean {
        /// Skip tables whose cleaning fails instead of aborting
        #[arg(long)]
        skip_failed: bool,
    },

    /// Join cleaned tables with the auxiliary sources
    Enrich {
        /// Fail if any auxiliary source cannot be loaded
        #[arg(long)]
        strict: bool,
    },

    /// Run ingestion, cleaning and enrichment in order
    Run {
        /// Download the dataset archive from this URL first
        #[arg(long)]
        download_url: Option<String>,

        /// Skip tables whose cleaning fails instead of aborting
        #[arg(long)]
        skip_failed: bool,

        /// Fail if any auxiliary source cannot be loaded
        #[arg(long)]
        strict: bool,
    },
}
