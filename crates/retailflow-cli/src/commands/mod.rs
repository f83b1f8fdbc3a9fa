//! CLI command implementations.

pub mod clean;
pub mod enrich;
pub mod ingest;
pub mod run;

use std::path::Path;

use retailflow::PipelineConfig;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Resolve the configuration from `--config` or `--root`.
pub fn load_config(
    config: Option<&Path>,
    root: Option<&Path>,
) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let config = match (config, root) {
        (Some(path), _) => PipelineConfig::load(path)?,
        (None, Some(root)) => PipelineConfig::rooted_at(root),
        (None, None) => PipelineConfig::default(),
    };
    Ok(config)
}
