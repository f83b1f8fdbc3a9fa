//! Enrichment of cleaned domain tables with auxiliary reference data.

mod engine;
mod rules;

pub use engine::{EnrichmentEngine, EnrichmentOutcome, JoinSummary};
pub use rules::{JoinRule, KeyDerivation};
