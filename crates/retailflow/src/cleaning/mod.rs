//! Cleaning engine: deduplication, imputation, coercion and per-table rules.

mod engine;
mod rules;

pub use engine::{CleaningEngine, CleaningOutcome, UNKNOWN_SENTINEL};
pub use rules::{TableRule, TableTransform};
