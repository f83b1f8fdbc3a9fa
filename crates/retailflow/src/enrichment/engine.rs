//! Left-join enrichment of domain tables.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PlaceholderKeys;
use crate::error::{PipelineError, Result};
use crate::sources::AuxiliarySet;
use crate::table::{Column, Table, Value};

use super::rules::{JoinRule, KeyDerivation};

/// What happened to one join rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinSummary {
    pub domain_table: String,
    pub auxiliary: String,
    /// Domain rows, before and after the join.
    pub rows: usize,
    /// Domain rows that found an auxiliary match.
    pub matched: usize,
    /// Why the rule was not applied, if it wasn't.
    pub skipped: Option<String>,
}

/// Result of one enrichment pass.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    /// Enriched tables keyed by their domain table name.
    pub tables: IndexMap<String, Table>,
    /// One entry per join rule, in rule order.
    pub joins: Vec<JoinSummary>,
}

/// Joins cleaned domain tables against auxiliary tables.
pub struct EnrichmentEngine {
    rules: Vec<JoinRule>,
}

impl EnrichmentEngine {
    /// Engine with the default retail pairings.
    pub fn new(keys: &PlaceholderKeys) -> Self {
        Self::with_rules(JoinRule::defaults(keys))
    }

    pub fn with_rules(rules: Vec<JoinRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[JoinRule] {
        &self.rules
    }

    /// Apply every rule whose domain and auxiliary tables are both present.
    ///
    /// Rules targeting the same domain table are applied in order on the
    /// accumulated result. A missing auxiliary table skips its rule.
    pub fn enrich(
        &self,
        cleaned: &IndexMap<String, Table>,
        auxiliary: &AuxiliarySet,
    ) -> Result<EnrichmentOutcome> {
        let mut outcome = EnrichmentOutcome::default();

        for rule in &self.rules {
            let Some(domain) = outcome
                .tables
                .get(&rule.domain_table)
                .or_else(|| cleaned.get(&rule.domain_table))
            else {
                outcome.joins.push(skipped(rule, 0, "domain table not found"));
                continue;
            };

            let Some(aux) = auxiliary.table(&rule.auxiliary) else {
                warn!(
                    table = %rule.domain_table,
                    auxiliary = %rule.auxiliary,
                    "Auxiliary table unavailable, skipping join"
                );
                outcome
                    .joins
                    .push(skipped(rule, domain.row_count(), "auxiliary source not loaded"));
                continue;
            };

            let (joined, matched) = left_join(domain, aux, rule)?;
            info!(
                table = %rule.domain_table,
                auxiliary = %rule.auxiliary,
                rows = joined.row_count(),
                matched,
                "Enriched table"
            );
            outcome.joins.push(JoinSummary {
                domain_table: rule.domain_table.clone(),
                auxiliary: rule.auxiliary.clone(),
                rows: joined.row_count(),
                matched,
                skipped: None,
            });
            outcome.tables.insert(rule.domain_table.clone(), joined);
        }

        Ok(outcome)
    }
}

fn skipped(rule: &JoinRule, rows: usize, reason: &str) -> JoinSummary {
    JoinSummary {
        domain_table: rule.domain_table.clone(),
        auxiliary: rule.auxiliary.clone(),
        rows,
        matched: 0,
        skipped: Some(reason.to_string()),
    }
}

/// Left outer join keeping every domain row exactly once.
///
/// The first auxiliary row with a given key wins. The auxiliary key column
/// is not repeated; other auxiliary columns whose names collide with domain
/// columns get a `_<auxiliary>` suffix. A collision on the suffixed name
/// too is an error.
pub(crate) fn left_join(domain: &Table, aux: &Table, rule: &JoinRule) -> Result<(Table, usize)> {
    let keys = rule.key.key_values(domain).ok_or_else(|| {
        PipelineError::transform(
            &domain.name,
            format!("join key column '{}' not found", rule.key.column_name()),
        )
    })?;
    let aux_key = aux.column_index(&rule.auxiliary_key).ok_or_else(|| {
        PipelineError::source(
            &rule.auxiliary,
            format!("join key column '{}' not found", rule.auxiliary_key),
        )
    })?;

    let mut index: HashMap<String, usize> = HashMap::new();
    for (row_idx, value) in aux.column_values(aux_key).enumerate() {
        if let Some(key) = value.join_key() {
            index.entry(key).or_insert(row_idx);
        }
    }

    let mut joined = domain.clone();
    if let KeyDerivation::Constant { name, value } = &rule.key {
        let column_type = value.column_type().unwrap_or_default();
        joined.add_column(Column::new(name.as_str(), column_type), keys.clone())?;
    }

    let matches: Vec<Option<usize>> = keys
        .iter()
        .map(|k| k.join_key().and_then(|k| index.get(&k).copied()))
        .collect();
    let matched = matches.iter().filter(|m| m.is_some()).count();

    for (col_idx, column) in aux.columns.iter().enumerate() {
        if col_idx == aux_key {
            continue;
        }
        let name = if joined.column_index(&column.name).is_some() {
            let suffixed = format!("{}_{}", column.name, rule.auxiliary);
            if joined.column_index(&suffixed).is_some() {
                return Err(PipelineError::transform(
                    &domain.name,
                    format!(
                        "column '{}' from '{}' collides with existing column '{}'",
                        column.name, rule.auxiliary, suffixed
                    ),
                ));
            }
            suffixed
        } else {
            column.name.clone()
        };
        let values = matches
            .iter()
            .map(|m| m.map_or(Value::Null, |row| aux.rows[row][col_idx].clone()))
            .collect();
        joined.add_column(Column::new(name, column.column_type), values)?;
    }

    Ok((joined, matched))
}
