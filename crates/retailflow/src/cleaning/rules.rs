//! Declarative per-table transforms.
//!
//! Each [`TableRule`] pairs an exact table name with one transform. New
//! rules are added to the list; existing ones are never edited to make room.

use crate::dataset::{ORDER_ITEMS_TABLE, ORDER_REVIEWS_TABLE, PRODUCTS_TABLE};
use crate::error::{PipelineError, Result};
use crate::table::{Column, ColumnType, Table, Value};

/// A transform applied to tables with a specific name.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRule {
    /// Exact, case-sensitive table name.
    pub table: String,
    pub transform: TableTransform,
}

/// A table-specific transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum TableTransform {
    /// Add `target` = `source` / `divisor`.
    ScaleColumn {
        source: String,
        target: String,
        divisor: f64,
    },

    /// Lower-case labels and replace underscores with spaces, in place.
    NormalizeLabels { column: String },

    /// Add a categorical `target` by binning `source`.
    ///
    /// Bins are `(edges[i], edges[i + 1]]`; the first bin also includes its
    /// lower edge. Values outside `[edges[0], edges[last]]` become null.
    BinScores {
        source: String,
        target: String,
        edges: Vec<f64>,
        labels: Vec<String>,
    },
}

impl TableRule {
    pub fn new(table: impl Into<String>, transform: TableTransform) -> Self {
        Self {
            table: table.into(),
            transform,
        }
    }

    /// The rules applied to the retail dataset.
    pub fn defaults() -> Vec<TableRule> {
        vec![
            TableRule::new(
                ORDER_ITEMS_TABLE,
                TableTransform::ScaleColumn {
                    source: "price".to_string(),
                    target: "price_normalized".to_string(),
                    divisor: 5.0,
                },
            ),
            TableRule::new(
                PRODUCTS_TABLE,
                TableTransform::NormalizeLabels {
                    column: "product_category_name".to_string(),
                },
            ),
            TableRule::new(
                ORDER_REVIEWS_TABLE,
                TableTransform::BinScores {
                    source: "review_score".to_string(),
                    target: "review_sentiment".to_string(),
                    edges: vec![0.0, 2.0, 3.0, 5.0],
                    labels: vec![
                        "Negative".to_string(),
                        "Neutral".to_string(),
                        "Positive".to_string(),
                    ],
                },
            ),
        ]
    }

    pub fn matches(&self, table_name: &str) -> bool {
        self.table == table_name
    }
}

impl TableTransform {
    /// Apply the transform, returning a log entry when it ran.
    ///
    /// Returns `Ok(None)` when the table lacks the source column.
    pub fn apply(&self, table: &mut Table) -> Result<Option<String>> {
        match self {
            TableTransform::ScaleColumn {
                source,
                target,
                divisor,
            } => {
                let Some(idx) = table.column_index(source) else {
                    return Ok(None);
                };
                if *divisor == 0.0 {
                    return Err(PipelineError::transform(&table.name, "divisor must be non-zero"));
                }
                let values = numeric_column(table, idx)?
                    .into_iter()
                    .map(|v| v.map_or(Value::Null, |v| Value::Float(v / divisor)))
                    .collect();
                table.add_column(Column::new(target.clone(), ColumnType::Float), values)?;
                Ok(Some(format!(
                    "Normalized '{}' into '{}' (divided by {})",
                    source, target, divisor
                )))
            }

            TableTransform::NormalizeLabels { column } => {
                let Some(idx) = table.column_index(column) else {
                    return Ok(None);
                };
                for row in &mut table.rows {
                    if let Value::Text(label) = &row[idx] {
                        row[idx] = Value::Text(label.to_lowercase().replace('_', " "));
                    }
                }
                Ok(Some(format!("Standardized category names in '{}'", column)))
            }

            TableTransform::BinScores {
                source,
                target,
                edges,
                labels,
            } => {
                let Some(idx) = table.column_index(source) else {
                    return Ok(None);
                };
                if edges.len() != labels.len() + 1 || edges.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(PipelineError::transform(
                        &table.name,
                        format!("invalid bins for '{}'", source),
                    ));
                }
                let values = numeric_column(table, idx)?
                    .into_iter()
                    .map(|v| {
                        v.and_then(|v| bin_label(v, edges, labels))
                            .map_or(Value::Null, Value::text)
                    })
                    .collect();
                table.add_column(Column::new(target.clone(), ColumnType::Text), values)?;
                Ok(Some(format!(
                    "Binned '{}' into '{}' ({})",
                    source,
                    target,
                    labels.join(", ")
                )))
            }
        }
    }
}

/// Numeric view of a column; nulls map to `None`, non-numeric text fails.
fn numeric_column(table: &Table, idx: usize) -> Result<Vec<Option<f64>>> {
    table
        .column_values(idx)
        .map(|value| match value {
            Value::Null => Ok(None),
            Value::Text(s) => match Value::infer(s) {
                Value::Null => Ok(None),
                v => v.as_f64().map(Some).ok_or_else(|| {
                    PipelineError::transform(
                        &table.name,
                        format!(
                            "column '{}' holds non-numeric value '{}'",
                            table.columns[idx].name, s
                        ),
                    )
                }),
            },
            v => v.as_f64().map(Some).ok_or_else(|| {
                PipelineError::transform(
                    &table.name,
                    format!("column '{}' is not numeric", table.columns[idx].name),
                )
            }),
        })
        .collect()
}

/// Label for a value under right-closed bins with an inclusive first edge.
fn bin_label<'a>(value: f64, edges: &[f64], labels: &'a [String]) -> Option<&'a str> {
    if value == edges[0] {
        return labels.first().map(String::as_str);
    }
    edges
        .windows(2)
        .position(|w| value > w[0] && value <= w[1])
        .map(|i| labels[i].as_str())
}
