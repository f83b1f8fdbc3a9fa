//! Declarative join pairings.

use crate::config::PlaceholderKeys;
use crate::dataset::{CUSTOMERS_TABLE, ORDERS_TABLE, PRODUCTS_TABLE};
use crate::sources::{CATEGORIES, SEGMENTS, SHIPPING_RATES};
use crate::table::{Table, Value};

/// How the join key is obtained on the domain side.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDerivation {
    /// An existing domain column.
    Column(String),
    /// A constant materialised as column `name` on every domain row.
    ///
    /// Stands in for keys whose real derivation (e.g. summed item weight
    /// per order) is not implemented; swap in a new variant to compute them.
    Constant { name: String, value: Value },
}

impl KeyDerivation {
    /// Name of the domain-side key column.
    pub fn column_name(&self) -> &str {
        match self {
            KeyDerivation::Column(name) => name,
            KeyDerivation::Constant { name, .. } => name,
        }
    }

    /// Key value of every domain row, or `None` if the key column is absent.
    pub(crate) fn key_values(&self, table: &Table) -> Option<Vec<Value>> {
        match self {
            KeyDerivation::Column(name) => {
                let idx = table.column_index(name)?;
                Some(table.column_values(idx).cloned().collect())
            }
            KeyDerivation::Constant { value, .. } => Some(vec![value.clone(); table.row_count()]),
        }
    }
}

/// One (domain table, auxiliary table, key) pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRule {
    /// Exact name of the cleaned domain table.
    pub domain_table: String,
    /// Name of the auxiliary source.
    pub auxiliary: String,
    /// Domain-side key.
    pub key: KeyDerivation,
    /// Key column in the auxiliary table.
    pub auxiliary_key: String,
}

impl JoinRule {
    pub fn new(
        domain_table: impl Into<String>,
        auxiliary: impl Into<String>,
        key: KeyDerivation,
        auxiliary_key: impl Into<String>,
    ) -> Self {
        Self {
            domain_table: domain_table.into(),
            auxiliary: auxiliary.into(),
            key,
            auxiliary_key: auxiliary_key.into(),
        }
    }

    /// The pairings used for the retail dataset.
    pub fn defaults(keys: &PlaceholderKeys) -> Vec<JoinRule> {
        vec![
            JoinRule::new(
                PRODUCTS_TABLE,
                CATEGORIES,
                KeyDerivation::Column("product_category_name".to_string()),
                "name",
            ),
            JoinRule::new(
                ORDERS_TABLE,
                SHIPPING_RATES,
                KeyDerivation::Constant {
                    name: "weight_range".to_string(),
                    value: Value::text(keys.weight_range.as_str()),
                },
                "weight_range",
            ),
            JoinRule::new(
                CUSTOMERS_TABLE,
                SEGMENTS,
                KeyDerivation::Constant {
                    name: "min_purchase".to_string(),
                    value: Value::Float(keys.min_purchase),
                },
                "min_purchase",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType};

    #[test]
    fn test_defaults_use_placeholder_keys() {
        let keys = PlaceholderKeys {
            weight_range: "5-10kg".to_string(),
            min_purchase: 250.0,
        };
        let rules = JoinRule::defaults(&keys);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].key.column_name(), "product_category_name");
        assert_eq!(
            rules[1].key,
            KeyDerivation::Constant {
                name: "weight_range".to_string(),
                value: Value::text("5-10kg"),
            }
        );
        assert_eq!(rules[2].auxiliary, SEGMENTS);
    }

    #[test]
    fn test_key_values() {
        let table = Table::with_rows(
            "t",
            vec![Column::new("k", ColumnType::Text)],
            vec![vec![Value::text("a")], vec![Value::Null]],
        )
        .unwrap();

        let column = KeyDerivation::Column("k".to_string());
        assert_eq!(
            column.key_values(&table),
            Some(vec![Value::text("a"), Value::Null])
        );
        assert_eq!(KeyDerivation::Column("missing".to_string()).key_values(&table), None);

        let constant = KeyDerivation::Constant {
            name: "c".to_string(),
            value: Value::Integer(1),
        };
        assert_eq!(constant.key_values(&table).unwrap().len(), 2);
    }
}
