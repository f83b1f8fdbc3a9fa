//! Names used by the retail dataset and the stage naming conventions.

/// Identifier of the public dataset the raw tables come from.
pub const DEFAULT_DATASET: &str = "olistbr/brazilian-ecommerce";

pub const ORDERS_TABLE: &str = "olist_orders_dataset";
pub const ORDER_ITEMS_TABLE: &str = "olist_order_items_dataset";
pub const ORDER_REVIEWS_TABLE: &str = "olist_order_reviews_dataset";
pub const PRODUCTS_TABLE: &str = "olist_products_dataset";
pub const CUSTOMERS_TABLE: &str = "olist_customers_dataset";

/// Prefix of tables written by the cleaning stage.
pub const CLEAN_PREFIX: &str = "clean_";
/// Prefix of tables written by the enrichment stage.
pub const ENRICHED_PREFIX: &str = "enriched_";

/// Name of a table in the cleaned store.
pub fn clean_name(table: &str) -> String {
    format!("{}{}", CLEAN_PREFIX, table)
}

/// Name of an enriched table in the enriched store.
pub fn enriched_name(table: &str) -> String {
    format!("{}{}", ENRICHED_PREFIX, table)
}

/// Recover the original table name from a cleaned-store name.
pub fn original_name(stored: &str) -> &str {
    stored.strip_prefix(CLEAN_PREFIX).unwrap_or(stored)
}
