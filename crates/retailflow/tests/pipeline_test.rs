//! End-to-end stage runs against temporary stores and source files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use retailflow::input::LocalDirectory;
use retailflow::{ColumnType, LoadStatus, Pipeline, PipelineConfig, PipelineError, TableStore, Value};

const ORDERS: &str = "order_id,customer_id,order_status,order_purchase_timestamp\n\
                      o1,c1,delivered,2017-10-02 10:56:33\n\
                      o2,c2,,2018-07-24 20:41:37\n\
                      o3,c3,shipped,not a date\n\
                      o3,c3,shipped,not a date\n\
                      o4,c1,delivered,\n";

const ITEMS: &str = "order_id,order_item_id,price\n\
                     o1,1,29.99\n\
                     o2,1,\n\
                     o3,1,118.70\n\
                     o4,1,45.00\n";

const PRODUCTS: &str = "product_id,product_category_name,product_weight_g\n\
                        p1,cama_mesa_banho,500\n\
                        p2,perfumaria,\n\
                        p3,,1200\n";

const REVIEWS: &str = "review_id,order_id,review_score\n\
                       r1,o1,5\n\
                       r2,o2,1\n\
                       r3,o3,3\n";

const CUSTOMERS: &str = "customer_id,customer_city\n\
                         c1,sao paulo\n\
                         c2,rio de janeiro\n\
                         c3,curitiba\n";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lay out raw CSVs and every auxiliary source except the spreadsheet.
fn setup() -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = PipelineConfig::rooted_at(dir.path());
    config.sample_seed = Some(42);

    let raw = &config.raw_dir;
    write(&raw.join("olist_orders_dataset.csv"), ORDERS);
    write(&raw.join("olist_order_items_dataset.csv"), ITEMS);
    write(&raw.join("olist_products_dataset.csv"), PRODUCTS);
    write(&raw.join("olist_order_reviews_dataset.csv"), REVIEWS);
    write(&raw.join("olist_customers_dataset.csv"), CUSTOMERS);
    write(&raw.join("broken.csv"), "");

    let sources = &config.sources;
    write(
        &sources.categories,
        r#"[{"category_id": 1, "name": "cama mesa banho", "tax_rate": 0.12},
            {"category_id": 2, "name": "perfumaria", "tax_rate": 0.18}]"#,
    );
    write(
        &sources.segments,
        "segment_id,name,min_purchase,discount_rate\n\
         1,Bronze,50,0.0\n\
         2,Silver,100,0.05\n\
         3,Gold,500,0.1\n",
    );
    write(
        &sources.payment_methods,
        r#"<payment_methods>
             <method><id>1</id><name>credit_card</name><processing_fee>0.03</processing_fee></method>
             <method><id>2</id><name>boleto</name><processing_fee>0.01</processing_fee></method>
           </payment_methods>"#,
    );
    write(
        &sources.delivery_options,
        "<table><tr><th>option</th><th>days</th></tr><tr><td>Standard</td><td>7</td></tr></table>",
    );
    write(&sources.supplier_ratings, "Supplier A: 4.5\nSupplier B: 3.9\n");

    (dir, config)
}

#[test]
fn test_ingest_skips_unreadable_files() {
    let (_dir, config) = setup();
    let pipeline = Pipeline::new(config.clone());

    let summary = pipeline
        .ingest(&LocalDirectory::new(&config.raw_dir))
        .expect("Ingestion failed");

    assert_eq!(summary.tables.len(), 5);
    assert_eq!(summary.failed_files.len(), 1);
    assert_eq!(summary.failed_files[0].0, "broken.csv");

    let store = TableStore::open(&config.stores.raw).unwrap();
    assert_eq!(store.row_count("olist_orders_dataset").unwrap(), 5);

    let report = fs::read_to_string(&config.audit.ingestion).unwrap();
    assert!(report.contains("olist_orders_dataset.csv: 5 records"));
    assert!(report.contains("broken.csv: read error"));
    assert!(report.contains("Total records in CSV files: 18"));
    assert!(report.contains("Total records in store: 18"));

    assert!(config.exports.ingestion_sample.exists());
}

#[test]
fn test_ingest_isolates_files_the_store_rejects() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::rooted_at(dir.path());
    write(&config.raw_dir.join("good.csv"), "order_id\no1\no2\n");
    write(&config.raw_dir.join("dup.csv"), "id,id\n1,2\n");
    // SQLite column names ignore case, so this header cannot be stored.
    write(&config.raw_dir.join("mixed_case.csv"), "ID,id\n1,2\n");

    let summary = Pipeline::new(config.clone())
        .ingest(&LocalDirectory::new(&config.raw_dir))
        .expect("Ingestion failed");

    assert_eq!(summary.failed_files.len(), 1);
    assert_eq!(summary.failed_files[0].0, "mixed_case.csv");

    let store = TableStore::open(&config.stores.raw).unwrap();
    assert_eq!(store.row_count("good").unwrap(), 2);
    let dup = store.read_table("dup").unwrap();
    assert_eq!(dup.column_names(), vec!["id", "id.1"]);
    assert_eq!(dup.value(0, "id.1"), Some(&Value::Integer(2)));
}

#[test]
fn test_ingest_without_csv_files_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::rooted_at(dir.path());
    fs::create_dir_all(&config.raw_dir).unwrap();

    let result = Pipeline::new(config.clone()).ingest(&LocalDirectory::new(&config.raw_dir));
    assert!(matches!(result, Err(PipelineError::MissingResource(_))));
}

#[test]
fn test_clean_requires_raw_store() {
    let dir = TempDir::new().unwrap();
    let result = Pipeline::new(PipelineConfig::rooted_at(dir.path())).clean();
    assert!(matches!(result, Err(PipelineError::MissingResource(_))));
}

#[test]
fn test_clean_stage_persists_and_audits() {
    let (_dir, config) = setup();
    let pipeline = Pipeline::new(config.clone());
    pipeline.ingest(&LocalDirectory::new(&config.raw_dir)).unwrap();

    let summary = pipeline.clean().expect("Cleaning failed");
    assert_eq!(summary.tables.len(), 5);
    assert!(summary.skipped.is_empty());

    let orders = summary
        .tables
        .iter()
        .find(|a| a.table == "olist_orders_dataset")
        .unwrap();
    assert_eq!(orders.before.duplicate_row_count, 1);
    assert_eq!(orders.rows_after, orders.before.row_count - 1);
    assert_eq!(orders.operations[0], "Removed 1 duplicate rows");
    assert!(orders
        .operations
        .iter()
        .any(|op| op.starts_with("Converted column 'order_purchase_timestamp' to timestamp")));

    let store = TableStore::open(&config.stores.cleaned).unwrap();
    let names = store.table_names().unwrap();
    assert!(names.iter().all(|n| n.starts_with("clean_")));

    let cleaned_orders = store.read_table("clean_olist_orders_dataset").unwrap();
    assert_eq!(cleaned_orders.row_count(), 4);
    assert_eq!(
        cleaned_orders.column("order_purchase_timestamp").unwrap().column_type,
        ColumnType::Timestamp
    );
    assert_eq!(cleaned_orders.value(1, "order_status"), Some(&Value::text("UNKNOWN")));

    let items = store.read_table("clean_olist_order_items_dataset").unwrap();
    assert_eq!(items.value(1, "price"), Some(&Value::Float(45.0)));
    assert_eq!(items.value(1, "price_normalized"), Some(&Value::Float(9.0)));

    let products = store.read_table("clean_olist_products_dataset").unwrap();
    assert_eq!(
        products.value(0, "product_category_name"),
        Some(&Value::text("cama mesa banho"))
    );
    assert_eq!(products.value(1, "product_weight_g"), Some(&Value::Integer(850)));

    let reviews = store.read_table("clean_olist_order_reviews_dataset").unwrap();
    let sentiments: Vec<_> = (0..3)
        .map(|r| reviews.value(r, "review_sentiment").cloned().unwrap())
        .collect();
    assert_eq!(
        sentiments,
        vec![Value::text("Positive"), Value::text("Negative"), Value::text("Neutral")]
    );

    let report = fs::read_to_string(&config.audit.cleaning).unwrap();
    assert!(report.contains("- Duplicate rows removed: 1"));
    assert!(report.contains("  * Removed 1 duplicate rows"));
    assert!(report.contains("CLEANED DATA SAVED TO STORE:"));
    assert!(report.contains("clean_olist_orders_dataset"));

    let sample = fs::read_to_string(&config.exports.cleaning_sample).unwrap();
    assert!(sample.lines().next().unwrap().ends_with(",source"));
}

#[test]
fn test_enrich_stage_with_missing_spreadsheet() {
    let (_dir, config) = setup();
    let pipeline = Pipeline::new(config.clone());
    pipeline.ingest(&LocalDirectory::new(&config.raw_dir)).unwrap();
    pipeline.clean().unwrap();

    let summary = pipeline.enrich().expect("Enrichment failed");
    assert_eq!(summary.status, LoadStatus::Partial { failed: 1 });
    assert_eq!(summary.failures[0].source, "shipping_rates");

    let store = TableStore::open(&config.stores.enriched).unwrap();
    let names = store.table_names().unwrap();
    assert!(names.contains(&"enriched_olist_products_dataset".to_string()));
    assert!(names.contains(&"enriched_olist_customers_dataset".to_string()));
    assert!(names.contains(&"clean_olist_orders_dataset".to_string()));
    assert!(names.contains(&"clean_olist_order_items_dataset".to_string()));

    for counts in &summary.tables {
        assert_eq!(counts.rows_before, counts.rows_after, "{}", counts.table);
    }

    let products = store.read_table("enriched_olist_products_dataset").unwrap();
    assert_eq!(products.row_count(), 3);
    assert_eq!(products.value(0, "tax_rate"), Some(&Value::Float(0.12)));
    assert_eq!(products.value(1, "category_id"), Some(&Value::Integer(2)));
    assert_eq!(products.value(2, "category_id"), Some(&Value::Null));

    let customers = store.read_table("enriched_olist_customers_dataset").unwrap();
    assert_eq!(customers.row_count(), 3);
    assert_eq!(customers.value(2, "name"), Some(&Value::text("Silver")));
    assert_eq!(customers.value(0, "discount_rate"), Some(&Value::Float(0.05)));

    let report = fs::read_to_string(&config.audit.enrichment).unwrap();
    assert!(report.contains("Auxiliary sources: partial"));
    assert!(report.contains("- shipping_rates: FAILED"));
    assert!(report.contains("- supplier_ratings: text document"));
    assert!(report.contains("- olist_products_dataset <- categories: 2 of 3 rows matched"));
}

#[test]
fn test_strict_sources_abort_enrichment() {
    let (_dir, mut config) = setup();
    config.strict_sources = true;
    let pipeline = Pipeline::new(config.clone());
    pipeline.ingest(&LocalDirectory::new(&config.raw_dir)).unwrap();
    pipeline.clean().unwrap();

    assert!(matches!(
        pipeline.enrich(),
        Err(PipelineError::MissingResource(_))
    ));
}

#[test]
fn test_store_round_trip_keeps_shape() {
    let (_dir, config) = setup();
    let pipeline = Pipeline::new(config.clone());
    pipeline.ingest(&LocalDirectory::new(&config.raw_dir)).unwrap();

    let raw = TableStore::open(&config.stores.raw).unwrap();
    let items = raw.read_table("olist_order_items_dataset").unwrap();

    let mut memory = TableStore::in_memory().unwrap();
    memory.write_table(&items).unwrap();
    let back = memory.read_table("olist_order_items_dataset").unwrap();

    assert_eq!(back.row_count(), items.row_count());
    assert_eq!(back.column_names(), items.column_names());
}
