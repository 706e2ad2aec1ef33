#![cfg(feature = "db-tests")]
//! PostgreSQL store tests.
//!
//! Need a reachable database; connection parameters come from `PG_*`
//! variables. Every test works in its own schema, dropped afterwards.

use deadpool_postgres::{Config, ManagerConfig, PoolConfig, RecyclingMethod, Runtime};
use retable_cli::cli::ConnectionArgs;
use retable_cli::{DbConfig, PgQueryStore};
use retable_core::{
    ArtifactKind, IdFilter, QueryStore, RewriteTask, RewriteValue, RunOptions, Updater,
};
use retable_test_utils::fixture_config;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::NoTls;

const SCHEMA_SQL: &str = r#"
CREATE TABLE saved_queries (
    saved_query_id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    space_id INTEGER
);
CREATE TABLE saved_queries_versions (
    saved_queries_version_id SERIAL PRIMARY KEY,
    saved_query_id INTEGER NOT NULL REFERENCES saved_queries,
    explore_name TEXT NOT NULL,
    filters JSONB NOT NULL,
    chart_config JSONB,
    pivot_dimensions VARCHAR[]
);
CREATE TABLE saved_queries_version_fields (
    saved_queries_version_field_id SERIAL PRIMARY KEY,
    saved_queries_version_id INTEGER NOT NULL REFERENCES saved_queries_versions,
    name TEXT NOT NULL
);
CREATE TABLE saved_queries_version_table_calculations (
    saved_queries_version_table_calculation_id SERIAL PRIMARY KEY,
    saved_queries_version_id INTEGER NOT NULL REFERENCES saved_queries_versions,
    calculation_raw_sql TEXT NOT NULL
);
CREATE TABLE saved_queries_version_sorts (
    saved_queries_version_sort_id SERIAL PRIMARY KEY,
    saved_queries_version_id INTEGER NOT NULL REFERENCES saved_queries_versions,
    field_name TEXT NOT NULL
);
INSERT INTO saved_queries (name, space_id) VALUES ('Revenue by month', 1), ('Orders by status', 2);
INSERT INTO saved_queries_versions (saved_query_id, explore_name, filters, chart_config, pivot_dimensions) VALUES
    (1, 'orders', '{}', '{"type": "cartesian", "xField": "orders_amount"}', NULL),
    (1, 'orders', '{}', '{"type": "cartesian", "xField": "orders_amount"}', ARRAY['orders_status']),
    (2, 'orders', '{"fieldId": "orders_status"}', NULL, ARRAY[NULL, 'orders_status']);
INSERT INTO saved_queries_version_fields (saved_queries_version_id, name) VALUES
    (1, 'orders_amount'), (2, 'orders_amount'), (3, 'orders_status');
INSERT INTO saved_queries_version_table_calculations (saved_queries_version_id, calculation_raw_sql) VALUES
    (2, '${orders.amount} * 2');
INSERT INTO saved_queries_version_sorts (saved_queries_version_id, field_name) VALUES
    (2, 'orders_amount');
"#;

struct TestSchema {
    name: String,
    admin: deadpool_postgres::Pool,
    store: PgQueryStore,
}

impl TestSchema {
    async fn create() -> Self {
        let db = DbConfig::resolve(&ConnectionArgs {
            params_from_env: true,
            ..ConnectionArgs::default()
        })
        .expect("Invalid connection parameters");
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let name = format!("retable_test_{nanos}");

        let admin = db.create_pool().expect("Failed to create pool");
        let client = admin.get().await.expect("Failed to connect");
        client
            .batch_execute(&format!("CREATE SCHEMA {name}; SET search_path TO {name}; {SCHEMA_SQL}"))
            .await
            .expect("Failed to create fixture schema");
        drop(client);

        let mut cfg = Config::new();
        cfg.host = Some(db.host.clone());
        cfg.port = Some(db.port);
        cfg.dbname = Some(db.dbname.clone());
        cfg.user = Some(db.user.clone());
        cfg.password = Some(db.password.clone());
        cfg.options = Some(format!("-c search_path={name}"));
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(1));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .expect("Failed to create scoped pool");

        Self {
            name,
            admin,
            store: PgQueryStore::new(pool),
        }
    }

    async fn text(&self, sql: &str) -> String {
        let client = self.admin.get().await.expect("Failed to connect");
        client
            .query_one(&format!("SELECT ({sql})::TEXT FROM {}.saved_queries LIMIT 1", self.name), &[])
            .await
            .expect("Query failed")
            .get(0)
    }

    async fn drop_schema(self) {
        let client = self.admin.get().await.expect("Failed to connect");
        client
            .batch_execute(&format!("DROP SCHEMA {} CASCADE", self.name))
            .await
            .expect("Failed to drop schema");
    }
}

#[tokio::test]
async fn test_pg_run_rewrites_latest_versions() {
    let schema = TestSchema::create().await;
    let s = schema.name.clone();

    let report = Updater::new(&fixture_config(), &schema.store)
        .run(RunOptions::default())
        .await
        .expect("Run failed");
    assert_eq!(report.version_ids, vec![2, 3]);

    let fields = schema
        .text(&format!(
            "SELECT string_agg(name, ',' ORDER BY saved_queries_version_field_id) FROM {s}.saved_queries_version_fields"
        ))
        .await;
    assert_eq!(fields, "orders_amount,sales_total,sales_status");

    let calc = schema
        .text(&format!("SELECT calculation_raw_sql FROM {s}.saved_queries_version_table_calculations"))
        .await;
    assert_eq!(calc, "${sales.total} * 2");

    let chart = schema
        .text(&format!(
            "SELECT chart_config->>'xField' FROM {s}.saved_queries_versions WHERE saved_queries_version_id = 2"
        ))
        .await;
    assert_eq!(chart, "sales_total");

    let pivots = schema
        .text(&format!(
            "SELECT pivot_dimensions FROM {s}.saved_queries_versions WHERE saved_queries_version_id = 2"
        ))
        .await;
    assert_eq!(pivots, "{sales_status}");

    let sparse_pivots = schema
        .text(&format!(
            "SELECT pivot_dimensions FROM {s}.saved_queries_versions WHERE saved_queries_version_id = 3"
        ))
        .await;
    assert_eq!(sparse_pivots, "{NULL,sales_status}");

    let null_chart = schema
        .text(&format!(
            "SELECT coalesce(chart_config::TEXT, 'sql-null') FROM {s}.saved_queries_versions WHERE saved_queries_version_id = 3"
        ))
        .await;
    assert_eq!(null_chart, "sql-null");

    schema.drop_schema().await;
}

#[tokio::test]
async fn test_pg_failed_statement_rolls_back_batch() {
    let schema = TestSchema::create().await;
    let s = schema.name.clone();

    let mut tasks: Vec<RewriteTask> = ArtifactKind::ALL.iter().map(|k| RewriteTask::new(*k)).collect();
    tasks[0].push(1, RewriteValue::Text("changed".to_string()), true);
    tasks[2].push(1, RewriteValue::Text("changed".to_string()), true);
    tasks[4].push(2, RewriteValue::Json("{broken".to_string()), true);
    tasks[5].push(2, RewriteValue::Text("changed".to_string()), true);

    let result = schema.store.apply_rewrites(&tasks).await;
    assert!(result.is_err());

    let field = schema
        .text(&format!(
            "SELECT name FROM {s}.saved_queries_version_fields WHERE saved_queries_version_field_id = 1"
        ))
        .await;
    assert_eq!(field, "orders_amount");
    let sort = schema
        .text(&format!("SELECT field_name FROM {s}.saved_queries_version_sorts"))
        .await;
    assert_eq!(sort, "orders_amount");

    schema.drop_schema().await;
}

#[tokio::test]
async fn test_pg_single_query_filter() {
    let schema = TestSchema::create().await;

    let ids = schema
        .store
        .latest_version_ids(&IdFilter::from(vec![2]))
        .await
        .expect("Resolve failed");
    assert_eq!(ids, vec![3]);

    let summaries = schema.store.list_saved_queries().await.expect("List failed");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].name, "Revenue by month");

    schema.drop_schema().await;
}
