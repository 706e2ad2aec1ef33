//! retable test utilities
//!
//! Centralized test infrastructure for the retable workspace:
//! - Proptest generators for naming configs and artifact rows
//! - A seeded saved-query fixture on top of the in-memory store

pub use retable_storage::{MockQueryStore, SavedQueryTables, VersionRecord};

use proptest::prelude::*;
use retable_core::{ArtifactRow, FieldRename, IdFilter, NamingConfig, RenameConfig};
use serde_json::json;

// ============================================================================
// GENERATORS
// ============================================================================

/// Strategy for table-like identifiers.
pub fn arb_table_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,10}"
}

/// Strategy for field suffixes.
pub fn arb_field_suffix() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}"
}

/// Strategy for an ordered field-rename mapping.
pub fn arb_field_rename() -> impl Strategy<Value = FieldRename> {
    prop::collection::vec((arb_field_suffix(), arb_field_suffix()), 0..5)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for naming configs, with and without a new table name.
pub fn arb_naming_config() -> impl Strategy<Value = NamingConfig> {
    (
        arb_table_name(),
        proptest::option::of(arb_table_name()),
        arb_field_rename(),
    )
        .prop_map(|(old, new, rename)| NamingConfig::new(old, new, rename))
}

/// Strategy for field-id rows qualified by `table`.
pub fn arb_field_rows(table: String) -> impl Strategy<Value = Vec<ArtifactRow>> {
    prop::collection::vec(arb_field_suffix(), 0..10).prop_map(move |suffixes| {
        suffixes
            .into_iter()
            .enumerate()
            .map(|(i, s)| ArtifactRow::text(i as i64 + 1, format!("{table}_{s}")))
            .collect()
    })
}

// ============================================================================
// FIXTURES
// ============================================================================

/// `orders` -> `sales`, with `amount` renamed to `total`.
pub fn fixture_config() -> RenameConfig {
    fixture_config_for(IdFilter::new())
}

/// [`fixture_config`] restricted to `query_ids`.
pub fn fixture_config_for(query_ids: IdFilter) -> RenameConfig {
    let rename: FieldRename = [("amount", "total")].into_iter().collect();
    RenameConfig::new(
        NamingConfig::new("orders", Some("sales".to_string()), rename),
        query_ids,
    )
}

pub const REVENUE_QUERY: i64 = 1;
pub const STATUS_QUERY: i64 = 2;
pub const CUSTOMERS_QUERY: i64 = 3;

/// Superseded version of [`REVENUE_QUERY`]; never rewritten.
pub const REVENUE_OLD_VERSION: i64 = 10;
pub const REVENUE_VERSION: i64 = 11;
pub const STATUS_VERSION: i64 = 20;
pub const CUSTOMERS_VERSION: i64 = 30;

/// Three saved queries: two built on `orders`, one on `customers`.
pub fn fixture_store() -> MockQueryStore {
    let store = MockQueryStore::new();
    store.insert_saved_query(REVENUE_QUERY, "Revenue by month", Some(1));
    store.insert_saved_query(STATUS_QUERY, "Orders by status", Some(2));
    store.insert_saved_query(CUSTOMERS_QUERY, "Customer list", None);

    let revenue_chart = json!({
        "type": "cartesian",
        "config": {"layout": {"xField": "orders_created_month", "yField": ["orders_amount"]}}
    });
    let status_filters = json!({
        "dimensions": {
            "id": "f1",
            "and": [{
                "target": {"fieldId": "orders_status"},
                "operator": "equals",
                "values": ["complete"]
            }]
        }
    });

    store.insert_version(
        REVENUE_OLD_VERSION,
        VersionRecord::new(REVENUE_QUERY)
            .with_explore_name("orders")
            .with_chart_config(revenue_chart.clone())
            .with_filters(json!({})),
    );
    store.insert_version(
        REVENUE_VERSION,
        VersionRecord::new(REVENUE_QUERY)
            .with_explore_name("orders")
            .with_chart_config(revenue_chart)
            .with_filters(json!({}))
            .with_pivot_dimensions(["orders_status"]),
    );
    store.insert_version(
        STATUS_VERSION,
        VersionRecord::new(STATUS_QUERY)
            .with_explore_name("orders")
            .with_chart_config(json!({"type": "table"}))
            .with_filters(status_filters),
    );
    store.insert_version(
        CUSTOMERS_VERSION,
        VersionRecord::new(CUSTOMERS_QUERY)
            .with_explore_name("customers")
            .with_chart_config(json!({"type": "table"}))
            .with_filters(json!({})),
    );

    store.insert_field(1, REVENUE_VERSION, "orders_created_month");
    store.insert_field(2, REVENUE_VERSION, "orders_amount");
    store.insert_field(3, REVENUE_OLD_VERSION, "orders_amount");
    store.insert_field(4, STATUS_VERSION, "orders_status");
    store.insert_field(5, CUSTOMERS_VERSION, "customers_id");

    store.insert_calculation(1, REVENUE_VERSION, "${orders.amount} / 100");
    store.insert_calculation(2, STATUS_VERSION, "count(${orders.status})");
    store.insert_calculation(3, REVENUE_OLD_VERSION, "${orders.amount}");

    store.insert_sort(1, REVENUE_VERSION, "orders_amount");
    store.insert_sort(2, STATUS_VERSION, "orders_status");

    store
}
