//! retable storage - in-memory query store.
//!
//! [`MockQueryStore`] holds the five saved-query tables in memory and
//! implements [`QueryStore`] with the same semantics as the PostgreSQL store:
//! reads are scoped by [`IdFilter`], and a batch of rewrites is applied to a
//! private copy of the tables that only replaces the live copy once every task
//! succeeded.

use async_trait::async_trait;
use retable_core::{
    ArtifactKind, ArtifactRow, ArtifactValue, BatchWriter, IdFilter, QueryStore, RewriteTask,
    RewriteValue, SavedQuerySummary, StoreError, StoreResult,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

// ============================================================================
// TABLE RECORDS
// ============================================================================

/// Row of `saved_queries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedQueryRecord {
    pub name: String,
    pub space_id: Option<i64>,
}

/// Row of `saved_queries_versions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionRecord {
    pub saved_query_id: i64,
    pub chart_config: Option<serde_json::Value>,
    pub filters: Option<serde_json::Value>,
    pub explore_name: Option<String>,
    pub pivot_dimensions: Option<Vec<Option<String>>>,
}

impl VersionRecord {
    pub fn new(saved_query_id: i64) -> Self {
        Self {
            saved_query_id,
            ..Self::default()
        }
    }

    pub fn with_chart_config(mut self, chart_config: serde_json::Value) -> Self {
        self.chart_config = Some(chart_config);
        self
    }

    pub fn with_filters(mut self, filters: serde_json::Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_explore_name(mut self, explore_name: impl Into<String>) -> Self {
        self.explore_name = Some(explore_name.into());
        self
    }

    pub fn with_pivot_dimensions<S: Into<String>>(
        mut self,
        dimensions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.pivot_dimensions = Some(dimensions.into_iter().map(|d| Some(d.into())).collect());
        self
    }
}

/// Row of one of the per-version child tables (fields, calculations, sorts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub version_id: i64,
    pub value: Option<String>,
}

/// All saved-query tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedQueryTables {
    pub saved_queries: BTreeMap<i64, SavedQueryRecord>,
    pub versions: BTreeMap<i64, VersionRecord>,
    pub fields: BTreeMap<i64, ChildRecord>,
    pub calculations: BTreeMap<i64, ChildRecord>,
    pub sorts: BTreeMap<i64, ChildRecord>,
}

impl SavedQueryTables {
    fn children(&self, kind: ArtifactKind) -> Option<&BTreeMap<i64, ChildRecord>> {
        match kind {
            ArtifactKind::Fields => Some(&self.fields),
            ArtifactKind::Calculations => Some(&self.calculations),
            ArtifactKind::Sorts => Some(&self.sorts),
            _ => None,
        }
    }

    fn children_mut(&mut self, kind: ArtifactKind) -> Option<&mut BTreeMap<i64, ChildRecord>> {
        match kind {
            ArtifactKind::Fields => Some(&mut self.fields),
            ArtifactKind::Calculations => Some(&mut self.calculations),
            ArtifactKind::Sorts => Some(&mut self.sorts),
            _ => None,
        }
    }

    fn version_value(kind: ArtifactKind, version: &VersionRecord) -> ArtifactValue {
        let value = match kind {
            ArtifactKind::ChartConfig => version.chart_config.clone().map(ArtifactValue::Json),
            ArtifactKind::Filters => version.filters.clone().map(ArtifactValue::Json),
            ArtifactKind::ExploreName => version.explore_name.clone().map(ArtifactValue::Text),
            ArtifactKind::PivotDimensions => {
                version.pivot_dimensions.clone().map(ArtifactValue::TextList)
            }
            _ => None,
        };
        value.unwrap_or(ArtifactValue::Null)
    }

    fn apply_task(&mut self, task: &RewriteTask) -> StoreResult<()> {
        let kind = task.kind();
        for (id, value) in task.entries() {
            if let Some(children) = self.children_mut(kind) {
                // UPDATE of a missing key touches nothing.
                if let Some(record) = children.get_mut(&id) {
                    record.value = Some(expect_text(kind, value)?.to_string());
                }
                continue;
            }
            let Some(version) = self.versions.get_mut(&id) else {
                continue;
            };
            match kind {
                ArtifactKind::ChartConfig => version.chart_config = Some(parse_json(kind, value)?),
                ArtifactKind::Filters => version.filters = Some(parse_json(kind, value)?),
                ArtifactKind::ExploreName => {
                    version.explore_name = Some(expect_text(kind, value)?.to_string())
                }
                ArtifactKind::PivotDimensions => match value {
                    RewriteValue::TextList(items) => version.pivot_dimensions = Some(items.clone()),
                    _ => return Err(cast_error(kind, "VARCHAR[]")),
                },
                ArtifactKind::Fields | ArtifactKind::Calculations | ArtifactKind::Sorts => {}
            }
        }
        Ok(())
    }
}

fn expect_text(kind: ArtifactKind, value: &RewriteValue) -> StoreResult<&str> {
    match value {
        RewriteValue::Text(text) => Ok(text),
        _ => Err(cast_error(kind, "VARCHAR")),
    }
}

fn parse_json(kind: ArtifactKind, value: &RewriteValue) -> StoreResult<serde_json::Value> {
    match value {
        RewriteValue::Json(text) => serde_json::from_str(text).map_err(|e| StoreError::Query {
            context: format!("updating {kind}"),
            reason: format!("invalid input syntax for type json: {e}"),
        }),
        _ => Err(cast_error(kind, "JSONB")),
    }
}

fn cast_error(kind: ArtifactKind, sql_type: &str) -> StoreError {
    StoreError::Query {
        context: format!("updating {kind}"),
        reason: format!("value cannot be cast to {sql_type}"),
    }
}

// ============================================================================
// MOCK QUERY STORE
// ============================================================================

/// In-memory [`QueryStore`].
#[derive(Debug, Default)]
pub struct MockQueryStore {
    tables: RwLock<SavedQueryTables>,
    fail_on_task: Mutex<Option<usize>>,
    statements: Mutex<usize>,
    commits: Mutex<usize>,
}

impl MockQueryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `tables`.
    pub fn with_tables(tables: SavedQueryTables) -> Self {
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    pub fn insert_saved_query(&self, id: i64, name: impl Into<String>, space_id: Option<i64>) {
        self.write(|t| {
            t.saved_queries.insert(
                id,
                SavedQueryRecord {
                    name: name.into(),
                    space_id,
                },
            );
        });
    }

    pub fn insert_version(&self, version_id: i64, record: VersionRecord) {
        self.write(|t| {
            t.versions.insert(version_id, record);
        });
    }

    pub fn insert_field(&self, id: i64, version_id: i64, name: impl Into<String>) {
        self.insert_child(ArtifactKind::Fields, id, version_id, Some(name.into()));
    }

    pub fn insert_calculation(&self, id: i64, version_id: i64, sql: impl Into<String>) {
        self.insert_child(ArtifactKind::Calculations, id, version_id, Some(sql.into()));
    }

    pub fn insert_sort(&self, id: i64, version_id: i64, field_name: impl Into<String>) {
        self.insert_child(ArtifactKind::Sorts, id, version_id, Some(field_name.into()));
    }

    fn insert_child(&self, kind: ArtifactKind, id: i64, version_id: i64, value: Option<String>) {
        self.write(|t| {
            if let Some(children) = t.children_mut(kind) {
                children.insert(id, ChildRecord { version_id, value });
            }
        });
    }

    /// Make the `n`-th task (1-based) of the next batches fail, as if its
    /// statement raised an error.
    pub fn fail_on_task(&self, n: usize) {
        if let Ok(mut slot) = self.fail_on_task.lock() {
            *slot = Some(n);
        }
    }

    /// Copy of the current tables.
    pub fn snapshot(&self) -> SavedQueryTables {
        match self.tables.read() {
            Ok(tables) => tables.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of update statements the batches so far would have issued.
    pub fn statements_issued(&self) -> usize {
        self.statements.lock().map(|n| *n).unwrap_or_default()
    }

    /// Number of committed batches.
    pub fn commits(&self) -> usize {
        self.commits.lock().map(|n| *n).unwrap_or_default()
    }

    fn write(&self, f: impl FnOnce(&mut SavedQueryTables)) {
        match self.tables.write() {
            Ok(mut tables) => f(&mut tables),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn read_tables(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, SavedQueryTables>> {
        self.tables.read().map_err(|_| StoreError::Connection {
            reason: "mock store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl QueryStore for MockQueryStore {
    async fn list_saved_queries(&self) -> StoreResult<Vec<SavedQuerySummary>> {
        let tables = self.read_tables()?;
        Ok(tables
            .saved_queries
            .iter()
            .map(|(id, record)| SavedQuerySummary {
                saved_query_id: *id,
                name: record.name.clone(),
                space_id: record.space_id,
            })
            .collect())
    }

    async fn latest_version_ids(&self, query_ids: &IdFilter) -> StoreResult<Vec<i64>> {
        let tables = self.read_tables()?;
        let mut latest: BTreeMap<i64, i64> = BTreeMap::new();
        for (version_id, version) in &tables.versions {
            if !query_ids.is_empty() && !query_ids.matches(version.saved_query_id) {
                continue;
            }
            let entry = latest.entry(version.saved_query_id).or_insert(*version_id);
            *entry = (*entry).max(*version_id);
        }
        let mut ids: Vec<i64> = latest.into_values().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch_rows(
        &self,
        kind: ArtifactKind,
        versions: &IdFilter,
    ) -> StoreResult<Vec<ArtifactRow>> {
        let tables = self.read_tables()?;
        let rows = match tables.children(kind) {
            Some(children) => children
                .iter()
                .filter(|(_, record)| versions.matches(record.version_id))
                .map(|(id, record)| {
                    let value = match &record.value {
                        Some(text) => ArtifactValue::Text(text.clone()),
                        None => ArtifactValue::Null,
                    };
                    ArtifactRow::new(*id, value)
                })
                .collect(),
            None => tables
                .versions
                .iter()
                .filter(|(id, _)| versions.matches(**id))
                .map(|(id, version)| {
                    ArtifactRow::new(*id, SavedQueryTables::version_value(kind, version))
                })
                .collect(),
        };
        Ok(rows)
    }

    async fn apply_rewrites(&self, tasks: &[RewriteTask]) -> StoreResult<()> {
        let fail_on = self.fail_on_task.lock().map(|n| *n).unwrap_or_default();
        let writer = BatchWriter::default();

        let mut working = self.read_tables()?.clone();
        let mut issued = 0;
        for (index, task) in tasks.iter().enumerate() {
            if task.is_empty() {
                continue;
            }
            issued += writer.statements(task).len();
            if fail_on == Some(index + 1) {
                tracing::debug!(kind = %task.kind(), "Injected failure, rolling back");
                return Err(StoreError::Query {
                    context: format!("updating {}", task.kind()),
                    reason: "injected failure".to_string(),
                });
            }
            working.apply_task(task)?;
        }

        let mut tables = self.tables.write().map_err(|_| StoreError::Transaction {
            reason: "mock store lock poisoned".to_string(),
        })?;
        *tables = working;
        if let Ok(mut n) = self.statements.lock() {
            *n += issued;
        }
        if let Ok(mut n) = self.commits.lock() {
            *n += 1;
        }
        Ok(())
    }
}
