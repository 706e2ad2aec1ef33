//! Query store trait.
//!
//! The seam between the rename engine and the database holding the saved
//! queries. `retable-cli` implements it over PostgreSQL; `retable-storage`
//! provides an in-memory implementation for tests.

use crate::error::StoreError;
use crate::{ArtifactKind, ArtifactRow, IdFilter, RewriteTask, SavedQuerySummary};
use async_trait::async_trait;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Reads and writes the saved-query artifact tables.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Every saved query, ordered by id.
    async fn list_saved_queries(&self) -> StoreResult<Vec<SavedQuerySummary>>;

    /// Latest version id of each saved query in `query_ids`, ascending.
    /// An empty filter selects every saved query.
    async fn latest_version_ids(&self, query_ids: &IdFilter) -> StoreResult<Vec<i64>>;

    /// Rows of `kind` belonging to `versions`, ordered by id. An empty
    /// filter reads nothing.
    async fn fetch_rows(
        &self,
        kind: ArtifactKind,
        versions: &IdFilter,
    ) -> StoreResult<Vec<ArtifactRow>>;

    /// Apply every task in one transaction. Either all of them persist, or
    /// none do and the error is returned.
    async fn apply_rewrites(&self, tasks: &[RewriteTask]) -> StoreResult<()>;
}
