//! The rename pipeline.
//!
//! Version resolution, then the reads for every artifact kind, then the
//! rules, then one batched write. No write starts before every read is done.

use crate::error::RetableResult;
use crate::rules::apply_rule;
use crate::store::QueryStore;
use crate::{ArtifactKind, IdFilter, RenameConfig, RewriteTask};
use serde::Serialize;

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute every rewrite but leave the store untouched.
    pub dry_run: bool,
}

/// Outcome for one artifact kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: ArtifactKind,
    pub rows_read: usize,
    pub rows_written: usize,
    pub rows_changed: usize,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub old_table: String,
    pub target_table: String,
    pub version_ids: Vec<i64>,
    pub kinds: Vec<KindReport>,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn rows_written(&self) -> usize {
        self.kinds.iter().map(|k| k.rows_written).sum()
    }

    pub fn rows_changed(&self) -> usize {
        self.kinds.iter().map(|k| k.rows_changed).sum()
    }
}

/// Runs a [`RenameConfig`] against a [`QueryStore`].
pub struct Updater<'a, S: QueryStore + ?Sized> {
    config: &'a RenameConfig,
    store: &'a S,
}

impl<'a, S: QueryStore + ?Sized> Updater<'a, S> {
    pub fn new(config: &'a RenameConfig, store: &'a S) -> Self {
        Self { config, store }
    }

    /// Latest version id of every saved query in scope.
    pub async fn resolve_versions(&self) -> RetableResult<IdFilter> {
        let ids = self.store.latest_version_ids(&self.config.query_ids).await?;
        tracing::info!(
            requested = self.config.query_ids.len(),
            resolved = ids.len(),
            "Resolved latest saved query versions"
        );
        Ok(ids.into())
    }

    /// Read and rewrite every artifact kind. Returns one task per kind,
    /// possibly empty, along with the number of rows read for it.
    pub async fn plan(&self, versions: &IdFilter) -> RetableResult<Vec<(RewriteTask, usize)>> {
        let naming = &self.config.naming;
        let mut fetched = Vec::with_capacity(ArtifactKind::ALL.len());
        for kind in ArtifactKind::ALL {
            let rows = self.store.fetch_rows(kind, versions).await?;
            tracing::debug!(kind = %kind, rows = rows.len(), "Fetched artifact rows");
            fetched.push((kind, rows));
        }

        let mut planned = Vec::with_capacity(fetched.len());
        for (kind, rows) in fetched {
            let task = apply_rule(kind, &rows, naming)?;
            tracing::debug!(
                kind = %kind,
                rewrites = task.len(),
                changed = task.changed(),
                "Computed rewrites"
            );
            planned.push((task, rows.len()));
        }
        Ok(planned)
    }

    /// Run the whole pipeline.
    pub async fn run(&self, options: RunOptions) -> RetableResult<MigrationReport> {
        let naming = &self.config.naming;
        tracing::info!(
            old_table = naming.old_table(),
            target_table = naming.target_table(),
            field_renames = naming.field_rename().len(),
            dry_run = options.dry_run,
            "Starting table rename"
        );

        let versions = self.resolve_versions().await?;
        let planned = self.plan(&versions).await?;

        let kinds: Vec<KindReport> = planned
            .iter()
            .map(|(task, rows_read)| KindReport {
                kind: task.kind(),
                rows_read: *rows_read,
                rows_written: if options.dry_run { 0 } else { task.len() },
                rows_changed: task.changed(),
            })
            .collect();
        let tasks: Vec<RewriteTask> = planned.into_iter().map(|(task, _)| task).collect();

        if options.dry_run {
            tracing::info!("Dry run, nothing written");
        } else {
            self.store.apply_rewrites(&tasks).await?;
            tracing::info!(
                rows = tasks.iter().map(RewriteTask::len).sum::<usize>(),
                "Committed rewrites"
            );
        }

        Ok(MigrationReport {
            old_table: naming.old_table().to_string(),
            target_table: naming.target_table().to_string(),
            version_ids: versions.to_vec(),
            kinds,
            dry_run: options.dry_run,
        })
    }
}
