//! PostgreSQL connection provisioning and the PostgreSQL query store.
//!
//! SQL text comes from the statement builders in `retable_core`; this module
//! only binds parameters, runs statements and decodes rows.

use crate::cli::ConnectionArgs;
use crate::error::{CliError, CliResult};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use retable_core::reader::{artifact_rows_statement, latest_versions_statement, saved_queries_statement};
use retable_core::{
    ArtifactKind, ArtifactRow, ArtifactValue, BatchWriter, IdFilter, QueryStore, RewriteTask,
    SavedQuerySummary, SqlParam, SqlStatement, SqlType, StoreError, StoreResult,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION CONFIGURATION
// ============================================================================

/// Database connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
        }
    }
}

impl DbConfig {
    /// Resolve parameters from explicit flags, then `PG_*` variables when
    /// `args.params_from_env` is set, then defaults.
    pub fn resolve(args: &ConnectionArgs) -> CliResult<Self> {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// [`DbConfig::resolve`] with an injectable environment lookup.
    pub fn resolve_with(
        args: &ConnectionArgs,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CliResult<Self> {
        let defaults = Self::default();
        let env = |key: &str| {
            if args.params_from_env {
                lookup(key)
            } else {
                None
            }
        };

        let port = match args.port {
            Some(port) => port,
            None => match env("PG_PORT") {
                Some(raw) => raw.trim().parse().map_err(|_| CliError::InvalidConnection {
                    field: "PG_PORT",
                    reason: format!("not a port number: {raw}"),
                })?,
                None => defaults.port,
            },
        };

        Ok(Self {
            host: args.host.clone().or_else(|| env("PG_HOST")).unwrap_or(defaults.host),
            port,
            dbname: args
                .dbname
                .clone()
                .or_else(|| env("PG_DATABASE"))
                .unwrap_or(defaults.dbname),
            user: args.user.clone().or_else(|| env("PG_USER")).unwrap_or(defaults.user),
            password: args
                .password
                .clone()
                .or_else(|| env("PG_PASSWORD"))
                .unwrap_or(defaults.password),
        })
    }

    /// Create a single-connection pool from this configuration.
    pub fn create_pool(&self) -> CliResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(1));

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        Ok(pool)
    }
}

// ============================================================================
// POSTGRES QUERY STORE
// ============================================================================

/// [`QueryStore`] backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgQueryStore {
    pool: Pool,
    writer: BatchWriter,
}

impl PgQueryStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            writer: BatchWriter::default(),
        }
    }

    pub fn from_config(config: &DbConfig) -> CliResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Open the connection now so connectivity problems surface before any
    /// work starts.
    pub async fn connect(&self) -> StoreResult<()> {
        self.get_conn().await.map(|_| ())
    }

    async fn get_conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| StoreError::Connection {
            reason: e.to_string(),
        })
    }

    async fn query(&self, stmt: &SqlStatement, context: &str) -> StoreResult<Vec<Row>> {
        let conn = self.get_conn().await?;
        let params = bind_params(&stmt.params);
        conn.query(stmt.sql.as_str(), &params)
            .await
            .map_err(|e| query_error(context, e))
    }
}

fn bind_params(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| match p {
            SqlParam::BigInt(v) => v as &(dyn ToSql + Sync),
            SqlParam::BigIntArray(v) => v as &(dyn ToSql + Sync),
            SqlParam::Text(v) => v as &(dyn ToSql + Sync),
        })
        .collect()
}

fn query_error(context: &str, err: tokio_postgres::Error) -> StoreError {
    let reason = match err.as_db_error() {
        Some(db) => format!("{} ({})", db.message(), db.code().code()),
        None => err.to_string(),
    };
    StoreError::Query {
        context: context.to_string(),
        reason,
    }
}

fn decode_error(kind: ArtifactKind, err: tokio_postgres::Error) -> StoreError {
    StoreError::Decode {
        kind,
        reason: err.to_string(),
    }
}

fn decode_artifact_row(kind: ArtifactKind, row: &Row) -> StoreResult<ArtifactRow> {
    let id: i64 = row.try_get(0).map_err(|e| decode_error(kind, e))?;
    let value = match kind.sql_type() {
        SqlType::Varchar => row
            .try_get::<_, Option<String>>(1)
            .map_err(|e| decode_error(kind, e))?
            .map(ArtifactValue::Text),
        SqlType::Jsonb => row
            .try_get::<_, Option<serde_json::Value>>(1)
            .map_err(|e| decode_error(kind, e))?
            .map(ArtifactValue::Json),
        SqlType::VarcharArray => row
            .try_get::<_, Option<Vec<Option<String>>>>(1)
            .map_err(|e| decode_error(kind, e))?
            .map(ArtifactValue::TextList),
    };
    Ok(ArtifactRow::new(id, value.unwrap_or(ArtifactValue::Null)))
}

#[async_trait]
impl QueryStore for PgQueryStore {
    async fn list_saved_queries(&self) -> StoreResult<Vec<SavedQuerySummary>> {
        let rows = self
            .query(&saved_queries_statement(), "listing saved queries")
            .await?;
        rows.iter()
            .map(|row| {
                let decode = |e: tokio_postgres::Error| StoreError::Query {
                    context: "decoding saved queries".to_string(),
                    reason: e.to_string(),
                };
                Ok(SavedQuerySummary {
                    saved_query_id: row.try_get(0).map_err(decode)?,
                    name: row
                        .try_get::<_, Option<String>>(1)
                        .map_err(decode)?
                        .unwrap_or_default(),
                    space_id: row.try_get(2).map_err(decode)?,
                })
            })
            .collect()
    }

    async fn latest_version_ids(&self, query_ids: &IdFilter) -> StoreResult<Vec<i64>> {
        let stmt = latest_versions_statement(query_ids);
        let rows = self.query(&stmt, "resolving latest versions").await?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, i64>(1).map_err(|e| StoreError::Query {
                    context: "decoding version ids".to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn fetch_rows(
        &self,
        kind: ArtifactKind,
        versions: &IdFilter,
    ) -> StoreResult<Vec<ArtifactRow>> {
        let stmt = artifact_rows_statement(kind, versions);
        let context = format!("reading {kind}");
        let rows = self.query(&stmt, &context).await?;
        rows.iter().map(|row| decode_artifact_row(kind, row)).collect()
    }

    async fn apply_rewrites(&self, tasks: &[RewriteTask]) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(|e| StoreError::Transaction {
            reason: e.to_string(),
        })?;

        for task in tasks {
            if task.is_empty() {
                tracing::debug!(kind = %task.kind(), "No rows to update");
                continue;
            }
            let context = format!("updating {}", task.kind());
            for stmt in self.writer.statements(task) {
                let params = bind_params(&stmt.params);
                let updated = tx
                    .execute(stmt.sql.as_str(), &params)
                    .await
                    .map_err(|e| query_error(&context, e))?;
                tracing::debug!(kind = %task.kind(), updated, "Executed batched update");
            }
        }

        // Dropping `tx` on an error path above rolls the whole batch back.
        tx.commit().await.map_err(|e| StoreError::Transaction {
            reason: e.to_string(),
        })
    }
}
