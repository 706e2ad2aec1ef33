//! retable core - table-rename propagation for saved analytics queries.
//!
//! Saved queries embed the name of the table they were built on in several
//! places: field ids, calculation SQL, sort specs, chart configs, filters,
//! the explore name and pivot dimensions. This crate holds the engine that
//! rewrites all of them consistently:
//!
//! - [`NamingConfig`] / [`RenameConfig`]: what to rename, loaded from YAML
//! - [`IdFilter`]: id scoping and the `WHERE` predicates built from it
//! - [`rules`]: one rewrite rule per [`ArtifactKind`]
//! - [`BatchWriter`]: parameterized `UPDATE ... FROM (VALUES ...)` statements
//! - [`QueryStore`]: the database seam
//! - [`Updater`]: the pipeline tying them together
//!
//! The core never opens a connection; drivers live behind [`QueryStore`].

pub mod artifact;
pub mod config;
pub mod error;
pub mod filter;
pub mod naming;
pub mod reader;
pub mod rules;
pub mod sql;
pub mod store;
pub mod task;
pub mod updater;
pub mod writer;

pub use artifact::{ArtifactKind, ArtifactRow, ArtifactValue, SavedQuerySummary, SqlType};
pub use config::{RawConfig, RenameConfig};
pub use error::{ConfigError, RetableError, RetableResult, RewriteError, StoreError};
pub use filter::{IdFilter, IdPredicate, NO_MATCH_SENTINEL};
pub use naming::{FieldRename, NameMapping, NamingConfig};
pub use rules::apply_rule;
pub use sql::{SqlParam, SqlStatement};
pub use store::{QueryStore, StoreResult};
pub use task::{RewriteTask, RewriteValue};
pub use updater::{KindReport, MigrationReport, RunOptions, Updater};
pub use writer::BatchWriter;
