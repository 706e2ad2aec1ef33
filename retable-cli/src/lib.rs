//! retable command line interface.
//!
//! `retable list-ids` prints the saved queries; `retable update <config>`
//! runs the rename pipeline from `retable_core` against PostgreSQL.

pub mod app;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod output;
pub mod telemetry;

pub use db::{DbConfig, PgQueryStore};
pub use error::{CliError, CliResult};
