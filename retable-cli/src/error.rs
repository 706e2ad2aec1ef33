//! Error type for the retable binary.

use retable_core::{ConfigError, RetableError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Retable(#[from] RetableError),

    #[error("Invalid connection parameter {field}: {reason}")]
    InvalidConnection { field: &'static str, reason: String },

    #[error("Failed to create connection pool: {0}")]
    Pool(#[from] deadpool_postgres::CreatePoolError),

    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Aborted by user")]
    Aborted,
}

impl CliError {
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Retable(err.into())
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::Retable(err.into())
    }
}

pub type CliResult<T> = Result<T, CliError>;
