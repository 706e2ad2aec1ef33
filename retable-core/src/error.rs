//! Error types for retable operations

use crate::ArtifactKind;
use thiserror::Error;

/// Configuration errors. Raised while loading the rename payload, before any
/// database access happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Errors raised by the rewrite rules.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Unexpected value for {kind} row {id}: expected {expected}")]
    UnexpectedValue {
        kind: ArtifactKind,
        id: i64,
        expected: &'static str,
    },

    #[error("Failed to serialize {kind} row {id}: {source}")]
    Serialize {
        kind: ArtifactKind,
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

/// Query store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    #[error("Query failed while {context}: {reason}")]
    Query { context: String, reason: String },

    #[error("Transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Failed to decode {kind} row: {reason}")]
    Decode { kind: ArtifactKind, reason: String },
}

/// Master error type for all retable errors.
#[derive(Debug, Error)]
pub enum RetableError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rewrite error: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for retable operations.
pub type RetableResult<T> = Result<T, RetableError>;

// =============================================================================
// TESTS
// =============================================================================
