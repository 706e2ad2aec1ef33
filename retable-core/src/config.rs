//! Rename configuration: loading and normalization.
//!
//! The YAML payload is deserialized into [`RawConfig`] and normalized exactly
//! once into a [`RenameConfig`]. Null or missing collections become empty
//! collections during normalization.

use crate::error::ConfigError;
use crate::naming::{FieldRename, NamingConfig};
use crate::IdFilter;
use serde::Deserialize;
use serde_yaml::{Mapping, Value as YamlValue};
use std::path::Path;

/// Rename payload as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub old_table: Option<String>,
    #[serde(default)]
    pub new_table: Option<String>,
    #[serde(default, alias = "fields_raw_mapping")]
    pub field_rename: Option<Mapping>,
    #[serde(default)]
    pub query_ids: Option<Vec<i64>>,
}

/// Normalized rename configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConfig {
    pub naming: NamingConfig,
    /// Saved queries to migrate. Empty means all of them.
    pub query_ids: IdFilter,
}

impl RenameConfig {
    pub fn new(naming: NamingConfig, query_ids: IdFilter) -> Self {
        Self { naming, query_ids }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(contents)?;
        Self::normalize(raw)
    }

    pub fn normalize(raw: RawConfig) -> Result<Self, ConfigError> {
        let old_table = raw.old_table.ok_or_else(|| ConfigError::MissingRequired {
            field: "old_table".to_string(),
        })?;
        let old_table = old_table.trim().to_string();
        if old_table.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "old_table".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let new_table = raw
            .new_table
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut field_rename = FieldRename::new();
        for (key, value) in raw.field_rename.unwrap_or_default() {
            let key = scalar_text(&key, "field_rename key")?;
            let value = scalar_text(&value, "field_rename value")?;
            if key.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "field_rename".to_string(),
                    reason: "keys must not be empty".to_string(),
                });
            }
            field_rename.insert(key, value);
        }

        let query_ids: IdFilter = raw.query_ids.unwrap_or_default().into();

        Ok(Self {
            naming: NamingConfig::new(old_table, new_table, field_rename),
            query_ids,
        })
    }
}

fn scalar_text(value: &YamlValue, field: &str) -> Result<String, ConfigError> {
    match value {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a scalar, got {other:?}"),
        }),
    }
}
