//! Saved-query artifact kinds and the rows read for them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Table holding one row per saved-query version.
pub const VERSIONS_TABLE: &str = "saved_queries_versions";
/// Primary key of [`VERSIONS_TABLE`].
pub const VERSION_ID_COLUMN: &str = "saved_queries_version_id";

/// Column type a rewritten value is cast to on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Varchar,
    Jsonb,
    VarcharArray,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Varchar => "VARCHAR",
            SqlType::Jsonb => "JSONB",
            SqlType::VarcharArray => "VARCHAR[]",
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, SqlType::VarcharArray)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One of the seven saved-query sub-structures a table rename touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Fields,
    Calculations,
    Sorts,
    ChartConfig,
    Filters,
    ExploreName,
    PivotDimensions,
}

impl ArtifactKind {
    /// Every kind, in the order the pipeline processes them.
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::Fields,
        ArtifactKind::Calculations,
        ArtifactKind::Sorts,
        ArtifactKind::ChartConfig,
        ArtifactKind::Filters,
        ArtifactKind::ExploreName,
        ArtifactKind::PivotDimensions,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            ArtifactKind::Fields => "saved_queries_version_fields",
            ArtifactKind::Calculations => "saved_queries_version_table_calculations",
            ArtifactKind::Sorts => "saved_queries_version_sorts",
            ArtifactKind::ChartConfig
            | ArtifactKind::Filters
            | ArtifactKind::ExploreName
            | ArtifactKind::PivotDimensions => VERSIONS_TABLE,
        }
    }

    /// Primary key of [`ArtifactKind::table_name`].
    pub fn id_column(self) -> &'static str {
        match self {
            ArtifactKind::Fields => "saved_queries_version_field_id",
            ArtifactKind::Calculations => "saved_queries_version_table_calculation_id",
            ArtifactKind::Sorts => "saved_queries_version_sort_id",
            ArtifactKind::ChartConfig
            | ArtifactKind::Filters
            | ArtifactKind::ExploreName
            | ArtifactKind::PivotDimensions => VERSION_ID_COLUMN,
        }
    }

    pub fn value_column(self) -> &'static str {
        match self {
            ArtifactKind::Fields => "name",
            ArtifactKind::Calculations => "calculation_raw_sql",
            ArtifactKind::Sorts => "field_name",
            ArtifactKind::ChartConfig => "chart_config",
            ArtifactKind::Filters => "filters",
            ArtifactKind::ExploreName => "explore_name",
            ArtifactKind::PivotDimensions => "pivot_dimensions",
        }
    }

    pub fn sql_type(self) -> SqlType {
        match self {
            ArtifactKind::Fields
            | ArtifactKind::Calculations
            | ArtifactKind::Sorts
            | ArtifactKind::ExploreName => SqlType::Varchar,
            ArtifactKind::ChartConfig | ArtifactKind::Filters => SqlType::Jsonb,
            ArtifactKind::PivotDimensions => SqlType::VarcharArray,
        }
    }

    /// Label used in logs and reports.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Fields => "fields",
            ArtifactKind::Calculations => "calculations",
            ArtifactKind::Sorts => "sorts",
            ArtifactKind::ChartConfig => "chart_config",
            ArtifactKind::Filters => "filters",
            ArtifactKind::ExploreName => "explore_name",
            ArtifactKind::PivotDimensions => "pivot_dimensions",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current value of an artifact column, as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactValue {
    Null,
    Text(String),
    Json(serde_json::Value),
    /// `NULL` array elements are kept as `None`.
    TextList(Vec<Option<String>>),
}

/// `(primary key, current value)` of one artifact row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRow {
    pub id: i64,
    pub value: ArtifactValue,
}

impl ArtifactRow {
    pub fn new(id: i64, value: ArtifactValue) -> Self {
        Self { id, value }
    }

    pub fn text(id: i64, value: impl Into<String>) -> Self {
        Self::new(id, ArtifactValue::Text(value.into()))
    }

    pub fn json(id: i64, value: serde_json::Value) -> Self {
        Self::new(id, ArtifactValue::Json(value))
    }

    pub fn text_list<S: Into<String>>(id: i64, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            id,
            ArtifactValue::TextList(values.into_iter().map(|v| Some(v.into())).collect()),
        )
    }

    pub fn null(id: i64) -> Self {
        Self::new(id, ArtifactValue::Null)
    }
}

/// One line of the "list ids" report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuerySummary {
    pub saved_query_id: i64,
    pub name: String,
    pub space_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_kinds_share_versions_table() {
        for kind in [
            ArtifactKind::ChartConfig,
            ArtifactKind::Filters,
            ArtifactKind::ExploreName,
            ArtifactKind::PivotDimensions,
        ] {
            assert_eq!(kind.table_name(), VERSIONS_TABLE);
            assert_eq!(kind.id_column(), VERSION_ID_COLUMN);
        }
    }

    #[test]
    fn test_table_column_pairs_are_distinct() {
        let mut pairs: Vec<_> = ArtifactKind::ALL
            .iter()
            .map(|k| (k.table_name(), k.value_column()))
            .collect();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), ArtifactKind::ALL.len());
    }

    #[test]
    fn test_only_pivot_dimensions_is_array_typed() {
        let arrays: Vec<_> = ArtifactKind::ALL
            .iter()
            .filter(|k| k.sql_type().is_array())
            .collect();
        assert_eq!(arrays, vec![&ArtifactKind::PivotDimensions]);
    }

    #[test]
    fn test_sql_type_renders_as_cast_target() {
        assert_eq!(SqlType::Varchar.to_string(), "VARCHAR");
        assert_eq!(ArtifactKind::Filters.sql_type().to_string(), "JSONB");
        assert_eq!(format!("::{}", SqlType::VarcharArray), "::VARCHAR[]");
    }
}
