//! Rewrite rules, one per artifact kind.
//!
//! Every rule first replaces literal occurrences of the old table name with
//! the target table name, then applies its kind-specific field renames. Rows
//! whose source value is SQL `NULL` are left out of the task.

use crate::error::RewriteError;
use crate::naming::{NameMapping, NamingConfig};
use crate::{ArtifactKind, ArtifactRow, ArtifactValue, RewriteTask, RewriteValue};

/// Literal token stripped from calculation SQL: eight backslashes then `n`.
///
/// Left behind by repeated escaping upstream; stripped verbatim.
pub const ESCAPED_NEWLINE_ARTIFACT: &str = r"\\\\\\\\n";

/// Rewrite a fully qualified field id (`{table}_{field}`).
pub fn rewrite_field_name(naming: &NamingConfig, fields: &NameMapping, name: &str) -> String {
    let replaced = naming.replace_table(name);
    match fields.get(&replaced) {
        Some(mapped) => mapped.to_string(),
        None => replaced,
    }
}

/// Rewrite a free-text calculation expression.
pub fn rewrite_calculation(naming: &NamingConfig, calculations: &NameMapping, sql: &str) -> String {
    let replaced = naming.replace_table(sql);
    calculations
        .replace_all(&replaced)
        .replace(ESCAPED_NEWLINE_ARTIFACT, "")
}

/// Rewrite a chart config, returned as serialized JSON.
pub fn rewrite_chart_config(
    naming: &NamingConfig,
    fields: &NameMapping,
    serialized: &str,
) -> String {
    fields.replace_all(&naming.replace_table(serialized))
}

/// Rewrite serialized filters. Field renames are not applied here.
pub fn rewrite_filters(naming: &NamingConfig, serialized: &str) -> String {
    naming.replace_table(serialized)
}

/// Replace the explore name only when it is exactly the old table name.
pub fn rewrite_explore_name(naming: &NamingConfig, explore_name: &str) -> String {
    if explore_name == naming.old_table() {
        naming.target_table().to_string()
    } else {
        explore_name.to_string()
    }
}

/// Rewrite each pivot dimension as a field id. `NULL` elements stay `NULL`.
pub fn rewrite_pivot_dimensions(
    naming: &NamingConfig,
    fields: &NameMapping,
    dimensions: &[Option<String>],
) -> Vec<Option<String>> {
    dimensions
        .iter()
        .map(|d| d.as_deref().map(|d| rewrite_field_name(naming, fields, d)))
        .collect()
}

/// Run the rule for `kind` over `rows`.
pub fn apply_rule(
    kind: ArtifactKind,
    rows: &[ArtifactRow],
    naming: &NamingConfig,
) -> Result<RewriteTask, RewriteError> {
    let fields = naming.fields_mapping();
    let calculations = naming.calculations_mapping();
    let mut task = RewriteTask::new(kind);

    for row in rows {
        let id = row.id;
        match (kind, &row.value) {
            (_, ArtifactValue::Null) => continue,
            (ArtifactKind::Fields | ArtifactKind::Sorts, ArtifactValue::Text(name)) => {
                let new = rewrite_field_name(naming, &fields, name);
                let changed = new != *name;
                task.push(id, RewriteValue::Text(new), changed);
            }
            (ArtifactKind::Calculations, ArtifactValue::Text(sql)) => {
                let new = rewrite_calculation(naming, &calculations, sql);
                let changed = new != *sql;
                task.push(id, RewriteValue::Text(new), changed);
            }
            (ArtifactKind::ExploreName, ArtifactValue::Text(name)) => {
                let new = rewrite_explore_name(naming, name);
                let changed = new != *name;
                task.push(id, RewriteValue::Text(new), changed);
            }
            (ArtifactKind::ChartConfig, ArtifactValue::Json(value)) => {
                let serialized = serialize(kind, id, value)?;
                let new = rewrite_chart_config(naming, &fields, &serialized);
                let changed = new != serialized;
                task.push(id, RewriteValue::Json(new), changed);
            }
            (ArtifactKind::Filters, ArtifactValue::Json(value)) => {
                let serialized = serialize(kind, id, value)?;
                let new = rewrite_filters(naming, &serialized);
                let changed = new != serialized;
                task.push(id, RewriteValue::Json(new), changed);
            }
            (ArtifactKind::PivotDimensions, ArtifactValue::TextList(dimensions)) => {
                let new = rewrite_pivot_dimensions(naming, &fields, dimensions);
                let changed = new != *dimensions;
                task.push(id, RewriteValue::TextList(new), changed);
            }
            (kind, _) => {
                return Err(RewriteError::UnexpectedValue {
                    kind,
                    id,
                    expected: expected_shape(kind),
                })
            }
        }
    }

    Ok(task)
}

fn serialize(
    kind: ArtifactKind,
    id: i64,
    value: &serde_json::Value,
) -> Result<String, RewriteError> {
    serde_json::to_string(value).map_err(|source| RewriteError::Serialize { kind, id, source })
}

fn expected_shape(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Fields
        | ArtifactKind::Calculations
        | ArtifactKind::Sorts
        | ArtifactKind::ExploreName => "text",
        ArtifactKind::ChartConfig | ArtifactKind::Filters => "json",
        ArtifactKind::PivotDimensions => "text list",
    }
}
