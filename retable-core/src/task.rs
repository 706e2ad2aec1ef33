//! Rewrite tasks handed from the rules to the batched writer.

use crate::{ArtifactKind, SqlType};

/// New value for one artifact row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteValue {
    Text(String),
    /// Serialized JSON document, cast to `JSONB` on write.
    Json(String),
    TextList(Vec<Option<String>>),
}

/// Positionally aligned ids and new values for a single artifact kind.
///
/// Values are pushed together with their id, so `ids` and `new_values` always
/// have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTask {
    kind: ArtifactKind,
    ids: Vec<i64>,
    new_values: Vec<RewriteValue>,
    changed: usize,
}

impl RewriteTask {
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            ids: Vec::new(),
            new_values: Vec::new(),
            changed: 0,
        }
    }

    /// Record the new value for row `id`. `changed` marks whether it differs
    /// from what the row currently holds.
    pub fn push(&mut self, id: i64, value: RewriteValue, changed: bool) {
        self.ids.push(id);
        self.new_values.push(value);
        if changed {
            self.changed += 1;
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn new_values(&self) -> &[RewriteValue] {
        &self.new_values
    }

    pub fn table_name(&self) -> &'static str {
        self.kind.table_name()
    }

    pub fn id_column(&self) -> &'static str {
        self.kind.id_column()
    }

    pub fn value_column(&self) -> &'static str {
        self.kind.value_column()
    }

    pub fn sql_type(&self) -> SqlType {
        self.kind.sql_type()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of rows whose new value differs from the current one.
    pub fn changed(&self) -> usize {
        self.changed
    }

    pub fn entries(&self) -> impl Iterator<Item = (i64, &RewriteValue)> {
        self.ids.iter().copied().zip(self.new_values.iter())
    }
}
