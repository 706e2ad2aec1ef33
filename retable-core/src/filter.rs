//! Id filters and the `WHERE` predicates built from them.

use crate::sql::{SqlParam, SqlStatement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Id that no serial primary key ever takes. An empty filter compares
/// against it so the predicate stays valid SQL while matching nothing.
pub const NO_MATCH_SENTINEL: i64 = -42;

/// Shape of the predicate an [`IdFilter`] compiles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdPredicate {
    /// Matches no real row.
    Never,
    /// `= id`
    Eq(i64),
    /// `= ANY(ids)`
    In(Vec<i64>),
}

/// A sorted, de-duplicated set of integer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdFilter {
    ids: BTreeSet<i64>,
}

impl IdFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.iter().collect()
    }

    pub fn predicate(&self) -> IdPredicate {
        let mut ids = self.ids.iter();
        match (ids.next(), ids.next()) {
            (None, _) => IdPredicate::Never,
            (Some(id), None) => IdPredicate::Eq(*id),
            _ => IdPredicate::In(self.to_vec()),
        }
    }

    /// Whether `id` satisfies the compiled predicate.
    pub fn matches(&self, id: i64) -> bool {
        match self.predicate() {
            IdPredicate::Never => id == NO_MATCH_SENTINEL,
            IdPredicate::Eq(only) => id == only,
            IdPredicate::In(_) => self.ids.contains(&id),
        }
    }

    /// Render the right-hand side of a `WHERE column ...` clause, binding
    /// the ids into `stmt`.
    pub fn where_clause(&self, stmt: &mut SqlStatement) -> String {
        match self.predicate() {
            IdPredicate::Never => format!("= {NO_MATCH_SENTINEL}"),
            IdPredicate::Eq(id) => {
                let p = stmt.bind(SqlParam::BigInt(id));
                format!("= {p}::BIGINT")
            }
            IdPredicate::In(ids) => {
                let p = stmt.bind(SqlParam::BigIntArray(ids));
                format!("= ANY({p}::BIGINT[])")
            }
        }
    }
}

impl FromIterator<i64> for IdFilter {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<i64>> for IdFilter {
    fn from(ids: Vec<i64>) -> Self {
        ids.into_iter().collect()
    }
}
