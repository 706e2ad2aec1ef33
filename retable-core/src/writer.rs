//! Batched writer: turns rewrite tasks into `UPDATE ... FROM (VALUES ...)`
//! statements.
//!
//! Statements are only built here. The store runs every statement of one
//! [`BatchWriter::plan`] inside a single transaction.

use crate::sql::{array_constructor, SqlParam, SqlStatement};
use crate::{RewriteTask, RewriteValue};

/// Postgres refuses statements with more than 65 535 bound parameters.
pub const POSTGRES_MAX_PARAMS: usize = 65_535;

/// Default per-statement parameter budget.
pub const DEFAULT_MAX_PARAMS: usize = 30_000;

/// Builds batched update statements.
#[derive(Debug, Clone, Copy)]
pub struct BatchWriter {
    max_params: usize,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self {
            max_params: DEFAULT_MAX_PARAMS,
        }
    }
}

impl BatchWriter {
    /// Writer with a custom parameter budget, clamped to what Postgres
    /// accepts. A single row is never split, so one statement may exceed a
    /// budget smaller than that row.
    pub fn with_max_params(max_params: usize) -> Self {
        Self {
            max_params: max_params.clamp(2, POSTGRES_MAX_PARAMS),
        }
    }

    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Statements for all `tasks`, in task order. Empty tasks contribute
    /// nothing.
    pub fn plan(&self, tasks: &[RewriteTask]) -> Vec<SqlStatement> {
        tasks.iter().flat_map(|task| self.statements(task)).collect()
    }

    /// Statements for one task, split so no statement exceeds the parameter
    /// budget.
    pub fn statements(&self, task: &RewriteTask) -> Vec<SqlStatement> {
        let mut statements = Vec::new();
        let mut current = SqlStatement::new("");
        let mut rows: Vec<String> = Vec::new();

        for (id, value) in task.entries() {
            let needed = 1 + params_for(value);
            if !rows.is_empty() && current.params.len() + needed > self.max_params {
                statements.push(finish(task, current, &rows));
                current = SqlStatement::new("");
                rows.clear();
            }
            rows.push(values_row(&mut current, id, value));
        }

        if !rows.is_empty() {
            statements.push(finish(task, current, &rows));
        }
        statements
    }
}

fn params_for(value: &RewriteValue) -> usize {
    match value {
        RewriteValue::Text(_) | RewriteValue::Json(_) => 1,
        RewriteValue::TextList(items) => items.iter().flatten().count(),
    }
}

/// Bind one `(id, value)` pair and render its `VALUES` tuple.
fn values_row(stmt: &mut SqlStatement, id: i64, value: &RewriteValue) -> String {
    let id_param = stmt.bind(SqlParam::BigInt(id));
    let value_sql = match value {
        RewriteValue::Text(text) | RewriteValue::Json(text) => {
            let p = stmt.bind(SqlParam::Text(text.clone()));
            format!("{p}::TEXT")
        }
        RewriteValue::TextList(items) => {
            let placeholders: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Some(item) => stmt.bind(SqlParam::Text(item.clone())),
                    None => "NULL".to_string(),
                })
                .collect();
            array_constructor(&placeholders, "TEXT")
        }
    };
    format!("({id_param}::BIGINT, {value_sql})")
}

fn finish(task: &RewriteTask, mut stmt: SqlStatement, rows: &[String]) -> SqlStatement {
    stmt.sql = format!(
        "UPDATE {table} AS t \
         SET {column} = v.value::{sql_type} \
         FROM (VALUES {values}) AS v (id, value) \
         WHERE t.{id_column} = v.id",
        table = task.table_name(),
        column = task.value_column(),
        sql_type = task.sql_type(),
        values = rows.join(", "),
        id_column = task.id_column(),
    );
    stmt
}
