//! Read statements: saved-query listing, version resolution and per-kind
//! artifact reads.

use crate::artifact::{VERSIONS_TABLE, VERSION_ID_COLUMN};
use crate::sql::SqlStatement;
use crate::{ArtifactKind, IdFilter, SqlType};

/// `saved_query_id, name, space_id` for every saved query.
pub fn saved_queries_statement() -> SqlStatement {
    SqlStatement::new(
        "SELECT saved_query_id::BIGINT, name::TEXT, space_id::BIGINT \
         FROM saved_queries \
         ORDER BY saved_query_id",
    )
}

/// Latest version id per saved query.
///
/// An empty `query_ids` set means every saved query: the statement then has
/// no `WHERE` clause at all.
pub fn latest_versions_statement(query_ids: &IdFilter) -> SqlStatement {
    let mut stmt = SqlStatement::new("");
    let where_sql = if query_ids.is_empty() {
        String::new()
    } else {
        format!(" WHERE saved_query_id {}", query_ids.where_clause(&mut stmt))
    };
    stmt.sql = format!(
        "SELECT saved_query_id::BIGINT, MAX({VERSION_ID_COLUMN})::BIGINT \
         FROM {VERSIONS_TABLE}{where_sql} \
         GROUP BY 1 \
         ORDER BY 2"
    );
    stmt
}

/// `(id, value)` rows of one artifact kind, scoped to `versions`.
///
/// An empty `versions` set reads nothing.
pub fn artifact_rows_statement(kind: ArtifactKind, versions: &IdFilter) -> SqlStatement {
    let mut stmt = SqlStatement::new("");
    let clause = versions.where_clause(&mut stmt);
    let read_type = match kind.sql_type() {
        SqlType::Varchar => "TEXT",
        SqlType::Jsonb => "JSONB",
        SqlType::VarcharArray => "TEXT[]",
    };
    stmt.sql = format!(
        "SELECT {id}::BIGINT, {value}::{read_type} \
         FROM {table} \
         WHERE {VERSION_ID_COLUMN} {clause} \
         ORDER BY 1",
        id = kind.id_column(),
        value = kind.value_column(),
        table = kind.table_name(),
    );
    stmt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlParam;

    #[test]
    fn test_latest_versions_without_ids_reads_everything() {
        let stmt = latest_versions_statement(&IdFilter::new());
        assert!(!stmt.sql.contains("WHERE"));
        assert!(stmt.sql.contains("GROUP BY 1"));
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_latest_versions_with_one_id_binds_equality() {
        let stmt = latest_versions_statement(&IdFilter::from(vec![12]));
        assert!(stmt.sql.contains("WHERE saved_query_id = $1::BIGINT"));
        assert_eq!(stmt.params, vec![SqlParam::BigInt(12)]);
    }

    #[test]
    fn test_artifact_rows_for_empty_versions_use_sentinel() {
        let stmt = artifact_rows_statement(ArtifactKind::Sorts, &IdFilter::new());
        assert!(stmt
            .sql
            .contains("FROM saved_queries_version_sorts WHERE saved_queries_version_id = -42"));
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_artifact_rows_select_kind_columns() {
        let stmt = artifact_rows_statement(ArtifactKind::PivotDimensions, &IdFilter::from(vec![1, 2]));
        assert!(stmt
            .sql
            .starts_with("SELECT saved_queries_version_id::BIGINT, pivot_dimensions::TEXT[]"));
        assert!(stmt.sql.contains("= ANY($1::BIGINT[])"));
        assert_eq!(stmt.params, vec![SqlParam::BigIntArray(vec![1, 2])]);
    }
}
