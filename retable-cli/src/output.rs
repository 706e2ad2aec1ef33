use comfy_table::{presets::UTF8_BORDERS_ONLY, Cell, ContentArrangement, Row, Table};
use retable_core::{MigrationReport, SavedQuerySummary};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(Row::from(header.iter().map(Cell::new).collect::<Vec<_>>()));
    table
}

pub fn render_saved_queries_table(queries: &[SavedQuerySummary]) -> String {
    let mut table = new_table(&["saved_query_id", "name", "space_id"]);
    for query in queries {
        table.add_row(vec![
            Cell::new(query.saved_query_id),
            Cell::new(&query.name),
            Cell::new(
                query
                    .space_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "null".to_string()),
            ),
        ]);
    }
    format!("{table}\n({} rows)", queries.len())
}

pub fn render_report_table(report: &MigrationReport) -> String {
    let mut table = new_table(&["artifact", "read", "written", "changed"]);
    for kind in &report.kinds {
        table.add_row(vec![
            Cell::new(kind.kind),
            Cell::new(kind.rows_read),
            Cell::new(kind.rows_written),
            Cell::new(kind.rows_changed),
        ]);
    }
    let mode = if report.dry_run { " (dry run)" } else { "" };
    format!(
        "{} -> {} across {} saved query versions{mode}\n{table}",
        report.old_table,
        report.target_table,
        report.version_ids.len(),
    )
}

pub fn render_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retable_core::{ArtifactKind, KindReport};

    fn report(dry_run: bool) -> MigrationReport {
        MigrationReport {
            old_table: "orders".to_string(),
            target_table: "sales".to_string(),
            version_ids: vec![11, 20],
            kinds: vec![KindReport {
                kind: ArtifactKind::ExploreName,
                rows_read: 2,
                rows_written: 2,
                rows_changed: 1,
            }],
            dry_run,
        }
    }

    #[test]
    fn test_saved_queries_table_lists_every_row() {
        let rendered = render_saved_queries_table(&[
            SavedQuerySummary {
                saved_query_id: 1,
                name: "Revenue".to_string(),
                space_id: Some(4),
            },
            SavedQuerySummary {
                saved_query_id: 2,
                name: "Churn".to_string(),
                space_id: None,
            },
        ]);
        assert!(rendered.contains("saved_query_id"));
        assert!(rendered.contains("Revenue"));
        assert!(rendered.contains("null"));
        assert!(rendered.ends_with("(2 rows)"));
    }

    #[test]
    fn test_report_table_names_tables_and_kinds() {
        let rendered = render_report_table(&report(false));
        assert!(rendered.starts_with("orders -> sales across 2 saved query versions\n"));
        assert!(rendered.contains("explore_name"));
    }

    #[test]
    fn test_report_table_flags_dry_run() {
        assert!(render_report_table(&report(true)).contains("(dry run)"));
    }

    #[test]
    fn test_report_json_uses_snake_case_kinds() {
        let rendered = render_json(&report(false));
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["kinds"][0]["kind"], "explore_name");
        assert_eq!(value["version_ids"], serde_json::json!([11, 20]));
    }
}
