use crate::cli::{ListIdsArgs, OutputFormat};
use crate::error::CliResult;
use crate::output::{render_json, render_saved_queries_table};
use retable_core::QueryStore;

/// Render every saved query with its id, name and space.
pub async fn run<S: QueryStore + ?Sized>(store: &S, args: &ListIdsArgs) -> CliResult<String> {
    let queries = store.list_saved_queries().await?;
    tracing::debug!(count = queries.len(), "Listed saved queries");
    Ok(match args.format {
        OutputFormat::Table => render_saved_queries_table(&queries),
        OutputFormat::Json => render_json(&queries),
    })
}
