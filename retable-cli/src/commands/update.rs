use crate::cli::{OutputFormat, UpdateArgs};
use crate::error::{CliError, CliResult};
use crate::output::{render_json, render_report_table};
use retable_core::{QueryStore, RenameConfig, RunOptions, Updater};
use std::io::{BufRead, Write};

/// Describe what a run is about to do.
pub fn describe(config: &RenameConfig) -> String {
    let naming = &config.naming;
    let scope = if config.query_ids.is_empty() {
        "all saved queries".to_string()
    } else {
        format!("saved queries {:?}", config.query_ids.to_vec())
    };
    let renames = naming
        .field_rename()
        .iter()
        .map(|(k, v)| format!("{k} -> {v}"))
        .collect::<Vec<_>>();
    let renames = if renames.is_empty() {
        String::new()
    } else {
        format!(" (fields: {})", renames.join(", "))
    };
    format!(
        "Rename table {} -> {} in {scope}{renames}",
        naming.old_table(),
        naming.target_table()
    )
}

/// Ask for a `y`/`yes` answer on `input`. Anything else declines.
pub fn confirm(
    config: &RenameConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> CliResult<bool> {
    write!(output, "{}. Continue? [y/N] ", describe(config))
        .and_then(|_| output.flush())
        .map_err(|e| CliError::io("writing prompt", e))?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| CliError::io("reading confirmation", e))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Run the rename pipeline and render its report.
pub async fn run<S: QueryStore + ?Sized>(
    store: &S,
    config: &RenameConfig,
    args: &UpdateArgs,
) -> CliResult<String> {
    let options = RunOptions {
        dry_run: args.dry_run,
    };
    let report = Updater::new(config, store).run(options).await?;
    Ok(match args.format {
        OutputFormat::Table => render_report_table(&report),
        OutputFormat::Json => render_json(&report),
    })
}
