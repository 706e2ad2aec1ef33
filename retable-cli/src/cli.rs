use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "retable")]
#[command(about = "Rename a table across saved analytics queries")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List saved query ids with their name and space.
    ListIds(ListIdsArgs),
    /// Rewrite saved queries according to a rename config file.
    Update(UpdateArgs),
}

/// PostgreSQL connection overrides. Unset fields fall back to `PG_*`
/// environment variables (with `--params-from-env`), then to defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Read unset connection parameters from PG_HOST, PG_PORT, PG_DATABASE,
    /// PG_USER and PG_PASSWORD.
    #[arg(long, global = true)]
    pub params_from_env: bool,

    #[arg(long, global = true)]
    pub host: Option<String>,

    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[arg(long, global = true)]
    pub dbname: Option<String>,

    #[arg(long, global = true)]
    pub user: Option<String>,

    #[arg(long, global = true)]
    pub password: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct ListIdsArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Path to the YAML rename config.
    #[arg(value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Compute and report the rewrites without writing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Output format for the run report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}
