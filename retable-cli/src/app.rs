use crate::cli::{Cli, Command, ConnectionArgs};
use crate::commands;
use crate::db::{DbConfig, PgQueryStore};
use crate::error::{CliError, CliResult};
use retable_core::RenameConfig;

/// Dispatch a parsed command line. Returns the text to print on stdout.
pub async fn run(cli: Cli) -> CliResult<String> {
    match cli.command {
        Command::ListIds(args) => {
            let store = connect(&cli.connection).await?;
            commands::list_ids::run(&store, &args).await
        }
        Command::Update(args) => {
            // Config problems surface before any connection is attempted.
            let config = RenameConfig::from_path(&args.config)?;
            if !args.dry_run && !args.yes {
                let mut input = std::io::stdin().lock();
                let mut output = std::io::stderr();
                if !commands::update::confirm(&config, &mut input, &mut output)? {
                    return Err(CliError::Aborted);
                }
            }
            let store = connect(&cli.connection).await?;
            commands::update::run(&store, &config, &args).await
        }
    }
}

async fn connect(args: &ConnectionArgs) -> CliResult<PgQueryStore> {
    let config = DbConfig::resolve(args)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        dbname = %config.dbname,
        user = %config.user,
        "Connecting to PostgreSQL"
    );
    let store = PgQueryStore::from_config(&config)?;
    store.connect().await?;
    Ok(store)
}
