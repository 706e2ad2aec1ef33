//! retable entry point.

use clap::Parser;
use retable_cli::cli::Cli;
use retable_cli::telemetry::init_tracing;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.log_json) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match retable_cli::app::run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
