//! Gatehouse CLI binary.
//!
//! This binary provides command-line access to the gateway:
//! - Run a single call through the full pipeline and print the response
//! - Show the effective layered configuration

use clap::Parser;
use gatehouse::{ObservabilityConfig, init_observability_with_config, shutdown_observability};
use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, load_config, run_call, show_config};

    // API keys may live in a local .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_observability_with_config(ObservabilityConfig::from_flags(cli.verbose, cli.json_logs))?;

    let config = load_config(cli.config.as_deref())?;

    let exit = match cli.command {
        Commands::Call(args) => {
            let pretty = args.pretty;
            let response = run_call(&config, args).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&response)?
            } else {
                serde_json::to_string(&response)?
            };
            println!("{}", json);
            if *response.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Commands::Config => {
            show_config(&config)?;
            ExitCode::SUCCESS
        }
    };

    shutdown_observability();
    Ok(exit)
}
