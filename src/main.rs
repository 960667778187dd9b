// file: src/main.rs
// version: 1.0.0
// guid: d07b41f6-3c92-48e5-a1d4-6f85e20c79b3

//! Security operations agent - Main entry point

use clap::Parser;
use secops_agent::{
    cli::{args::Cli, commands::*},
    logging::logger,
    Result,
};
use tokio::signal;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logger::init_logger(cli.verbose, cli.quiet)?;

    let shutdown_signal = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        warn!("Received Ctrl+C, shutting down...");
    };

    let command_future = async {
        match cli.command {
            secops_agent::cli::args::Commands::Query {
                query, target, user, role, config
            } => {
                query_command(&query, target, &user, role.into(), config).await
            }
            secops_agent::cli::args::Commands::Tools { json, config } => {
                tools_command(json, config).await
            }
            secops_agent::cli::args::Commands::CheckTarget { target, config } => {
                check_target_command(&target, config).await
            }
        }
    };

    tokio::select! {
        result = command_future => result,
        _ = shutdown_signal => {
            warn!("Interrupted by user");
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}
