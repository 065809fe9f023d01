//! Sentinel CLI - Subscription burn and runway tracker
//!
//! Usage:
//!   sentinel serve --port 3000          Start web server
//!   sentinel sync                       Pull the SimpleFIN inbox
//!   sentinel accounts                   Show SimpleFIN balances
//!   sentinel runway --seed data.json    Monthly burn and net cashflow
//!   sentinel config                     Show resolved configuration

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            seed,
            static_dir,
        } => {
            commands::cmd_serve(config, &host, port, seed.as_deref(), static_dir.as_deref()).await
        }
        Commands::Sync { json } => commands::cmd_sync(&config, json).await,
        Commands::Accounts => commands::cmd_accounts(&config).await,
        Commands::Runway { seed } => commands::cmd_runway(&config, &seed),
        Commands::Config => commands::cmd_config(&config, cli.config.as_deref()),
    }
}
