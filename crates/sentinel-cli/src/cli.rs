//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sentinel - Track subscriptions and monthly runway
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Subscription burn and runway tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to the platform config dir, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// JSON snapshot every new session starts from (demo data)
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Fetch the SimpleFIN inbox and list it
    Sync {
        /// Print the sync report and transactions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List SimpleFIN account balances
    Accounts,

    /// Show monthly burn, income, and net cashflow for a snapshot
    Runway {
        /// JSON snapshot with subscriptions, income, and estimates
        #[arg(long)]
        seed: PathBuf,
    },

    /// Print the resolved configuration (secrets masked)
    Config,
}
