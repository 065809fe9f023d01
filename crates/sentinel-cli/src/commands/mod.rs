//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Show resolved configuration
//! - `runway` - Burn and cashflow report for a snapshot
//! - `serve` - Web server command
//! - `simplefin` - SimpleFIN inbox sync and account balances
//!
//! Shared helpers for loading config and seed files and for money formatting
//! live here.

pub mod config;
pub mod runway;
pub mod serve;
pub mod simplefin;

// Re-export command functions for main.rs
pub use config::*;
pub use runway::*;
pub use serve::*;
pub use simplefin::*;

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sentinel_core::{aggregate::to_cents, Config, Snapshot};
use tracing::debug;

/// Load config from an explicit path or the default locations, plus env overrides
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(Some(p))
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Config::load(None).context("Failed to load config"),
    }
}

/// Read a JSON snapshot used to seed sessions or the runway report
pub fn load_seed(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let snapshot = Snapshot::from_json(&content)
        .with_context(|| format!("Invalid seed file {}", path.display()))?;

    debug!(
        path = %path.display(),
        transactions = snapshot.transactions.len(),
        subscriptions = snapshot.subscriptions.len(),
        "Loaded seed snapshot"
    );
    Ok(snapshot)
}

/// Format an amount as dollars rounded to the cent
pub fn format_money(amount: Decimal) -> String {
    let cents = to_cents(amount);
    if cents.is_sign_negative() && !cents.is_zero() {
        format!("-${:.2}", cents.abs())
    } else {
        format!("${:.2}", cents.abs())
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
