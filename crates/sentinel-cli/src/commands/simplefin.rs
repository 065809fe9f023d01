//! SimpleFIN command implementations (sync, accounts)

use std::fmt::Write;

use anyhow::{bail, Context, Result};
use sentinel_core::{
    sync::{fetch_batch, newest_first},
    AccountSummary, Config, FetchRequest, Ledger, ProviderClient, Session, SyncReport,
    Transaction,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{format_money, truncate};

/// SimpleFIN client from config, or an error naming the missing settings
pub fn simplefin_provider(config: &Config) -> Result<ProviderClient> {
    match ProviderClient::simplefin_from_config(config)? {
        Some(provider) => Ok(provider),
        None => bail!(
            "SimpleFIN is not configured. Set SIMPLEFIN_BASE_URL, SIMPLEFIN_USERNAME and \
             SIMPLEFIN_PASSWORD or fill in [simplefin] in the config file"
        ),
    }
}

/// Pull the SimpleFIN inbox through a throwaway session
pub async fn sync_inbox(config: &Config) -> Result<(SyncReport, Ledger)> {
    let provider = simplefin_provider(config)?;
    let ledger = Ledger::new().with_yearly_threshold(config.runway.yearly_threshold);
    let session = Mutex::new(Session::new(ledger));

    let report = sentinel_core::sync_session(&session, &provider)
        .await
        .context("SimpleFIN sync failed")?;

    info!(
        imported = report.imported,
        skipped = report.skipped,
        accounts = report.accounts.len(),
        "SimpleFIN inbox synced"
    );
    Ok((report, session.into_inner().ledger))
}

pub async fn cmd_sync(config: &Config, json: bool) -> Result<()> {
    let (report, ledger) = sync_inbox(config).await?;
    let mut inbox = ledger.inbox().to_vec();
    newest_first(&mut inbox);

    if json {
        let output = serde_json::json!({
            "report": report,
            "transactions": inbox,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", render_inbox(&report, &inbox, &ledger));
    Ok(())
}

pub async fn cmd_accounts(config: &Config) -> Result<()> {
    let provider = simplefin_provider(config)?;
    let batch = fetch_batch(&provider, &FetchRequest::default())
        .await
        .context("Failed to fetch SimpleFIN accounts")?;

    print!("{}", render_accounts(&batch.accounts));
    for warning in &batch.warnings {
        warn!(warning = %warning, "SimpleFIN account data incomplete");
    }
    Ok(())
}

/// Render the synced inbox with the frequency approval would pick
pub fn render_inbox(report: &SyncReport, inbox: &[Transaction], ledger: &Ledger) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "📥 Inbox: {} imported, {} skipped ({})",
        report.imported, report.skipped, report.provider
    );
    let _ = writeln!(
        out,
        "   ─────────────────────────────────────────────────────────────"
    );
    for txn in inbox {
        let _ = writeln!(
            out,
            "   {}  {:<28} {:>10}  {:<7}  {}",
            txn.date,
            truncate(&txn.merchant, 28),
            format_money(txn.amount),
            ledger.infer_frequency(txn.amount).as_str(),
            txn.source
        );
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "   ⚠️  {}", warning);
    }
    let _ = writeln!(out);
    out
}

/// Render account balances
pub fn render_accounts(accounts: &[AccountSummary]) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "🏦 Accounts ({})", accounts.len());
    let _ = writeln!(
        out,
        "   ─────────────────────────────────────────────────────────────"
    );
    if accounts.is_empty() {
        let _ = writeln!(out, "   (no accounts)");
    }
    for account in accounts {
        let _ = writeln!(
            out,
            "   {:<32} {:>12}  {}",
            truncate(&account.name, 32),
            format_money(account.balance),
            account.source
        );
    }
    let _ = writeln!(out);
    out
}
