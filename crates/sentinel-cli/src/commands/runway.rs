//! Runway command implementation

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use sentinel_core::{Config, Frequency, Ledger};

use super::{format_money, load_seed, truncate};

pub fn cmd_runway(config: &Config, seed: &Path) -> Result<()> {
    let snapshot = load_seed(seed)?;
    let ledger = Ledger::from_snapshot(snapshot).with_yearly_threshold(config.runway.yearly_threshold);

    print!("{}", render_runway(&ledger, config));
    Ok(())
}

/// Render the subscription list and cashflow summary
pub fn render_runway(ledger: &Ledger, config: &Config) -> String {
    let burn = ledger.burn_summary();
    let runway = ledger.runway(config.runway.income_policy);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out);
    let _ = writeln!(out, "📉 Subscriptions ({})", ledger.approved().len());
    let _ = writeln!(
        out,
        "   ─────────────────────────────────────────────────────────────"
    );
    if ledger.approved().is_empty() {
        let _ = writeln!(out, "   (none approved)");
    }
    for sub in ledger.approved() {
        let period = match sub.frequency {
            Frequency::Monthly => "/mo",
            Frequency::Yearly => "/yr",
        };
        let _ = writeln!(
            out,
            "   {:<28} {:>10}{}  day {:>2}  {}",
            truncate(&sub.merchant, 28),
            format_money(sub.amount),
            period,
            sub.billing_day,
            sub.source
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "   Monthly subscriptions:  {:>12}", format_money(burn.monthly_total));
    let _ = writeln!(
        out,
        "   Yearly ({}) as monthly: {:>12}",
        burn.yearly_count,
        format_money(runway.yearly_as_monthly)
    );
    let _ = writeln!(out, "   Monthly burn:           {:>12}", format_money(runway.monthly_burn));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "   Recurring income:       {:>12}  ({})",
        format_money(runway.recurring_income),
        runway.income_policy.as_str()
    );
    let _ = writeln!(out, "   Manual estimates:       {:>12}", format_money(runway.estimates_total));
    let _ = writeln!(out, "   Monthly income:         {:>12}", format_money(runway.monthly_income));
    let _ = writeln!(out);

    let marker = if runway.is_positive() { "✅" } else { "⚠️ " };
    let _ = writeln!(
        out,
        "   {} Net cashflow:        {:>12}",
        marker,
        format_money(runway.net_cashflow)
    );
    let _ = writeln!(out);
    out
}
