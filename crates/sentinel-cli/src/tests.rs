//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::str::FromStr;

use rust_decimal::Decimal;
use sentinel_core::{test_utils::MockBankServer, AccountSummary, BankSource, Config, Ledger};
use tempfile::NamedTempFile;

use crate::commands::{self, format_money, truncate};

const SEED: &str = r#"{
    "subscriptions": [
        {"id": "sub-1", "merchant": "Netflix", "amount": "15.99",
         "source": {"bank": "Chase", "lastFour": "4521"}, "frequency": "monthly",
         "billingDay": 2, "notes": "", "approvedAt": "2026-03-02"},
        {"id": "sub-2", "merchant": "Adobe Creative Cloud", "amount": "659.88",
         "source": {"bank": "Amex", "lastFour": "1009"}, "frequency": "yearly",
         "billingDay": 14, "notes": "work", "approvedAt": "2026-02-14"}
    ],
    "incomeSources": [
        {"id": "inc-1", "merchant": "Acme Payroll", "amount": "3000.00",
         "source": {"bank": "Chase", "lastFour": "4521"}, "frequency": "monthly"}
    ],
    "estimates": [
        {"id": "est-1", "label": "Freelance", "amount": "250.00"}
    ]
}"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn simplefin_config(server: &MockBankServer) -> Config {
    let mut config = Config::default();
    config.simplefin.base_url = Some(server.simplefin_url());
    config.simplefin.username = Some(MockBankServer::SIMPLEFIN_USERNAME.into());
    config.simplefin.password = Some(MockBankServer::SIMPLEFIN_PASSWORD.into());
    config
}

// ========== Helper Tests ==========

#[test]
fn test_format_money() {
    assert_eq!(format_money(dec("15.99")), "$15.99");
    assert_eq!(format_money(dec("54.99")), "$54.99");
    assert_eq!(format_money(dec("12.5")), "$12.50");
    assert_eq!(format_money(dec("0.005")), "$0.01");
    assert_eq!(format_money(dec("-612.4")), "-$612.40");
    assert_eq!(format_money(Decimal::ZERO), "$0.00");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("Netflix", 10), "Netflix");
    assert_eq!(truncate("Adobe Creative Cloud", 10), "Adobe C...");
    assert_eq!(truncate("Café Crème Brûlée", 8), "Café ...");
}

#[test]
fn test_load_seed() {
    let file = write_temp(SEED);
    let snapshot = commands::load_seed(file.path()).unwrap();
    assert_eq!(snapshot.subscriptions.len(), 2);
    assert_eq!(snapshot.income.len(), 1);
    assert_eq!(snapshot.estimates.len(), 1);
}

#[test]
fn test_load_seed_errors() {
    let missing = commands::load_seed(std::path::Path::new("/nonexistent/seed.json"));
    assert!(missing.is_err());

    let file = write_temp(r#"{"subscriptions": [{"frequency": "weekly"}]}"#);
    let err = commands::load_seed(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid seed file"));
}

#[test]
fn test_load_config_from_file() {
    let file = write_temp("[runway]\nyearly_threshold = \"250\"\n");
    let config = commands::load_config(Some(file.path())).unwrap();
    assert_eq!(config.runway.yearly_threshold, dec("250"));
}

#[test]
fn test_load_config_missing_explicit_path() {
    let result = commands::load_config(Some(std::path::Path::new("/nonexistent/sentinel.toml")));
    assert!(result.is_err());
}

// ========== Runway Command Tests ==========

#[test]
fn test_render_runway() {
    let snapshot = commands::load_seed(write_temp(SEED).path()).unwrap();
    let ledger = Ledger::from_snapshot(snapshot);

    let output = commands::render_runway(&ledger, &Config::default());

    assert!(output.contains("Subscriptions (2)"));
    assert!(output.contains("Netflix"));
    // 15.99 + 659.88 / 12
    assert!(output.contains("$70.98"));
    // 3000 + 250 - 70.98
    assert!(output.contains("$3179.02"));
    assert!(output.contains("face_value"));
    assert!(output.contains("✅"));
}

#[test]
fn test_render_runway_negative_cashflow() {
    let ledger = Ledger::from_snapshot(
        sentinel_core::Snapshot::from_json(
            r#"{"subscriptions": [{"id": "s", "merchant": "Gym", "amount": "80",
                "source": {"bank": "Chase", "lastFour": "4521"}, "frequency": "monthly",
                "billingDay": 1, "notes": "", "approvedAt": "2026-01-01"}]}"#,
        )
        .unwrap(),
    );

    let output = commands::render_runway(&ledger, &Config::default());
    assert!(output.contains("-$80.00"));
    assert!(output.contains("⚠️"));
}

#[test]
fn test_cmd_runway() {
    let file = write_temp(SEED);
    let result = commands::cmd_runway(&Config::default(), file.path());
    assert!(result.is_ok());
}

// ========== SimpleFIN Command Tests ==========

#[test]
fn test_render_accounts() {
    let accounts = vec![AccountSummary {
        name: "Blue Cash Everyday 1009".into(),
        balance: dec("-612.40"),
        source: BankSource::new("Amex", "1009"),
    }];

    let output = commands::render_accounts(&accounts);
    assert!(output.contains("Accounts (1)"));
    assert!(output.contains("-$612.40"));
    assert!(output.contains("Amex"));

    assert!(commands::render_accounts(&[]).contains("(no accounts)"));
}

#[test]
fn test_simplefin_not_configured() {
    let err = commands::simplefin_provider(&Config::default()).err().expect("expected an error");
    assert!(err.to_string().contains("SIMPLEFIN_BASE_URL"));
}

#[tokio::test]
async fn test_sync_inbox() {
    let server = MockBankServer::start().await;
    let config = simplefin_config(&server);

    let (report, ledger) = commands::sync_inbox(&config).await.unwrap();

    assert_eq!(report.imported, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(ledger.inbox().len(), 4);

    let mut inbox = ledger.inbox().to_vec();
    sentinel_core::sync::newest_first(&mut inbox);
    let output = commands::render_inbox(&report, &inbox, &ledger);
    assert!(output.contains("4 imported, 1 skipped"));
    assert!(output.contains("Costco Membership"));
    assert!(output.contains("yearly"));
    assert!(output.contains("TRN-4"));
}

#[tokio::test]
async fn test_cmd_sync_and_accounts() {
    let server = MockBankServer::start().await;
    let config = simplefin_config(&server);

    assert!(commands::cmd_sync(&config, false).await.is_ok());
    assert!(commands::cmd_sync(&config, true).await.is_ok());
    assert!(commands::cmd_accounts(&config).await.is_ok());
}

#[tokio::test]
async fn test_cmd_sync_provider_down() {
    let server = MockBankServer::start_failing().await;
    let config = simplefin_config(&server);

    let err = commands::cmd_sync(&config, false).await.unwrap_err();
    assert!(err.to_string().contains("SimpleFIN sync failed"));
}

// ========== Config Command Tests ==========

#[test]
fn test_cmd_config() {
    let mut config = Config::default();
    config.plaid.secret = Some("super-secret".into());
    assert!(commands::cmd_config(&config, None).is_ok());
}
