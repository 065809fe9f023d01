//! Provider normalizer
//!
//! Converts raw Plaid and SimpleFIN records into uniform [`Transaction`],
//! [`BankSource`] and [`AccountSummary`] values. Everything here is pure.
//! A record with a missing or unparseable required field is rejected with
//! [`Error::MalformedRecord`]; the batch functions skip such records and
//! collect a warning for each instead of aborting.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{AccountSummary, BankSource, Transaction};
use crate::providers::types::{
    PlaidTransaction, SimpleFinAccount, SimpleFinResponse, SimpleFinTransaction,
};

/// Bank label used for Plaid records (institution lookup is a separate call)
pub const PLAID_BANK_LABEL: &str = "Plaid Bank";

/// Category assigned to Plaid records without one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Known institution domains, matched as case-insensitive substrings in order
const BANK_NAMES: &[(&[&str], &str)] = &[
    (&["chase"], "Chase"),
    (&["amex", "americanexpress"], "Amex"),
    (&["wellsfargo"], "Wells Fargo"),
    (&["citi"], "Citi"),
    (&["bofa", "bankofamerica"], "BofA"),
];

/// Output of normalizing one provider response
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub accounts: Vec<AccountSummary>,
    /// One entry per skipped record or provider-reported problem
    pub warnings: Vec<String>,
}

impl NormalizedBatch {
    fn skip(&mut self, context: &str, err: Error) {
        warn!(context, error = %err, "Skipping provider record");
        self.warnings.push(format!("{}: {}", context, err));
    }

    /// Keep a transaction unless its id was already seen in this batch
    fn accept(&mut self, seen: &mut HashSet<String>, context: &str, txn: Transaction) {
        if seen.insert(txn.id.clone()) {
            self.transactions.push(txn);
        } else {
            let err = Error::MalformedRecord(format!("duplicate transaction id {}", txn.id));
            self.skip(context, err);
        }
    }
}

/// Resolve a display bank name from an institution domain
///
/// Unknown domains fall back to the domain itself without a leading `www.`
/// or trailing `.com`, first letter capitalized.
pub fn parse_bank_name(domain: &str) -> String {
    let lowered = domain.to_lowercase();
    for (needles, name) in BANK_NAMES {
        if needles.iter().any(|n| lowered.contains(n)) {
            return (*name).to_string();
        }
    }

    let trimmed = domain.trim();
    let trimmed = strip_prefix_ci(trimmed, "www.");
    let trimmed = strip_suffix_ci(trimmed, ".com");
    capitalize(trimmed)
}

/// Resolve the last-four identifier from an account display name
///
/// A parenthesized 4-digit group wins; otherwise the last four characters
/// are used verbatim, digits or not.
pub fn parse_last_four(display_name: &str) -> String {
    static PAREN_DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = PAREN_DIGITS.get_or_init(|| Regex::new(r"\((\d{4})\)").expect("valid regex"));

    if let Some(caps) = re.captures(display_name) {
        return caps[1].to_string();
    }
    last_chars(display_name, 4)
}

/// Parse a provider amount as a spend magnitude (absolute value)
pub fn parse_amount(value: &Value) -> Result<Decimal> {
    parse_decimal(value).map(|d| d.abs())
}

/// Parse a signed decimal from a JSON string or number
///
/// Strings may carry whitespace, `$` and `,` thousands separators.
pub fn parse_decimal(value: &Value) -> Result<Decimal> {
    match value {
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != '$' && *c != ',')
                .collect();
            if cleaned.is_empty() {
                return Err(Error::MalformedRecord("empty amount".into()));
            }
            decimal_from_text(&cleaned)
                .ok_or_else(|| Error::MalformedRecord(format!("unparseable amount {:?}", s)))
        }
        Value::Number(n) => decimal_from_text(&n.to_string())
            .ok_or_else(|| Error::MalformedRecord(format!("unparseable amount {}", n))),
        Value::Null => Err(Error::MalformedRecord("missing amount".into())),
        other => Err(Error::MalformedRecord(format!(
            "amount must be a string or number, got {}",
            other
        ))),
    }
}

fn decimal_from_text(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Parse a provider timestamp into a calendar date
///
/// Accepts Unix epoch seconds (number or digit string), `YYYY-MM-DD`, and
/// RFC 3339 / naive ISO date-times. Times are dropped after conversion to UTC.
pub fn parse_date(value: &Value) -> Result<NaiveDate> {
    match value {
        Value::Number(n) => {
            let secs = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .ok_or_else(|| Error::MalformedRecord(format!("invalid timestamp {}", n)))?;
            date_from_epoch(secs)
        }
        Value::String(s) => parse_date_str(s),
        Value::Null => Err(Error::MalformedRecord("missing date".into())),
        other => Err(Error::MalformedRecord(format!(
            "date must be a string or number, got {}",
            other
        ))),
    }
}

fn parse_date_str(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::MalformedRecord("empty date".into()));
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = s
            .parse()
            .map_err(|_| Error::MalformedRecord(format!("invalid timestamp {:?}", raw)))?;
        return date_from_epoch(secs);
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }

    Err(Error::MalformedRecord(format!("unrecognized date {:?}", raw)))
}

fn date_from_epoch(secs: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| Error::MalformedRecord(format!("timestamp out of range: {}", secs)))
}

/// Build the [`BankSource`] for a SimpleFIN account
pub fn simplefin_source(account: &SimpleFinAccount) -> Result<BankSource> {
    let name = non_empty(account.name.as_deref())
        .ok_or_else(|| Error::MalformedRecord("account has no name".into()))?;

    let org = account.org.as_ref();
    let bank = match (
        org.and_then(|o| non_empty(o.domain.as_deref())),
        org.and_then(|o| non_empty(o.name.as_deref())),
    ) {
        (Some(domain), _) => parse_bank_name(domain),
        (None, Some(org_name)) => org_name.to_string(),
        (None, None) => {
            return Err(Error::MalformedRecord(format!(
                "account {:?} has no institution",
                name
            )))
        }
    };

    Ok(BankSource::new(bank, parse_last_four(name)))
}

/// Normalize one SimpleFIN transaction for an already-resolved source
pub fn normalize_simplefin_transaction(
    raw: &SimpleFinTransaction,
    source: &BankSource,
) -> Result<Transaction> {
    let id = non_empty(raw.id.as_deref())
        .ok_or_else(|| Error::MalformedRecord("transaction has no id".into()))?;

    let merchant = non_empty(raw.payee.as_deref())
        .or_else(|| non_empty(raw.description.as_deref()))
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no payee", id)))?;

    let amount = raw
        .amount
        .as_ref()
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no amount", id)))
        .and_then(parse_amount)?;

    let date = raw
        .posted
        .as_ref()
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no posted time", id)))
        .and_then(parse_date)?;

    Ok(Transaction {
        id: id.to_string(),
        merchant: merchant.to_string(),
        amount,
        source: source.clone(),
        date,
        category: None,
    })
}

/// Normalize a full SimpleFIN `/accounts` response
///
/// SimpleFIN transaction ids are only unique within an account, so each id
/// is qualified as `<account id>:<transaction id>`.
pub fn normalize_simplefin(response: &SimpleFinResponse) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen = HashSet::new();

    for message in &response.errors {
        warn!(message = %message, "SimpleFIN reported an error");
        batch.warnings.push(format!("simplefin: {}", message));
    }

    for (index, account) in response.accounts.iter().enumerate() {
        let label = account
            .id
            .clone()
            .or_else(|| account.name.clone())
            .unwrap_or_else(|| format!("#{}", index));

        let source = match simplefin_source(account) {
            Ok(source) => source,
            Err(e) => {
                batch.skip(&format!("account {}", label), e);
                continue;
            }
        };

        match account.balance.as_ref().map(parse_decimal) {
            Some(Ok(balance)) => batch.accounts.push(AccountSummary {
                name: account.name.clone().unwrap_or_default(),
                balance,
                source: source.clone(),
            }),
            Some(Err(e)) => batch.skip(&format!("account {} balance", label), e),
            None => batch.skip(
                &format!("account {} balance", label),
                Error::MalformedRecord("missing balance".into()),
            ),
        }

        for raw in &account.transactions {
            let context = format!(
                "account {} transaction {}",
                label,
                raw.id.as_deref().unwrap_or("?")
            );
            match normalize_simplefin_transaction(raw, &source) {
                Ok(mut txn) => {
                    txn.id = format!("{}:{}", label, txn.id);
                    batch.accept(&mut seen, &context, txn);
                }
                Err(e) => batch.skip(&context, e),
            }
        }
    }

    debug!(
        transactions = batch.transactions.len(),
        accounts = batch.accounts.len(),
        skipped = batch.warnings.len(),
        "Normalized SimpleFIN response"
    );
    batch
}

/// Normalize one Plaid transaction
pub fn normalize_plaid_transaction(raw: &PlaidTransaction) -> Result<Transaction> {
    let id = non_empty(raw.transaction_id.as_deref())
        .ok_or_else(|| Error::MalformedRecord("transaction has no transaction_id".into()))?;

    let merchant = non_empty(raw.merchant_name.as_deref())
        .or_else(|| non_empty(raw.name.as_deref()))
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no name", id)))?;

    let account_id = non_empty(raw.account_id.as_deref())
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no account_id", id)))?;

    let amount = raw
        .amount
        .as_ref()
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no amount", id)))
        .and_then(parse_amount)?;

    let date = raw
        .date
        .as_ref()
        .ok_or_else(|| Error::MalformedRecord(format!("transaction {} has no date", id)))
        .and_then(parse_date)?;

    let category = raw
        .category
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| non_empty(Some(c.as_str())))
        .unwrap_or(UNCATEGORIZED);

    Ok(Transaction {
        id: id.to_string(),
        merchant: merchant.to_string(),
        amount,
        source: BankSource::new(PLAID_BANK_LABEL, last_chars(account_id, 4)),
        date,
        category: Some(category.to_string()),
    })
}

/// Normalize a list of Plaid transactions
pub fn normalize_plaid(transactions: &[PlaidTransaction]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen = HashSet::new();

    for (index, raw) in transactions.iter().enumerate() {
        let id = raw
            .transaction_id
            .clone()
            .unwrap_or_else(|| format!("#{}", index));
        let context = format!("plaid transaction {}", id);
        match normalize_plaid_transaction(raw) {
            Ok(txn) => batch.accept(&mut seen, &context, txn),
            Err(e) => batch.skip(&context, e),
        }
    }

    debug!(
        transactions = batch.transactions.len(),
        skipped = batch.warnings.len(),
        "Normalized Plaid transactions"
    );
    batch
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> &'a str {
    if s.len() < suffix.len() {
        return s;
    }
    let split = s.len() - suffix.len();
    match s.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &s[..split],
        _ => s,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
