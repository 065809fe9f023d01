//! Domain models for Sentinel
//!
//! JSON uses camelCase field names and `YYYY-MM-DD` dates so the dashboard
//! can consume the records as-is. Amounts are [`Decimal`] and serialize as
//! strings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifies the originating account of a charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSource {
    pub bank: String,
    pub last_four: String,
}

impl BankSource {
    pub fn new(bank: impl Into<String>, last_four: impl Into<String>) -> Self {
        Self {
            bank: bank.into(),
            last_four: last_four.into(),
        }
    }
}

impl std::fmt::Display for BankSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ••{}", self.bank, self.last_four)
    }
}

/// Billing period of a subscription or income source
///
/// Closed set: anything other than `monthly`/`yearly` is rejected with
/// [`Error::InvalidFrequency`], including during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Number of months covered by one charge
    pub fn months(&self) -> Decimal {
        match self {
            Self::Monthly => Decimal::ONE,
            Self::Yearly => Decimal::from(12),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::InvalidFrequency(other.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An unreviewed charge sitting in the inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub merchant: String,
    /// Spend magnitude, never negative
    pub amount: Decimal,
    pub source: BankSource,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A charge the user confirmed as recurring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub merchant: String,
    pub amount: Decimal,
    pub source: BankSource,
    pub frequency: Frequency,
    /// Day of month (1-31), fixed at approval time
    pub billing_day: u32,
    #[serde(default)]
    pub notes: String,
    pub approved_at: NaiveDate,
}

/// Recurring income (read-only, no approval workflow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSource {
    pub id: String,
    pub merchant: String,
    pub amount: Decimal,
    pub source: BankSource,
    pub frequency: Frequency,
}

/// Ad hoc income projection entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEstimate {
    pub id: String,
    pub label: String,
    pub amount: Decimal,
}

/// Account row reported by an aggregator alongside its transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub name: String,
    /// Signed: credit card balances are usually negative
    pub balance: Decimal,
    pub source: BankSource,
}

/// Seed document for a session's collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default, alias = "incomeSources")]
    pub income: Vec<IncomeSource>,
    #[serde(default)]
    pub estimates: Vec<ManualEstimate>,
}

impl Snapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json(content: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_frequency_round_trip_strings() {
        assert_eq!(Frequency::from_str("monthly").unwrap(), Frequency::Monthly);
        assert_eq!(Frequency::from_str("yearly").unwrap(), Frequency::Yearly);
        assert_eq!(Frequency::Yearly.to_string(), "yearly");
    }

    #[test]
    fn test_frequency_rejects_other_periods() {
        for bad in ["weekly", "quarterly", "Monthly", ""] {
            let err = Frequency::from_str(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidFrequency(ref s) if s == bad));
        }
    }

    #[test]
    fn test_subscription_json_shape() {
        let sub = Subscription {
            id: "sub-1".into(),
            merchant: "Google One".into(),
            amount: Decimal::from_str("2.99").unwrap(),
            source: BankSource::new("Chase", "1234"),
            frequency: Frequency::Monthly,
            billing_day: 1,
            notes: String::new(),
            approved_at: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        };

        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["billingDay"], 1);
        assert_eq!(json["approvedAt"], "2026-01-10");
        assert_eq!(json["frequency"], "monthly");
        assert_eq!(json["source"]["lastFour"], "1234");
        assert_eq!(json["amount"], "2.99");
    }

    #[test]
    fn test_deserialize_invalid_frequency_fails() {
        let json = r#"{
            "id": "inc-1", "merchant": "Acme", "amount": "10",
            "source": {"bank": "Chase", "lastFour": "1234"},
            "frequency": "weekly"
        }"#;
        let err = serde_json::from_str::<IncomeSource>(json).unwrap_err();
        assert!(err.to_string().contains("Invalid frequency"));
    }

    #[test]
    fn test_snapshot_accepts_numeric_amounts_and_alias() {
        let json = r#"{
            "incomeSources": [{
                "id": "inc-1", "merchant": "Salary", "amount": 5200,
                "source": {"bank": "Chase", "lastFour": "1234"},
                "frequency": "monthly"
            }],
            "estimates": [{"id": "est-1", "label": "Freelance", "amount": "800.00"}]
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert!(snapshot.transactions.is_empty());
        assert_eq!(snapshot.income.len(), 1);
        assert_eq!(snapshot.income[0].amount, Decimal::from(5200));
        assert_eq!(snapshot.estimates[0].amount, Decimal::from_str("800.00").unwrap());
    }

    #[test]
    fn test_transaction_category_omitted_when_none() {
        let txn = Transaction {
            id: "t".into(),
            merchant: "m".into(),
            amount: Decimal::ONE,
            source: BankSource::new("Citi", "0001"),
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            category: None,
        };
        let json = serde_json::to_value(&txn).unwrap();
        assert!(json.get("category").is_none());
        assert_eq!(json["date"], "2026-02-01");
    }
}
