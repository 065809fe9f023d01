//! Raw provider record shapes
//!
//! These mirror the provider wire formats loosely: every field a provider
//! might omit is optional and amounts/dates stay as raw JSON values, so a
//! single bad record can be rejected by the normalizer without failing the
//! whole response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /accounts` response from a SimpleFIN bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleFinResponse {
    /// Bridge-level error strings (e.g. an institution needing re-auth)
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<SimpleFinAccount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleFinAccount {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Decimal string, sometimes a bare number
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub org: Option<SimpleFinOrg>,
    #[serde(default)]
    pub transactions: Vec<SimpleFinTransaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleFinOrg {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleFinTransaction {
    #[serde(default)]
    pub id: Option<String>,
    /// Unix epoch seconds
    #[serde(default)]
    pub posted: Option<Value>,
    /// Signed decimal string, negative for spend
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// One entry of Plaid's `/transactions/get` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaidTransaction {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    /// Positive for money leaving the account
    #[serde(default)]
    pub amount: Option<Value>,
    /// ISO calendar date
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub category: Option<Vec<String>>,
}
