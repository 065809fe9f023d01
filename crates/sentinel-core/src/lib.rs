//! Sentinel Core Library
//!
//! Shared functionality for the Sentinel subscription and runway tracker:
//! - Domain models with exact decimal amounts
//! - Provider normalizer for SimpleFIN and Plaid records
//! - Financial aggregator (monthly burn, income, net cashflow)
//! - Subscription lifecycle store (inbox, approve, unapprove, estimates)
//! - Per-session state with idle expiry
//! - Bank provider clients and sync orchestration
//! - Layered TOML configuration

pub mod aggregate;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod session;
pub mod store;
pub mod sync;

/// Test utilities including a mock bank provider server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{BurnSummary, IncomePolicy, RunwaySummary};
pub use config::{Config, PlaidEnvironment};
pub use error::{Error, Result};
pub use models::{
    AccountSummary, BankSource, Frequency, IncomeSource, ManualEstimate, Snapshot, Subscription,
    Transaction,
};
pub use normalize::NormalizedBatch;
pub use providers::{
    BankProvider, FetchRequest, MockProvider, PlaidClient, ProviderClient, SimpleFinClient,
};
pub use session::{Session, SessionManager, DEFAULT_SESSION};
pub use store::Ledger;
pub use sync::{sync_session, SyncReport};
