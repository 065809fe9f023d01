//! Mock provider for testing
//!
//! Returns a fixed batch without touching the network. Can be switched to a
//! failing mode to exercise `ProviderUnavailable` handling.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Transaction;
use crate::normalize::NormalizedBatch;

use super::{BankProvider, FetchRequest};

#[derive(Clone, Default)]
pub struct MockProvider {
    pub batch: NormalizedBatch,
    /// Whether fetch and link calls should fail
    pub unavailable: bool,
    /// Require an access token on fetch, like Plaid
    pub requires_token: bool,
}

impl MockProvider {
    pub const LINK_TOKEN: &'static str = "link-mock-token";
    pub const ACCESS_TOKEN: &'static str = "access-mock-token";

    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            batch: NormalizedBatch {
                transactions,
                ..Default::default()
            },
            unavailable: false,
            requires_token: false,
        }
    }

    /// Behaves like a bank-link provider: fetch needs a token
    pub fn linked(transactions: Vec<Transaction>) -> Self {
        Self {
            requires_token: true,
            ..Self::new(transactions)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::ProviderUnavailable("mock provider is down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BankProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<NormalizedBatch> {
        if self.requires_token && request.access_token.is_none() {
            return Err(Error::NotConnected);
        }
        self.check()?;
        Ok(self.batch.clone())
    }

    async fn create_link_token(&self) -> Result<String> {
        self.check()?;
        Ok(Self::LINK_TOKEN.to_string())
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<String> {
        self.check()?;
        if public_token.trim().is_empty() {
            return Err(Error::InvalidInput("public_token must not be empty".into()));
        }
        Ok(Self::ACCESS_TOKEN.to_string())
    }
}
