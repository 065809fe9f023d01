//! Bank data providers
//!
//! # Architecture
//!
//! - `BankProvider` trait: fetch a normalized batch, plus the optional
//!   bank-link handshake (link token, public-token exchange)
//! - `ProviderClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Implementations: `SimpleFinClient` (read-only aggregator), `PlaidClient`
//!   (bank-link), `MockProvider` (canned data for tests and demos)
//!
//! Providers are built from [`Config`]; one whose credentials are missing is
//! simply "not configured" and `from_config` returns `None` for it.

mod mock;
mod plaid;
mod simplefin;
pub mod types;

pub use mock::MockProvider;
pub use plaid::PlaidClient;
pub use simplefin::SimpleFinClient;
pub use types::*;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::normalize::NormalizedBatch;

/// What a single fetch should cover
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Bank-link access token (Plaid); ignored by read-only providers
    pub access_token: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl FetchRequest {
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Interface shared by every bank data source
///
/// Fetch failures (network, auth, non-2xx) surface as
/// [`Error::ProviderUnavailable`]; individual bad records never fail a fetch
/// and end up in [`NormalizedBatch::warnings`] instead.
#[async_trait]
pub trait BankProvider: Send + Sync {
    /// Short provider name for logs and sync reports
    fn name(&self) -> &'static str;

    /// Fetch and normalize transactions (and account balances, if any)
    async fn fetch(&self, request: &FetchRequest) -> Result<NormalizedBatch>;

    /// Start a bank-link flow; returns a short-lived link token
    async fn create_link_token(&self) -> Result<String> {
        Err(Error::Config(format!(
            "{} does not support bank linking",
            self.name()
        )))
    }

    /// Trade a public token from the link flow for a long-lived access token
    async fn exchange_public_token(&self, _public_token: &str) -> Result<String> {
        Err(Error::Config(format!(
            "{} does not support bank linking",
            self.name()
        )))
    }
}

/// Concrete provider wrapper
#[derive(Clone)]
pub enum ProviderClient {
    SimpleFin(SimpleFinClient),
    Plaid(PlaidClient),
    /// Canned data for testing
    Mock(MockProvider),
}

impl ProviderClient {
    /// SimpleFIN client, or `None` when credentials are missing
    pub fn simplefin_from_config(config: &Config) -> Result<Option<Self>> {
        Ok(SimpleFinClient::from_config(config)?.map(ProviderClient::SimpleFin))
    }

    /// Plaid client, or `None` when credentials are missing
    pub fn plaid_from_config(config: &Config) -> Result<Option<Self>> {
        Ok(PlaidClient::from_config(config)?.map(ProviderClient::Plaid))
    }

    pub fn mock(provider: MockProvider) -> Self {
        ProviderClient::Mock(provider)
    }
}

// Delegate to the inner provider
#[async_trait]
impl BankProvider for ProviderClient {
    fn name(&self) -> &'static str {
        match self {
            ProviderClient::SimpleFin(p) => p.name(),
            ProviderClient::Plaid(p) => p.name(),
            ProviderClient::Mock(p) => p.name(),
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<NormalizedBatch> {
        match self {
            ProviderClient::SimpleFin(p) => p.fetch(request).await,
            ProviderClient::Plaid(p) => p.fetch(request).await,
            ProviderClient::Mock(p) => p.fetch(request).await,
        }
    }

    async fn create_link_token(&self) -> Result<String> {
        match self {
            ProviderClient::SimpleFin(p) => p.create_link_token().await,
            ProviderClient::Plaid(p) => p.create_link_token().await,
            ProviderClient::Mock(p) => p.create_link_token().await,
        }
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<String> {
        match self {
            ProviderClient::SimpleFin(p) => p.exchange_public_token(public_token).await,
            ProviderClient::Plaid(p) => p.exchange_public_token(public_token).await,
            ProviderClient::Mock(p) => p.exchange_public_token(public_token).await,
        }
    }
}

/// Build an HTTP client with the configured request timeout
pub(crate) fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http.timeout())
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_providers_are_none() {
        let config = Config::default();
        assert!(ProviderClient::simplefin_from_config(&config).unwrap().is_none());
        assert!(ProviderClient::plaid_from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_simplefin_does_not_link() {
        let mut config = Config::default();
        config.simplefin.base_url = Some("http://127.0.0.1:1".into());
        config.simplefin.username = Some("u".into());
        config.simplefin.password = Some("p".into());

        let client = ProviderClient::simplefin_from_config(&config)
            .unwrap()
            .unwrap();
        assert_eq!(client.name(), "simplefin");
        assert!(matches!(
            client.create_link_token().await,
            Err(Error::Config(_))
        ));
    }
}
