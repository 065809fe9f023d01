//! SimpleFIN bridge client
//!
//! Read-only: one `GET {base}/accounts` with HTTP Basic credentials returns
//! every account with its recent transactions.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::normalize::{normalize_simplefin, NormalizedBatch};

use super::types::SimpleFinResponse;
use super::{http_client, BankProvider, FetchRequest};

#[derive(Clone)]
pub struct SimpleFinClient {
    http_client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl SimpleFinClient {
    pub fn new(http_client: Client, base_url: &str, username: &str, password: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Build from config; `None` if any credential is missing
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let sf = &config.simplefin;
        let (Some(base_url), Some(username), Some(password)) =
            (&sf.base_url, &sf.username, &sf.password)
        else {
            return Ok(None);
        };
        Ok(Some(Self::new(
            http_client(config)?,
            base_url,
            username,
            password,
        )))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw `/accounts` payload
    pub async fn list_accounts(&self) -> Result<SimpleFinResponse> {
        let url = format!("{}/accounts", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "SimpleFIN request failed");
            return Err(Error::ProviderUnavailable(format!(
                "SimpleFIN request failed: {}",
                status
            )));
        }

        let body: SimpleFinResponse = response.json().await?;
        debug!(accounts = body.accounts.len(), "SimpleFIN accounts fetched");
        Ok(body)
    }
}

#[async_trait]
impl BankProvider for SimpleFinClient {
    fn name(&self) -> &'static str {
        "simplefin"
    }

    async fn fetch(&self, _request: &FetchRequest) -> Result<NormalizedBatch> {
        let raw = self.list_accounts().await?;
        Ok(normalize_simplefin(&raw))
    }
}
