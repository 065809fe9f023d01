//! Plaid bank-link client
//!
//! Implements the three calls Sentinel needs: link token creation, public
//! token exchange and `/transactions/get`. Credentials travel in the JSON
//! body rather than headers, as Plaid expects.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::normalize::{normalize_plaid, NormalizedBatch};

use super::types::PlaidTransaction;
use super::{http_client, BankProvider, FetchRequest};

/// Plaid caps `/transactions/get` pages at 500
const PAGE_SIZE: u32 = 500;

#[derive(Clone)]
pub struct PlaidClient {
    http_client: Client,
    base_url: String,
    client_id: String,
    secret: String,
    client_name: String,
    user_id: String,
    history_start: NaiveDate,
}

#[derive(Debug, Serialize)]
struct LinkTokenRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    client_name: &'a str,
    user: LinkUser<'a>,
    products: [&'static str; 1],
    country_codes: [&'static str; 1],
    language: &'static str,
}

#[derive(Debug, Serialize)]
struct LinkUser<'a> {
    client_user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct LinkTokenResponse {
    link_token: String,
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    public_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct TransactionsRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    options: TransactionsOptions,
}

#[derive(Debug, Serialize)]
struct TransactionsOptions {
    count: u32,
    offset: u32,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<PlaidTransaction>,
    #[serde(default)]
    total_transactions: u32,
}

/// Error body Plaid returns with non-2xx statuses
#[derive(Debug, Deserialize)]
struct PlaidErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl PlaidClient {
    pub fn new(http_client: Client, base_url: &str, client_id: &str, secret: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            secret: secret.to_string(),
            client_name: "Sentinel".to_string(),
            user_id: "sentinel-user".to_string(),
            history_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        }
    }

    /// Build from config; `None` if client id or secret is missing
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let plaid = &config.plaid;
        let (Some(client_id), Some(secret)) = (&plaid.client_id, &plaid.secret) else {
            return Ok(None);
        };

        let mut client = Self::new(
            http_client(config)?,
            &plaid.resolved_base_url(),
            client_id,
            secret,
        );
        client.client_name = plaid.client_name.clone();
        client.user_id = plaid.user_id.clone();
        client.history_start = plaid.history_start;
        Ok(Some(client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and decode the JSON reply, mapping Plaid errors
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http_client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<PlaidErrorBody>().await {
                Ok(PlaidErrorBody {
                    error_code,
                    error_message,
                }) => format!(
                    "{} {}",
                    error_code.unwrap_or_default(),
                    error_message.unwrap_or_default()
                ),
                Err(_) => String::new(),
            };
            warn!(path, %status, detail = %detail.trim(), "Plaid request failed");
            return Err(Error::ProviderUnavailable(format!(
                "Plaid {} failed: {} {}",
                path,
                status,
                detail.trim()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn create_link_token(&self) -> Result<String> {
        let request = LinkTokenRequest {
            client_id: &self.client_id,
            secret: &self.secret,
            client_name: &self.client_name,
            user: LinkUser {
                client_user_id: &self.user_id,
            },
            products: ["transactions"],
            country_codes: ["US"],
            language: "en",
        };
        let response: LinkTokenResponse = self.post("/link/token/create", &request).await?;
        Ok(response.link_token)
    }

    pub async fn exchange_public_token(&self, public_token: &str) -> Result<String> {
        let request = ExchangeRequest {
            client_id: &self.client_id,
            secret: &self.secret,
            public_token,
        };
        let response: ExchangeResponse =
            self.post("/item/public_token/exchange", &request).await?;
        info!("Exchanged Plaid public token");
        Ok(response.access_token)
    }

    /// All transactions in `[start, end]`, following pagination
    pub async fn list_transactions(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PlaidTransaction>> {
        let mut all = Vec::new();

        loop {
            let request = TransactionsRequest {
                client_id: &self.client_id,
                secret: &self.secret,
                access_token,
                start_date: start,
                end_date: end,
                options: TransactionsOptions {
                    count: PAGE_SIZE,
                    offset: all.len() as u32,
                },
            };
            let page: TransactionsResponse = self.post("/transactions/get", &request).await?;
            let received = page.transactions.len();
            all.extend(page.transactions);

            debug!(
                received,
                total = page.total_transactions,
                "Plaid transactions page"
            );
            if received == 0 || all.len() as u32 >= page.total_transactions {
                break;
            }
        }

        Ok(all)
    }
}

#[async_trait]
impl BankProvider for PlaidClient {
    fn name(&self) -> &'static str {
        "plaid"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<NormalizedBatch> {
        let token = request.access_token.as_deref().ok_or(Error::NotConnected)?;
        let start = request.start.unwrap_or(self.history_start);
        let end = request.end.unwrap_or_else(|| Utc::now().date_naive());

        let raw = self.list_transactions(token, start, end).await?;
        Ok(normalize_plaid(&raw))
    }

    async fn create_link_token(&self) -> Result<String> {
        PlaidClient::create_link_token(self).await
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<String> {
        PlaidClient::exchange_public_token(self, public_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBankServer;

    fn client_for(server: &MockBankServer, secret: &str) -> PlaidClient {
        PlaidClient::new(
            Client::new(),
            &server.url(),
            MockBankServer::PLAID_CLIENT_ID,
            secret,
        )
    }

    #[tokio::test]
    async fn test_link_flow() {
        let server = MockBankServer::start().await;
        let client = client_for(&server, MockBankServer::PLAID_SECRET);

        let link = client.create_link_token().await.unwrap();
        assert!(link.starts_with("link-sandbox-"));

        let access = client
            .exchange_public_token("public-sandbox-abc")
            .await
            .unwrap();
        assert_eq!(access, MockBankServer::PLAID_ACCESS_TOKEN);
    }

    #[tokio::test]
    async fn test_fetch_paginates_and_normalizes() {
        let server = MockBankServer::start().await;
        let client = client_for(&server, MockBankServer::PLAID_SECRET);

        let batch = client
            .fetch(&FetchRequest::with_access_token(
                MockBankServer::PLAID_ACCESS_TOKEN,
            ))
            .await
            .unwrap();

        assert_eq!(
            batch.transactions.len() + batch.warnings.len(),
            MockBankServer::PLAID_TRANSACTION_COUNT
        );
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch
            .transactions
            .iter()
            .all(|t| t.source.bank == "Plaid Bank"));
    }

    #[tokio::test]
    async fn test_fetch_without_token_is_not_connected() {
        let server = MockBankServer::start().await;
        let client = client_for(&server, MockBankServer::PLAID_SECRET);

        let err = client.fetch(&FetchRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_plaid_error_body_surfaces() {
        let server = MockBankServer::start().await;
        let client = client_for(&server, "bad-secret");

        let err = client.create_link_token().await.unwrap_err();
        match err {
            Error::ProviderUnavailable(msg) => assert!(msg.contains("INVALID_API_KEYS")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_config_uses_base_url_override() {
        let mut config = Config::default();
        config.plaid.client_id = Some("cid".into());
        config.plaid.secret = Some("secret".into());
        config.plaid.base_url = Some("http://127.0.0.1:7777/".into());

        let client = PlaidClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:7777");
    }
}
