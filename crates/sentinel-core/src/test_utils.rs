//! Test utilities for sentinel-core
//!
//! A mock bank server that speaks just enough of the SimpleFIN and Plaid
//! APIs for provider tests and local development.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Mock SimpleFIN + Plaid server on an ephemeral port
///
/// Routes:
/// - `GET /simplefin/accounts` (Basic auth `demo` / [`Self::SIMPLEFIN_PASSWORD`])
/// - `POST /link/token/create`, `POST /item/public_token/exchange`,
///   `POST /transactions/get` (Plaid, paginated two at a time)
pub struct MockBankServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Clone)]
struct MockState {
    failing: bool,
}

impl MockBankServer {
    pub const SIMPLEFIN_USERNAME: &'static str = "demo";
    pub const SIMPLEFIN_PASSWORD: &'static str = "sandbox-pass";
    /// `Basic base64("demo:sandbox-pass")`
    const SIMPLEFIN_AUTH: &'static str = "Basic ZGVtbzpzYW5kYm94LXBhc3M=";

    pub const PLAID_CLIENT_ID: &'static str = "mock-client-id";
    pub const PLAID_SECRET: &'static str = "mock-secret";
    pub const PLAID_ACCESS_TOKEN: &'static str = "access-sandbox-mock";
    /// Records served by `/transactions/get`, one of them malformed
    pub const PLAID_TRANSACTION_COUNT: usize = 5;

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockState { failing: false }).await
    }

    /// Start a server that answers every request with 503
    pub async fn start_failing() -> Self {
        Self::start_with(MockState { failing: true }).await
    }

    async fn start_with(state: MockState) -> Self {
        let app = Router::new()
            .route("/simplefin/accounts", get(handle_simplefin_accounts))
            .route("/link/token/create", post(handle_link_token))
            .route("/item/public_token/exchange", post(handle_exchange))
            .route("/transactions/get", post(handle_transactions))
            .with_state(Arc::new(state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for the Plaid routes
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL for the SimpleFIN bridge
    pub fn simplefin_url(&self) -> String {
        format!("{}/simplefin", self.url())
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockBankServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response()
}

fn plaid_error(code: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error_type": "INVALID_INPUT",
            "error_code": code,
            "error_message": message,
        })),
    )
        .into_response()
}

fn check_plaid_keys(client_id: &str, secret: &str) -> Option<Response> {
    if client_id != MockBankServer::PLAID_CLIENT_ID || secret != MockBankServer::PLAID_SECRET {
        return Some(plaid_error(
            "INVALID_API_KEYS",
            "invalid client_id or secret provided",
        ));
    }
    None
}

async fn handle_simplefin_accounts(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> Response {
    if state.failing {
        return unavailable();
    }
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == MockBankServer::SIMPLEFIN_AUTH);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }

    Json(simplefin_fixture()).into_response()
}

#[derive(Deserialize)]
struct LinkTokenRequest {
    client_id: String,
    secret: String,
    user: Value,
    products: Vec<String>,
}

async fn handle_link_token(
    State(state): State<Arc<MockState>>,
    Json(req): Json<LinkTokenRequest>,
) -> Response {
    if state.failing {
        return unavailable();
    }
    if let Some(err) = check_plaid_keys(&req.client_id, &req.secret) {
        return err;
    }
    if req.user.get("client_user_id").is_none() || req.products != ["transactions"] {
        return plaid_error("INVALID_FIELD", "user and products are required");
    }

    Json(json!({
        "link_token": "link-sandbox-6c2f0e39",
        "expiration": "2026-03-22T16:00:00Z",
        "request_id": "mock",
    }))
    .into_response()
}

#[derive(Deserialize)]
struct ExchangeRequest {
    client_id: String,
    secret: String,
    public_token: String,
}

async fn handle_exchange(
    State(state): State<Arc<MockState>>,
    Json(req): Json<ExchangeRequest>,
) -> Response {
    if state.failing {
        return unavailable();
    }
    if let Some(err) = check_plaid_keys(&req.client_id, &req.secret) {
        return err;
    }
    if !req.public_token.starts_with("public-") {
        return plaid_error("INVALID_PUBLIC_TOKEN", "provided public token is in an invalid format");
    }

    Json(json!({
        "access_token": MockBankServer::PLAID_ACCESS_TOKEN,
        "item_id": "item-mock",
        "request_id": "mock",
    }))
    .into_response()
}

#[derive(Deserialize)]
struct TransactionsRequest {
    client_id: String,
    secret: String,
    access_token: String,
    #[serde(default)]
    options: Option<TransactionsOptions>,
}

#[derive(Deserialize)]
struct TransactionsOptions {
    count: usize,
    offset: usize,
}

async fn handle_transactions(
    State(state): State<Arc<MockState>>,
    Json(req): Json<TransactionsRequest>,
) -> Response {
    if state.failing {
        return unavailable();
    }
    if let Some(err) = check_plaid_keys(&req.client_id, &req.secret) {
        return err;
    }
    if req.access_token != MockBankServer::PLAID_ACCESS_TOKEN {
        return plaid_error("INVALID_ACCESS_TOKEN", "provided access token is invalid");
    }

    let all = plaid_fixture();
    let (count, offset) = req
        .options
        .map(|o| (o.count.min(2), o.offset))
        .unwrap_or((2, 0));
    let page: Vec<Value> = all.iter().skip(offset).take(count).cloned().collect();

    Json(json!({
        "transactions": page,
        "total_transactions": all.len(),
        "accounts": [],
    }))
    .into_response()
}

/// Two accounts; the Chase account carries one transaction without an amount
fn simplefin_fixture() -> Value {
    json!({
        "errors": [],
        "accounts": [
            {
                "id": "ACT-chase-1",
                "name": "Sapphire Checking (4521)",
                "currency": "USD",
                "balance": "2480.16",
                "org": {"domain": "www.chase.com", "name": "Chase Bank"},
                "transactions": [
                    {"id": "TRN-1", "posted": 1774180800, "amount": "-150.00",
                     "description": "COSTCO *ANNUAL RENEWAL", "payee": "Costco Membership"},
                    {"id": "TRN-2", "posted": 1772712000, "amount": "-9.99",
                     "description": "NETFLIX.COM"},
                    {"id": "TRN-3", "posted": "1772798400", "amount": "-2.99",
                     "description": "GOOGLE *Google One", "payee": "Google One"},
                    {"id": "TRN-4", "posted": 1772798400, "description": "PENDING HOLD"}
                ]
            },
            {
                "id": "ACT-amex-1",
                "name": "Blue Cash Everyday 1009",
                "currency": "USD",
                "balance": "-612.40",
                "org": {"domain": "americanexpress.com"},
                "transactions": [
                    {"id": "TRN-5", "posted": 1772280000, "amount": "-139.00",
                     "description": "AMAZON PRIME*2K4", "payee": "Amazon Prime"}
                ]
            }
        ]
    })
}

/// Five Plaid transactions; the last has no date
fn plaid_fixture() -> Vec<Value> {
    vec![
        json!({"transaction_id": "pl-1", "account_id": "BxBXxLj1m4HMXBm9WZZmCWVbPjX16EHwv99vp",
               "amount": 15.99, "date": "2026-03-02", "name": "NETFLIX.COM",
               "merchant_name": "Netflix", "category": ["Service", "Subscription"]}),
        json!({"transaction_id": "pl-2", "account_id": "BxBXxLj1m4HMXBm9WZZmCWVbPjX16EHwv99vp",
               "amount": 10.99, "date": "2026-03-04", "name": "Spotify USA",
               "merchant_name": null, "category": ["Service"]}),
        json!({"transaction_id": "pl-3", "account_id": "vzeNDwK7KQIm4yEog683uElbp9GRLEFXGK98D",
               "amount": 659.88, "date": "2026-02-14", "name": "ADOBE *CREATIVE CLD",
               "merchant_name": "Adobe", "category": null}),
        json!({"transaction_id": "pl-4", "account_id": "vzeNDwK7KQIm4yEog683uElbp9GRLEFXGK98D",
               "amount": -2500.0, "date": "2026-03-01", "name": "ACME CORP PAYROLL",
               "merchant_name": "Acme Corp", "category": ["Transfer", "Payroll"]}),
        json!({"transaction_id": "pl-5", "account_id": "vzeNDwK7KQIm4yEog683uElbp9GRLEFXGK98D",
               "amount": 4.5, "name": "STARBUCKS", "merchant_name": "Starbucks"}),
    ]
}
