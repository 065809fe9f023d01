//! Inbox handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use sentinel_core::{sync::newest_first, Frequency, Subscription, Transaction};

/// GET /api/transactions - Unreviewed charges, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let session = state.session(&headers).await;
    let mut transactions = session.lock().await.ledger.inbox().to_vec();
    newest_first(&mut transactions);
    Ok(Json(transactions))
}

/// Body for approving a charge
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    /// "monthly" or "yearly"; omitted means infer from the amount
    #[serde(default)]
    pub frequency: Option<String>,
}

impl ApproveRequest {
    /// An empty body means "no choice"; anything else must be valid JSON
    fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::bad_request(&format!("Invalid request body: {}", e)))
    }
}

/// POST /api/transactions/:id/approve - Confirm a charge as a subscription
pub async fn approve_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Subscription>, AppError> {
    let request = ApproveRequest::from_body(&body)?;
    let frequency = request
        .frequency
        .as_deref()
        .map(str::parse::<Frequency>)
        .transpose()?;

    let today = chrono::Local::now().date_naive();
    let session = state.session(&headers).await;
    let subscription = session.lock().await.ledger.approve(&id, frequency, today)?;

    Ok(Json(subscription))
}
