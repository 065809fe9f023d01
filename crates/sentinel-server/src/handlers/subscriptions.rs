//! Approved subscription handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use sentinel_core::{Subscription, Transaction};

/// GET /api/subscriptions - Approved subscriptions
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Subscription>>, AppError> {
    let session = state.session(&headers).await;
    let subscriptions = session.lock().await.ledger.approved().to_vec();
    Ok(Json(subscriptions))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: String,
}

/// PUT /api/subscriptions/:id/notes - Replace a subscription's notes
pub async fn update_subscription_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateNotesRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let session = state.session(&headers).await;
    session.lock().await.ledger.set_notes(&id, body.notes)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/subscriptions/:id/unapprove - Send back to the inbox
///
/// Notes, billing day and frequency are discarded; the restored charge is
/// dated on the approval day.
pub async fn unapprove_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Transaction>, AppError> {
    let session = state.session(&headers).await;
    let transaction = session.lock().await.ledger.unapprove(&id)?;
    Ok(Json(transaction))
}

/// DELETE /api/subscriptions/:id - Remove without returning to the inbox
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    let session = state.session(&headers).await;
    session.lock().await.ledger.remove(&id)?;
    Ok(Json(SuccessResponse { success: true }))
}
