//! Bank provider handlers: Plaid link flow and sync

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, SuccessResponse};
use sentinel_core::{sync_session, BankProvider, ProviderClient, SyncReport};

fn plaid(state: &AppState) -> Result<&ProviderClient, AppError> {
    state
        .plaid
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("Plaid is not configured"))
}

fn simplefin(state: &AppState) -> Result<&ProviderClient, AppError> {
    state
        .simplefin
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("SimpleFIN is not configured"))
}

#[derive(Serialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
}

/// POST /api/create-link-token - Start the Plaid Link flow
pub async fn create_link_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LinkTokenResponse>, AppError> {
    let link_token = plaid(&state)?.create_link_token().await?;
    Ok(Json(LinkTokenResponse { link_token }))
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub public_token: String,
}

/// POST /api/exchange-public-token - Finish the link flow for this session
pub async fn exchange_public_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ExchangeRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if body.public_token.trim().is_empty() {
        return Err(AppError::bad_request("public_token is required"));
    }

    let access_token = plaid(&state)?
        .exchange_public_token(&body.public_token)
        .await?;

    let session = state.session(&headers).await;
    session.lock().await.plaid_access_token = Some(access_token);
    info!(session = %crate::get_session_id(&headers), "Bank linked");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/sync/plaid - Replace the inbox with Plaid transactions
pub async fn sync_plaid(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SyncReport>, AppError> {
    let provider = plaid(&state)?;
    let session = state.session(&headers).await;
    let report = sync_session(&session, provider).await?;
    Ok(Json(report))
}

/// POST /api/sync/simplefin - Replace the inbox with SimpleFIN transactions
pub async fn sync_simplefin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SyncReport>, AppError> {
    let provider = simplefin(&state)?;
    let session = state.session(&headers).await;
    let report = sync_session(&session, provider).await?;
    Ok(Json(report))
}
