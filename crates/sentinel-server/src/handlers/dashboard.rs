//! Health and dashboard handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use sentinel_core::BurnSummary;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub inbox_count: usize,
    pub approved_count: usize,
    pub burn: BurnSummary,
    pub plaid_connected: bool,
    pub plaid_configured: bool,
    pub simplefin_configured: bool,
}

/// GET /api/dashboard - Counts and burn figures for the session
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    let session = state.session(&headers).await;
    let session = session.lock().await;

    Ok(Json(DashboardResponse {
        inbox_count: session.ledger.inbox().len(),
        approved_count: session.ledger.approved().len(),
        burn: session.ledger.burn_summary(),
        plaid_connected: session.is_plaid_connected(),
        plaid_configured: state.plaid.is_some(),
        simplefin_configured: state.simplefin.is_some(),
    }))
}
