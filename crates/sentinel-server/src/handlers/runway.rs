//! Income, estimate and runway handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse};
use sentinel_core::{IncomeSource, ManualEstimate, RunwaySummary};

/// GET /api/income - Recurring income sources
pub async fn list_income(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<IncomeSource>>, AppError> {
    let session = state.session(&headers).await;
    let income = session.lock().await.ledger.income().to_vec();
    Ok(Json(income))
}

/// GET /api/estimates - Manual income estimates
pub async fn list_estimates(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ManualEstimate>>, AppError> {
    let session = state.session(&headers).await;
    let estimates = session.lock().await.ledger.estimates().to_vec();
    Ok(Json(estimates))
}

#[derive(Debug, Deserialize)]
pub struct CreateEstimateRequest {
    pub label: String,
    /// Accepts `"800.00"` or `800`
    pub amount: Decimal,
}

#[derive(Serialize)]
pub struct CreateEstimateResponse {
    pub id: String,
}

/// POST /api/estimates - Add a manual estimate
pub async fn create_estimate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateEstimateRequest>,
) -> Result<Json<CreateEstimateResponse>, AppError> {
    let session = state.session(&headers).await;
    let estimate = session
        .lock()
        .await
        .ledger
        .add_estimate(&body.label, body.amount)?;
    Ok(Json(CreateEstimateResponse { id: estimate.id }))
}

/// DELETE /api/estimates/:id - Remove a manual estimate
pub async fn delete_estimate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    let session = state.session(&headers).await;
    session.lock().await.ledger.remove_estimate(&id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/runway - Burn versus income for the session
pub async fn get_runway(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RunwaySummary>, AppError> {
    let session = state.session(&headers).await;
    let runway = session
        .lock()
        .await
        .ledger
        .runway(state.config.runway.income_policy);
    Ok(Json(runway))
}
