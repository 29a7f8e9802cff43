//! Axum REST handlers for the management API.

use crate::models::*;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use campaign_core::error::CampaignError;
use campaign_core::store::{MessageStore, UnsubscribeRegistry};
use campaign_core::types::{CampaignDetail, CampaignSummary, DispatchStats, Job};
use campaign_dispatch::{DispatchMode, Dispatcher};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Number of jobs returned by `GET /api/jobs`.
const RECENT_JOBS: usize = 20;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<dyn MessageStore>,
    pub registry: Arc<dyn UnsubscribeRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub api_key: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: CampaignError) -> ApiError {
    let (status, code) = match &e {
        CampaignError::CampaignNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CampaignError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        CampaignError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status.is_server_error() {
        error!(error = %e, "request failed");
    }
    metrics::counter!("api.errors", "code" => code).increment(1);
    let message = match e {
        CampaignError::CampaignNotFound(_) => "Campaign not found".to_string(),
        CampaignError::Validation(msg) | CampaignError::Config(msg) => msg,
        other => other.to_string(),
    };
    (status, Json(ErrorResponse::new(message, code)))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(
    State(state): State<ManagementState>,
) -> Result<Json<Vec<CampaignSummary>>, ApiError> {
    state.store.list_campaigns().await.map(Json).map_err(api_error)
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignDetail>, ApiError> {
    state
        .store
        .campaign_detail(id)
        .await
        .map_err(api_error)?
        .map(Json)
        .ok_or_else(|| api_error(CampaignError::CampaignNotFound(id)))
}

/// POST /api/campaigns/:id/send — run the dispatch engine for one campaign.
pub async fn send_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SendQuery>,
    body: Option<Json<SendRequest>>,
) -> Result<Json<DispatchStats>, ApiError> {
    let test_mode = query.is_test_mode() || body.is_some_and(|Json(b)| b.test_mode);
    let stats = state
        .dispatcher
        .dispatch(id, DispatchMode::from_test_flag(test_mode))
        .await
        .map_err(api_error)?;
    Ok(Json(stats))
}

// ─── Unsubscribe ───────────────────────────────────────────────────────────

pub async fn unsubscribe(
    State(state): State<ManagementState>,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<(StatusCode, Json<UnsubscribeResponse>), ApiError> {
    let phone = state.registry.add(&req.phone).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(UnsubscribeResponse { phone })))
}

// ─── Jobs ──────────────────────────────────────────────────────────────────

pub async fn list_jobs(State(state): State<ManagementState>) -> Result<Json<Vec<Job>>, ApiError> {
    state
        .store
        .list_jobs(RECENT_JOBS)
        .await
        .map(Json)
        .map_err(api_error)
}
