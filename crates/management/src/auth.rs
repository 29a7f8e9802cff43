//! API key middleware.
//!
//! Every route except the public unsubscribe endpoint and the health check
//! requires the configured key in the `x-api-key` header.

use crate::handlers::ManagementState;
use crate::models::ErrorResponse;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const API_KEY_HEADER: &str = "x-api-key";

const PUBLIC_PATHS: &[&str] = &["/api/unsubscribe", "/health"];

pub async fn require_api_key(
    State(state): State<ManagementState>,
    req: Request,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let Some(expected) = state.api_key.as_deref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("API key not configured", "config_error")),
        )
            .into_response();
    };

    let supplied = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if supplied == Some(expected) {
        next.run(req).await
    } else {
        metrics::counter!("api.unauthorized").increment(1);
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Unauthorized", "unauthorized")),
        )
            .into_response()
    }
}
