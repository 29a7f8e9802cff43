//! Management API router.

use crate::auth;
use crate::handlers::{self, ManagementState};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the management router with all endpoints.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Campaigns
        .route("/api/campaigns", get(handlers::list_campaigns))
        .route("/api/campaigns/:id", get(handlers::get_campaign))
        .route("/api/campaigns/:id/send", post(handlers::send_campaign))
        // Unsubscribe (public)
        .route("/api/unsubscribe", post(handlers::unsubscribe))
        // Jobs
        .route("/api/jobs", get(handlers::list_jobs))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
