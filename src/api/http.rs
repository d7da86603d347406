//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::{history, status};
use super::sse::stream_handler;
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - status pages may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Current status and its stream
        .route("/api/status", get(status::get_status).post(status::post_status))
        .route("/api/status/stream", get(stream_handler))
        .route("/api/status/:name", delete(status::delete_status))
        // History
        .route("/api/history", get(history::list_history))
        .route("/api/history/:name", get(history::member_history))
        .route("/api/stats", get(status::get_stats))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
