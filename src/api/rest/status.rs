//! Current status endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;

use super::ApiError;
use crate::api::state::AppState;
use crate::types::{Snapshot, StatusUpdate};

/// GET /api/status - Full current snapshot
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.service.current_snapshot()?))
}

/// POST /api/status - Upsert one member, returns the updated snapshot
pub async fn post_status(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Snapshot>, ApiError> {
    let Json(update) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(state.service.update(update)?))
}

/// DELETE /api/status/:name - Remove a member and its history
pub async fn delete_status(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.service.remove(&name)?))
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub subscribers: usize,
    pub members: usize,
}

/// GET /api/stats - Operational counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, ApiError> {
    let members = state.service.current_snapshot()?.len();
    Ok(Json(Stats {
        subscribers: state.registry().len(),
        members,
    }))
}
