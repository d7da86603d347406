//! History endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::ApiError;
use crate::api::state::AppState;
use crate::types::{HistoryPage, HistoryQuery, DEFAULT_HISTORY_LIMIT};
use crate::utils::decode_time;

/// Query parameters for history listing
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    /// Inclusive lower bound (RFC 3339)
    pub from: Option<String>,
    /// Inclusive upper bound (RFC 3339)
    pub to: Option<String>,
    /// Page size (default: 100, max: 1000)
    pub limit: Option<usize>,
    /// Entries to skip
    pub offset: Option<i64>,
}

impl HistoryParams {
    fn into_query(self, name: Option<String>) -> Result<HistoryQuery, ApiError> {
        let offset = match self.offset {
            Some(offset) if offset < 0 => {
                return Err(ApiError::bad_request("offset must be non-negative"))
            }
            Some(offset) => usize::try_from(offset).unwrap_or(usize::MAX),
            None => 0,
        };

        let query = HistoryQuery {
            name,
            from: parse_bound("from", self.from.as_deref())?,
            to: parse_bound("to", self.to.as_deref())?,
            limit: self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            offset,
        };
        Ok(HistoryQuery {
            limit: query.normalized_limit(),
            ..query
        })
    }
}

fn parse_bound(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(text) => decode_time(text)
            .map(Some)
            .map_err(|e| ApiError::bad_request(format!("invalid '{field}' timestamp: {e}"))),
    }
}

fn query_params(
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<HistoryParams, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// GET /api/history - History of all members, newest first
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryPage>, ApiError> {
    let query = query_params(params)?.into_query(None)?;
    Ok(Json(state.service.history(&query)?))
}

/// GET /api/history/:name - History of one member
pub async fn member_history(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryPage>, ApiError> {
    let query = query_params(params)?.into_query(Some(name))?;
    Ok(Json(state.service.history(&query)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_HISTORY_LIMIT;

    #[test]
    fn test_defaults() {
        let query = HistoryParams::default().into_query(None).unwrap();
        assert_eq!(query.limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_limit_capped() {
        let params = HistoryParams {
            limit: Some(50_000),
            ..Default::default()
        };
        assert_eq!(params.into_query(None).unwrap().limit, MAX_HISTORY_LIMIT);
    }

    #[test]
    fn test_negative_offset_rejected() {
        let params = HistoryParams {
            offset: Some(-1),
            ..Default::default()
        };
        assert!(params.into_query(None).is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let params = HistoryParams {
            from: Some("yesterday".to_string()),
            ..Default::default()
        };
        let err = params.into_query(None).unwrap_err();
        assert_eq!(err.code, "BAD_REQUEST");
    }
}
