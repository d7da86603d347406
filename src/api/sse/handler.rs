//! Status stream handler

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{sse::Event, IntoResponse, Response, Sse},
};

use super::session::StreamSession;
use super::{CACHE_CONTROL_NO_STORE, X_ACCEL_BUFFERING};
use crate::api::rest::ApiError;
use crate::api::state::AppState;

/// GET /api/status/stream - Snapshot stream
///
/// Handshake: read the current snapshot (mirror fallback applies), queue it as
/// the first frame, register the session, then return headers that disable
/// caching and proxy buffering. If any step fails the client gets an error
/// response and nothing stays registered.
pub async fn stream_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = match state.service.current_snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, "stream handshake failed");
            return ApiError::from(e).into_response();
        }
    };

    let mut session =
        match StreamSession::open(&state.broadcaster, &snapshot, state.subscriber_buffer) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "stream handshake failed");
                return ApiError::from(e).into_response();
            }
        };

    let stream = async_stream::stream! {
        while let Some(frame) = session.next_frame().await {
            yield Ok::<Event, Infallible>(frame.into());
        }
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, CACHE_CONTROL_NO_STORE),
            (header::CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        Sse::new(stream),
    )
        .into_response()
}
