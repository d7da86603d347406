//! SSE (Server-Sent Events) status stream
//!
//! `GET /api/status/stream` delivers one `data:` frame with the full snapshot
//! immediately, a new `data:` frame after each settled change, and a
//! `:heartbeat` comment every heartbeat period.
//!
//! ## Proxy buffering
//! Reverse proxies such as nginx buffer responses by default, which would hold
//! every frame until the buffer fills or the connection ends. The response
//! therefore always carries `X-Accel-Buffering: no` together with
//! `Cache-Control: no-cache, no-store, must-revalidate`. Deployments behind a
//! proxy that ignores this header must disable buffering for this path in the
//! proxy configuration.

pub mod handler;
pub mod session;

use axum::http::HeaderName;

/// Asks reverse proxies not to buffer the response
pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub const CACHE_CONTROL_NO_STORE: &str = "no-cache, no-store, must-revalidate";

pub use handler::stream_handler;
pub use session::{SessionPhase, StreamSession};
