//! API module for HTTP and SSE endpoints
//!
//! This module provides the REST API and the real-time status stream.

pub mod http;
pub mod rest;
pub mod sse;
pub mod state;

pub use http::create_router;
pub use state::AppState;
