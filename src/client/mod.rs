//! Status stream client
//!
//! A [`StatusClient`] follows `/api/status/stream` through a
//! [`StatusTransport`], reconnecting with linear backoff and falling back to
//! polling `/api/status` once reconnects are exhausted.

pub mod backoff;
pub mod controller;
pub mod decoder;
pub mod fingerprint;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use controller::{ClientEvent, ClientHandle, ConnectionState, StatusClient};
pub use decoder::SseDecoder;
pub use fingerprint::Fingerprint;
pub use transport::{ClientError, FrameStream, HttpTransport, StatusTransport};
