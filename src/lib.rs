//! Status Board
//!
//! A small-group status board: members post what they are doing, and every
//! open viewer sees the change within about 100ms over a Server-Sent Events
//! stream.
//!
//! # Features
//!
//! - **Debounced fan-out**: bursts of writes collapse into one broadcast
//! - **Non-blocking delivery**: stalled or closed viewers are evicted
//! - **Proxy-safe streaming**: heartbeats plus `X-Accel-Buffering: no`
//! - **Reconnecting client**: linear backoff, then periodic polling
//! - **Durable store**: SQLite with history, mirrored to a legacy JSON file
//!
//! # Modules
//!
//! - `types`: Member status, snapshot and history types
//! - `store`: `StatusStore` trait, SQLite and in-memory stores, legacy mirror
//! - `realtime`: Change source, subscriber registry and broadcaster
//! - `service`: Write path and snapshot reads
//! - `api`: REST endpoints and the status stream
//! - `client`: Reconnection controller and HTTP transport
//! - `server`: Assembly and graceful shutdown
//! - `config`: Environment configuration
//!
//! # Example
//!
//! ```no_run
//! use status_board::{Config, StatusServer};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::in_memory();
//!     let listener = TcpListener::bind(config.bind).await?;
//!     let server = StatusServer::from_config(config)?;
//!     server
//!         .serve(listener, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod logging;
pub mod realtime;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use client::{ClientEvent, ConnectionState, HttpTransport, ReconnectPolicy, StatusClient};
pub use config::{ClientConfig, Config};
pub use server::{ServerError, StatusServer};
pub use service::{ServiceError, StatusService};
pub use store::{MemoryStore, SqliteStore, StatusStore};
pub use types::{HistoryEntry, HistoryPage, HistoryQuery, MemberStatus, Snapshot, StatusUpdate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
