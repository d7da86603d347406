//! Real-time change distribution
//!
//! ```text
//! write path ──notify()──► ChangeSource ──(100ms quiet)──► Broadcaster
//!                                                            │ reads store,
//!                                                            │ serializes once
//!                                                            ▼
//!                                                   SubscriberRegistry
//!                                                   ┌────┬────┬────┐
//!                                                   sub  sub  sub  (mpsc queues)
//! ```
//!
//! - Debounce: a burst of signals collapses into one read-and-broadcast cycle
//! - Eviction: closed or stalled subscribers are removed after each pass
//! - Heartbeat: `:heartbeat` comment every 30s through the same eviction path

pub mod broadcaster;
pub mod change;
pub mod frame;
pub mod registry;
pub mod watch;

pub use broadcaster::{BroadcastError, BroadcastReport, Broadcaster};
pub use change::{change_channel, ChangeNotifier, ChangeSource, DEFAULT_DEBOUNCE};
pub use frame::{Frame, HEARTBEAT_COMMENT};
pub use registry::{FrameSender, RegistryError, SubscriberId, SubscriberRegistry};
pub use watch::{watch_store, StoreWatcher};
