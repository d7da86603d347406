//! Shared application state

use std::sync::Arc;

use crate::realtime::{Broadcaster, SubscriberRegistry};
use crate::service::StatusService;

/// State shared by every HTTP handler
pub struct AppState {
    /// Write path and snapshot reads
    pub service: Arc<StatusService>,

    /// Fan-out to stream sessions (owns the subscriber registry)
    pub broadcaster: Arc<Broadcaster>,

    /// Frames queued per subscriber before it counts as stalled
    pub subscriber_buffer: usize,
}

impl AppState {
    pub fn new(
        service: Arc<StatusService>,
        broadcaster: Arc<Broadcaster>,
        subscriber_buffer: usize,
    ) -> Self {
        Self {
            service,
            broadcaster,
            subscriber_buffer,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        self.broadcaster.registry()
    }
}
