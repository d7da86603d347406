//! Stream session lifecycle
//!
//! `Handshaking → Streaming → Closed`. A session only exists once the initial
//! snapshot is queued and the subscriber is registered; dropping it (client
//! disconnect drops the response body) unregisters synchronously, so no
//! registry entry outlives its connection.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::realtime::{BroadcastError, Broadcaster, Frame, SubscriberId, SubscriberRegistry};
use crate::types::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Streaming,
    Closed,
}

pub struct StreamSession {
    id: SubscriberId,
    registry: Arc<SubscriberRegistry>,
    rx: mpsc::Receiver<Frame>,
    phase: SessionPhase,
}

impl StreamSession {
    /// Complete the handshake: queue `snapshot` first, then register.
    pub fn open(
        broadcaster: &Broadcaster,
        snapshot: &Snapshot,
        buffer: usize,
    ) -> Result<Self, BroadcastError> {
        let (id, rx) = broadcaster.open_subscription(snapshot, buffer)?;
        let registry = broadcaster.registry().clone();
        tracing::info!(subscriber = %id, subscribers = registry.len(), "stream session opened");

        Ok(Self {
            id,
            registry,
            rx,
            phase: SessionPhase::Streaming,
        })
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Next frame to write; `None` once the session was evicted or closed
    pub async fn next_frame(&mut self) -> Option<Frame> {
        if self.phase == SessionPhase::Closed {
            return None;
        }
        let frame = self.rx.recv().await;
        if frame.is_none() {
            self.close();
        }
        frame
    }

    /// Idempotent transition to `Closed`
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.phase = SessionPhase::Closed;
        self.rx.close();
        self.registry.unregister(self.id);
        tracing::info!(
            subscriber = %self.id,
            subscribers = self.registry.len(),
            "stream session closed"
        );
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}
