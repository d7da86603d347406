//! Snapshot broadcaster
//!
//! Reads the authoritative snapshot from the store, serializes it once and
//! pushes the shared frame to every registered subscriber. Writes never block:
//! a closed channel or a full queue marks the subscriber, and all marked
//! subscribers are removed together after the pass.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::{Frame, FrameSender, RegistryError, SubscriberId, SubscriberRegistry};
use crate::store::{StatusStore, StoreError};
use crate::types::Snapshot;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to read snapshot: {0}")]
    Store(#[from] StoreError),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Outcome of one fan-out pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub evicted: usize,
}

pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    store: Arc<dyn StatusStore>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>, store: Arc<dyn StatusStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Read the current snapshot and push it to every subscriber
    pub fn broadcast_snapshot(&self) -> Result<BroadcastReport, BroadcastError> {
        let snapshot = self.store.snapshot()?;
        let frame = Frame::snapshot(&snapshot)?;
        Ok(self.deliver(frame))
    }

    /// Send a keep-alive comment to every subscriber
    pub fn heartbeat(&self) -> BroadcastReport {
        self.deliver(Frame::Heartbeat)
    }

    /// Fan one frame out, then evict every subscriber whose write failed
    pub fn deliver(&self, frame: Frame) -> BroadcastReport {
        let mut failed: Vec<SubscriberId> = Vec::new();
        let mut delivered = 0;

        self.registry.for_each(|id, sender| match sender.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(subscriber = %id, "subscriber queue full, evicting");
                failed.push(id);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(subscriber = %id, "subscriber channel closed, evicting");
                failed.push(id);
            }
        });

        let evicted = self.registry.unregister_all(&failed);
        BroadcastReport { delivered, evicted }
    }

    /// Handshake path: queue `snapshot` as the first frame of a new session,
    /// then register it. Nothing is registered if any step fails.
    pub fn open_subscription(
        &self,
        snapshot: &Snapshot,
        buffer: usize,
    ) -> Result<(SubscriberId, mpsc::Receiver<Frame>), BroadcastError> {
        let frame = Frame::snapshot(snapshot)?;
        let (tx, rx) = mpsc::channel(buffer.max(1));
        Self::send_initial(&tx, frame);
        let id = self.registry.register(tx)?;
        Ok((id, rx))
    }

    fn send_initial(tx: &FrameSender, frame: Frame) {
        // a fresh channel always has room for one frame
        let _ = tx.try_send(frame);
    }

    /// Send heartbeats every `period` until the task is aborted
    pub fn spawn_heartbeat(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            timer.tick().await;

            loop {
                timer.tick().await;
                let report = self.heartbeat();
                tracing::trace!(
                    delivered = report.delivered,
                    evicted = report.evicted,
                    "heartbeat sent"
                );
            }
        })
    }
}
