//! Debounced change source
//!
//! Writers call [`ChangeNotifier::notify`]; the [`ChangeSource`] task waits for
//! the signals to settle for one quiet window and then runs exactly one
//! broadcast, which re-reads state from the store. A burst of writes inside
//! the window therefore produces a single frame reflecting the last write.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use super::Broadcaster;

/// Default quiet period before a broadcast
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Cloneable handle used by write paths and watchers to mark state dirty
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    tx: mpsc::Sender<()>,
}

impl ChangeNotifier {
    /// Signal a change. Never blocks; a signal already pending absorbs this one.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Receiving side, run as a single task
pub struct ChangeSource {
    rx: mpsc::Receiver<()>,
    window: Duration,
}

/// Create a connected notifier/source pair
pub fn change_channel(window: Duration) -> (ChangeNotifier, ChangeSource) {
    let (tx, rx) = mpsc::channel(1);
    (ChangeNotifier { tx }, ChangeSource { rx, window })
}

impl ChangeSource {
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Consume a pending signal without waiting
    #[cfg(test)]
    pub(crate) fn try_pending(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Run until every notifier is dropped
    pub async fn run(mut self, broadcaster: Arc<Broadcaster>) {
        while self.rx.recv().await.is_some() {
            let closed = self.settle().await;

            match broadcaster.broadcast_snapshot() {
                Ok(report) => tracing::debug!(
                    delivered = report.delivered,
                    evicted = report.evicted,
                    "snapshot broadcast"
                ),
                Err(e) => tracing::warn!(error = %e, "skipping broadcast cycle"),
            }

            if closed {
                break;
            }
        }
    }

    /// Wait until no signal arrives for a whole window. Returns true if the
    /// channel closed meanwhile.
    async fn settle(&mut self) -> bool {
        loop {
            match timeout(self.window, self.rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return true,
                Err(_) => return false,
            }
        }
    }
}
