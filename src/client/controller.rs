//! Client reconnection controller
//!
//! Keeps one logical subscription alive across physical reconnects:
//!
//! ```text
//! Idle ─► Connecting ─► Connected ─(error)─► Reconnecting ─(timer)─► Connecting
//!                                                 │
//!                                   (max attempts)└─► FallenBack (poll)
//! ```
//!
//! Everything runs on a single task, so there is never more than one pending
//! retry timer and shutting the task down cancels streams, timers and pulls.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::backoff::ReconnectPolicy;
use super::fingerprint::Fingerprint;
use super::transport::{ClientError, StatusTransport};
use crate::realtime::Frame;
use crate::types::{MemberStatus, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    /// Waiting out the backoff after `attempt` consecutive failures
    Reconnecting { attempt: u32 },
    /// Periodic pull; terminal until shutdown
    FallenBack,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// New displayed state
    Snapshot(Snapshot),
    /// Values changed; names the most recently timestamped member
    StatusChanged { member: MemberStatus },
    /// Streaming gave up, now polling
    Degraded,
}

pub struct StatusClient {
    transport: Arc<dyn StatusTransport>,
    policy: ReconnectPolicy,
}

impl StatusClient {
    pub fn new(transport: Arc<dyn StatusTransport>, policy: ReconnectPolicy) -> Self {
        Self { transport, policy }
    }

    /// Start the controller task
    pub fn spawn(self) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let mut controller = Controller {
            transport: self.transport,
            policy: self.policy,
            events: events_tx,
            state: state_tx,
            fingerprint: None,
        };

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = controller.run() => {}
                _ = shutdown_rx => {}
            }
            controller.set_state(ConnectionState::Closed);
            tracing::debug!("status client stopped");
        });

        let handle = ClientHandle {
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        };
        (handle, events_rx)
    }
}

/// Owner of a running controller; dropping it aborts the task
pub struct ClientHandle {
    state: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ClientHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop the controller and wait until it has released every resource
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "status client task failed");
            }
        }
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Controller {
    transport: Arc<dyn StatusTransport>,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<ClientEvent>,
    state: watch::Sender<ConnectionState>,
    fingerprint: Option<Fingerprint>,
}

impl Controller {
    async fn run(&mut self) {
        if self.transport.supports_streaming() {
            self.stream_until_exhausted().await;
        } else {
            tracing::info!("transport cannot stream, polling");
        }
        self.poll().await;
    }

    /// Returns once the attempt budget is spent
    async fn stream_until_exhausted(&mut self) {
        let mut attempt = 0u32;
        loop {
            self.set_state(ConnectionState::Connecting);
            let error = self.stream_once(&mut attempt).await;

            attempt += 1;
            match self.policy.retry_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "status stream failed, scheduling reconnect"
                    );
                    self.set_state(ConnectionState::Reconnecting { attempt });
                    time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(
                        error = %error,
                        attempts = attempt,
                        "reconnect attempts exhausted, falling back to polling"
                    );
                    return;
                }
            }
        }
    }

    /// Run one physical connection until it fails.
    ///
    /// The connection counts as established once its initial snapshot
    /// arrives; that resets the attempt counter.
    async fn stream_once(&mut self, attempt: &mut u32) -> ClientError {
        let mut stream = match self.transport.open_stream().await {
            Ok(stream) => stream,
            Err(e) => return e,
        };

        loop {
            match stream.next().await {
                Some(Ok(Frame::Data(json))) => {
                    if self.current_state() != ConnectionState::Connected {
                        self.set_state(ConnectionState::Connected);
                        *attempt = 0;
                        tracing::info!("status stream connected");
                    }
                    match serde_json::from_str::<Snapshot>(&json) {
                        Ok(snapshot) => self.dispatch(snapshot),
                        Err(e) => tracing::warn!(error = %e, "dropping malformed frame"),
                    }
                }
                Some(Ok(Frame::Heartbeat)) => tracing::trace!("heartbeat"),
                Some(Err(e)) => return e,
                None => return ClientError::StreamClosed,
            }
        }
    }

    async fn poll(&mut self) {
        self.set_state(ConnectionState::FallenBack);
        let _ = self.events.send(ClientEvent::Degraded);

        // first tick completes immediately
        let mut ticker = time::interval(self.policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.transport.fetch_snapshot().await {
                Ok(snapshot) => self.dispatch(snapshot),
                Err(e) => tracing::warn!(error = %e, "status poll failed"),
            }
        }
    }

    fn dispatch(&mut self, snapshot: Snapshot) {
        let fingerprint = Fingerprint::of(&snapshot);
        if let Some(previous) = self.fingerprint {
            if previous != fingerprint {
                if let Some(member) = snapshot.latest() {
                    let _ = self.events.send(ClientEvent::StatusChanged {
                        member: member.clone(),
                    });
                }
            }
        }
        self.fingerprint = Some(fingerprint);
        let _ = self.events.send(ClientEvent::Snapshot(snapshot));
    }

    fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}
