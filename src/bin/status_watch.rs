//! Status Board Watcher - follows a server's status stream and logs changes

use std::process::ExitCode;
use std::sync::Arc;

use status_board::client::{ClientEvent, HttpTransport, StatusClient};
use status_board::{logging, ClientConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    logging::init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let transport = match HttpTransport::new(config.url.clone()) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(url = %config.url, "watching status board");
    let (handle, mut events) = StatusClient::new(Arc::new(transport), config.policy).spawn();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Snapshot(snapshot)) => {
                    tracing::debug!(members = snapshot.len(), "snapshot received");
                }
                Some(ClientEvent::StatusChanged { member }) => {
                    tracing::info!(
                        name = %member.name,
                        activity = %member.activity,
                        state = %member.state,
                        at = %member.timestamp,
                        "status changed"
                    );
                }
                Some(ClientEvent::Degraded) => {
                    tracing::warn!(
                        poll_secs = config.policy.poll_interval.as_secs(),
                        "live updates unavailable, polling"
                    );
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    ExitCode::SUCCESS
}
