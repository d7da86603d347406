//! Status server assembly
//!
//! Wires the store, mirror, change source, broadcaster and HTTP router
//! together and runs them until a shutdown signal arrives.

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::realtime::{
    change_channel, watch_store, Broadcaster, ChangeNotifier, ChangeSource, SubscriberRegistry,
};
use crate::service::StatusService;
use crate::store::{
    import_legacy, ImportError, LegacyMirror, MemoryStore, SqliteStore, StatusStore, StoreError,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("legacy import failed: {0}")]
    Import(#[from] ImportError),
    #[error("store watcher failed: {0}")]
    Watch(#[from] notify::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub struct StatusServer {
    config: Config,
    state: Arc<AppState>,
    notifier: ChangeNotifier,
    changes: ChangeSource,
}

impl StatusServer {
    /// Open the configured store and build the server around it
    pub fn from_config(config: Config) -> Result<Self, ServerError> {
        let store: Arc<dyn StatusStore> = match config.db_path {
            Some(ref path) => {
                tracing::info!(path = %path.display(), "opening sqlite store");
                Arc::new(SqliteStore::open(path)?)
            }
            None => {
                tracing::info!("using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_store(config, store)
    }

    /// Build the server around an existing store
    pub fn with_store(config: Config, store: Arc<dyn StatusStore>) -> Result<Self, ServerError> {
        let mirror = config.mirror_path.clone().map(LegacyMirror::new);
        if let Some(ref mirror) = mirror {
            match import_legacy(store.as_ref(), mirror) {
                Ok(_) => {}
                // an unreadable legacy file must not keep the board offline
                Err(ImportError::Mirror(e)) => {
                    tracing::warn!(
                        error = %e,
                        path = %mirror.path().display(),
                        "skipping legacy import"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let registry = Arc::new(SubscriberRegistry::new(config.max_subscribers));
        let broadcaster = Arc::new(Broadcaster::new(registry, store.clone()));
        let (notifier, changes) = change_channel(config.debounce);
        let service = Arc::new(StatusService::new(store, mirror, notifier.clone()));
        let state = Arc::new(AppState::new(service, broadcaster, config.subscriber_buffer));

        Ok(Self {
            config,
            state,
            notifier,
            changes,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// On shutdown every stream session is released so in-flight streams end
    /// and the graceful shutdown can complete; background tasks are stopped
    /// before returning.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let Self {
            config,
            state,
            notifier,
            changes,
        } = self;

        let watcher = match state.service.store().location() {
            Some(path) if config.watch_store => Some(watch_store(path, notifier.clone())?),
            _ => None,
        };
        drop(notifier);

        let change_task = tokio::spawn(changes.run(state.broadcaster.clone()));
        let heartbeat_task = state.broadcaster.clone().spawn_heartbeat(config.heartbeat);

        tracing::info!(addr = %listener.local_addr()?, "status server listening");

        let registry = state.registry().clone();
        let signal = async move {
            shutdown.await;
            // late handshakes fail instead of holding the drain open
            let released = registry.close();
            tracing::info!(sessions = released, "shutdown signal received");
        };

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await;

        heartbeat_task.abort();
        change_task.abort();
        drop(watcher);

        result?;
        tracing::info!("status server stopped");
        Ok(())
    }
}
