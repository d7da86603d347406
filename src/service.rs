//! Status service
//!
//! The write path: validates requests, writes the authoritative store,
//! signals the change source and refreshes the legacy mirror. Reads fall back
//! to the mirror when the store cannot produce a snapshot.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::realtime::ChangeNotifier;
use crate::store::{LegacyMirror, StatusStore, StoreError};
use crate::types::{HistoryPage, HistoryQuery, MemberStatus, Snapshot, StatusUpdate};
use crate::utils::now;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("member '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("status unavailable: {0}")]
    Unavailable(String),
}

pub struct StatusService {
    store: Arc<dyn StatusStore>,
    mirror: Option<LegacyMirror>,
    changes: ChangeNotifier,
    // serializes mirror rewrites so a stale snapshot never lands last
    mirror_lock: Mutex<()>,
}

impl StatusService {
    pub fn new(
        store: Arc<dyn StatusStore>,
        mirror: Option<LegacyMirror>,
        changes: ChangeNotifier,
    ) -> Self {
        Self {
            store,
            mirror,
            changes,
            mirror_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Snapshot for serving; uses the mirror if the store read fails
    pub fn current_snapshot(&self) -> Result<Snapshot, ServiceError> {
        match self.store.snapshot() {
            Ok(snapshot) => Ok(snapshot),
            Err(store_err) => {
                let Some(ref mirror) = self.mirror else {
                    return Err(ServiceError::Unavailable(store_err.to_string()));
                };
                tracing::warn!(error = %store_err, "store read failed, serving legacy mirror");
                mirror.read().map_err(|mirror_err| {
                    ServiceError::Unavailable(format!("{store_err}; mirror: {mirror_err}"))
                })
            }
        }
    }

    /// Upsert a member's status and return the resulting snapshot
    pub fn update(&self, update: StatusUpdate) -> Result<Snapshot, ServiceError> {
        let name = update
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::Validation("name is required".to_string()))?;

        let status: MemberStatus = self.store.upsert(
            name,
            update.activity.as_deref(),
            update.state.as_deref(),
            now(),
        )?;
        self.changes.notify();
        tracing::info!(
            name = %status.name,
            activity = %status.activity,
            state = %status.state,
            "status updated"
        );

        self.refresh_mirror()
    }

    /// Remove a member and its history
    pub fn remove(&self, name: &str) -> Result<Snapshot, ServiceError> {
        if !self.store.delete(name)? {
            return Err(ServiceError::NotFound(name.to_string()));
        }
        self.changes.notify();
        tracing::info!(name, "member removed");

        self.refresh_mirror()
    }

    pub fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ServiceError> {
        Ok(self.store.history(query)?)
    }

    /// Re-read the store and rewrite the mirror. Mirror failures are logged only.
    fn refresh_mirror(&self) -> Result<Snapshot, ServiceError> {
        let _guard = self.mirror_lock.lock();
        let snapshot = self.store.snapshot()?;
        if let Some(ref mirror) = self.mirror {
            if let Err(e) = mirror.write(&snapshot) {
                tracing::warn!(path = %mirror.path().display(), error = %e, "mirror write failed");
            }
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::change_channel;
    use crate::store::MemoryStore;
    use crate::types::HistoryQuery;
    use std::time::Duration;
    use tempfile::TempDir;

    fn service(mirror: Option<LegacyMirror>) -> (StatusService, crate::realtime::ChangeSource) {
        let (notifier, source) = change_channel(Duration::from_millis(100));
        let store: Arc<dyn StatusStore> = Arc::new(MemoryStore::new());
        (StatusService::new(store, mirror, notifier), source)
    }

    #[test]
    fn test_update_requires_name() {
        let (service, _source) = service(None);

        let missing = service.update(StatusUpdate::default());
        let blank = service.update(StatusUpdate::new("   "));

        assert!(matches!(missing, Err(ServiceError::Validation(_))));
        assert!(matches!(blank, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_update_keeps_prior_fields_and_writes_history() {
        let (service, _source) = service(None);

        service.update(StatusUpdate::new("A").activity("home").state("busy")).unwrap();
        let snapshot = service.update(StatusUpdate::new("A").activity("")).unwrap();

        let a = snapshot.get("A").unwrap();
        assert_eq!(a.activity, "home");
        assert_eq!(a.state, "busy");
        assert_eq!(service.history(&HistoryQuery::default()).unwrap().total, 2);
    }

    #[test]
    fn test_update_signals_change() {
        let (service, mut source) = service(None);
        service.update(StatusUpdate::new("A").activity("home")).unwrap();
        assert!(source_has_signal(&mut source));
    }

    #[test]
    fn test_remove_missing_is_not_found_and_silent() {
        let (service, mut source) = service(None);

        let result = service.remove("ghost");

        assert!(matches!(result, Err(ServiceError::NotFound(name)) if name == "ghost"));
        assert!(!source_has_signal(&mut source));
    }

    #[test]
    fn test_mirror_follows_writes() {
        let dir = TempDir::new().unwrap();
        let mirror = LegacyMirror::new(dir.path().join("status.json"));
        let (service, _source) = service(Some(mirror.clone()));

        service.update(StatusUpdate::new("A").activity("home")).unwrap();
        assert_eq!(mirror.read().unwrap().get("A").unwrap().activity, "home");

        service.remove("A").unwrap();
        assert!(mirror.read().unwrap().is_empty());
    }

    #[test]
    fn test_mirror_failure_does_not_fail_write() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be replaced by a file rename
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(blocked.join("child")).unwrap();
        let (service, _source) = service(Some(LegacyMirror::new(&blocked)));

        assert!(service.update(StatusUpdate::new("A").activity("home")).is_ok());
    }

    fn source_has_signal(source: &mut crate::realtime::ChangeSource) -> bool {
        source.try_pending()
    }
}
