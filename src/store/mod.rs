//! Status storage
//!
//! The store is the authoritative owner of current member statuses and their
//! history. Two backends implement [`StatusStore`]:
//!
//! - [`SqliteStore`]: durable, file-backed (rusqlite)
//! - [`MemoryStore`]: process-local, used for tests and `:memory:` deployments
//!
//! [`LegacyMirror`] keeps the flat `status.json` layout in step with the store
//! on a best-effort basis, and [`import_legacy`] seeds an empty store from it.

mod import;
mod memory;
mod mirror;
mod sqlite;

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{HistoryPage, HistoryQuery, MemberStatus, Snapshot};

pub use import::{import_legacy, ImportError, ImportResult};
pub use memory::MemoryStore;
pub use mirror::{LegacyMirror, MirrorError};
pub use sqlite::SqliteStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read/upsert/delete/range-query access to member statuses.
///
/// `upsert` writes the current status and its history row atomically.
/// `delete` cascades to the member's history.
pub trait StatusStore: Send + Sync {
    /// All current statuses, ordered by name
    fn snapshot(&self) -> StoreResult<Snapshot>;

    fn get(&self, name: &str) -> StoreResult<Option<MemberStatus>>;

    /// Merge an update into the member's current status and append one history row
    fn upsert(
        &self,
        name: &str,
        activity: Option<&str>,
        state: Option<&str>,
        at: DateTime<Utc>,
    ) -> StoreResult<MemberStatus>;

    /// Remove a member and its history. Returns false if the member did not exist.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    fn history(&self, query: &HistoryQuery) -> StoreResult<HistoryPage>;

    /// Insert statuses for members not yet present, keeping their timestamps.
    /// Returns the number of members inserted.
    fn import(&self, members: &[MemberStatus]) -> StoreResult<usize>;

    /// Backing file, if any (watched for external changes)
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Behaviour every backend must share
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    pub fn upsert_merges_and_records_history(store: &dyn StatusStore) {
        store.upsert("alice", Some("home"), None, at(10)).unwrap();
        let updated = store.upsert("alice", None, Some("busy"), at(20)).unwrap();

        assert_eq!(updated.activity, "home");
        assert_eq!(updated.state, "busy");
        assert_eq!(updated.timestamp, at(20));
        assert_eq!(store.get("alice").unwrap(), Some(updated));

        let page = store.history(&HistoryQuery::for_member("alice")).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.entries[0].changed_at, at(20));
        assert_eq!(page.entries[1].activity, "home");
        assert!(page.entries[0].id > page.entries[1].id);
    }

    pub fn snapshot_is_sorted(store: &dyn StatusStore) {
        store.upsert("carol", Some("x"), None, at(1)).unwrap();
        store.upsert("alice", Some("y"), None, at(2)).unwrap();

        let snapshot = store.snapshot().unwrap();
        let names: Vec<&str> = snapshot.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "carol"]);
    }

    pub fn delete_cascades(store: &dyn StatusStore) {
        store.upsert("alice", Some("home"), None, at(1)).unwrap();
        store.upsert("bob", Some("work"), None, at(2)).unwrap();

        assert!(store.delete("alice").unwrap());
        assert!(!store.delete("alice").unwrap());

        assert!(store.get("alice").unwrap().is_none());
        let all = store.history(&HistoryQuery::default()).unwrap();
        assert_eq!(all.total, 1);
        assert_eq!(all.entries[0].name, "bob");
    }

    pub fn history_range_and_paging(store: &dyn StatusStore) {
        for i in 0..5 {
            store.upsert("alice", Some(&format!("a{i}")), None, at(i * 10)).unwrap();
        }

        let ranged = store
            .history(&HistoryQuery {
                from: Some(at(10)),
                to: Some(at(30)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ranged.total, 3);
        assert_eq!(ranged.entries[0].activity, "a3");

        let paged = store
            .history(&HistoryQuery {
                limit: 2,
                offset: 1,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paged.total, 5);
        assert_eq!(paged.entries.len(), 2);
        assert_eq!(paged.entries[0].activity, "a3");
        assert_eq!(paged.limit, 2);
        assert_eq!(paged.offset, 1);
    }

    pub fn import_skips_existing(store: &dyn StatusStore) {
        store.upsert("alice", Some("live"), None, at(50)).unwrap();

        let inserted = store
            .import(&[
                MemberStatus::new("alice", "stale", "", at(1)),
                MemberStatus::new("bob", "legacy", "idle", at(2)),
            ])
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(store.get("alice").unwrap().unwrap().activity, "live");
        let bob = store.get("bob").unwrap().unwrap();
        assert_eq!(bob.state, "idle");
        assert_eq!(bob.timestamp, at(2));
        assert_eq!(store.history(&HistoryQuery::for_member("bob")).unwrap().total, 1);
    }
}
