//! In-memory status store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{StatusStore, StoreResult};
use crate::types::{HistoryEntry, HistoryPage, HistoryQuery, MemberStatus, Snapshot};

#[derive(Default)]
struct Tables {
    members: BTreeMap<String, MemberStatus>,
    history: Vec<HistoryEntry>,
    next_id: i64,
}

impl Tables {
    fn record(&mut self, status: &MemberStatus) {
        self.next_id += 1;
        self.history.push(HistoryEntry {
            id: self.next_id,
            name: status.name.clone(),
            activity: status.activity.clone(),
            state: status.state.clone(),
            changed_at: status.timestamp,
        });
        self.members.insert(status.name.clone(), status.clone());
    }
}

/// Store kept entirely in process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusStore for MemoryStore {
    fn snapshot(&self) -> StoreResult<Snapshot> {
        let tables = self.tables.read();
        Ok(Snapshot::new(tables.members.values().cloned().collect()))
    }

    fn get(&self, name: &str) -> StoreResult<Option<MemberStatus>> {
        Ok(self.tables.read().members.get(name).cloned())
    }

    fn upsert(
        &self,
        name: &str,
        activity: Option<&str>,
        state: Option<&str>,
        at: DateTime<Utc>,
    ) -> StoreResult<MemberStatus> {
        let mut tables = self.tables.write();
        let status = MemberStatus::merged(tables.members.get(name), name, activity, state, at);
        tables.record(&status);
        Ok(status)
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.members.remove(name).is_none() {
            return Ok(false);
        }
        tables.history.retain(|entry| entry.name != name);
        Ok(true)
    }

    fn history(&self, query: &HistoryQuery) -> StoreResult<HistoryPage> {
        let tables = self.tables.read();
        let mut matching: Vec<&HistoryEntry> =
            tables.history.iter().filter(|e| query.matches(e)).collect();
        matching.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(b.id.cmp(&a.id)));

        let limit = query.normalized_limit();
        Ok(HistoryPage {
            total: matching.len(),
            entries: matching
                .into_iter()
                .skip(query.offset)
                .take(limit)
                .cloned()
                .collect(),
            limit,
            offset: query.offset,
        })
    }

    fn import(&self, members: &[MemberStatus]) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let mut inserted = 0;
        for member in members {
            if !tables.members.contains_key(&member.name) {
                tables.record(member);
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[test]
    fn test_upsert_merges_and_records_history() {
        conformance::upsert_merges_and_records_history(&MemoryStore::new());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        conformance::snapshot_is_sorted(&MemoryStore::new());
    }

    #[test]
    fn test_delete_cascades() {
        conformance::delete_cascades(&MemoryStore::new());
    }

    #[test]
    fn test_history_range_and_paging() {
        conformance::history_range_and_paging(&MemoryStore::new());
    }

    #[test]
    fn test_import_skips_existing() {
        conformance::import_skips_existing(&MemoryStore::new());
    }
}
