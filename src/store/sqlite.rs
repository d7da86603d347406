//! SQLite-backed status store

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{StatusStore, StoreError, StoreResult};
use crate::types::{HistoryEntry, HistoryPage, HistoryQuery, MemberStatus, Snapshot};
use crate::utils::{decode_time, encode_time};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS members (
    name        TEXT PRIMARY KEY,
    activity    TEXT NOT NULL DEFAULT '',
    state       TEXT NOT NULL DEFAULT '',
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    member      TEXT NOT NULL REFERENCES members(name) ON DELETE CASCADE,
    activity    TEXT NOT NULL,
    state       TEXT NOT NULL,
    changed_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_changed_at ON history(changed_at);
CREATE INDEX IF NOT EXISTS idx_history_member ON history(member, changed_at);
"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file at `path`, enable WAL mode, and create the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn select_member(conn: &Connection, name: &str) -> StoreResult<Option<MemberStatus>> {
        let row = conn
            .query_row(
                "SELECT name, activity, state, updated_at FROM members WHERE name = ?1",
                params![name],
                raw_member,
            )
            .optional()?;
        row.map(RawMember::into_status).transpose()
    }

    fn insert_member(conn: &Connection, status: &MemberStatus) -> StoreResult<()> {
        let at = encode_time(&status.timestamp);
        conn.execute(
            "INSERT INTO members (name, activity, state, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                activity = excluded.activity,
                state = excluded.state,
                updated_at = excluded.updated_at",
            params![status.name, status.activity, status.state, at],
        )?;
        conn.execute(
            "INSERT INTO history (member, activity, state, changed_at) VALUES (?1, ?2, ?3, ?4)",
            params![status.name, status.activity, status.state, at],
        )?;
        Ok(())
    }
}

impl StatusStore for SqliteStore {
    fn snapshot(&self) -> StoreResult<Snapshot> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT name, activity, state, updated_at FROM members ORDER BY name")?;
        let members = stmt
            .query_map([], raw_member)?
            .map(|row| row.map_err(StoreError::from).and_then(RawMember::into_status))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Snapshot::new(members))
    }

    fn get(&self, name: &str) -> StoreResult<Option<MemberStatus>> {
        let conn = self.conn.lock();
        Self::select_member(&conn, name)
    }

    fn upsert(
        &self,
        name: &str,
        activity: Option<&str>,
        state: Option<&str>,
        at: DateTime<Utc>,
    ) -> StoreResult<MemberStatus> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let prior = Self::select_member(&tx, name)?;
        let status = MemberStatus::merged(prior.as_ref(), name, activity, state, at);
        Self::insert_member(&tx, &status)?;

        tx.commit()?;
        Ok(status)
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM members WHERE name = ?1", params![name])?;
        Ok(removed > 0)
    }

    fn history(&self, query: &HistoryQuery) -> StoreResult<HistoryPage> {
        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(ref name) = query.name {
            args.push(name.clone());
            clauses.push(format!("member = ?{}", args.len()));
        }
        if let Some(ref from) = query.from {
            args.push(encode_time(from));
            clauses.push(format!("changed_at >= ?{}", args.len()));
        }
        if let Some(ref to) = query.to {
            args.push(encode_time(to));
            clauses.push(format!("changed_at <= ?{}", args.len()));
        }
        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let limit = query.normalized_limit();
        let conn = self.conn.lock();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM history {filter}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT id, member, activity, state, changed_at FROM history {filter}
             ORDER BY changed_at DESC, id DESC LIMIT {limit} OFFSET {offset}",
            offset = query.offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .map(|row| -> StoreResult<HistoryEntry> {
                let (id, name, activity, state, changed_at) = row?;
                Ok(HistoryEntry {
                    id,
                    name,
                    activity,
                    state,
                    changed_at: parse_time(&changed_at)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(HistoryPage {
            entries,
            total: usize::try_from(total).unwrap_or_default(),
            limit,
            offset: query.offset,
        })
    }

    fn import(&self, members: &[MemberStatus]) -> StoreResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut inserted = 0;
        for member in members {
            if Self::select_member(&tx, &member.name)?.is_none() {
                Self::insert_member(&tx, member)?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Row as stored, before timestamp parsing
struct RawMember {
    name: String,
    activity: String,
    state: String,
    updated_at: String,
}

impl RawMember {
    fn into_status(self) -> StoreResult<MemberStatus> {
        Ok(MemberStatus {
            timestamp: parse_time(&self.updated_at)?,
            name: self.name,
            activity: self.activity,
            state: self.state,
        })
    }
}

fn raw_member(row: &Row<'_>) -> rusqlite::Result<RawMember> {
    Ok(RawMember {
        name: row.get(0)?,
        activity: row.get(1)?,
        state: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn parse_time(text: &str) -> StoreResult<DateTime<Utc>> {
    decode_time(text).map_err(|e| StoreError::Corrupt(format!("bad timestamp '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use tempfile::TempDir;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_upsert_merges_and_records_history() {
        conformance::upsert_merges_and_records_history(&store());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        conformance::snapshot_is_sorted(&store());
    }

    #[test]
    fn test_delete_cascades() {
        conformance::delete_cascades(&store());
    }

    #[test]
    fn test_history_range_and_paging() {
        conformance::history_range_and_paging(&store());
    }

    #[test]
    fn test_import_skips_existing() {
        conformance::import_skips_existing(&store());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("status.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert("alice", Some("home"), None, crate::utils::now()).unwrap();
            assert_eq!(store.location(), Some(path.as_path()));
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let snapshot = reopened.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.members[0].activity, "home");
    }

    #[test]
    fn test_timestamps_round_trip() {
        let store = store();
        let at = crate::utils::now();
        let written = store.upsert("alice", Some("home"), None, at).unwrap();

        assert_eq!(store.get("alice").unwrap().unwrap().timestamp, written.timestamp);
    }
}
