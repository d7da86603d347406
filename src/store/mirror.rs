//! Legacy flat-file mirror
//!
//! The mirror holds `{ "members": [...] }` in the layout older deployments
//! read directly. The store stays authoritative; the mirror is rewritten after
//! each change and may lag behind it. It is read only when the store cannot
//! serve a snapshot, and once at startup to seed an empty store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Snapshot;
use crate::utils::atomic_write;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror io error: {0}")]
    Io(#[from] io::Error),
    #[error("mirror json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct LegacyMirror {
    path: PathBuf,
}

impl LegacyMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the mirror with `snapshot`
    pub fn write(&self, snapshot: &Snapshot) -> Result<(), MirrorError> {
        let content = serde_json::to_vec_pretty(snapshot)?;
        atomic_write(&self.path, &content)?;
        Ok(())
    }

    pub fn read(&self) -> Result<Snapshot, MirrorError> {
        let content = fs::read(&self.path)?;
        let snapshot: Snapshot = serde_json::from_slice(&content)?;
        Ok(Snapshot::new(snapshot.members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemberStatus;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = LegacyMirror::new(temp_dir.path().join("status.json"));
        let snapshot = Snapshot::new(vec![MemberStatus::new(
            "alice",
            "home",
            "",
            crate::utils::now(),
        )]);

        mirror.write(&snapshot).unwrap();

        assert!(mirror.exists());
        assert_eq!(mirror.read().unwrap(), snapshot);
    }

    #[test]
    fn test_reads_legacy_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("status.json");
        fs::write(
            &path,
            r#"{"members":[
                {"name":"zed","activity":"away","state":"","timestamp":"2023-01-02T03:04:05Z"},
                {"name":"amy","timestamp":"2023-01-01T00:00:00Z"}
            ]}"#,
        )
        .unwrap();

        let snapshot = LegacyMirror::new(&path).read().unwrap();
        assert_eq!(snapshot.members[0].name, "amy");
        assert_eq!(snapshot.members[0].activity, "");
        assert_eq!(snapshot.members[1].activity, "away");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = LegacyMirror::new(temp_dir.path().join("absent.json"));
        assert!(matches!(mirror.read(), Err(MirrorError::Io(_))));
    }
}
