//! Legacy import
//!
//! Seeds an empty store from the legacy mirror file:
//! 1. Skips entirely if the store already has members
//! 2. Reads `{ "members": [...] }` from the mirror
//! 3. Inserts each named member with its original timestamp and one history row

use thiserror::Error;

use super::{LegacyMirror, MirrorError, StatusStore, StoreError};

/// Result of an import run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub members_imported: usize,
    pub members_skipped: usize,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

/// Import the mirror into `store` if the store is empty and the mirror exists
pub fn import_legacy(
    store: &dyn StatusStore,
    mirror: &LegacyMirror,
) -> Result<ImportResult, ImportError> {
    if !mirror.exists() || !store.snapshot()?.is_empty() {
        return Ok(ImportResult::default());
    }

    let legacy = mirror.read()?;
    let total = legacy.members.len();
    let valid: Vec<_> = legacy
        .members
        .into_iter()
        .filter(|m| !m.name.trim().is_empty())
        .collect();

    let imported = store.import(&valid)?;
    tracing::info!(
        path = %mirror.path().display(),
        imported,
        "imported legacy status file"
    );

    Ok(ImportResult {
        members_imported: imported,
        members_skipped: total - imported,
    })
}
