//! Storage change signal
//!
//! Watches the store's backing file so writes made by other tools sharing the
//! database reach connected viewers too. Every relevant filesystem event is
//! forwarded to the [`ChangeNotifier`]; the debounce collapses the bursts
//! SQLite produces (main file, `-wal`, `-shm`).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::ChangeNotifier;

/// Keeps the underlying watcher alive; dropping it stops the signal
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl StoreWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Start watching `path` (and its SQLite side files)
pub fn watch_store(path: &Path, notifier: ChangeNotifier) -> notify::Result<StoreWatcher> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem: OsString = path.file_name().map(OsString::from).unwrap_or_default();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event, &stem) => notifier.notify(),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "store watcher error"),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    tracing::info!(path = %path.display(), "watching store for external changes");
    Ok(StoreWatcher {
        _watcher: watcher,
        path: path.to_path_buf(),
    })
}

fn is_relevant(event: &Event, stem: &OsString) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    let stem = stem.to_string_lossy();
    kind_matches
        && event.paths.iter().any(|p| {
            p.file_name()
                .map(|name| name.to_string_lossy().starts_with(stem.as_ref()))
                .unwrap_or(false)
        })
}
