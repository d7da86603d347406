//! Status history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum page size for history queries
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// Page size used when the caller does not specify one
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One recorded status change. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub name: String,
    pub activity: String,
    pub state: String,
    pub changed_at: DateTime<Utc>,
}

/// Filter and pagination for history reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub name: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            name: None,
            from: None,
            to: None,
            limit: DEFAULT_HISTORY_LIMIT,
            offset: 0,
        }
    }
}

impl HistoryQuery {
    /// History of a single member
    pub fn for_member(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Limit capped to [`MAX_HISTORY_LIMIT`]
    pub fn normalized_limit(&self) -> usize {
        self.limit.min(MAX_HISTORY_LIMIT)
    }

    /// Whether an entry passes the name and time-range filters (bounds inclusive)
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if let Some(ref name) = self.name {
            if &entry.name != name {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.changed_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.changed_at > to {
                return false;
            }
        }
        true
    }
}

/// One page of history, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
