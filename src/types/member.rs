//! Member status and snapshot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current status of one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatus {
    pub name: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub state: String,
    pub timestamp: DateTime<Utc>,
}

impl MemberStatus {
    /// Create a status with explicit values
    pub fn new(
        name: impl Into<String>,
        activity: impl Into<String>,
        state: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            activity: activity.into(),
            state: state.into(),
            timestamp,
        }
    }

    /// Apply an update on top of the prior status.
    ///
    /// Missing or blank fields keep the prior value (or stay empty for a new member).
    pub fn merged(
        prior: Option<&MemberStatus>,
        name: &str,
        activity: Option<&str>,
        state: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        let pick = |new: Option<&str>, old: Option<&String>| match new.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => old.cloned().unwrap_or_default(),
        };

        Self {
            name: name.to_string(),
            activity: pick(activity, prior.map(|p| &p.activity)),
            state: pick(state, prior.map(|p| &p.state)),
            timestamp: at,
        }
    }
}

/// Full set of current member statuses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub members: Vec<MemberStatus>,
}

impl Snapshot {
    /// Build a snapshot, ordering members by name
    pub fn new(mut members: Vec<MemberStatus>) -> Self {
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Self { members }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Look up a member by name
    pub fn get(&self, name: &str) -> Option<&MemberStatus> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The member with the most recent timestamp
    pub fn latest(&self) -> Option<&MemberStatus> {
        self.members.iter().max_by_key(|m| m.timestamp)
    }
}

/// Body of `POST /api/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl StatusUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}
