//! Data types for the status board
//!
//! This module contains the member, snapshot and history structures shared by
//! the store, the HTTP API and the streaming client.

mod history;
mod member;

pub use history::{
    HistoryEntry, HistoryPage, HistoryQuery, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use member::{MemberStatus, Snapshot, StatusUpdate};
