//! Event-stream frames
//!
//! Each message is a UTF-8 block terminated by a blank line. Data frames carry
//! one JSON snapshot after `data: `; heartbeats are the comment `:heartbeat`,
//! so clients can tell them apart without parsing JSON.

use std::sync::Arc;

use axum::response::sse::Event;

use crate::types::Snapshot;

/// Comment text carried by heartbeat frames
pub const HEARTBEAT_COMMENT: &str = "heartbeat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Serialized snapshot, shared by every subscriber of one broadcast
    Data(Arc<str>),
    /// Keep-alive with no payload
    Heartbeat,
}

impl Frame {
    /// Serialize a snapshot once into a shareable data frame
    pub fn snapshot(snapshot: &Snapshot) -> serde_json::Result<Self> {
        let json = serde_json::to_string(snapshot)?;
        Ok(Frame::Data(Arc::from(json)))
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Frame::Heartbeat)
    }

    /// Wire text of this frame
    pub fn encode(&self) -> String {
        match self {
            Frame::Data(json) => format!("data: {json}\n\n"),
            Frame::Heartbeat => format!(":{HEARTBEAT_COMMENT}\n\n"),
        }
    }
}

impl From<Frame> for Event {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Data(json) => Event::default().data(&*json),
            Frame::Heartbeat => Event::default().comment(HEARTBEAT_COMMENT),
        }
    }
}
