//! Snapshot fingerprints
//!
//! Only `(name, activity, state)` contribute; timestamps are ignored so a
//! rewrite with identical values does not count as a change.

use crate::types::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut members: Vec<_> = snapshot.members.iter().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));

        let mut hasher = blake3::Hasher::new();
        for member in members {
            for field in [&member.name, &member.activity, &member.state] {
                hasher.update(&(field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
