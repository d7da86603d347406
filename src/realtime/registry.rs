//! Subscriber registry
//!
//! The only shared mutable structure on the server side. Registration and
//! removal take the write lock; iteration copies a point-in-time view under
//! the read lock and releases it before any frame is written.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rand::Rng;
use thiserror::Error;
use tokio::sync::mpsc;

use super::Frame;

/// Output channel of one stream session
pub type FrameSender = mpsc::Sender<Frame>;

/// Opaque subscriber identity: creation time plus a random tie-break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId {
    created_micros: i64,
    nonce: u32,
}

impl SubscriberId {
    pub fn generate() -> Self {
        Self {
            created_micros: chrono::Utc::now().timestamp_micros(),
            nonce: rand::thread_rng().gen(),
        }
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub_{:x}_{:08x}", self.created_micros, self.nonce)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("subscriber limit reached ({0})")]
    Capacity(usize),
    #[error("server is shutting down")]
    Closed,
}

pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, FrameSender>>,
    capacity: usize,
    // only flipped while the write lock is held
    closed: AtomicBool,
}

impl SubscriberRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Add a channel and return its id
    pub fn register(&self, sender: FrameSender) -> Result<SubscriberId, RegistryError> {
        let mut subscribers = self.subscribers.write();
        if self.closed.load(Ordering::Acquire) {
            return Err(RegistryError::Closed);
        }
        if subscribers.len() >= self.capacity {
            return Err(RegistryError::Capacity(self.capacity));
        }

        let mut id = SubscriberId::generate();
        while subscribers.contains_key(&id) {
            id = SubscriberId::generate();
        }
        subscribers.insert(id, sender);
        Ok(id)
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    /// Remove several subscribers under one lock acquisition
    pub fn unregister_all(&self, ids: &[SubscriberId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let mut subscribers = self.subscribers.write();
        ids.iter().filter(|id| subscribers.remove(id).is_some()).count()
    }

    /// Drop every subscriber and refuse new ones from now on
    pub fn close(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        self.closed.store(true, Ordering::Release);
        let count = subscribers.len();
        subscribers.clear();
        count
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Visit each subscriber registered at call time exactly once.
    ///
    /// The callback runs without the lock held, so it may register or
    /// unregister freely; those changes do not affect the current pass.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(SubscriberId, &FrameSender),
    {
        let view: Vec<(SubscriberId, FrameSender)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        for (id, sender) in &view {
            f(*id, sender);
        }
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sender() -> FrameSender {
        mpsc::channel(1).0
    }

    #[test]
    fn test_register_and_unregister_twice() {
        let registry = SubscriberRegistry::new(8);
        let id = registry.register(sender()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_capacity_error() {
        let registry = SubscriberRegistry::new(2);
        registry.register(sender()).unwrap();
        registry.register(sender()).unwrap();

        assert_eq!(registry.register(sender()), Err(RegistryError::Capacity(2)));
    }

    #[test]
    fn test_close_refuses_late_registrations() {
        let registry = SubscriberRegistry::new(8);
        registry.register(sender()).unwrap();

        assert_eq!(registry.close(), 1);
        assert!(registry.is_closed());
        assert_eq!(registry.register(sender()), Err(RegistryError::Closed));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SubscriberRegistry::new(256);
        let ids: HashSet<_> = (0..200).map(|_| registry.register(sender()).unwrap()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_for_each_is_point_in_time() {
        let registry = SubscriberRegistry::new(16);
        let first = registry.register(sender()).unwrap();
        let second = registry.register(sender()).unwrap();

        let mut visited = Vec::new();
        registry.for_each(|id, _| {
            visited.push(id);
            // mutations during the pass must not disturb it
            registry.unregister(second);
            registry.register(sender()).unwrap();
        });

        visited.sort();
        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(visited, expected);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unregister_all() {
        let registry = SubscriberRegistry::new(16);
        let a = registry.register(sender()).unwrap();
        let b = registry.register(sender()).unwrap();
        let c = registry.register(sender()).unwrap();

        assert_eq!(registry.unregister_all(&[a, c, a]), 2);
        assert!(registry.contains(b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_display_format() {
        let id = SubscriberId::generate();
        assert!(id.to_string().starts_with("sub_"));
    }
}
