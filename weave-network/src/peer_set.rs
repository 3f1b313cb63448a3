//! Peer-set management (supplemented feature): the set of peer addresses a
//! node currently knows about, shared between gossip registration and
//! `PeerRpc`-based sync.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Clone, Default)]
pub struct PeerSet {
    inner: Arc<RwLock<HashSet<String>>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter(peers: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(peers.into_iter().collect())),
        }
    }

    pub fn insert(&self, peer: impl Into<String>) -> bool {
        self.inner.write().insert(peer.into())
    }

    pub fn remove(&self, peer: &str) -> bool {
        self.inner.write().remove(peer)
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.inner.read().contains(peer)
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let set = PeerSet::new();
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_drops_membership() {
        let set = PeerSet::from_iter(["a".to_string(), "b".to_string()]);
        assert!(set.remove("a"));
        assert!(!set.contains("a"));
        assert!(set.contains("b"));
    }
}
