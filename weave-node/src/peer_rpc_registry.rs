//! Maps a peer id to the `PeerRpc` client used to reach it. Kept separate
//! from `weave_network::PeerSet` (which only tracks membership) because not
//! every known peer necessarily has an established RPC client yet.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use weave_network::PeerRpc;

#[derive(Clone, Default)]
pub struct PeerRpcRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn PeerRpc>>>>,
}

impl PeerRpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, peer_id: impl Into<String>, rpc: Arc<dyn PeerRpc>) {
        self.inner.write().insert(peer_id.into(), rpc);
    }

    pub fn get(&self, peer_id: &str) -> Option<Arc<dyn PeerRpc>> {
        self.inner.read().get(peer_id).cloned()
    }

    pub fn remove(&self, peer_id: &str) {
        self.inner.write().remove(peer_id);
    }
}
