//! The gossip bus (§6): delivers `{add_tx}` and `{new_block}` messages to
//! every other connected peer exactly once. This is the in-scope half of
//! the networking layer — unlike [`PeerRpc`](crate::peer_rpc::PeerRpc),
//! which spec.md specifies only by contract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use weave_core::{Block, Transaction};

pub type PeerId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GossipMessage {
    AddTx(Transaction),
    /// `{new_block, peer_id, height, block, recall_block}` (§6) — the
    /// originating peer is carried explicitly, since recipients need it to
    /// resolve missing transaction bodies or recall-recover from that same
    /// peer. `height` is redundant with `block.height` and not duplicated;
    /// `recall_block` is resolved locally from the store rather than
    /// trusted from the wire (see `weave_node::state::NodeState::try_apply`).
    NewBlock(PeerId, Block),
}

/// Simulated link quality for one peer's inbox: a message can be dropped
/// outright, or delivered after a delay. Both default to "perfect link".
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkConditions {
    pub loss_probability: f64,
    pub delay: Duration,
}

struct Peer {
    sender: mpsc::UnboundedSender<GossipMessage>,
    conditions: LinkConditions,
}

/// An in-process gossip bus. Each peer registers an inbox; [`broadcast`]
/// fans a message out to every other registered peer exactly once.
#[derive(Clone, Default)]
pub struct GossipBus {
    peers: Arc<RwLock<HashMap<PeerId, Peer>>>,
}

impl GossipBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `peer_id` on a perfect link, returning its inbox.
    pub fn register(&self, peer_id: impl Into<PeerId>) -> mpsc::UnboundedReceiver<GossipMessage> {
        self.register_with_conditions(peer_id, LinkConditions::default())
    }

    /// Registers `peer_id` with simulated loss/delay, for fault-injection
    /// tests of fork recovery and propagation.
    pub fn register_with_conditions(
        &self,
        peer_id: impl Into<PeerId>,
        conditions: LinkConditions,
    ) -> mpsc::UnboundedReceiver<GossipMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.peers
            .write()
            .insert(peer_id.into(), Peer { sender, conditions });
        receiver
    }

    pub fn unregister(&self, peer_id: &str) {
        self.peers.write().remove(peer_id);
    }

    /// Sends `message` to every registered peer other than `from`, exactly
    /// once each. Loss and delay are applied independently per recipient.
    pub fn broadcast(&self, from: &str, message: GossipMessage) {
        let targets: Vec<(PeerId, mpsc::UnboundedSender<GossipMessage>, LinkConditions)> = self
            .peers
            .read()
            .iter()
            .filter(|(id, _)| id.as_str() != from)
            .map(|(id, peer)| (id.clone(), peer.sender.clone(), peer.conditions))
            .collect();

        for (peer_id, sender, conditions) in targets {
            let message = message.clone();
            if conditions.loss_probability > 0.0
                && rand::thread_rng().gen::<f64>() < conditions.loss_probability
            {
                trace!(%peer_id, "gossip: simulated loss, dropping message");
                continue;
            }
            if conditions.delay.is_zero() {
                if sender.send(message).is_err() {
                    debug!(%peer_id, "gossip: peer inbox closed");
                }
            } else {
                let delay = conditions.delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = sender.send(message);
                });
            }
        }
    }

    pub fn peer_count(&self) -> usize {
        self.peers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{build_genesis, WalletList};

    fn sample_message() -> GossipMessage {
        GossipMessage::NewBlock("origin".to_string(), build_genesis(WalletList::new(), 0))
    }

    #[tokio::test]
    async fn broadcast_reaches_every_other_peer_once() {
        let bus = GossipBus::new();
        let mut a = bus.register("a");
        let mut b = bus.register("b");
        let mut c = bus.register("c");

        bus.broadcast("a", sample_message());

        assert!(a.try_recv().is_err());
        assert!(b.recv().await.is_some());
        assert!(c.recv().await.is_some());
        assert!(b.try_recv().is_err());
        assert!(c.try_recv().is_err());
    }

    #[tokio::test]
    async fn total_loss_drops_every_delivery() {
        let bus = GossipBus::new();
        let mut b = bus.register_with_conditions(
            "b",
            LinkConditions {
                loss_probability: 1.0,
                delay: Duration::ZERO,
            },
        );
        bus.broadcast("a", sample_message());
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregistered_peer_receives_nothing_further() {
        let bus = GossipBus::new();
        let mut b = bus.register("b");
        bus.unregister("b");
        bus.broadcast("a", sample_message());
        assert!(b.recv().await.is_none());
    }
}
