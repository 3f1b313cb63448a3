//! The node's single-owner state (§4.7/§5): the chain tip, the mempool,
//! and the collaborators needed to validate and apply a block. Owned
//! exclusively by the server task in `server.rs` — nothing outside that
//! task ever mutates it directly, which is what makes block application
//! race-free without locking.

use std::sync::Arc;

use tracing::warn;
use weave_config::NodeConfig;
use weave_core::{Block, FullBlock};
use weave_network::{GossipBus, GossipMessage, PeerSet};
use weave_store::BlockStore;

use crate::apply::validate_and_persist;
use crate::mempool::Mempool;
use crate::peer_rpc_registry::PeerRpcRegistry;

pub struct NodeState {
    pub peer_id: String,
    pub current: Block,
    pub store: Arc<dyn BlockStore>,
    pub mempool: Mempool,
    pub gossip: GossipBus,
    pub peers: PeerSet,
    pub peer_rpc: PeerRpcRegistry,
    pub config: NodeConfig,
    /// Whether this node has ever caught up with a peer (§4.7's
    /// "not-joined" sentinel, concretized: rather than a distinct
    /// `hash_list`-less state, a node always starts holding its genesis
    /// block and is "not-joined" exactly until its first successful catch-up
    /// — `join` or a direct/fork-recovered block acceptance — flips this.
    pub joined: bool,
    pub reward_addr: weave_core::RewardAddr,
}

impl NodeState {
    pub fn new(
        peer_id: String,
        genesis: Block,
        store: Arc<dyn BlockStore>,
        mempool: Mempool,
        gossip: GossipBus,
        peers: PeerSet,
        peer_rpc: PeerRpcRegistry,
        config: NodeConfig,
        reward_addr: weave_core::RewardAddr,
    ) -> Self {
        Self {
            peer_id,
            current: genesis,
            store,
            mempool,
            gossip,
            peers,
            peer_rpc,
            config,
            joined: false,
            reward_addr,
        }
    }

    /// Resolves `candidate`'s recall block and full transaction bodies from
    /// the local store, then runs full validation (§4.6) against
    /// `predecessor`. On success, commits the block and its transactions to
    /// the store, advances `current`, purges applied transactions from the
    /// mempool, and drops any remaining entry the new ledger state no longer
    /// admits (§8: mempool txs must verify under the *current* wallet_list).
    pub async fn try_apply(&mut self, full: &FullBlock, predecessor: Block) -> bool {
        if let Err(e) =
            validate_and_persist(self.store.as_ref(), &self.config.consensus, full, &predecessor).await
        {
            warn!(error = %e, "rejecting block");
            return false;
        }
        self.mempool.remove_applied(&full.block.txs);
        self.current = full.block.clone();
        self.mempool
            .retain_valid(&self.current.wallet_list, self.current.diff, &self.config.consensus);
        self.joined = true;
        true
    }

    /// Applies `full` as the direct successor of the current tip and, on
    /// success, re-broadcasts the (compact) block announcement to every
    /// other peer. Returns whether the block was accepted.
    pub async fn try_extend(&mut self, full: FullBlock) -> bool {
        let predecessor = self.current.clone();
        let accepted = self.try_apply(&full, predecessor).await;
        if accepted {
            self.gossip
                .broadcast(
                    &self.peer_id,
                    GossipMessage::NewBlock(self.peer_id.clone(), full.block.clone()),
                );
        }
        accepted
    }
}
