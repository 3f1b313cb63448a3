//! Fork recovery (§4.9): a detached worker spawned when a received block is
//! more than one height ahead of the current tip, or extends a different
//! predecessor at the same height. Walks the offering peer's chain back to
//! a common ancestor and replays forward, reporting the new tip back to the
//! node server once its schedule empties.
//!
//! Runs as an independent tokio task (§5: "Workers... are independent
//! actors, each owning private state... communicate with the Node Server
//! exclusively by message passing"), mirroring the shape of
//! `weave_miner::spawn_miner`. Superseded workers are simply abandoned —
//! the node adopts only the first report whose chain is strictly longer
//! than its own (§4.9 "Target update").

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use weave_config::ConsensusParams;
use weave_core::{Block, TxId};
use weave_network::PeerRpc;
use weave_store::BlockStore;

use crate::sync::{log_failure, walk_and_replay};

/// What a recovery worker reports once its replay schedule empties. A
/// worker that fails sends nothing — there is nothing for the node to
/// adopt, and the failure is already logged.
pub struct RecoveryReport {
    pub final_tip: Block,
    pub applied_tx_ids: Vec<TxId>,
}

/// A handle to a running fork-recovery worker.
pub struct RecoveryHandle {
    target_updates: mpsc::UnboundedSender<Block>,
    task: JoinHandle<()>,
}

impl RecoveryHandle {
    /// Forwards a later `new_block` announcement to the running worker
    /// (§4.9 "target update"). The worker decides for itself whether the
    /// new target is on the same branch as the one it's already chasing;
    /// a mismatch is silently dropped there, matching the spec's
    /// "otherwise ignore".
    pub fn update_target(&self, target: Block) {
        let _ = self.target_updates.send(target);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a fork-recovery worker targeting `target`, starting its backward
/// walk from `own_tip`. Reports on `out` once it finishes successfully.
pub fn spawn_recovery(
    store: Arc<dyn BlockStore>,
    peer_rpc: Arc<dyn PeerRpc>,
    params: ConsensusParams,
    own_tip: Block,
    target: Block,
    out: mpsc::UnboundedSender<RecoveryReport>,
) -> RecoveryHandle {
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        match walk_and_replay(
            store.as_ref(),
            peer_rpc.as_ref(),
            &params,
            &own_tip,
            target,
            &mut update_rx,
        )
        .await
        {
            Ok(recovered) => {
                info!(
                    height = recovered.final_tip.height,
                    "fork recovery: replay complete"
                );
                let _ = out.send(RecoveryReport {
                    final_tip: recovered.final_tip,
                    applied_tx_ids: recovered.applied_tx_ids,
                });
            }
            Err(e) => log_failure("fork_recovery", &e),
        }
    });
    RecoveryHandle {
        target_updates: update_tx,
        task,
    }
}
