//! Ancestor-chain replay (§4.9 loop, §4.8 join "Prep"): walks backward from
//! a peer-supplied target through `peer_rpc` until reaching a block
//! already held in `store` (the fork point), then replays every block from
//! there forward via [`crate::apply::validate_and_persist`]. Runs detached
//! from [`crate::state::NodeState`] — callers decide whether and how to
//! adopt the resulting tip. Shared by join bootstrap and fork recovery,
//! which differ only in when they're triggered, not in how the catch-up
//! itself works.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use weave_config::ConsensusParams;
use weave_core::{Block, TxId};
use weave_network::PeerRpc;
use weave_store::BlockStore;

use crate::apply::{validate_and_persist, ApplyError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("peer rpc failed: {0}")]
    Rpc(#[source] anyhow::Error),
    #[error("peer could not supply a missing ancestor")]
    MissingAncestor,
    #[error("peer could not supply a block's transaction bodies")]
    MissingBody,
    #[error("target is more than store_blocks_behind_current blocks ahead")]
    TooFarBehind,
    #[error("attempted to recover all the way to genesis")]
    RecoveryToGenesis,
    #[error("a block in the recovered chain failed validation: {0}")]
    Invalid(#[from] ApplyError),
}

/// The outcome of a successful replay: the new tip, and every transaction
/// id applied along the way (so a caller can purge them from its mempool).
pub struct RecoveredChain {
    pub final_tip: Block,
    pub applied_tx_ids: Vec<TxId>,
}

/// Walks back from `target` through `peer_rpc` until reaching a block
/// already in `store`, then applies every block from there forward,
/// starting from `own_tip` as the first predecessor.
///
/// Re-checks `target_updates` between applications (§4.9 "target update"):
/// a later target on the same branch replaces the current one and the
/// backward walk restarts from it. This is cheap even mid-replay, since
/// every block this loop already applied is already in `store` and is
/// immediately recognised as the new fork point.
///
/// Bounded by `store_blocks_behind_current` (§4.9: `STORE_BLOCKS_BEHIND_CURRENT`).
pub async fn walk_and_replay(
    store: &dyn BlockStore,
    peer_rpc: &dyn PeerRpc,
    params: &ConsensusParams,
    own_tip: &Block,
    mut target: Block,
    target_updates: &mut mpsc::UnboundedReceiver<Block>,
) -> Result<RecoveredChain, SyncError> {
    let max_depth = params.store_blocks_behind_current;
    let mut applied_tip = own_tip.clone();
    let mut applied_tx_ids = Vec::new();

    'restart: loop {
        if target.height == 0 {
            return Err(SyncError::RecoveryToGenesis);
        }
        if target.height.saturating_sub(applied_tip.height) > max_depth {
            return Err(SyncError::TooFarBehind);
        }

        // Walk backward from `target` until we reach a block whose parent is
        // already held locally — that parent is the fork point. It needn't
        // be `own_tip`: a genuinely competing branch forks off earlier, at
        // whatever common ancestor the two chains share.
        let mut chain = vec![target.clone()];
        let fork_point = loop {
            let tail = chain.last().expect("chain always has at least target");
            if tail.height == 0 {
                return Err(SyncError::RecoveryToGenesis);
            }
            if let Some(ancestor) = store.get_block(&tail.prev_hash).await {
                break ancestor;
            }
            if chain.len() as u64 >= max_depth {
                return Err(SyncError::TooFarBehind);
            }
            let prev_hash = tail.prev_hash;
            let parent = peer_rpc
                .get_block(prev_hash)
                .await
                .map_err(SyncError::Rpc)?
                .ok_or(SyncError::MissingAncestor)?;
            chain.push(parent);
        };
        applied_tip = fork_point;

        for block in chain.into_iter().rev() {
            if let Ok(candidate) = target_updates.try_recv() {
                if on_same_branch(&target, &candidate) {
                    info!(height = candidate.height, "fork recovery: target updated");
                    target = candidate;
                    continue 'restart;
                }
            }

            if store.get_block(&block.indep_hash).await.is_some() {
                // Already held — the fork point, or a block a prior pass
                // through this loop already applied.
                applied_tip = block;
                continue;
            }
            let full = peer_rpc
                .get_full_block(block.indep_hash)
                .await
                .map_err(SyncError::Rpc)?
                .ok_or(SyncError::MissingBody)?;
            validate_and_persist(store, params, &full, &applied_tip).await?;
            applied_tx_ids.extend(full.block.txs.iter().copied());
            applied_tip = full.block;
            info!(height = applied_tip.height, "sync: applied recovered block");
        }

        return Ok(RecoveredChain {
            final_tip: applied_tip,
            applied_tx_ids,
        });
    }
}

/// `T.indep_hash ∈ [B'.indep_hash] ∪ B'.hash_list` — the candidate target
/// is the current one, or a descendant of it on the same branch.
fn on_same_branch(current_target: &Block, candidate: &Block) -> bool {
    candidate.indep_hash == current_target.indep_hash
        || candidate.hash_list.contains(&current_target.indep_hash)
}

pub(crate) fn log_failure(context: &str, err: &SyncError) {
    warn!(%context, error = %err, "sync failed");
}
