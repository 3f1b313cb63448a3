//! Join bootstrap (§4.9 "Prep"): a node starting from genesis polls a seed
//! peer for its current tip, backing off between attempts, then replays
//! forward via the same ancestor-walk fork recovery uses. Unlike fork
//! recovery this runs synchronously on the node server — a not-yet-joined
//! node has nothing else useful to do while it waits.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use weave_config::{ConsensusParams, TimeoutParams};
use weave_core::Block;
use weave_network::PeerRpc;
use weave_store::BlockStore;

use crate::sync::{walk_and_replay, SyncError};

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("seed peer did not respond after backing off")]
    PeerUnreachable,
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),
}

/// How many times [`join`] polls a seed peer for its current tip, backing
/// off `timeouts.rejoin_timeout()` between attempts, before giving up.
pub const DEFAULT_JOIN_ATTEMPTS: u32 = 5;

/// Polls `peer_rpc` for its current tip, retrying with the configured
/// rejoin backoff between attempts.
async fn poll_for_tip(
    peer_rpc: &dyn PeerRpc,
    timeouts: &TimeoutParams,
    max_attempts: u32,
) -> Option<Block> {
    for attempt in 0..max_attempts {
        match peer_rpc.get_current_block().await {
            Ok(block) => return Some(block),
            Err(e) => {
                warn!(attempt, error = %e, "join: poll for tip failed, backing off");
                if attempt + 1 < max_attempts {
                    tokio::time::sleep(timeouts.rejoin_timeout()).await;
                }
            }
        }
    }
    None
}

/// Bootstraps from `own_genesis` up to `peer_rpc`'s current tip, returning
/// the new tip. If the peer's tip isn't ahead of `own_genesis`, join still
/// succeeds trivially — there's simply nothing to recover.
pub async fn join(
    store: &dyn BlockStore,
    peer_rpc: &dyn PeerRpc,
    params: &ConsensusParams,
    timeouts: &TimeoutParams,
    own_genesis: &Block,
    max_attempts: u32,
) -> Result<Block, JoinError> {
    let target = poll_for_tip(peer_rpc, timeouts, max_attempts)
        .await
        .ok_or(JoinError::PeerUnreachable)?;

    if target.height <= own_genesis.height {
        info!("join: seed peer is not ahead, nothing to do");
        return Ok(own_genesis.clone());
    }

    // Join never needs to react to a concurrent target update — it hasn't
    // reported itself to any peer yet, so nothing can be racing to update it.
    let (_tx, mut rx) = mpsc::unbounded_channel();
    let recovered = walk_and_replay(store, peer_rpc, params, own_genesis, target, &mut rx).await?;
    Ok(recovered.final_tip)
}
