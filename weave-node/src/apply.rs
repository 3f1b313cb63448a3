//! Shared "resolve recall block, validate, persist" logic between direct
//! extension ([`crate::state::NodeState::try_apply`]) and fork recovery's
//! replay loop (`sync::walk_and_replay`) — both need exactly the same
//! recall-resolution-then-§4.6-validation step, just against different
//! owning state.

use thiserror::Error;
use weave_config::ConsensusParams;
use weave_core::{block, Block, FullBlock};
use weave_store::BlockStore;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("tx ids inconsistent with block body")]
    InconsistentBodies,
    #[error("recall block unresolved")]
    RecallUnresolved,
    #[error("block failed validation: {0}")]
    Invalid(#[from] weave_consensus::BlockError),
    #[error("store write failed")]
    StoreWrite,
}

/// Resolves `full.block`'s recall block from `store`, runs full §4.6
/// validation against `predecessor`, and on success persists the block and
/// its transaction bodies. Does not touch any node-owned state — callers
/// decide what to do with a successful application (advance `current`,
/// accumulate into a recovery schedule, etc).
pub async fn validate_and_persist(
    store: &dyn BlockStore,
    params: &ConsensusParams,
    full: &FullBlock,
    predecessor: &Block,
) -> Result<(), ApplyError> {
    if !full.ids_consistent() {
        return Err(ApplyError::InconsistentBodies);
    }
    let candidate = &full.block;

    let recall_idx = block::recall_index(&candidate.prev_hash, candidate.height);
    let pos =
        block::recall_position(candidate.height, recall_idx).ok_or(ApplyError::RecallUnresolved)?;
    let recall_hash = *candidate
        .hash_list
        .get(pos)
        .ok_or(ApplyError::RecallUnresolved)?;
    let recall_block = store
        .get_block(&recall_hash)
        .await
        .ok_or(ApplyError::RecallUnresolved)?;
    let recall_txs = store
        .get_full_txs(&recall_block)
        .await
        .ok_or(ApplyError::RecallUnresolved)?;

    weave_consensus::validate_block(
        candidate,
        &full.txs,
        predecessor,
        &recall_block,
        &recall_txs,
        params,
    )?;

    store
        .put_block(candidate)
        .await
        .map_err(|_| ApplyError::StoreWrite)?;
    store
        .put_txs(&full.txs)
        .await
        .map_err(|_| ApplyError::StoreWrite)?;
    Ok(())
}
