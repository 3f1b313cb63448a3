//! Full block validation (§4.6): a candidate block is checked against its
//! predecessor and its resolved recall block.

use thiserror::Error;
use weave_config::ConsensusParams;
use weave_core::{data_segment, Block, Transaction};
use weave_ledger::{apply_mining_reward, apply_txs, verify_list, TxError};

use crate::pow::{pow_hash, pow_verify};
use crate::retarget::retarget_ok;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("prev_hash does not match predecessor's indep_hash")]
    PrevHashMismatch,
    #[error("hash_list does not extend predecessor's hash_list")]
    HashListMismatch,
    #[error("wallet_list does not match ledger replay")]
    WalletListMismatch,
    #[error("recall block is not at the recall index of hash_list")]
    RecallIndexMismatch,
    #[error("tx {0} invalid: {1}")]
    TxInvalid(usize, TxError),
    #[error("declared hash does not match the recomputed proof-of-work hash")]
    HashMismatch,
    #[error("proof-of-work predicate not satisfied")]
    PowInvalid,
    #[error("indep_hash does not match the block's own encoding")]
    IndepHashMismatch,
    #[error("retarget rule violated")]
    RetargetInvalid,
}

/// Validates `candidate` (with its full transaction bodies `candidate_txs`)
/// against `predecessor` and the resolved `recall_block` (with its full
/// bodies `recall_txs`). This is the single source of truth for block
/// acceptance; fork recovery's `try_apply` calls the same function.
pub fn validate_block(
    candidate: &Block,
    candidate_txs: &[Transaction],
    predecessor: &Block,
    recall_block: &Block,
    recall_txs: &[Transaction],
    params: &ConsensusParams,
) -> Result<(), BlockError> {
    // 1. prev_hash / hash_list linkage.
    if candidate.prev_hash != predecessor.indep_hash {
        return Err(BlockError::PrevHashMismatch);
    }
    if candidate.hash_list.len() != predecessor.hash_list.len() + 1
        || candidate.hash_list[1..] != predecessor.hash_list[..]
    {
        return Err(BlockError::HashListMismatch);
    }

    // 2. wallet_list replay.
    let replayed = apply_txs(&predecessor.wallet_list, candidate_txs);
    let replayed = apply_mining_reward(
        &replayed,
        candidate.reward_addr.address(),
        candidate_txs,
        candidate.height,
        params,
    );
    if replayed != candidate.wallet_list {
        return Err(BlockError::WalletListMismatch);
    }

    // 3. recall block is at the recall index of candidate.hash_list.
    let recall_idx = weave_core::block::recall_index(&candidate.prev_hash, candidate.height);
    let pos = weave_core::block::recall_position(candidate.height, recall_idx);
    match pos.and_then(|p| candidate.hash_list.get(p)) {
        Some(h) if *h == recall_block.indep_hash => {}
        _ => return Err(BlockError::RecallIndexMismatch),
    }

    // 4. every tx verifies against candidate.diff and the predecessor's ledger.
    verify_list(candidate_txs, &predecessor.wallet_list, candidate.diff, params)
        .map_err(|(i, e)| BlockError::TxInvalid(i, e))?;

    // 5. proof-of-work: the declared hash must be the one the nonce
    // actually produces, and that hash must meet the declared difficulty.
    let seg = data_segment(candidate_txs, recall_block, recall_txs, &candidate.reward_addr);
    if candidate.hash != pow_hash(&predecessor.hash, &seg, &candidate.nonce) {
        return Err(BlockError::HashMismatch);
    }
    if !pow_verify(&predecessor.hash, candidate.diff, &seg, &candidate.nonce) {
        return Err(BlockError::PowInvalid);
    }

    // 6. indep_hash must be self-consistent with every other field (catches
    // tampering with any single field post-mining, including `hash` itself).
    if candidate.indep_hash != candidate.compute_indep_hash() {
        return Err(BlockError::IndepHashMismatch);
    }

    // 7. retarget rule.
    if !retarget_ok(candidate, predecessor, params) {
        return Err(BlockError::RetargetInvalid);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{build_genesis, RewardAddr, WalletEntry, WalletList};
    use weave_crypto::KeyPair;

    fn mine_next(
        predecessor: &Block,
        txs: Vec<Transaction>,
        reward_addr: RewardAddr,
        params: &ConsensusParams,
    ) -> (Block, Block, Vec<Transaction>) {
        // Recall block for a single-ancestor chain is always the predecessor
        // once height reaches 1 (recall_index mod max(1,height)).
        let recall_block = predecessor.clone();
        let recall_txs: Vec<Transaction> = Vec::new();

        let wallet_list = apply_mining_reward(
            &apply_txs(&predecessor.wallet_list, &txs),
            reward_addr.address(),
            &txs,
            predecessor.height + 1,
            params,
        );

        let mut hash_list = vec![predecessor.indep_hash];
        hash_list.extend(predecessor.hash_list.iter().copied());

        let mut block = Block {
            indep_hash: [0u8; 32],
            prev_hash: predecessor.indep_hash,
            height: predecessor.height + 1,
            nonce: Vec::new(),
            hash: predecessor.hash,
            diff: predecessor.diff,
            timestamp: predecessor.timestamp + 1,
            last_retarget: predecessor.last_retarget,
            hash_list,
            wallet_list,
            txs: txs.iter().map(|t| t.id).collect(),
            reward_addr,
            weave_size: 0,
            block_size: 0,
            tags: vec![],
        };

        // Brute-force a nonce satisfying the (low, test-only) difficulty.
        for n in 0u64.. {
            block.nonce = n.to_be_bytes().to_vec();
            let seg = data_segment(&txs, &recall_block, &recall_txs, &block.reward_addr);
            if pow_verify(&predecessor.hash, block.diff, &seg, &block.nonce) {
                break;
            }
        }
        block.hash = pow::pow_hash(
            &predecessor.hash,
            &data_segment(&txs, &recall_block, &recall_txs, &block.reward_addr),
            &block.nonce,
        );
        block.indep_hash = block.compute_indep_hash();
        (block, recall_block, recall_txs)
    }

    use crate::pow;

    #[test]
    fn first_block_validates_against_genesis() {
        let mut params = ConsensusParams::default();
        params.diff_center = 0;
        let kp = KeyPair::generate();
        let wl = WalletList::from_entries(vec![WalletEntry {
            address: kp.address(),
            balance: 10_000,
            last_tx: None,
        }]);
        let genesis = build_genesis(wl, 0);
        let mut genesis = genesis;
        genesis.diff = 1; // keep mining fast in tests

        let (block, recall, recall_txs) =
            mine_next(&genesis, vec![], RewardAddr::Unclaimed, &params);

        validate_block(&block, &[], &genesis, &recall, &recall_txs, &params).unwrap();
    }

    #[test]
    fn tampered_hash_fails_validation() {
        let mut params = ConsensusParams::default();
        params.diff_center = 0;
        let kp = KeyPair::generate();
        let wl = WalletList::from_entries(vec![WalletEntry {
            address: kp.address(),
            balance: 10_000,
            last_tx: None,
        }]);
        let mut genesis = build_genesis(wl, 0);
        genesis.diff = 1;

        let (mut block, recall, recall_txs) =
            mine_next(&genesis, vec![], RewardAddr::Unclaimed, &params);
        block.hash[0] ^= 0xff;

        assert!(validate_block(&block, &[], &genesis, &recall, &recall_txs, &params).is_err());
    }
}
