//! Difficulty retarget (§4.10): every `retarget_blocks` blocks, difficulty
//! adjusts from elapsed wall-clock time, bounded so a single retarget cannot
//! multiply or divide difficulty by more than `retarget_max_change`.
//!
//! Difficulty is bit-denominated (`leading_zero_bits(h) >= diff`), so a
//! multiplicative cap on "hardness" (2^diff) becomes an additive cap in bits:
//! `max_step_bits = log2(retarget_max_change)`.

use weave_config::ConsensusParams;
use weave_core::Block;

/// Computes the new difficulty given the elapsed wall-clock time since the
/// last retarget and how many blocks that period spans.
pub fn compute_retarget(prev_diff: u32, elapsed_secs: u64, blocks_elapsed: u64, params: &ConsensusParams) -> u32 {
    let target_secs = (params.target_block_time_secs * blocks_elapsed).max(1) as f64;
    let actual_secs = (elapsed_secs as f64).max(1.0);
    let ratio = (target_secs / actual_secs).clamp(1.0 / params.retarget_max_change, params.retarget_max_change);
    let bits_delta = ratio.log2();
    let new_diff = prev_diff as f64 + bits_delta;
    new_diff.round().max(0.0) as u32
}

/// The `(diff, last_retarget)` a block extending `predecessor` at
/// `timestamp` must carry — the same rule [`retarget_ok`] checks, computed
/// prospectively so a candidate can be assembled before mining rather than
/// validated after the fact.
pub fn next_diff(predecessor: &Block, timestamp: u64, params: &ConsensusParams) -> (u32, u64) {
    let height = predecessor.height + 1;
    if height % params.retarget_blocks == 0 {
        let elapsed = timestamp.saturating_sub(predecessor.last_retarget);
        let diff = compute_retarget(predecessor.diff, elapsed, params.retarget_blocks, params);
        (diff, timestamp)
    } else {
        (predecessor.diff, predecessor.last_retarget)
    }
}

/// `retarget_ok(B, P)`: on a retarget height `B.diff`/`B.last_retarget` must
/// equal the deterministic retarget of `P`; on any other height they must
/// carry `P`'s values verbatim.
pub fn retarget_ok(block: &Block, prev: &Block, params: &ConsensusParams) -> bool {
    if block.height > 0 && block.height % params.retarget_blocks == 0 {
        let elapsed = block.timestamp.saturating_sub(prev.last_retarget);
        let expected = compute_retarget(prev.diff, elapsed, params.retarget_blocks, params);
        block.diff == expected && block.last_retarget == block.timestamp
    } else {
        block.diff == prev.diff && block.last_retarget == prev.last_retarget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faster_than_target_raises_difficulty() {
        let params = ConsensusParams::default();
        let target_secs = params.target_block_time_secs * params.retarget_blocks;
        let new_diff = compute_retarget(20, target_secs / 2, params.retarget_blocks, &params);
        assert!(new_diff > 20);
    }

    #[test]
    fn slower_than_target_lowers_difficulty() {
        let params = ConsensusParams::default();
        let target_secs = params.target_block_time_secs * params.retarget_blocks;
        let new_diff = compute_retarget(20, target_secs * 2, params.retarget_blocks, &params);
        assert!(new_diff < 20);
    }

    #[test]
    fn next_diff_matches_what_retarget_ok_expects() {
        let params = ConsensusParams::default();
        let predecessor = Block {
            indep_hash: [1u8; 32],
            prev_hash: [0u8; 32],
            height: params.retarget_blocks - 1,
            nonce: vec![],
            hash: [2u8; 32],
            diff: 20,
            timestamp: 1000,
            last_retarget: 0,
            hash_list: vec![[0u8; 32]; (params.retarget_blocks - 1) as usize],
            wallet_list: Default::default(),
            txs: vec![],
            reward_addr: weave_core::RewardAddr::Unclaimed,
            weave_size: 0,
            block_size: 0,
            tags: vec![],
        };
        let (diff, last_retarget) = next_diff(&predecessor, 2000, &params);

        let mut candidate = predecessor.clone();
        candidate.height = predecessor.height + 1;
        candidate.diff = diff;
        candidate.last_retarget = last_retarget;
        candidate.timestamp = 2000;
        assert!(retarget_ok(&candidate, &predecessor, &params));
    }

    #[test]
    fn single_retarget_is_bounded_by_cap() {
        let params = ConsensusParams::default();
        // Wildly fast blocks should not move difficulty by more than log2(cap) bits.
        let new_diff = compute_retarget(20, 1, params.retarget_blocks, &params);
        let max_step = params.retarget_max_change.log2().ceil() as i64;
        assert!((new_diff as i64 - 20).abs() <= max_step);
    }
}
