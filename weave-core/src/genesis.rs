//! Genesis block construction. spec.md treats `B0` as a given in its
//! end-to-end scenarios without specifying how it is built; this is the
//! natural base case of the block invariants in §3 (height 0, empty
//! hash_list, `prev_hash` of all-zero bytes).

use weave_crypto::Hash;

use crate::block::{Block, RewardAddr};
use crate::wallet::WalletList;

pub const GENESIS_PREV_HASH: Hash = [0u8; 32];
pub const GENESIS_DIFF: u32 = 8;

/// Builds the height-0 block seeding `wallet_list` as the initial ledger.
/// Callers must still set `indep_hash` via [`Block::compute_indep_hash`]
/// after construction.
pub fn build_genesis(wallet_list: WalletList, timestamp: u64) -> Block {
    let mut block = Block {
        indep_hash: [0u8; 32],
        prev_hash: GENESIS_PREV_HASH,
        height: 0,
        nonce: Vec::new(),
        hash: [0u8; 32],
        diff: GENESIS_DIFF,
        timestamp,
        last_retarget: timestamp,
        hash_list: Vec::new(),
        wallet_list,
        txs: Vec::new(),
        reward_addr: RewardAddr::Unclaimed,
        weave_size: 0,
        block_size: 0,
        tags: Vec::new(),
    };
    block.indep_hash = block.compute_indep_hash();
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletEntry;

    #[test]
    fn genesis_has_height_zero_and_empty_hash_list() {
        let wl = WalletList::from_entries(vec![WalletEntry {
            address: [1u8; 32],
            balance: 10_000,
            last_tx: None,
        }]);
        let g = build_genesis(wl, 1_000);
        assert_eq!(g.height, 0);
        assert!(g.hash_list.is_empty());
        assert_eq!(g.prev_hash, GENESIS_PREV_HASH);
        assert_eq!(g.indep_hash, g.compute_indep_hash());
    }
}
