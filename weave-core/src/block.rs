//! The block record, its canonical independent-hash encoding, the mining
//! data segment, and recall-block selection.

use serde::{Deserialize, Serialize};
use weave_crypto::{self as crypto, Address, Hash};

use crate::transaction::{Tag, Transaction, TxId};
use crate::wallet::WalletList;

/// `reward_addr` is either a claiming address or explicitly unclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardAddr {
    Address(Address),
    Unclaimed,
}

impl RewardAddr {
    pub fn address(&self) -> Option<Address> {
        match self {
            RewardAddr::Address(a) => Some(*a),
            RewardAddr::Unclaimed => None,
        }
    }

    fn encoded(&self) -> Vec<u8> {
        match self {
            RewardAddr::Address(a) => a.to_vec(),
            RewardAddr::Unclaimed => Vec::new(),
        }
    }
}

/// A block, in its canonical (tx-ids-only) form. The in-transit form that
/// pairs this with full transaction bodies is [`FullBlock`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub indep_hash: Hash,
    pub prev_hash: Hash,
    pub height: u64,
    pub nonce: Vec<u8>,
    pub hash: Hash,
    pub diff: u32,
    pub timestamp: u64,
    pub last_retarget: u64,
    /// Ancestor independent hashes, newest first. `len() == height`.
    pub hash_list: Vec<Hash>,
    pub wallet_list: WalletList,
    pub txs: Vec<TxId>,
    pub reward_addr: RewardAddr,
    pub weave_size: u128,
    pub block_size: u128,
    pub tags: Vec<Tag>,
}

impl Block {
    /// The canonical byte encoding over every field in a fixed order,
    /// excluding `indep_hash` itself — the preimage of the block's identity.
    pub fn encoding_for_indep_hash(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.prev_hash);
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.hash);
        buf.extend_from_slice(&self.diff.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.last_retarget.to_be_bytes());
        for h in &self.hash_list {
            buf.extend_from_slice(h);
        }
        for id in &self.txs {
            buf.extend_from_slice(id);
        }
        buf.extend_from_slice(&self.reward_addr.encoded());
        buf.extend_from_slice(&self.weave_size.to_be_bytes());
        buf.extend_from_slice(&self.block_size.to_be_bytes());
        for tag in &self.tags {
            buf.extend_from_slice(&tag.name);
            buf.extend_from_slice(&tag.value);
        }
        buf
    }

    /// Computes and returns the independent hash this block *should* carry;
    /// does not mutate `self`. Callers set `indep_hash` from this after
    /// assembling every other field.
    pub fn compute_indep_hash(&self) -> Hash {
        crypto::hash(&self.encoding_for_indep_hash())
    }

    /// `height == len(hash_list)`.
    pub fn height_matches_hash_list(&self) -> bool {
        self.height as usize == self.hash_list.len()
    }

    /// `hash_list[0] == prev_hash` once `height > 0`.
    pub fn hash_list_tail_matches_prev(&self) -> bool {
        if self.height == 0 {
            self.hash_list.is_empty()
        } else {
            self.hash_list.first() == Some(&self.prev_hash)
        }
    }
}

/// The in-transit wire form: a block paired with the full bodies of the
/// transactions its `txs` ids reference. Recipients re-derive ids rather
/// than trust the sender's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullBlock {
    pub block: Block,
    pub txs: Vec<Transaction>,
}

impl FullBlock {
    /// Validates that `block.txs` and `txs` agree, positionally, on ids.
    pub fn ids_consistent(&self) -> bool {
        self.block.txs.len() == self.txs.len()
            && self
                .block
                .txs
                .iter()
                .zip(self.txs.iter())
                .all(|(id, tx)| *id == tx.id)
    }
}

/// `block_data(txs) = concat(tx.id for tx in txs)` in list order.
pub fn block_data(txs: &[Transaction]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(txs.len() * 32);
    for tx in txs {
        buf.extend_from_slice(&tx.id);
    }
    buf
}

/// `data_segment(txs, recall_B, reward_addr) = block_data(txs) ‖
/// recall_B.nonce ‖ recall_B.hash ‖ block_data(recall_B.txs) ‖ reward_addr`.
pub fn data_segment(
    txs: &[Transaction],
    recall_block: &Block,
    recall_txs: &[Transaction],
    reward_addr: &RewardAddr,
) -> Vec<u8> {
    let mut buf = block_data(txs);
    buf.extend_from_slice(&recall_block.nonce);
    buf.extend_from_slice(&recall_block.hash);
    buf.extend_from_slice(&block_data(recall_txs));
    buf.extend_from_slice(&reward_addr.encoded());
    buf
}

/// Deterministic pseudo-random pick used to select the recall block.
/// `pick_recall(seed_hash, height) mod max(1, height)`.
pub fn pick_recall(seed_hash: &Hash, height: u64) -> u64 {
    let digest = crypto::hash(seed_hash);
    let mut acc = 0u64;
    for chunk in digest.chunks(8) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        acc ^= u64::from_be_bytes(buf);
    }
    let modulus = height.max(1);
    acc % modulus
}

/// `recall_index(B) = pick_recall(B.prev_hash, B.height) mod max(1, B.height)`.
///
/// Seeded by the *predecessor's* independent hash rather than `B`'s own:
/// the miner must know which recall block to mix into the data segment
/// before it can search for the nonce that determines `B.hash`, and
/// `B.indep_hash` is only computed from the final, already-mined fields —
/// using it here would make recall selection depend on the very block it
/// is selecting for. `B.prev_hash` is known up front (it's the
/// predecessor's `indep_hash`) and is exactly as unpredictable a seed.
pub fn recall_index(prev_hash: &Hash, height: u64) -> u64 {
    pick_recall(prev_hash, height)
}

/// The position in `hash_list` (reverse-indexed, newest first) of the recall
/// block: `hash_list[height - 1 - recall_index]`.
pub fn recall_position(height: u64, recall_idx: u64) -> Option<usize> {
    if height == 0 {
        return None;
    }
    let offset = height.checked_sub(1)?.checked_sub(recall_idx)?;
    Some(offset as usize)
}

/// Resolves the recall block's independent hash for a block whose full
/// `hash_list` is held (block itself is not in its own `hash_list`, so a
/// height-0 block has no recall block).
pub fn recall_hash_for(block: &Block) -> Option<Hash> {
    let idx = recall_index(&block.prev_hash, block.height);
    let pos = recall_position(block.height, idx)?;
    block.hash_list.get(pos).copied()
}

/// The `hash_list` a block extending `predecessor` would carry: its own
/// `prev_hash` (== `predecessor.indep_hash`) prepended to `predecessor`'s
/// own list.
pub fn next_hash_list(predecessor: &Block) -> Vec<Hash> {
    let mut list = Vec::with_capacity(predecessor.hash_list.len() + 1);
    list.push(predecessor.indep_hash);
    list.extend(predecessor.hash_list.iter().copied());
    list
}

/// Resolves the recall block's independent hash for a not-yet-mined
/// candidate extending `predecessor`, so the miner can be handed a fixed
/// recall block before it starts searching for a nonce. `candidate_hash_list`
/// is [`next_hash_list`] of the same predecessor.
pub fn next_recall_hash(predecessor: &Block, candidate_hash_list: &[Hash]) -> Option<Hash> {
    let height = predecessor.height + 1;
    let idx = recall_index(&predecessor.indep_hash, height);
    let pos = recall_position(height, idx)?;
    candidate_hash_list.get(pos).copied()
}

/// Everything [`weave_add`] needs to assemble a freshly mined block into its
/// final, independent-hash-bearing form.
pub struct WeaveAddInput {
    pub predecessor: Block,
    pub txs: Vec<Transaction>,
    pub wallet_list: WalletList,
    pub nonce: Vec<u8>,
    pub hash: Hash,
    pub diff: u32,
    pub timestamp: u64,
    pub last_retarget: u64,
    pub reward_addr: RewardAddr,
    pub tags: Vec<Tag>,
}

/// `weave_add(hash_list, wallet_list_after, mined_txs, nonce, reward_addr)`
/// (§4.7): assembles the block the miner just completed work for, deriving
/// `hash_list` from `predecessor`, `block_size` from the included txs' data,
/// and `weave_size` as the running cumulative sum (§9 open question
/// resolution).
pub fn weave_add(input: WeaveAddInput) -> Block {
    let hash_list = next_hash_list(&input.predecessor);
    let block_size: u128 = input.txs.iter().map(|t| t.data.len() as u128).sum();
    let weave_size = input.predecessor.weave_size + block_size;
    let mut block = Block {
        indep_hash: [0u8; 32],
        prev_hash: input.predecessor.indep_hash,
        height: input.predecessor.height + 1,
        nonce: input.nonce,
        hash: input.hash,
        diff: input.diff,
        timestamp: input.timestamp,
        last_retarget: input.last_retarget,
        hash_list,
        wallet_list: input.wallet_list,
        txs: input.txs.iter().map(|t| t.id).collect(),
        reward_addr: input.reward_addr,
        weave_size,
        block_size,
        tags: input.tags,
    };
    block.indep_hash = block.compute_indep_hash();
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(height: u64, hash_list: Vec<Hash>) -> Block {
        Block {
            indep_hash: [0u8; 32],
            prev_hash: [1u8; 32],
            height,
            nonce: vec![1, 2, 3],
            hash: [2u8; 32],
            diff: 10,
            timestamp: 1,
            last_retarget: 0,
            hash_list,
            wallet_list: WalletList::new(),
            txs: vec![],
            reward_addr: RewardAddr::Unclaimed,
            weave_size: 0,
            block_size: 0,
            tags: vec![],
        }
    }

    #[test]
    fn indep_hash_changes_when_any_field_changes() {
        let mut b = sample_block(2, vec![[3u8; 32], [4u8; 32]]);
        let h1 = b.compute_indep_hash();
        b.nonce = vec![9];
        let h2 = b.compute_indep_hash();
        assert_ne!(h1, h2);
    }

    #[test]
    fn genesis_height_matches_empty_hash_list() {
        let b = sample_block(0, vec![]);
        assert!(b.height_matches_hash_list());
        assert!(b.hash_list_tail_matches_prev());
    }

    #[test]
    fn recall_position_is_reverse_indexed() {
        // height 5: hash_list has 5 entries; recall_idx 0 -> newest-but-one slot (index height-1).
        assert_eq!(recall_position(5, 0), Some(4));
        assert_eq!(recall_position(5, 4), Some(0));
        assert_eq!(recall_position(0, 0), None);
    }

    #[test]
    fn recall_hash_is_deterministic_for_same_inputs() {
        let b = sample_block(3, vec![[1u8; 32], [2u8; 32], [3u8; 32]]);
        let a = recall_hash_for(&b);
        let b2 = recall_hash_for(&b);
        assert_eq!(a, b2);
    }

    #[test]
    fn next_recall_hash_agrees_with_post_construction_recall_hash_for() {
        // The recall block picked before mining (next_recall_hash, seeded by
        // predecessor.indep_hash) must match the one a validator resolves
        // after the fact (recall_hash_for, seeded by candidate.prev_hash) —
        // they're the same seed, since prev_hash IS predecessor.indep_hash.
        let predecessor = sample_block(2, vec![[7u8; 32], [8u8; 32]]);
        let candidate_hash_list = next_hash_list(&predecessor);
        let picked = next_recall_hash(&predecessor, &candidate_hash_list).unwrap();

        let mut candidate = sample_block(3, candidate_hash_list);
        candidate.prev_hash = predecessor.indep_hash;
        assert_eq!(recall_hash_for(&candidate), Some(picked));
    }

    #[test]
    fn weave_add_derives_hash_list_and_cumulative_weave_size() {
        let mut predecessor = sample_block(1, vec![[5u8; 32]]);
        predecessor.weave_size = 100;
        predecessor.indep_hash = predecessor.compute_indep_hash();

        let block = weave_add(WeaveAddInput {
            predecessor: predecessor.clone(),
            txs: vec![],
            wallet_list: WalletList::new(),
            nonce: vec![1, 2],
            hash: [9u8; 32],
            diff: 10,
            timestamp: 5,
            last_retarget: 0,
            reward_addr: RewardAddr::Unclaimed,
            tags: vec![],
        });

        assert_eq!(block.height, 2);
        assert_eq!(block.prev_hash, predecessor.indep_hash);
        assert_eq!(block.hash_list, next_hash_list(&predecessor));
        assert_eq!(block.weave_size, 100);
        assert_eq!(block.indep_hash, block.compute_indep_hash());
    }
}
