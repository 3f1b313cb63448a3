//! The pending transaction pool (supplemented feature: spec.md assumes a
//! "candidate tx set" is available to the miner but does not specify how
//! one is accumulated or bounded). Bounded by `max_size`; once full, the
//! lowest-reward transaction is evicted to make room for the incoming one,
//! since it is the one a rational miner would include last anyway.

use std::collections::HashMap;

use weave_config::ConsensusParams;
use weave_core::{Transaction, TxId, WalletList};
use weave_ledger::verify_tx;

/// Default bound on how many pending transactions a node keeps around
/// before evicting the cheapest. Not named by spec.md; a node-level tuning
/// knob, not a consensus constant, so it lives here rather than in
/// `weave-config`.
pub const DEFAULT_MEMPOOL_CAPACITY: usize = 10_000;

pub struct Mempool {
    max_size: usize,
    txs: HashMap<TxId, Transaction>,
}

impl Mempool {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            txs: HashMap::new(),
        }
    }

    /// Inserts `tx`, evicting the lowest-reward entry if already at
    /// capacity. Returns `false` without inserting if `tx` is already
    /// present (idempotent re-gossip of the same transaction).
    pub fn insert(&mut self, tx: Transaction) -> bool {
        if self.txs.contains_key(&tx.id) {
            return false;
        }
        if self.txs.len() >= self.max_size {
            self.evict_lowest_reward();
        }
        self.txs.insert(tx.id, tx);
        true
    }

    fn evict_lowest_reward(&mut self) {
        if let Some(&evict) = self
            .txs
            .iter()
            .min_by_key(|(_, tx)| tx.reward)
            .map(|(id, _)| id)
        {
            self.txs.remove(&evict);
        }
    }

    /// Drops every id in `applied` — called once a block including them
    /// commits, so they aren't offered to the miner again.
    pub fn remove_applied(&mut self, applied: &[TxId]) {
        for id in applied {
            self.txs.remove(id);
        }
    }

    /// Drops every remaining transaction that no longer verifies against
    /// `wallet_list`/`diff` — called after every block integration, since a
    /// newly committed block can invalidate mempool entries it didn't itself
    /// include (e.g. a sender's `last_tx` advancing via a different
    /// transaction, or a balance dropping below what a pending tx still
    /// claims). Upholds §8's "every tx in mempool verifies under current
    /// wallet_list and current diff" as an ongoing invariant rather than one
    /// only checked at insertion time.
    pub fn retain_valid(&mut self, wallet_list: &WalletList, diff: u32, params: &ConsensusParams) {
        self.txs
            .retain(|_, tx| verify_tx(tx, wallet_list, diff, params).is_ok());
    }

    pub fn get(&self, id: &TxId) -> Option<&Transaction> {
        self.txs.get(id)
    }

    /// Up to `limit` pending transactions, for a miner to build a candidate
    /// block from. No ordering guarantee beyond stability across calls with
    /// no intervening mutation.
    pub fn candidates(&self, limit: usize) -> Vec<Transaction> {
        self.txs.values().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_crypto::KeyPair;

    fn tx_with_reward(reward: u128) -> Transaction {
        let kp = KeyPair::generate();
        let mut tx = Transaction::unsigned(Some([9u8; 32]), 1, vec![], reward, None, vec![]);
        tx.sign(&kp);
        tx
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut pool = Mempool::new(10);
        let tx = tx_with_reward(100);
        assert!(pool.insert(tx.clone()));
        assert!(!pool.insert(tx));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn full_pool_evicts_lowest_reward() {
        let mut pool = Mempool::new(2);
        let low = tx_with_reward(1);
        let high = tx_with_reward(1000);
        let newest = tx_with_reward(500);
        pool.insert(low.clone());
        pool.insert(high.clone());
        pool.insert(newest.clone());
        assert_eq!(pool.len(), 2);
        assert!(pool.get(&low.id).is_none());
        assert!(pool.get(&high.id).is_some());
        assert!(pool.get(&newest.id).is_some());
    }

    #[test]
    fn remove_applied_drops_committed_txs() {
        let mut pool = Mempool::new(10);
        let tx = tx_with_reward(10);
        pool.insert(tx.clone());
        pool.remove_applied(&[tx.id]);
        assert!(pool.is_empty());
    }

    #[test]
    fn retain_valid_drops_txs_the_new_ledger_no_longer_admits() {
        use weave_core::WalletEntry;

        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let sender = kp.address();
        let reward = weave_ledger::min_cost(0, params.diff_center, &params) + 1;

        let mut tx = Transaction::unsigned(Some([3u8; 32]), 10, vec![], reward, None, vec![]);
        tx.sign(&kp);

        let mut pool = Mempool::new(10);
        pool.insert(tx.clone());

        // Simulate a block that already consumed this sender's last_tx via a
        // different transaction: the pending tx's `last_tx` (None) no longer
        // matches the sender's recorded one, so it must be evicted.
        let wl = WalletList::from_entries(vec![WalletEntry {
            address: sender,
            balance: 1_000,
            last_tx: Some([7u8; 32]),
        }]);
        pool.retain_valid(&wl, params.diff_center, &params);

        assert!(pool.get(&tx.id).is_none());
    }
}
