//! Wallet entries and wallet lists — the ledger snapshot carried by every block.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weave_crypto::Address;

use crate::transaction::TxId;

/// `(address, balance, last_tx_id)`. `last_tx` is `None` for a wallet that
/// has never sent a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub address: Address,
    pub balance: u128,
    pub last_tx: Option<TxId>,
}

/// A ledger snapshot: a set of wallet entries with strictly positive
/// balances, at most one entry per address. Entries are kept sorted by
/// address so two independently computed wallet lists compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletList {
    entries: Vec<WalletEntry>,
}

impl WalletList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(mut entries: Vec<WalletEntry>) -> Self {
        entries.retain(|e| e.balance > 0);
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WalletEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, addr: &Address) -> Option<&WalletEntry> {
        self.entries
            .binary_search_by(|e| e.address.cmp(addr))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Builds a working map keyed by address, for mutation during ledger
    /// replay (`apply_txs`). Consumes `self`.
    pub fn into_map(self) -> HashMap<Address, WalletEntry> {
        self.entries.into_iter().map(|e| (e.address, e)).collect()
    }

    /// Rebuilds a canonical, sorted, positive-balance-only wallet list from a
    /// working map (the inverse of [`into_map`](Self::into_map)).
    pub fn from_map(map: HashMap<Address, WalletEntry>) -> Self {
        Self::from_entries(map.into_values().collect())
    }

    /// All balances strictly positive — an invariant this type always
    /// upholds by construction, exposed for assertions in tests.
    pub fn all_positive(&self) -> bool {
        self.entries.iter().all(|e| e.balance > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        [n; 32]
    }

    #[test]
    fn zero_balance_entries_are_dropped() {
        let list = WalletList::from_entries(vec![
            WalletEntry {
                address: addr(1),
                balance: 0,
                last_tx: None,
            },
            WalletEntry {
                address: addr(2),
                balance: 10,
                last_tx: None,
            },
        ]);
        assert_eq!(list.len(), 1);
        assert!(list.get(&addr(1)).is_none());
        assert!(list.get(&addr(2)).is_some());
    }

    #[test]
    fn entries_are_sorted_for_canonical_comparison() {
        let a = WalletList::from_entries(vec![
            WalletEntry {
                address: addr(2),
                balance: 5,
                last_tx: None,
            },
            WalletEntry {
                address: addr(1),
                balance: 5,
                last_tx: None,
            },
        ]);
        let b = WalletList::from_entries(vec![
            WalletEntry {
                address: addr(1),
                balance: 5,
                last_tx: None,
            },
            WalletEntry {
                address: addr(2),
                balance: 5,
                last_tx: None,
            },
        ]);
        assert_eq!(a, b);
    }
}
