//! The block/transaction store. Out of scope per spec.md §1 ("on-disk block
//! store... specified only by its input/output contract") — this crate
//! supplies exactly that contract as a trait, plus the in-memory
//! implementation this workspace actually runs against. A disk-backed
//! implementation slots in behind the same trait without touching
//! `weave-node`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use weave_core::{Block, Transaction, TxId};
use weave_crypto::Hash;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("block {0:?} not found")]
    BlockNotFound(Hash),
    #[error("transaction {0:?} not found")]
    TxNotFound(TxId),
}

/// Content-addressed: each block is stored under its `indep_hash`, each
/// transaction under its `id`. The store never rewrites an entry once
/// written — blocks and transactions in the weave are immutable.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn put_block(&self, block: &Block) -> Result<(), StoreError>;
    async fn get_block(&self, hash: &Hash) -> Option<Block>;
    async fn put_tx(&self, tx: &Transaction) -> Result<(), StoreError>;
    async fn get_tx(&self, id: &TxId) -> Option<Transaction>;

    async fn put_txs(&self, txs: &[Transaction]) -> Result<(), StoreError> {
        for tx in txs {
            self.put_tx(tx).await?;
        }
        Ok(())
    }

    /// Resolves every tx id on a block to its full body, in order. Returns
    /// `None` if any referenced transaction is missing from the store.
    async fn get_full_txs(&self, block: &Block) -> Option<Vec<Transaction>> {
        let mut out = Vec::with_capacity(block.txs.len());
        for id in &block.txs {
            out.push(self.get_tx(id).await?);
        }
        Some(out)
    }
}

#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<Hash, Block>>,
    txs: RwLock<HashMap<TxId, Transaction>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn put_block(&self, block: &Block) -> Result<(), StoreError> {
        self.blocks
            .write()
            .insert(block.indep_hash, block.clone());
        Ok(())
    }

    async fn get_block(&self, hash: &Hash) -> Option<Block> {
        self.blocks.read().get(hash).cloned()
    }

    async fn put_tx(&self, tx: &Transaction) -> Result<(), StoreError> {
        self.txs.write().insert(tx.id, tx.clone());
        Ok(())
    }

    async fn get_tx(&self, id: &TxId) -> Option<Transaction> {
        self.txs.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{build_genesis, WalletList};

    #[tokio::test]
    async fn put_then_get_block_roundtrips() {
        let store = InMemoryBlockStore::new();
        let genesis = build_genesis(WalletList::new(), 0);
        store.put_block(&genesis).await.unwrap();
        let fetched = store.get_block(&genesis.indep_hash).await.unwrap();
        assert_eq!(fetched.indep_hash, genesis.indep_hash);
    }

    #[tokio::test]
    async fn missing_block_is_none() {
        let store = InMemoryBlockStore::new();
        assert!(store.get_block(&[9u8; 32]).await.is_none());
    }
}
