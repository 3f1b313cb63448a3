//! Core data model for the blockweave: transactions, blocks, and the wallet
//! ledger snapshot they carry. Pure data and canonical encodings only — no
//! ledger replay (see `weave-ledger`) and no consensus rules (see
//! `weave-consensus`).

pub mod block;
pub mod genesis;
pub mod transaction;
pub mod wallet;

pub use block::{
    block_data, data_segment, next_hash_list, next_recall_hash, weave_add, Block, FullBlock,
    RewardAddr, WeaveAddInput,
};
pub use genesis::build_genesis;
pub use transaction::{Tag, Transaction, TxFieldError, TxId};
pub use wallet::{WalletEntry, WalletList};

pub use weave_crypto::{Address, Hash};
