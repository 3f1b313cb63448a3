//! Transaction verification (§4.1) and the wallet-ledger reducer (§4.2).
//!
//! These two are kept in one crate because block validation depends on them
//! intimately: validating a block means replaying its transactions through
//! the reducer and checking the resulting wallet list against the one the
//! block claims.

mod cost;
mod reducer;
mod verify;

pub use cost::{min_cost, static_reward};
pub use reducer::{apply_mining_reward, apply_tx, apply_txs};
pub use verify::{verify_list, verify_tx, TxError};
