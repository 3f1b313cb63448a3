//! Consensus rules layered on top of `weave-core` and `weave-ledger`: the
//! proof-of-work predicate, difficulty retarget, and full block validation.

pub mod pow;
pub mod retarget;
pub mod validate;

pub use pow::{pow_hash, pow_verify};
pub use retarget::{compute_retarget, next_diff, retarget_ok};
pub use validate::{validate_block, BlockError};
