//! Transaction verification (§4.1).

use thiserror::Error;
use weave_config::ConsensusParams;
use weave_core::{Transaction, TxFieldError, WalletList};

use crate::cost::min_cost;
use crate::reducer::apply_tx;

/// Reason codes a transaction can be rejected for. The `Display` strings are
/// the stable, unique reason-code identifiers spec.md §7 names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("tx_signature_not_valid")]
    SignatureNotValid,
    #[error("tx_too_cheap")]
    TooCheap,
    #[error("tx_fields_too_large")]
    FieldsTooLarge,
    #[error("tag_field_illegally_specified")]
    TagFieldIllegallySpecified,
    #[error("last_tx_not_valid")]
    LastTxNotValid,
    #[error("tx_id_not_valid")]
    IdNotValid,
    #[error("target_equals_owner")]
    TargetEqualsOwner,
    #[error("insufficient_funds")]
    InsufficientFunds,
}

impl From<TxFieldError> for TxError {
    fn from(e: TxFieldError) -> Self {
        match e {
            TxFieldError::FieldsTooLarge => TxError::FieldsTooLarge,
            TxFieldError::TagFieldIllegallySpecified => TxError::TagFieldIllegallySpecified,
            TxFieldError::IdNotValid => TxError::IdNotValid,
            TxFieldError::SignatureNotValid => TxError::SignatureNotValid,
        }
    }
}

/// A transaction verifies iff every check of spec §4.1 holds against
/// `wallet_list` (the ledger state the tx is proposed against) and `diff`
/// (the difficulty it must afford to be included under).
pub fn verify_tx(
    tx: &Transaction,
    wallet_list: &WalletList,
    diff: u32,
    params: &ConsensusParams,
) -> Result<(), TxError> {
    tx.validate_field_sizes()?;

    if let Some(owner_addr) = tx.owner_address() {
        if Some(owner_addr) == tx.target {
            return Err(TxError::TargetEqualsOwner);
        }
    }

    if tx.reward < min_cost(tx.data.len(), diff, params) {
        return Err(TxError::TooCheap);
    }

    tx.validate_signature()?;

    if !tx.is_system() {
        let sender_addr = tx
            .owner_address()
            .expect("non-system tx always has an owner address");
        match wallet_list.get(&sender_addr) {
            Some(sender) => {
                if sender.last_tx != tx.last_tx {
                    return Err(TxError::LastTxNotValid);
                }
                // Mirrors the reducer (§4.2): a data-only tx (no target)
                // never moves `quantity`, so only `reward` is owed here.
                let transfer_amount = if tx.target.is_some() { tx.quantity } else { 0 };
                let debit = transfer_amount.saturating_add(tx.reward);
                if sender.balance < debit {
                    return Err(TxError::InsufficientFunds);
                }
            }
            None => {
                // A never-seen sender is only valid against an empty wallet
                // list (e.g. genesis construction); any other sender absence
                // means the tx references ledger state we don't have.
                if !wallet_list.is_empty() {
                    return Err(TxError::LastTxNotValid);
                }
            }
        }
    }

    Ok(())
}

/// Order-sensitive list verification: each tx is verified against the
/// ledger as it stands *after* applying every prior tx in the list.
pub fn verify_list(
    txs: &[Transaction],
    wallet_list: &WalletList,
    diff: u32,
    params: &ConsensusParams,
) -> Result<(), (usize, TxError)> {
    let mut running = wallet_list.clone();
    for (i, tx) in txs.iter().enumerate() {
        verify_tx(tx, &running, diff, params).map_err(|e| (i, e))?;
        running = apply_tx(&running, tx);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::WalletEntry;
    use weave_crypto::KeyPair;

    fn funded(addr: weave_crypto::Address, balance: u128) -> WalletList {
        WalletList::from_entries(vec![WalletEntry {
            address: addr,
            balance,
            last_tx: None,
        }])
    }

    fn priced_tx(
        params: &ConsensusParams,
        diff: u32,
        target: weave_crypto::Address,
        quantity: u128,
    ) -> (Transaction, KeyPair) {
        let kp = KeyPair::generate();
        let reward = min_cost(0, diff, params) + 10;
        let mut tx = Transaction::unsigned(Some(target), quantity, vec![], reward, None, vec![]);
        tx.sign(&kp);
        (tx, kp)
    }

    #[test]
    fn well_formed_tx_verifies() {
        let params = ConsensusParams::default();
        let (tx, kp) = priced_tx(&params, params.diff_center, [2u8; 32], 100);
        let wl = funded(kp.address(), 100_000);
        verify_tx(&tx, &wl, params.diff_center, &params).unwrap();
    }

    #[test]
    fn underpriced_tx_is_too_cheap() {
        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let mut tx = Transaction::unsigned(Some([2u8; 32]), 1, vec![0u8; 100_000], 1, None, vec![]);
        tx.sign(&kp);
        let wl = funded(kp.address(), 1_000_000);
        assert_eq!(
            verify_tx(&tx, &wl, params.diff_center, &params),
            Err(TxError::TooCheap)
        );
    }

    #[test]
    fn stale_last_tx_is_rejected() {
        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let reward = min_cost(0, params.diff_center, &params) + 10;
        let mut tx = Transaction::unsigned(
            Some([2u8; 32]),
            10,
            vec![],
            reward,
            Some([0xffu8; 32]),
            vec![],
        );
        tx.sign(&kp);
        let wl = funded(kp.address(), 100_000);
        assert_eq!(
            verify_tx(&tx, &wl, params.diff_center, &params),
            Err(TxError::LastTxNotValid)
        );
    }

    #[test]
    fn data_only_tx_is_not_charged_for_quantity() {
        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let reward = min_cost(3, params.diff_center, &params) + 1;
        // No target, but quantity is set: a sender funded only for the
        // reward must still verify, since quantity is never actually owed.
        let mut tx = Transaction::unsigned(None, 1_000_000, vec![1, 2, 3], reward, None, vec![]);
        tx.sign(&kp);
        let wl = funded(kp.address(), reward);
        verify_tx(&tx, &wl, params.diff_center, &params).unwrap();
    }

    #[test]
    fn self_transfer_is_rejected() {
        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let reward = min_cost(0, params.diff_center, &params) + 10;
        let mut tx = Transaction::unsigned(Some(kp.address()), 10, vec![], reward, None, vec![]);
        tx.sign(&kp);
        let wl = funded(kp.address(), 100_000);
        assert_eq!(
            verify_tx(&tx, &wl, params.diff_center, &params),
            Err(TxError::TargetEqualsOwner)
        );
    }

    #[test]
    fn tx_threading_second_spend_needs_first_tx_id() {
        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let target = [7u8; 32];
        let reward = min_cost(0, params.diff_center, &params) + 1;
        let mut tx1 = Transaction::unsigned(Some(target), 1_000, vec![], reward, None, vec![]);
        tx1.sign(&kp);
        let wl = funded(kp.address(), 10_000);
        verify_tx(&tx1, &wl, params.diff_center, &params).unwrap();
        let wl_after_tx1 = apply_tx(&wl, &tx1);

        let mut tx2 = Transaction::unsigned(
            Some(target),
            1_000,
            vec![],
            reward,
            Some(tx1.id),
            vec![],
        );
        tx2.sign(&kp);
        verify_tx(&tx2, &wl_after_tx1, params.diff_center, &params).unwrap();

        let mut bogus = Transaction::unsigned(
            Some(target),
            1_000,
            vec![],
            reward,
            Some([0xabu8; 32]),
            vec![],
        );
        bogus.sign(&kp);
        assert_eq!(
            verify_tx(&bogus, &wl_after_tx1, params.diff_center, &params),
            Err(TxError::LastTxNotValid)
        );
    }

    #[test]
    fn verify_list_is_order_sensitive() {
        let params = ConsensusParams::default();
        let kp = KeyPair::generate();
        let target = [7u8; 32];
        let reward = min_cost(0, params.diff_center, &params) + 1;
        let mut tx1 = Transaction::unsigned(Some(target), 1_000, vec![], reward, None, vec![]);
        tx1.sign(&kp);
        let mut tx2 = Transaction::unsigned(
            Some(target),
            1_000,
            vec![],
            reward,
            Some(tx1.id),
            vec![],
        );
        tx2.sign(&kp);
        let wl = funded(kp.address(), 10_000);

        // In-order: both valid.
        verify_list(&[tx1.clone(), tx2.clone()], &wl, params.diff_center, &params).unwrap();
        // Reversed: tx2 references a last_tx that hasn't happened yet.
        assert!(verify_list(&[tx2, tx1], &wl, params.diff_center, &params).is_err());
    }
}
