//! Transactions: construction, canonical signature-segment encoding, and the
//! field-size invariants that hold independently of ledger state.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weave_crypto::{self as crypto, Address, Hash, KeyPair};

pub type TxId = Hash;

pub const MAX_ID_SIZE: usize = 32;
pub const MAX_LAST_TX_SIZE: usize = 32;
pub const MAX_OWNER_SIZE: usize = 512;
pub const MAX_TAGS_SIZE: usize = 2048;
pub const MAX_TARGET_SIZE: usize = 32;
pub const MAX_QUANTITY_DIGITS: usize = 21;
pub const MAX_DATA_SIZE: usize = 6_000_000;
pub const MAX_SIGNATURE_SIZE: usize = 512;
pub const MAX_REWARD_DIGITS: usize = 21;

/// One `(name, value)` byte pair attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Tag {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.len() + self.value.len()
    }
}

/// Reason codes a transaction can be rejected for. The strings are stable —
/// they are logged and surfaced to callers, not just `Display`ed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxFieldError {
    #[error("tx_fields_too_large")]
    FieldsTooLarge,
    #[error("tag_field_illegally_specified")]
    TagFieldIllegallySpecified,
    #[error("tx_id_not_valid")]
    IdNotValid,
    #[error("tx_signature_not_valid")]
    SignatureNotValid,
}

/// A transfer or data-bearing transaction.
///
/// Invariants after [`Transaction::sign`]: `id = H(signature)`; `signature`
/// verifies the canonical signature segment against `owner`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub owner: Vec<u8>,
    pub target: Option<Address>,
    pub quantity: u128,
    pub data: Vec<u8>,
    pub reward: u128,
    pub last_tx: Option<TxId>,
    pub tags: Vec<Tag>,
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Builds an unsigned transaction skeleton; call [`sign`](Self::sign) to
    /// populate `owner`, `signature` and `id`.
    pub fn unsigned(
        target: Option<Address>,
        quantity: u128,
        data: Vec<u8>,
        reward: u128,
        last_tx: Option<TxId>,
        tags: Vec<Tag>,
    ) -> Self {
        Self {
            id: [0u8; 32],
            owner: Vec::new(),
            target,
            quantity,
            data,
            reward,
            last_tx,
            tags,
            signature: Vec::new(),
        }
    }

    /// The canonical signature segment:
    /// `owner ‖ target ‖ data ‖ ascii(quantity) ‖ ascii(reward) ‖ last_tx ‖ tags_bin`.
    pub fn signature_segment(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            self.owner.len() + self.data.len() + self.tags_bin_len() + 96,
        );
        buf.extend_from_slice(&self.owner);
        if let Some(target) = &self.target {
            buf.extend_from_slice(target);
        }
        buf.extend_from_slice(&self.data);
        buf.extend_from_slice(self.quantity.to_string().as_bytes());
        buf.extend_from_slice(self.reward.to_string().as_bytes());
        if let Some(last_tx) = &self.last_tx {
            buf.extend_from_slice(last_tx);
        }
        for tag in &self.tags {
            buf.extend_from_slice(&tag.name);
            buf.extend_from_slice(&tag.value);
        }
        buf
    }

    fn tags_bin_len(&self) -> usize {
        self.tags.iter().map(Tag::encoded_len).sum()
    }

    /// Signs the transaction segment with `keypair`, setting `owner`,
    /// `signature` and deriving `id = H(signature)`.
    pub fn sign(&mut self, keypair: &KeyPair) {
        self.owner = keypair.public_key();
        let segment = self.signature_segment();
        self.signature = keypair.sign(&segment);
        self.id = crypto::hash(&self.signature);
    }

    /// A genesis/system transaction carries no owner and bypasses `last_tx`
    /// replay checks.
    pub fn is_system(&self) -> bool {
        self.owner.is_empty()
    }

    pub fn is_data_only(&self) -> bool {
        self.target.is_none()
    }

    pub fn owner_address(&self) -> Option<Address> {
        if self.is_system() {
            None
        } else {
            Some(crypto::address_from_public_key(&self.owner))
        }
    }

    /// Checks every size-capped field and tag well-formedness, independent
    /// of any ledger or signature state.
    pub fn validate_field_sizes(&self) -> Result<(), TxFieldError> {
        if self.id.len() > MAX_ID_SIZE
            || self.owner.len() > MAX_OWNER_SIZE
            || self.data.len() > MAX_DATA_SIZE
            || self.signature.len() > MAX_SIGNATURE_SIZE
            || self.quantity.to_string().len() > MAX_QUANTITY_DIGITS
            || self.reward.to_string().len() > MAX_REWARD_DIGITS
            || self.last_tx.map(|t| t.len()).unwrap_or(0) > MAX_LAST_TX_SIZE
            || self.target.map(|t| t.len()).unwrap_or(0) > MAX_TARGET_SIZE
        {
            return Err(TxFieldError::FieldsTooLarge);
        }
        if self.tags_bin_len() > MAX_TAGS_SIZE {
            return Err(TxFieldError::FieldsTooLarge);
        }
        for tag in &self.tags {
            if tag.name.is_empty() {
                return Err(TxFieldError::TagFieldIllegallySpecified);
            }
        }
        Ok(())
    }

    /// `id == H(signature)` and the signature verifies against `owner`.
    pub fn validate_signature(&self) -> Result<(), TxFieldError> {
        if self.is_system() {
            return Ok(());
        }
        if crypto::hash(&self.signature) != self.id {
            return Err(TxFieldError::IdNotValid);
        }
        let segment = self.signature_segment();
        match crypto::verify(&self.owner, &segment, &self.signature) {
            Ok(true) => Ok(()),
            _ => Err(TxFieldError::SignatureNotValid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let kp = KeyPair::generate();
        let mut tx = Transaction::unsigned(Some([7u8; 32]), 100, vec![], 1, None, vec![]);
        tx.sign(&kp);
        tx.validate_field_sizes().unwrap();
        tx.validate_signature().unwrap();
        assert_eq!(tx.id, crypto::hash(&tx.signature));
    }

    #[test]
    fn mutated_data_fails_verification() {
        let kp = KeyPair::generate();
        let mut tx = Transaction::unsigned(Some([7u8; 32]), 100, vec![1, 2, 3], 1, None, vec![]);
        tx.sign(&kp);
        tx.data = vec![9, 9, 9];
        assert!(tx.validate_signature().is_err());
    }

    #[test]
    fn empty_tag_name_rejected() {
        let kp = KeyPair::generate();
        let mut tx = Transaction::unsigned(
            Some([1u8; 32]),
            1,
            vec![],
            1,
            None,
            vec![Tag::new(vec![], vec![1])],
        );
        tx.sign(&kp);
        assert_eq!(
            tx.validate_field_sizes(),
            Err(TxFieldError::TagFieldIllegallySpecified)
        );
    }

    #[test]
    fn oversized_data_rejected() {
        let kp = KeyPair::generate();
        let mut tx = Transaction::unsigned(
            Some([1u8; 32]),
            1,
            vec![0u8; MAX_DATA_SIZE + 1],
            1,
            None,
            vec![],
        );
        tx.sign(&kp);
        assert_eq!(tx.validate_field_sizes(), Err(TxFieldError::FieldsTooLarge));
    }
}
