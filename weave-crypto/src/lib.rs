//! Hashing, signing and address derivation primitives.
//!
//! `H` is the single 256-bit cryptographic hash used throughout the weave
//! (transaction ids, independent hashes, addresses). Everything else in this
//! crate builds on it and on Ed25519 signatures.

use anyhow::{anyhow, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Width in bytes of every hash and address in the system (`HASH_SZ = 256 bits`).
pub const HASH_SZ: usize = 32;

pub type Hash = [u8; HASH_SZ];
pub type Address = [u8; HASH_SZ];

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("public key has wrong length")]
    BadPublicKey,
    #[error("secret key has wrong length")]
    BadSecretKey,
    #[error("signature has wrong length")]
    BadSignature,
    #[error("signature does not verify")]
    VerificationFailed,
    #[error("address decode error: {0}")]
    AddressDecode(String),
}

/// `H(bytes) -> 256-bit digest`, the system's sole hash algorithm (`HASH_ALG`).
pub fn hash(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_SZ];
    out.copy_from_slice(&digest);
    out
}

/// `address(owner) = H(pubkey)`.
pub fn address_from_public_key(pubkey: &[u8]) -> Address {
    hash(pubkey)
}

pub fn address_to_string(addr: &Address) -> String {
    bs58::encode(addr).into_string()
}

pub fn address_from_string(s: &str) -> Result<Address, CryptoError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| CryptoError::AddressDecode(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::AddressDecode("wrong length".into()))
}

/// An Ed25519 keypair. `public_key` is the raw 32-byte verifying key, the
/// transaction `owner` field.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::BadSecretKey)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&arr),
        })
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key())
    }

    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.signing_key.sign(msg).to_bytes().to_vec()
    }
}

/// Verify `sig` over `msg` under the raw Ed25519 public key `pubkey`.
pub fn verify(pubkey: &[u8], msg: &[u8], sig: &[u8]) -> Result<bool, CryptoError> {
    let pk_arr: [u8; 32] = pubkey.try_into().map_err(|_| CryptoError::BadPublicKey)?;
    let vk = VerifyingKey::from_bytes(&pk_arr).map_err(|_| CryptoError::BadPublicKey)?;
    let sig_arr: [u8; 64] = sig.try_into().map_err(|_| CryptoError::BadSignature)?;
    let signature = Signature::from_bytes(&sig_arr);
    Ok(vk.verify(msg, &signature).is_ok())
}

/// Like [`verify`] but returns an error rather than `false` on mismatch,
/// convenient at call sites that want `?`-propagation of a hard failure.
pub fn verify_strict(pubkey: &[u8], msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
    if verify(pubkey, msg, sig)? {
        Ok(())
    } else {
        Err(CryptoError::VerificationFailed)
    }
}

/// Count of leading zero bits across a hash, used by the PoW predicate
/// (`leading_zero_bits(h) >= D`).
pub fn leading_zero_bits(h: &Hash) -> u32 {
    let mut count = 0u32;
    for byte in h.iter() {
        if *byte == 0 {
            count += 8;
            continue;
        }
        count += byte.leading_zeros();
        break;
    }
    count
}

pub fn hash_to_hex(h: &Hash) -> String {
    hex::encode(h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"hello weave";
        let sig = kp.sign(msg);
        assert!(verify(&kp.public_key(), msg, &sig).unwrap());
    }

    #[test]
    fn forged_signature_fails() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"hello weave");
        assert!(!verify(&kp.public_key(), b"goodbye weave", &sig).unwrap());
    }

    #[test]
    fn address_roundtrips_through_base58() {
        let kp = KeyPair::generate();
        let addr = kp.address();
        let encoded = address_to_string(&addr);
        let decoded = address_from_string(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn leading_zero_bits_counts_correctly() {
        let mut h = [0xffu8; 32];
        assert_eq!(leading_zero_bits(&h), 0);
        h[0] = 0x0f;
        assert_eq!(leading_zero_bits(&h), 4);
        h[0] = 0x00;
        h[1] = 0x01;
        assert_eq!(leading_zero_bits(&h), 15);
        let zero = [0u8; 32];
        assert_eq!(leading_zero_bits(&zero), 256);
    }
}
