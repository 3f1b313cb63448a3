//! The mining predicate: `H(prev_hash ‖ data_segment ‖ nonce)` must have at
//! least `diff` leading zero bits.

use weave_crypto::{self as crypto, Hash};

pub fn pow_hash(prev_hash: &Hash, data_segment: &[u8], nonce: &[u8]) -> Hash {
    let mut buf = Vec::with_capacity(32 + data_segment.len() + nonce.len());
    buf.extend_from_slice(prev_hash);
    buf.extend_from_slice(data_segment);
    buf.extend_from_slice(nonce);
    crypto::hash(&buf)
}

/// `pow_verify(P.hash, B.diff, data_segment(...), B.nonce)`.
pub fn pow_verify(prev_hash: &Hash, diff: u32, data_segment: &[u8], nonce: &[u8]) -> bool {
    let h = pow_hash(prev_hash, data_segment, nonce);
    crypto::leading_zero_bits(&h) >= diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_difficulty_always_verifies() {
        assert!(pow_verify(&[0u8; 32], 0, b"seg", b"nonce"));
    }

    #[test]
    fn impossible_difficulty_never_verifies() {
        assert!(!pow_verify(&[0u8; 32], 257, b"seg", b"nonce"));
    }

    #[test]
    fn hash_is_deterministic_in_its_inputs() {
        let a = pow_hash(&[1u8; 32], b"x", b"y");
        let b = pow_hash(&[1u8; 32], b"x", b"y");
        assert_eq!(a, b);
        let c = pow_hash(&[1u8; 32], b"x", b"z");
        assert_ne!(a, c);
    }
}
