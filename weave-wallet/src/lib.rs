//! Wallet key management: generating and persisting Ed25519 keypairs
//! password-encrypted at rest, independent of any running node. Not named
//! by spec.md (which treats `owner`/`target` as opaque key material
//! already in hand) but needed for a usable CLI — grounded on the
//! teacher's own wallet crate, swapping its key/address types for this
//! system's Ed25519/base58 ones.

use aes_gcm::aead::{Aead, KeyInit, OsRng as AesOsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{anyhow, Result};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use weave_crypto::{address_from_string, address_to_string, Address, KeyPair};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub name: String,
    pub address: Address,
    pub public_key: Vec<u8>,
    pub encrypted_secret: Vec<u8>,
    pub nonce: [u8; 12],
}

pub struct WalletStore {
    root: PathBuf,
}

impl WalletStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn create(&self, name: &str, password: &str) -> Result<Wallet> {
        let kp = KeyPair::generate();
        let address = kp.address();
        let (encrypted_secret, nonce) = encrypt_secret(&kp.secret_bytes(), password)?;
        let wallet = Wallet {
            name: name.to_string(),
            address,
            public_key: kp.public_key(),
            encrypted_secret,
            nonce,
        };
        let path = self.root.join(format!("{name}.json"));
        fs::write(path, serde_json::to_vec_pretty(&wallet)?)?;
        Ok(wallet)
    }

    pub fn list(&self) -> Result<Vec<Wallet>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let bytes = fs::read(entry.path())?;
                let wallet: Wallet = serde_json::from_slice(&bytes)?;
                out.push(wallet);
            }
        }
        Ok(out)
    }

    pub fn load(&self, name: &str) -> Result<Wallet> {
        let path = self.root.join(format!("{name}.json"));
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decrypts and reconstructs the signing keypair, for a CLI command
    /// that needs to sign a transaction on the spot.
    pub fn unlock(&self, wallet: &Wallet, password: &str) -> Result<KeyPair> {
        let secret = decrypt_secret(&wallet.encrypted_secret, &wallet.nonce, password)?;
        Ok(KeyPair::from_secret_bytes(&secret)?)
    }
}

fn encrypt_secret(secret: &[u8], password: &str) -> Result<(Vec<u8>, [u8; 12])> {
    let mut salt = [0u8; 16];
    AesOsRng.fill_bytes(&mut salt);
    let mut key = [0u8; 32];
    pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), &salt, 10_000, &mut key);
    let cipher = Aes256Gcm::new_from_slice(&key)?;
    let mut nonce_bytes = [0u8; 12];
    AesOsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, secret)
        .map_err(|e| anyhow!("encrypt failed: {e}"))?;
    let mut out = salt.to_vec();
    out.extend_from_slice(&ciphertext);
    Ok((out, nonce_bytes))
}

fn decrypt_secret(ciphertext: &[u8], nonce: &[u8; 12], password: &str) -> Result<Vec<u8>> {
    if ciphertext.len() < 16 {
        return Err(anyhow!("ciphertext too short"));
    }
    let (salt, ct) = ciphertext.split_at(16);
    let mut key = [0u8; 32];
    pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), salt, 10_000, &mut key);
    let cipher = Aes256Gcm::new_from_slice(&key)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ct)
        .map_err(|e| anyhow!("decrypt failed: {e}"))?;
    Ok(plaintext)
}

pub fn address_to_base58(addr: &Address) -> String {
    address_to_string(addr)
}

pub fn address_from_base58(s: &str) -> Result<Address> {
    Ok(address_from_string(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_roundtrip() {
        let store = WalletStore::new(std::env::temp_dir().join("weave-wallet-test")).unwrap();
        let wallet = store.create("test", "pass").unwrap();
        let kp = store.unlock(&wallet, "pass").unwrap();
        assert_eq!(kp.address(), wallet.address);
    }

    #[test]
    fn wrong_password_fails_to_unlock() {
        let store = WalletStore::new(std::env::temp_dir().join("weave-wallet-test-2")).unwrap();
        let wallet = store.create("test2", "correct").unwrap();
        assert!(store.unlock(&wallet, "wrong").is_err());
    }
}
