//! Entry encryption for private containers.
//!
//! Every container created with encryption gets its own 256-bit key. Sealed
//! output is `nonce (12 bytes) || AES-256-GCM ciphertext`.
//!
//! Keys are sealed with a nonce derived from the plaintext, so the same entry
//! key always encrypts to the same bytes and can be looked up. Values are
//! sealed with a random nonce.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

const NONCE_LEN: usize = 12;
const KEY_NONCE_CONTEXT: &str = "pns 2024-01 container entry-key nonce";

/// Errors from sealing or opening entry data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("sealed data too short: {0} bytes")]
    TooShort(usize),

    #[error("encryption failed")]
    SealFailed,

    #[error("decryption failed")]
    OpenFailed,
}

/// Symmetric cipher bound to one container.
#[derive(Clone)]
pub struct ContainerCipher {
    key: [u8; 32],
}

impl ContainerCipher {
    /// Generate a cipher with a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// From existing key material.
    pub fn from_key(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// The raw key material.
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Seal an entry key. Deterministic for a given cipher and plaintext.
    pub fn seal_key(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce_key = blake3::derive_key(KEY_NONCE_CONTEXT, &self.key);
        let digest = blake3::keyed_hash(&nonce_key, plaintext);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest.as_bytes()[..NONCE_LEN]);
        self.seal_with_nonce(nonce, plaintext)
    }

    /// Seal an entry value with a random nonce.
    pub fn seal_value(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        self.seal_with_nonce(nonce, plaintext)
    }

    /// Open data produced by [`seal_key`](Self::seal_key) or
    /// [`seal_value`](Self::seal_value).
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        if sealed.len() < NONCE_LEN {
            return Err(CipherError::TooShort(sealed.len()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.aead()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::OpenFailed)
    }

    fn seal_with_nonce(&self, nonce: [u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let ciphertext = self
            .aead()
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CipherError::SealFailed)?;
        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn aead(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

impl fmt::Debug for ContainerCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerCipher").finish_non_exhaustive()
    }
}
