//! Credential cipher for reward account inventory. Plaintext credentials
//! are sealed with AES-256-GCM before they reach the database and only
//! opened again for admin-facing retrieval.

use ring::aead::{
    Aad, BoundKey, Nonce, NonceSequence, OpeningKey, SealingKey, UnboundKey, AES_256_GCM,
};
use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};

const NONCE_LEN: usize = 12;

#[derive(thiserror::Error, Debug)]
pub enum EncryptionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid key length (expected 32 bytes)")]
    InvalidKeyLength,

    #[error("Invalid encrypted data format")]
    InvalidFormat,
}

impl From<Unspecified> for EncryptionError {
    fn from(_: Unspecified) -> Self {
        EncryptionError::EncryptionFailed("Cryptographic operation failed".to_string())
    }
}

struct SingleNonce {
    nonce: [u8; NONCE_LEN],
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, Unspecified> {
        Nonce::try_assume_unique_for_key(&self.nonce)
    }
}

/// Encrypts credential plaintext for BYTEA storage. Each call draws a fresh
/// random nonce, which is prepended to the ciphertext.
///
/// Format: [nonce (12 bytes)][ciphertext + auth tag]
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if key.len() != 32 {
        return Err(EncryptionError::InvalidKeyLength);
    }

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| EncryptionError::EncryptionFailed("Failed to generate nonce".to_string()))?;

    let unbound_key = UnboundKey::new(&AES_256_GCM, key)?;
    let mut sealing_key = SealingKey::new(unbound_key, SingleNonce { nonce: nonce_bytes });

    let mut in_out = plaintext.as_bytes().to_vec();
    sealing_key
        .seal_in_place_append_tag(Aad::empty(), &mut in_out)
        .map_err(|_| EncryptionError::EncryptionFailed("Sealing failed".to_string()))?;

    let mut result = Vec::with_capacity(NONCE_LEN + in_out.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&in_out);

    Ok(result)
}

/// Decrypts ciphertext produced by `encrypt`.
pub fn decrypt(encrypted: &[u8], key: &[u8]) -> Result<String, EncryptionError> {
    if key.len() != 32 {
        return Err(EncryptionError::InvalidKeyLength);
    }

    if encrypted.len() < NONCE_LEN {
        return Err(EncryptionError::InvalidFormat);
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&encrypted[..NONCE_LEN]);

    let unbound_key = UnboundKey::new(&AES_256_GCM, key)?;
    let mut opening_key = OpeningKey::new(unbound_key, SingleNonce { nonce: nonce_bytes });

    let mut in_out = encrypted[NONCE_LEN..].to_vec();
    let decrypted = opening_key
        .open_in_place(Aad::empty(), &mut in_out)
        .map_err(|_| EncryptionError::DecryptionFailed("Opening failed".to_string()))?;

    String::from_utf8(decrypted.to_vec())
        .map_err(|_| EncryptionError::DecryptionFailed("Invalid UTF-8".to_string()))
}

/// Derives a 32-byte cipher key from the configured key string via SHA-256.
pub fn derive_key(key_string: &str) -> [u8; 32] {
    use ring::digest;

    let hash = digest::digest(&digest::SHA256, key_string.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(hash.as_ref());
    key
}
