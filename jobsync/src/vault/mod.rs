//! AES-256-GCM credential vault.
//!
//! OAuth tokens are sealed before they touch the database and opened on the
//! way back out. Sealed blobs are laid out as `nonce || ciphertext` with a
//! fresh random 96-bit nonce per call, so sealing the same plaintext twice
//! never yields the same bytes.

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit};
use thiserror::Error;

/// 96-bit GCM nonce prepended to every sealed blob.
const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("encryption key is empty (set ENCRYPTION_KEY)")]
    EmptyKey,

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    Seal,

    #[error("ciphertext too short")]
    TooShort,

    #[error("decryption failed (wrong key or corrupted data)")]
    Open,
}

/// Symmetric vault around a single AES-256-GCM key.
pub struct SecretBox {
    cipher: Aes256Gcm,
}

impl SecretBox {
    /// Builds a vault from the configured key material. Accepts either 32
    /// raw bytes or 64 hex chars, tolerating surrounding whitespace, quotes
    /// and a `0x` prefix. Anything else is rejected up front.
    pub fn new(raw_key: &str) -> Result<Self, VaultError> {
        let key = decode_key(raw_key)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| VaultError::InvalidKey("key must be exactly 32 bytes".to_string()))?;
        Ok(Self { cipher })
    }

    /// Seals `plaintext` under a fresh random nonce, returning
    /// `nonce || ciphertext`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::Seal)?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Opens a `nonce || ciphertext` blob produced by [`SecretBox::seal`].
    /// Any tampering with the nonce, body or tag fails authentication.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, VaultError> {
        if sealed.len() < NONCE_LEN {
            return Err(VaultError::TooShort);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| VaultError::Open)
    }
}

/// Decodes key material into 32 key bytes. Hex is tried first whenever the
/// normalized string looks like hex and has even length; otherwise the raw
/// bytes are used as-is.
fn decode_key(raw: &str) -> Result<[u8; 32], VaultError> {
    if raw.is_empty() {
        return Err(VaultError::EmptyKey);
    }

    let k = raw.trim();
    let k = k.trim_matches(|c| c == '"' || c == '\'');
    let k = k
        .strip_prefix("0x")
        .or_else(|| k.strip_prefix("0X"))
        .unwrap_or(k);

    if is_likely_hex(k) && k.len() % 2 == 0 {
        let bytes = hex::decode(k)
            .map_err(|e| VaultError::InvalidKey(format!("invalid hex string: {e}")))?;
        return bytes.try_into().map_err(|_| {
            VaultError::InvalidKey("hex key must represent exactly 32 bytes (64 hex chars)".to_string())
        });
    }

    let bytes = k.as_bytes();
    if bytes.len() == 32 {
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        return Ok(key);
    }

    Err(VaultError::InvalidKey(
        "encryption key must be 32 raw bytes or 64-char hex".to_string(),
    ))
}

fn is_likely_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}
