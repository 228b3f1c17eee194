//! AES-256-GCM encryption for the ENCRYPT operator
//!
//! Output format: `ENC:<key_ref>:<base64(nonce ‖ ciphertext)>`. A fresh
//! 96-bit nonce is drawn for every span, so ciphertexts of identical input
//! differ between calls.

use crate::config::SecretString;
use crate::domain::{AnonymizerError, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, Secret, SecretVec};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Prefix of every encrypted token
pub const ENCRYPTED_PREFIX: &str = "ENC";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Named AES-256 keys referenced by `encrypt` operators
#[derive(Default)]
pub struct KeyRing {
    keys: HashMap<String, SecretVec<u8>>,
}

impl KeyRing {
    /// Empty key ring
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key ring from base64-encoded 32-byte keys
    pub fn from_base64(keys: &BTreeMap<String, SecretString>) -> Result<Self> {
        let mut ring = Self::new();
        for (key_ref, encoded) in keys {
            let bytes = BASE64
                .decode(encoded.expose_secret().as_ref().trim())
                .map_err(|e| {
                    AnonymizerError::Configuration(format!(
                        "Encryption key '{key_ref}' is not valid base64: {e}"
                    ))
                })?;
            ring.insert(key_ref, bytes)?;
        }
        Ok(ring)
    }

    /// Add a raw key
    pub fn insert(&mut self, key_ref: &str, key: Vec<u8>) -> Result<()> {
        if key.len() != KEY_LEN {
            return Err(AnonymizerError::Configuration(format!(
                "Encryption key '{key_ref}' must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        if key_ref.is_empty() || key_ref.contains(':') {
            return Err(AnonymizerError::Configuration(format!(
                "Invalid encryption key reference '{key_ref}'"
            )));
        }
        self.keys.insert(key_ref.to_string(), Secret::new(key));
        Ok(())
    }

    pub fn contains(&self, key_ref: &str) -> bool {
        self.keys.contains_key(key_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn cipher(&self, key_ref: &str) -> Result<Aes256Gcm> {
        let key = self.keys.get(key_ref).ok_or_else(|| {
            AnonymizerError::Encryption(format!("Unknown encryption key '{key_ref}'"))
        })?;
        Aes256Gcm::new_from_slice(key.expose_secret())
            .map_err(|e| AnonymizerError::Encryption(format!("Invalid key '{key_ref}': {e}")))
    }

    /// Encrypt `plaintext` with the named key
    pub fn encrypt(&self, key_ref: &str, plaintext: &str) -> Result<String> {
        let cipher = self.cipher(key_ref)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AnonymizerError::Encryption(format!("Encryption failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&ciphertext);

        Ok(format!(
            "{ENCRYPTED_PREFIX}:{key_ref}:{}",
            BASE64.encode(payload)
        ))
    }

    /// Decrypt a token produced by [`KeyRing::encrypt`]
    pub fn decrypt(&self, token: &str) -> Result<String> {
        let malformed = || AnonymizerError::Encryption("Malformed encrypted token".to_string());

        let mut parts = token.splitn(3, ':');
        if parts.next() != Some(ENCRYPTED_PREFIX) {
            return Err(malformed());
        }
        let key_ref = parts.next().ok_or_else(malformed)?;
        let payload = BASE64
            .decode(parts.next().ok_or_else(malformed)?)
            .map_err(|_| malformed())?;
        if payload.len() <= NONCE_LEN {
            return Err(malformed());
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher(key_ref)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AnonymizerError::Encryption(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| AnonymizerError::Encryption(format!("Decrypted text is not UTF-8: {e}")))
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut refs: Vec<&String> = self.keys.keys().collect();
        refs.sort();
        f.debug_struct("KeyRing").field("keys", &refs).finish()
    }
}
