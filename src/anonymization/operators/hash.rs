//! Salted digests for the HASH operator and the `hash` micro-operator

use crate::config::SecretString;
use rand::RngCore;
use secrecy::{ExposeSecret, Secret, SecretVec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;

const GENERATED_SALT_LEN: usize = 32;

/// Digest algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Run-scoped salt mixed into every digest.
///
/// Identical input hashes identically for as long as the same salt is used.
/// A configured salt keeps digests stable across runs, a generated one only
/// within the current process.
pub struct HashSalt(SecretVec<u8>);

impl HashSalt {
    /// Random salt for a single run
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; GENERATED_SALT_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(Secret::new(bytes))
    }

    /// Salt taken from configuration
    pub fn from_secret(secret: &SecretString) -> Self {
        Self(Secret::new(
            secret.expose_secret().as_ref().as_bytes().to_vec(),
        ))
    }

    /// Salt from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Secret::new(bytes.to_vec()))
    }

    fn bytes(&self) -> &[u8] {
        self.0.expose_secret()
    }

    /// Lowercase hex digest of `salt ‖ text`
    pub fn digest_hex(&self, algorithm: HashAlgorithm, text: &str) -> String {
        match algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(self.bytes());
                hasher.update(text.as_bytes());
                format!("{:x}", hasher.finalize())
            }
            HashAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                hasher.update(self.bytes());
                hasher.update(text.as_bytes());
                format!("{:x}", hasher.finalize())
            }
        }
    }
}

impl fmt::Debug for HashSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashSalt([REDACTED])")
    }
}
