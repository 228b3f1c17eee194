//! Run secrets: the hash salt and the encryption keys
//!
//! Both are read from configuration into [`SecretString`], so they are
//! zeroed on drop and never appear in `Debug` output or log lines.
//!
//! ```rust
//! use bias_anonymizer::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let salt = secret_string("per-run-salt".to_string());
//! assert_eq!(salt.expose_secret().as_ref(), "per-run-salt");
//! assert!(!format!("{salt:?}").contains("per-run-salt"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Plain text of a salt or base64 key
#[derive(Clone, Debug, Zeroize, Serialize, Deserialize)]
#[serde(transparent)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A salt or key held behind `secrecy`
pub type SecretString = Secret<SecretValue>;

/// Wrap a salt or key read from configuration or the environment
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
