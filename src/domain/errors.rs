//! Domain error types
//!
//! This module defines the error hierarchy for the anonymizer.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main anonymizer error type
///
/// Document-level failures ([`AnonymizerError::MalformedInput`]) and
/// configuration-level failures ([`AnonymizerError::OperatorMisconfiguration`],
/// [`AnonymizerError::Configuration`]) are surfaced to the caller. Recognizer
/// failures are normally contained by the registry and only reach callers that
/// invoke a recognizer directly.
#[derive(Debug, Error)]
pub enum AnonymizerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The document cannot be walked (too deep, unclassifiable leaf)
    #[error("Malformed input at '{path}': {reason}")]
    MalformedInput { path: String, reason: String },

    /// An entity type has no operator and no default operator exists,
    /// or an operator references something that is not configured
    #[error("Operator misconfiguration: {0}")]
    OperatorMisconfiguration(String),

    /// A single recognizer failed on a single text unit
    #[error("Recognizer '{recognizer}' failed: {reason}")]
    Recognizer { recognizer: String, reason: String },

    /// A pattern rule could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(String),

    /// Encryption operator errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A batch worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl AnonymizerError {
    /// Creates a malformed input error for the given field path
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a recognizer failure
    pub fn recognizer(recognizer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Recognizer {
            recognizer: recognizer.into(),
            reason: reason.into(),
        }
    }

    /// Returns the offending field path for document-level failures
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Self::MalformedInput { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for AnonymizerError {
    fn from(err: std::io::Error) -> Self {
        AnonymizerError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AnonymizerError {
    fn from(err: serde_json::Error) -> Self {
        AnonymizerError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AnonymizerError {
    fn from(err: toml::de::Error) -> Self {
        AnonymizerError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from regex compile errors
impl From<regex::Error> for AnonymizerError {
    fn from(err: regex::Error) -> Self {
        AnonymizerError::Pattern(err.to_string())
    }
}
