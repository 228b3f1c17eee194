//! Configuration management
//!
//! TOML configuration loading, parsing and validation.
//!
//! # Overview
//!
//! The configuration file supports:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `BIAS_ANONYMIZER_*` environment overrides
//! - Default values for optional settings
//! - Validation before any document is processed
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and output formatting
//! - `[detection]`, `[anonymization]`, `[field_policy]`, `[[recognizers]]`,
//!   `[secrets]`, `[audit]` - engine settings, see
//!   [`AnonymizationConfig`](crate::anonymization::AnonymizationConfig)
//! - [`LoggingConfig`] - console and file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [detection]
//! confidence_threshold = 0.7
//! bias_categories = ["gender", "age", "race_ethnicity"]
//!
//! [anonymization]
//! strategy = "custom"
//!
//! [anonymization.operators]
//! EMAIL_ADDRESS = { type = "mask", masking_char = "*", chars_to_mask = 10 }
//! PHONE_NUMBER = { type = "hash", algorithm = "sha256" }
//! DEFAULT = { type = "redact" }
//!
//! [field_policy]
//! preset = "talent_profile"
//! default_policy = "anonymize"
//!
//! [secrets]
//! hash_salt = "${BIAS_ANONYMIZER_SALT}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{AnonymizerConfig, ApplicationConfig, LoggingConfig};
pub use secret::{secret_string, SecretString, SecretValue};
