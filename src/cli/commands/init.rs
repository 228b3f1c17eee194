//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "bias-anonymizer.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing bias-anonymizer configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Review the field policy in {}", self.output);
                println!("  2. Set BIAS_ANONYMIZER_HASH_SALT so hashes are stable across runs");
                println!(
                    "  3. Validate configuration: bias-anonymizer validate-config -c {}",
                    self.output
                );
                println!("  4. Anonymize: bias-anonymizer anonymize profiles.jsonl -o out.jsonl");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                tracing::error!(error = %e, output = %self.output, "Failed to write configuration file");
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# bias-anonymizer configuration

[application]
log_level = "info"
pretty_output = true

[detection]
detect_pii = true
detect_bias = true
confidence_threshold = 0.7

[anonymization]
strategy = "custom"
max_workers = 4

[anonymization.operators]
PERSON = { type = "replace", new_value = "[PERSON]" }
EMAIL_ADDRESS = { type = "mask", masking_char = "*", chars_to_mask = 10 }
PHONE_NUMBER = { type = "hash" }
LOCATION = { type = "replace", new_value = "[LOCATION]" }
DATE_TIME = { type = "replace", new_value = "[DATE]" }
CREDIT_CARD = { type = "mask", chars_to_mask = 12 }
IP_ADDRESS = { type = "mask", chars_to_mask = 7, from_end = true }
US_SSN = { type = "mask", chars_to_mask = 5 }
DEFAULT = { type = "redact" }

[field_policy]
preset = "talent_profile"
default_policy = "anonymize"

[audit]
enabled = false

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# bias-anonymizer configuration
#
# Values of the form ${VAR_NAME} are replaced with environment variables
# before parsing. Every BIAS_ANONYMIZER_* variable listed below overrides
# the matching file setting.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
# Override: BIAS_ANONYMIZER_APPLICATION_LOG_LEVEL
log_level = "info"

# Pretty-print JSON and JSON array output (JSON Lines is always compact)
pretty_output = true

# ============================================================================
# Detection
# ============================================================================
[detection]
# Built-in PII recognizers (email, phone, SSN, credit card, IP, dates, URLs)
# Override: BIAS_ANONYMIZER_DETECT_PII
detect_pii = true

# Bias word lists (gender, race, age, religion, ...)
# Override: BIAS_ANONYMIZER_DETECT_BIAS
detect_bias = true

# Restrict bias detection to these categories (empty means all)
bias_categories = []

# Spans scoring below this are dropped
# Override: BIAS_ANONYMIZER_CONFIDENCE_THRESHOLD
confidence_threshold = 0.7

# Words inspected on each side of a match, and the boost when a context
# word is found there
context_window = 5
context_boost = 0.15

# Language passed to an injected NLP recognizer
language = "en"

# Only detect these entity types (empty means all)
entity_types = []

# Extra descriptor words per bias category
# [detection.custom_bias_words]
# gender = ["gal", "fella"]

# ============================================================================
# Anonymization
# ============================================================================
[anonymization]
# custom | redact_all | replace_all
# Override: BIAS_ANONYMIZER_STRATEGY
strategy = "custom"

# Documents processed concurrently
# Override: BIAS_ANONYMIZER_MAX_WORKERS
max_workers = 4

# Documents nested deeper than this are rejected
max_depth = 64

# Top-level field used as the document id in reports and audit entries
document_id_field = "id"

# Operator per entity type. DEFAULT covers every type not listed; without
# it every detectable type must have an entry or the engine refuses to start.
#   replace { new_value }
#   mask    { masking_char, chars_to_mask, from_end }
#   hash    { algorithm = "sha256" | "sha512" }
#   redact
#   encrypt { key_ref }   (key from [secrets.encryption_keys])
#   keep
[anonymization.operators]
PERSON = { type = "replace", new_value = "[PERSON]" }
EMAIL_ADDRESS = { type = "mask", masking_char = "*", chars_to_mask = 10, from_end = false }
PHONE_NUMBER = { type = "hash", algorithm = "sha256" }
LOCATION = { type = "replace", new_value = "[LOCATION]" }
DATE_TIME = { type = "replace", new_value = "[DATE]" }
CREDIT_CARD = { type = "mask", masking_char = "*", chars_to_mask = 12, from_end = false }
IP_ADDRESS = { type = "mask", masking_char = "*", chars_to_mask = 7, from_end = true }
US_SSN = { type = "mask", masking_char = "*", chars_to_mask = 5, from_end = false }
DEFAULT = { type = "redact" }

# Tokens used by the replace_all strategy
[anonymization.replacement_tokens]
PERSON = "[NAME]"
DEFAULT = "[REDACTED]"

# ============================================================================
# Field Policy
# ============================================================================
# Rule precedence: preserve, then special, then always_anonymize, then the
# default. Paths use dots for keys, [*] for any array index and * for a
# single key segment.
[field_policy]
preset = "talent_profile"

# What happens to paths no rule matches (anonymize | preserve). Required.
default_policy = "anonymize"

preserve = ["id", "tenantId"]
always_anonymize = ["notes", "summary"]

# Whole-value transformations
#   hash        { prefix, length }
#   year_only   { fallback }
#   categorize  { buckets = [{ max, label }], overflow, fallback }
#   remove
#   replace     { value }
[field_policy.special]
"managerId" = { type = "hash", prefix = "MGR_", length = 12 }
"hireDate" = { type = "year_only" }

# ============================================================================
# Custom Recognizers
# ============================================================================
[[recognizers]]
id = "employee_id"
entity_type = "EMPLOYEE_ID"
patterns = [{ name = "emp", regex = '\bEMP-\d{6}\b', score = 0.9 }]
context = ["employee", "badge"]

# ============================================================================
# Secrets
# ============================================================================
[secrets]
# Salt for hash operators. A random salt is used for each run when unset,
# so hashes only match within one run.
# Override: BIAS_ANONYMIZER_HASH_SALT
# hash_salt = "${BIAS_ANONYMIZER_HASH_SALT}"

# Base64 AES-256 keys referenced by encrypt operators
# [secrets.encryption_keys]
# primary = "${BIAS_ANONYMIZER_PRIMARY_KEY}"

# ============================================================================
# Audit
# ============================================================================
[audit]
# Overrides: BIAS_ANONYMIZER_AUDIT_ENABLED, BIAS_ANONYMIZER_AUDIT_LOG_PATH,
# BIAS_ANONYMIZER_AUDIT_JSON_FORMAT
enabled = false
log_path = "./audit/anonymization.log"
json_format = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files with rotation (daily, hourly, never)
# Overrides: BIAS_ANONYMIZER_LOGGING_LOCAL_ENABLED, BIAS_ANONYMIZER_LOGGING_LOCAL_PATH
local_enabled = false
local_path = "./logs"
local_rotation = "daily"

# Write console logs (stderr) as JSON
console_json = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::AnonymizationEngine;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_config_is_valid() {
        let config = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(config.engine.field_policy.preset.as_deref(), Some("talent_profile"));
        assert!(AnonymizationEngine::new(config.engine).is_ok());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse_config(&InitArgs::generate_config_with_examples()).unwrap();
        assert_eq!(config.engine.recognizers.len(), 1);
        assert_eq!(config.engine.field_policy.special.len(), 2);
        assert!(AnonymizationEngine::new(config.engine).is_ok());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bias-anonymizer.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), EXIT_SUCCESS);
        assert!(fs::read_to_string(&output).unwrap().contains("[field_policy]"));
    }
}
