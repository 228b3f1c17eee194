//! Validate config command implementation
//!
//! This module implements the `validate-config` command. Validation goes
//! as far as building the engine, so operator coverage and custom
//! recognizers are checked too.

use super::load_engine;
use crate::cli::{EXIT_CONFIG, EXIT_SUCCESS};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let Some((config, engine)) = load_engine(config_path, |_| Ok(())) else {
            return Ok(EXIT_CONFIG);
        };

        let detection = &config.engine.detection;
        let settings = &config.engine.anonymization;
        let policy = engine.policy();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Strategy: {}", settings.strategy);
        println!("  Detect PII: {}", detection.detect_pii);
        println!("  Detect Bias: {}", detection.detect_bias);
        println!("  Confidence Threshold: {}", detection.confidence_threshold);
        println!("  Max Workers: {}", settings.max_workers);
        println!("  Max Depth: {}", settings.max_depth);
        println!();
        println!("Field Policy:");
        println!("  Default: {}", policy.default_policy());
        println!("  Preserve Rules: {}", policy.preserve_patterns().len());
        println!(
            "  Always-Anonymize Rules: {}",
            policy.always_anonymize_patterns().len()
        );
        println!("  Special Rules: {}", policy.special_rules().len());
        println!();
        println!("Recognizers:");
        println!("  Registered: {}", engine.registry().len());
        println!("  Entity Types: {}", engine.registry().entity_types().len());
        println!(
            "  Audit Log: {}",
            if config.engine.audit.enabled {
                config.engine.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );

        Ok(EXIT_SUCCESS)
    }
}
