//! CLI command implementations

pub mod analyze;
pub mod anonymize;
pub mod init;
pub mod validate;

use crate::anonymization::AnonymizationEngine;
use crate::config::{load_config, AnonymizerConfig};

/// Load the configuration and build the engine, printing the failure
///
/// Returns `None` when either step fails; the caller exits with the
/// configuration error code.
pub(crate) fn load_engine(
    config_path: &str,
    adjust: impl FnOnce(&mut AnonymizerConfig) -> crate::domain::Result<()>,
) -> Option<(AnonymizerConfig, AnonymizationEngine)> {
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("❌ Failed to load configuration: {e}");
            return None;
        }
    };

    if let Err(e) = adjust(&mut config) {
        tracing::error!(error = %e, "Invalid command line override");
        eprintln!("❌ {e}");
        return None;
    }

    match AnonymizationEngine::new(config.engine.clone()) {
        Ok(engine) => Some((config, engine)),
        Err(e) => {
            crate::log_error_with_context!(&e, "Failed to build anonymization engine");
            eprintln!("❌ Failed to build anonymization engine: {e}");
            None
        }
    }
}
