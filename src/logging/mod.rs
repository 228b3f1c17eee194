//! Logging and observability
//!
//! Structured logging with:
//! - Human-readable or JSON console output on stderr
//! - Configurable log levels (`RUST_LOG` overrides)
//! - Local JSON file logging with rotation
//!
//! Matched text is never logged; events carry entity types, paths and counts.
//!
//! # Example
//!
//! ```no_run
//! use bias_anonymizer::logging::init_logging;
//! use bias_anonymizer::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a run over an input
///
/// # Example
///
/// ```no_run
/// use bias_anonymizer::log_run_start;
///
/// log_run_start!("anonymize", "profiles.jsonl", 120);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($command:expr, $input:expr, $documents:expr) => {
        tracing::info!(
            command = $command,
            input = %$input,
            documents = $documents,
            "Starting run"
        );
    };
}

/// Log the completion of a run
///
/// # Example
///
/// ```no_run
/// use bias_anonymizer::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!(42, 1, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($processed:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            processed = $processed,
            failed = $failed,
            duration_ms = $duration.as_millis() as u64,
            "Run completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use bias_anonymizer::log_error_with_context;
/// use bias_anonymizer::domain::AnonymizerError;
///
/// let error = AnonymizerError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
