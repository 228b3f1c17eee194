//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;
pub mod input;

use clap::{Parser, Subcommand};

/// Exit code: success
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: some documents failed or were processed without full coverage
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: fatal error
pub const EXIT_FATAL: i32 = 5;

/// Bias Anonymizer - PII and bias-descriptor anonymization for HR records
#[derive(Parser, Debug)]
#[command(name = "bias-anonymizer")]
#[command(version, about, long_about = None)]
#[command(author = "Bias Anonymizer Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "bias-anonymizer.toml",
        env = "BIAS_ANONYMIZER_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BIAS_ANONYMIZER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Anonymize JSON documents
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Report PII and bias findings without changing documents
    Analyze(commands::analyze::AnalyzeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
