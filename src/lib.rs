// Bias Anonymizer - PII and bias-descriptor anonymization for HR records
// Copyright (c) 2025 Bias Anonymizer Contributors
// Licensed under the MIT License

//! # Bias Anonymizer
//!
//! Detects personal data and bias-prone descriptors (gender, age, race,
//! religion and others) in nested employee and talent-profile JSON, and
//! rewrites them with configurable operators before the records reach
//! matching or review workflows.
//!
//! ## Architecture
//!
//! - [`anonymization`] - Recognizers, registry, resolver, field policy,
//!   operators and the document walker, tied together by
//!   [`anonymization::AnonymizationEngine`]
//! - [`domain`] - Entity types, bias categories and the error type
//! - [`config`] - TOML configuration with environment overrides
//! - [`logging`] - Structured logging with `tracing`
//! - [`cli`] - Command-line interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bias_anonymizer::anonymization::AnonymizationEngine;
//! use bias_anonymizer::config::load_config;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("bias-anonymizer.toml")?;
//! let engine = AnonymizationEngine::new(config.engine)?;
//!
//! let profile = json!({
//!     "id": "emp-001",
//!     "summary": "She is a young engineer, reach her at jane@corp.example"
//! });
//! let result = engine.anonymize(&profile)?;
//! println!("{}", result.anonymized_data);
//! # Ok(())
//! # }
//! ```
//!
//! ## Batches
//!
//! Batches run on the blocking thread pool with bounded concurrency and
//! keep input order:
//!
//! ```rust,no_run
//! use bias_anonymizer::anonymization::{AnonymizationConfig, AnonymizationEngine};
//! use std::sync::Arc;
//!
//! # async fn example(documents: Vec<serde_json::Value>) -> bias_anonymizer::domain::Result<()> {
//! let engine = Arc::new(AnonymizationEngine::new(AnonymizationConfig::default())?);
//! let (anonymized, report) = engine.anonymize_batch_with_report(documents).await;
//! println!("{} anonymized, {} failed", anonymized.len(), report.failed_documents);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], whose error type is
//! [`domain::AnonymizerError`].

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
