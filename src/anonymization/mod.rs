//! PII and bias-descriptor anonymization
//!
//! This module detects personal data and bias descriptors in free-text
//! leaves of nested JSON records and rewrites them in place.
//!
//! # Architecture
//!
//! The pipeline for one string leaf:
//! - **Recognizers**: pattern, word-list and injected NLP recognizers emit candidate spans
//! - **Registry**: runs the selected recognizers and contains their failures
//! - **Resolver**: keeps a non-overlapping subset of confident candidates
//! - **Operators**: rewrite the kept spans right to left
//!
//! Around it, the **field policy** decides per path whether a leaf is
//! preserved, analyzed or handed to a micro-operator, and the **walker**
//! drives the whole document.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bias_anonymizer::anonymization::{AnonymizationConfig, AnonymizationEngine};
//!
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let anonymized = engine.anonymize(&document)?;
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod models;
pub mod operators;
pub mod policy;
pub mod recognizer;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod walker;

// Re-export main types
pub use config::AnonymizationConfig;
pub use engine::AnonymizationEngine;
pub use models::{AnonymizedDocument, CandidateSpan, Detection, ResolvedSpan};
pub use operators::{AnonymizationStrategy, Operator, OperatorMapping};
pub use policy::{DefaultPolicy, FieldPolicyTable, MicroOperator};
pub use report::{AnalysisReport, BatchReport};
