//! Recognizer layer
//!
//! Provides the trait-based detection interface, the pattern recognizer
//! used for every built-in entity type, and the adapter that plugs an
//! external named-entity recognizer into the same interface.

pub mod bias;
pub mod nlp;
pub mod pattern;
pub mod pii;
pub mod validators;

use crate::anonymization::models::CandidateSpan;
use crate::domain::entity::EntityType;
use crate::domain::Result;

pub use nlp::{NlpEntityRecognizer, NlpRecognizer};
pub use pattern::{PatternRecognizer, PatternRule, Validator};

/// Trait for span detection implementations
///
/// Implementations must be pure functions of the input text. An `Err`
/// return is contained by the registry: the recognizer is skipped for that
/// text unit and the result is flagged as incomplete.
pub trait Recognizer: Send + Sync {
    /// Stable identifier used in spans, logs and failure reports
    fn id(&self) -> &str;

    /// Entity types this recognizer can emit
    fn supported_entities(&self) -> &[EntityType];

    /// Detect candidate spans in a unit of text
    fn detect(&self, text: &str) -> Result<Vec<CandidateSpan>>;
}
