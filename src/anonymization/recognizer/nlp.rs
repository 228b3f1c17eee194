//! Named-entity recognition seam
//!
//! The named-entity model is an external capability. Anything implementing
//! [`NlpEntityRecognizer`] can be wrapped in an [`NlpRecognizer`] and
//! registered next to the pattern recognizers; its spans are validated and
//! then treated exactly like pattern output.

use super::Recognizer;
use crate::anonymization::models::{CandidateSpan, DetectionMethod};
use crate::domain::entity::{pii, EntityType};
use crate::domain::{AnonymizerError, Result};
use std::sync::Arc;

/// External named-entity recognizer
pub trait NlpEntityRecognizer: Send + Sync {
    /// Name used as the recognizer id
    fn name(&self) -> &str;

    /// Entity types the model can emit
    fn supported_entities(&self) -> Vec<EntityType> {
        [pii::PERSON, pii::LOCATION, pii::DATE_TIME]
            .into_iter()
            .map(EntityType::known)
            .collect()
    }

    /// Return spans for names, locations, organizations and dates in `text`
    fn recognize_nlp_entities(&self, text: &str, language: &str) -> Result<Vec<CandidateSpan>>;
}

/// Adapter registering an [`NlpEntityRecognizer`] as a [`Recognizer`]
pub struct NlpRecognizer {
    id: String,
    language: String,
    entities: Vec<EntityType>,
    inner: Arc<dyn NlpEntityRecognizer>,
}

impl NlpRecognizer {
    /// Wrap a model for the given language
    pub fn new(inner: Arc<dyn NlpEntityRecognizer>, language: impl Into<String>) -> Self {
        Self {
            id: format!("nlp:{}", inner.name()),
            language: language.into(),
            entities: inner.supported_entities(),
            inner,
        }
    }

    /// Language passed to the model
    pub fn language(&self) -> &str {
        &self.language
    }

    fn check_span(&self, text: &str, span: &CandidateSpan) -> Result<()> {
        if !span.fits(text) {
            return Err(AnonymizerError::recognizer(
                &self.id,
                format!(
                    "span {}..{} is not a valid range of a {}-byte text",
                    span.start,
                    span.end,
                    text.len()
                ),
            ));
        }
        Ok(())
    }
}

impl Recognizer for NlpRecognizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn supported_entities(&self) -> &[EntityType] {
        &self.entities
    }

    fn detect(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let spans = self
            .inner
            .recognize_nlp_entities(text, &self.language)
            .map_err(|e| AnonymizerError::recognizer(&self.id, e.to_string()))?;

        spans
            .into_iter()
            .map(|span| {
                self.check_span(text, &span)?;
                Ok(CandidateSpan::new(
                    span.start,
                    span.end,
                    span.entity_type,
                    span.confidence,
                    &self.id,
                )
                .with_method(DetectionMethod::Nlp))
            })
            .collect()
    }
}
