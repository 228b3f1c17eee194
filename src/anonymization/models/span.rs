//! Span data models produced by recognizers and the entity resolver

use crate::domain::entity::EntityType;
use serde::{Deserialize, Serialize};

/// Detection method that produced a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Built-in or configured pattern rule
    Pattern,
    /// Injected named-entity recognizer
    Nlp,
    /// Caller-supplied recognizer implementation
    Custom,
}

/// A candidate span emitted by a recognizer
///
/// Offsets are UTF-8 byte offsets into the scanned text and always fall on
/// char boundaries. Candidates from different recognizers may overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpan {
    /// Inclusive start offset
    pub start: usize,
    /// Exclusive end offset
    pub end: usize,
    /// What the span represents
    pub entity_type: EntityType,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Id of the recognizer that produced this span
    pub recognizer_id: String,
    /// Detection method used
    pub detection_method: DetectionMethod,
}

impl CandidateSpan {
    /// Create a new candidate span; confidence is clamped to [0, 1]
    pub fn new(
        start: usize,
        end: usize,
        entity_type: EntityType,
        confidence: f32,
        recognizer_id: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            entity_type,
            confidence: clamp_confidence(confidence),
            recognizer_id: recognizer_id.into(),
            detection_method: DetectionMethod::Pattern,
        }
    }

    /// Set the detection method
    pub fn with_method(mut self, method: DetectionMethod) -> Self {
        self.detection_method = method;
        self
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no text
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the offsets select a valid `&str` slice of `text`
    pub fn fits(&self, text: &str) -> bool {
        self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }

    /// End offset used for overlap checks; an empty span still claims its position
    pub(crate) fn occupied_end(&self) -> usize {
        self.end.max(self.start + 1)
    }

    /// Whether two spans claim any common position
    pub fn overlaps(&self, other: &CandidateSpan) -> bool {
        self.start < other.occupied_end() && other.start < self.occupied_end()
    }
}

/// A span selected by the resolver as authoritative for its text region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSpan {
    pub start: usize,
    pub end: usize,
    pub entity_type: EntityType,
    pub confidence: f32,
    pub recognizer_id: String,
    pub detection_method: DetectionMethod,
}

impl ResolvedSpan {
    /// The covered slice of the original text
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no text
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two resolved spans intersect
    pub fn intersects(&self, other: &ResolvedSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<CandidateSpan> for ResolvedSpan {
    fn from(span: CandidateSpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
            entity_type: span.entity_type,
            confidence: span.confidence,
            recognizer_id: span.recognizer_id,
            detection_method: span.detection_method,
        }
    }
}

/// A recognizer that failed on one text unit and was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerFailure {
    /// Failing recognizer id
    pub recognizer_id: String,
    /// Field path of the text unit, filled in by the document walker
    pub field_path: Option<String>,
    /// Error message
    pub reason: String,
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
