//! Per-document detection results

use super::span::{DetectionMethod, RecognizerFailure, ResolvedSpan};
use crate::domain::entity::{EntityGroup, EntityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A resolved span together with the field it was found in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Entity type of the span
    pub entity_type: EntityType,
    /// Path of the leaf containing the span
    pub field_path: String,
    /// Byte offsets within the leaf text
    pub start: usize,
    pub end: usize,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    pub recognizer_id: String,
    pub detection_method: DetectionMethod,
    /// Name of the operator applied, if the span was rewritten
    pub operator: Option<String>,
    /// Matched text; never serialized, only hashed by the audit log
    #[serde(skip)]
    pub original_value: String,
}

impl Detection {
    /// Build a detection from a resolved span of `text` at `field_path`
    pub fn from_span(span: &ResolvedSpan, text: &str, field_path: &str) -> Self {
        Self {
            entity_type: span.entity_type.clone(),
            field_path: field_path.to_string(),
            start: span.start,
            end: span.end,
            confidence: span.confidence,
            recognizer_id: span.recognizer_id.clone(),
            detection_method: span.detection_method,
            operator: None,
            original_value: span.text(text).to_string(),
        }
    }

    /// Record the operator that rewrote this span
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn group(&self) -> EntityGroup {
        self.entity_type.group()
    }
}

/// A leaf rewritten by a micro-operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialField {
    pub field_path: String,
    pub micro_operator: String,
}

/// Result of anonymizing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizedDocument {
    /// Document id (configured id field or generated)
    pub document_id: String,
    /// Anonymized document, same shape as the input
    pub anonymized_data: Value,
    /// Resolved spans that were rewritten
    pub detections: Vec<Detection>,
    /// Leaves handled by micro-operators
    pub special_fields: Vec<SpecialField>,
    /// Recognizers that failed on some leaf
    pub failures: Vec<RecognizerFailure>,
    /// False when any recognizer failed, so coverage is not guaranteed
    pub complete: bool,
    /// Strategy applied
    pub strategy_applied: String,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Timestamp of anonymization
    pub timestamp: DateTime<Utc>,
    /// Detection counts by entity type
    pub stats_by_entity: BTreeMap<EntityType, usize>,
}

impl AnonymizedDocument {
    /// Create a new anonymized document result
    pub fn new(
        document_id: String,
        anonymized_data: Value,
        detections: Vec<Detection>,
        special_fields: Vec<SpecialField>,
        failures: Vec<RecognizerFailure>,
        strategy_applied: String,
        processing_time_ms: u64,
    ) -> Self {
        let mut stats_by_entity = BTreeMap::new();
        for detection in &detections {
            *stats_by_entity
                .entry(detection.entity_type.clone())
                .or_insert(0) += 1;
        }

        Self {
            document_id,
            anonymized_data,
            detections,
            special_fields,
            complete: failures.is_empty(),
            failures,
            strategy_applied,
            processing_time_ms,
            timestamp: Utc::now(),
            stats_by_entity,
        }
    }

    /// Get total number of detections
    pub fn total_detections(&self) -> usize {
        self.detections.len()
    }

    /// Check if anything was detected
    pub fn has_detections(&self) -> bool {
        !self.detections.is_empty()
    }

    /// Number of detections in one entity group
    pub fn count_in_group(&self, group: EntityGroup) -> usize {
        self.detections.iter().filter(|d| d.group() == group).count()
    }
}
