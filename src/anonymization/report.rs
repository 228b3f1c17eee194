//! Analysis and batch reporting
//!
//! [`AnalysisReport`] describes what detection found in one document without
//! changing it. [`BatchReport`] summarizes an anonymization batch. Neither
//! report carries matched plaintext.

use crate::anonymization::models::{
    AnonymizedDocument, Detection, RecognizerFailure, SpecialField,
};
use crate::domain::entity::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const BIAS_FIELD_WEIGHT: usize = 3;
const PII_FIELD_WEIGHT: usize = 5;
const MAX_RISK_SCORE: usize = 100;

/// Findings for one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFinding {
    pub field_path: String,
    pub entities_found: usize,
    pub bias_categories: BTreeSet<String>,
    pub pii_types: BTreeSet<EntityType>,
    pub detections: Vec<Detection>,
}

/// Detection results for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub document_id: String,
    /// String leaves that went through detection
    pub total_fields_checked: usize,
    pub fields_with_bias: Vec<String>,
    pub fields_with_pii: Vec<String>,
    pub bias_categories_found: BTreeSet<String>,
    pub pii_types_found: BTreeSet<EntityType>,
    pub entity_counts: BTreeMap<EntityType, usize>,
    /// `min(100, 3 * bias fields + 5 * PII fields)`
    pub risk_score: usize,
    pub details: Vec<FieldFinding>,
    pub special_fields: Vec<SpecialField>,
    pub failures: Vec<RecognizerFailure>,
    /// False when a recognizer failed, so findings may be missing
    pub complete: bool,
}

impl AnalysisReport {
    /// Build a report from walker output
    pub fn new(
        document_id: String,
        total_fields_checked: usize,
        detections: Vec<Detection>,
        special_fields: Vec<SpecialField>,
        failures: Vec<RecognizerFailure>,
    ) -> Self {
        let mut details: Vec<FieldFinding> = Vec::new();
        let mut entity_counts = BTreeMap::new();

        for detection in detections {
            *entity_counts
                .entry(detection.entity_type.clone())
                .or_insert(0) += 1;

            // Detections of one field arrive consecutively
            if details
                .last()
                .map_or(true, |f| f.field_path != detection.field_path)
            {
                details.push(FieldFinding {
                    field_path: detection.field_path.clone(),
                    entities_found: 0,
                    bias_categories: BTreeSet::new(),
                    pii_types: BTreeSet::new(),
                    detections: Vec::new(),
                });
            }
            if let Some(finding) = details.last_mut() {
                finding.entities_found += 1;
                match detection.entity_type.bias_category() {
                    Some(category) => {
                        finding.bias_categories.insert(category);
                    }
                    None => {
                        finding.pii_types.insert(detection.entity_type.clone());
                    }
                }
                finding.detections.push(detection);
            }
        }

        let fields_with_bias: Vec<String> = details
            .iter()
            .filter(|f| !f.bias_categories.is_empty())
            .map(|f| f.field_path.clone())
            .collect();
        let fields_with_pii: Vec<String> = details
            .iter()
            .filter(|f| !f.pii_types.is_empty())
            .map(|f| f.field_path.clone())
            .collect();
        let bias_categories_found = details
            .iter()
            .flat_map(|f| f.bias_categories.iter().cloned())
            .collect();
        let pii_types_found = details
            .iter()
            .flat_map(|f| f.pii_types.iter().cloned())
            .collect();
        let risk_score = (fields_with_bias.len() * BIAS_FIELD_WEIGHT
            + fields_with_pii.len() * PII_FIELD_WEIGHT)
            .min(MAX_RISK_SCORE);

        Self {
            document_id,
            total_fields_checked,
            fields_with_bias,
            fields_with_pii,
            bias_categories_found,
            pii_types_found,
            entity_counts,
            risk_score,
            details,
            special_fields,
            complete: failures.is_empty(),
            failures,
        }
    }

    /// Total resolved spans
    pub fn total_entities(&self) -> usize {
        self.entity_counts.values().sum()
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    BIAS & PII ANALYSIS REPORT                 \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  Document:              {}\n", self.document_id));
        output.push_str(&format!("  Risk Score:            {}/100\n", self.risk_score));
        output.push_str(&format!(
            "  Fields Checked:        {}\n",
            self.total_fields_checked
        ));
        output.push_str(&format!(
            "  Fields with Bias:      {}\n",
            self.fields_with_bias.len()
        ));
        output.push_str(&format!(
            "  Fields with PII:       {}\n",
            self.fields_with_pii.len()
        ));
        output.push_str(&format!(
            "  Special Fields:        {}\n",
            self.special_fields.len()
        ));
        output.push('\n');

        if !self.bias_categories_found.is_empty() {
            let categories: Vec<&str> =
                self.bias_categories_found.iter().map(String::as_str).collect();
            output.push_str(&format!("  Bias categories: {}\n", categories.join(", ")));
        }
        if !self.pii_types_found.is_empty() {
            let types: Vec<&str> = self.pii_types_found.iter().map(|t| t.as_str()).collect();
            output.push_str(&format!("  PII types:       {}\n", types.join(", ")));
        }

        if !self.details.is_empty() {
            output.push('\n');
            output.push_str("🔍 FINDINGS BY FIELD\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for finding in &self.details {
                let mut types: Vec<&str> = finding
                    .detections
                    .iter()
                    .map(|d| d.entity_type.as_str())
                    .collect();
                types.dedup();
                output.push_str(&format!(
                    "  {:40} {:>3}  {}\n",
                    finding.field_path,
                    finding.entities_found,
                    types.join(", ")
                ));
            }
        }

        if !self.complete {
            output.push('\n');
            output.push_str("⚠️  INCOMPLETE ANALYSIS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for failure in &self.failures {
                output.push_str(&format!(
                    "  • {} at {}: {}\n",
                    failure.recognizer_id,
                    failure.field_path.as_deref().unwrap_or("-"),
                    failure.reason
                ));
            }
        }

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Summary of an anonymization batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Documents anonymized successfully
    pub total_documents: usize,

    /// Documents that failed and were not written
    pub failed_documents: usize,

    /// Total spans rewritten
    pub total_detections: usize,

    /// Detections by entity type
    pub detections_by_entity: BTreeMap<EntityType, usize>,

    /// Ids of documents whose detection had recognizer failures
    pub incomplete_documents: Vec<String>,

    /// Warnings raised while processing
    pub warnings: Vec<String>,

    /// Processing statistics
    pub stats: ProcessingStats,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Average processing time per document (ms)
    pub avg_processing_time_ms: u64,

    /// Total processing time (ms)
    pub total_processing_time_ms: u64,

    pub documents_with_detections: usize,

    pub documents_without_detections: usize,
}

impl BatchReport {
    /// Create a new empty batch report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results from an anonymized document
    pub fn add_document(&mut self, document: &AnonymizedDocument) {
        self.total_documents += 1;
        self.stats.total_processing_time_ms += document.processing_time_ms;

        if document.has_detections() {
            self.stats.documents_with_detections += 1;
            self.total_detections += document.total_detections();
            for (entity_type, count) in &document.stats_by_entity {
                *self
                    .detections_by_entity
                    .entry(entity_type.clone())
                    .or_insert(0) += count;
            }
        } else {
            self.stats.documents_without_detections += 1;
        }

        if !document.complete {
            self.incomplete_documents.push(document.document_id.clone());
        }

        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / self.total_documents as u64;
    }

    /// Record a document that failed
    pub fn add_failure(&mut self, reason: String) {
        self.failed_documents += 1;
        self.warnings.push(reason);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Whether every document completed with full recognizer coverage
    pub fn is_complete(&self) -> bool {
        self.failed_documents == 0 && self.incomplete_documents.is_empty()
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    ANONYMIZATION BATCH REPORT                 \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "  Documents Anonymized:        {}\n",
            self.total_documents
        ));
        output.push_str(&format!(
            "  Documents Failed:            {}\n",
            self.failed_documents
        ));
        output.push_str(&format!(
            "  Documents with Detections:   {}\n",
            self.stats.documents_with_detections
        ));
        output.push_str(&format!(
            "  Total Entities Anonymized:   {}\n",
            self.total_detections
        ));
        output.push_str(&format!(
            "  Avg Processing Time:         {} ms\n",
            self.stats.avg_processing_time_ms
        ));
        output.push('\n');

        if !self.detections_by_entity.is_empty() {
            output.push_str("🔍 DETECTIONS BY ENTITY TYPE\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            let mut entities: Vec<_> = self.detections_by_entity.iter().collect();
            entities.sort_by(|a, b| b.1.cmp(a.1));

            for (entity_type, count) in entities {
                output.push_str(&format!("  {:30} {:>5}\n", entity_type.as_str(), count));
            }
            output.push('\n');
        }

        if !self.incomplete_documents.is_empty() {
            output.push_str("⚠️  INCOMPLETE DOCUMENTS (recognizer failures)\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for id in &self.incomplete_documents {
                output.push_str(&format!("  • {id}\n"));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
