//! Audit logger for anonymization operations

use crate::anonymization::models::{AnonymizedDocument, Detection};
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    document_id: String,
    detections_count: usize,
    special_fields_count: usize,
    strategy: String,
    complete: bool,
    processing_time_ms: u64,
    detections: Vec<AuditDetection>,
}

/// Audit detection entry (with hashed matched text)
#[derive(Debug, Serialize)]
struct AuditDetection {
    entity_type: String,
    field_path: String,
    confidence: f32,
    operator: Option<String>,
    /// SHA-256 hash of the matched text (never log plaintext)
    value_hash: String,
}

/// Audit logger for anonymization operations
///
/// Entries are appended one line per document. Writes are serialized so
/// concurrent batch workers never interleave partial lines.
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
            write_lock: Mutex::new(()),
        })
    }

    /// A logger that never writes
    pub fn disabled() -> Self {
        Self {
            log_path: PathBuf::new(),
            json_format: true,
            enabled: false,
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log an anonymized document
    pub fn log_anonymization(&self, document: &AnonymizedDocument) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: document.timestamp.to_rfc3339(),
            document_id: document.document_id.clone(),
            detections_count: document.detections.len(),
            special_fields_count: document.special_fields.len(),
            strategy: document.strategy_applied.clone(),
            complete: document.complete,
            processing_time_ms: document.processing_time_ms,
            detections: document
                .detections
                .iter()
                .map(create_audit_detection)
                .collect(),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let line = if self.json_format {
            serde_json::to_string(entry).context("Failed to serialize audit entry")?
        } else {
            format!(
                "[{}] Document: {} | Detections: {} | Special: {} | Strategy: {} | Complete: {} | Time: {}ms",
                entry.timestamp,
                entry.document_id,
                entry.detections_count,
                entry.special_fields_count,
                entry.strategy,
                entry.complete,
                entry.processing_time_ms
            )
        };

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        writeln!(file, "{line}").context("Failed to write audit entry")?;

        Ok(())
    }
}

fn create_audit_detection(detection: &Detection) -> AuditDetection {
    AuditDetection {
        entity_type: detection.entity_type.to_string(),
        field_path: detection.field_path.clone(),
        confidence: detection.confidence,
        operator: detection.operator.clone(),
        value_hash: hash_value(&detection.original_value),
    }
}

/// Hash a matched value using SHA-256
fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}
