//! Error handling tests for the anonymization engine

use bias_anonymizer::anonymization::models::CandidateSpan;
use bias_anonymizer::anonymization::recognizer::Recognizer;
use bias_anonymizer::anonymization::{
    AnonymizationConfig, AnonymizationEngine, Operator, OperatorMapping,
};
use bias_anonymizer::config::secret_string;
use bias_anonymizer::domain::entity::EntityType;
use bias_anonymizer::domain::{AnonymizerError, Result};
use serde_json::{json, Value};
use std::sync::Arc;

struct Broken(Vec<EntityType>);

impl Recognizer for Broken {
    fn id(&self) -> &str {
        "broken"
    }

    fn supported_entities(&self) -> &[EntityType] {
        &self.0
    }

    fn detect(&self, _text: &str) -> Result<Vec<CandidateSpan>> {
        Err(AnonymizerError::recognizer("broken", "validator input rejected"))
    }
}

/// Emits a span running past the end of the text
struct Overrunning(Vec<EntityType>);

impl Recognizer for Overrunning {
    fn id(&self) -> &str {
        "overrunning"
    }

    fn supported_entities(&self) -> &[EntityType] {
        &self.0
    }

    fn detect(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        Ok(vec![CandidateSpan::new(
            0,
            text.len() + 5,
            self.0[0].clone(),
            0.95,
            "overrunning",
        )])
    }
}

fn nested(depth: usize) -> Value {
    (0..depth).fold(json!("leaf"), |inner, _| json!({ "n": inner }))
}

#[test]
fn test_missing_operator_fails_at_construction() {
    let mut config = AnonymizationConfig::default();
    config.anonymization.operators = OperatorMapping::new().with(
        EntityType::new("EMAIL_ADDRESS").unwrap(),
        Operator::mask('*', 4, false),
    );

    let err = AnonymizationEngine::new(config).unwrap_err();
    assert!(matches!(err, AnonymizerError::OperatorMisconfiguration(_)));
}

#[test]
fn test_unknown_encryption_key_fails_at_construction() {
    let mut config = AnonymizationConfig::default();
    config.anonymization.operators = OperatorMapping::new().with_default(Operator::Encrypt {
        key_ref: "primary".to_string(),
    });

    let err = AnonymizationEngine::new(config).unwrap_err();
    assert!(matches!(err, AnonymizerError::OperatorMisconfiguration(_)));
}

#[test]
fn test_encrypt_round_trip_through_engine() {
    let mut config = AnonymizationConfig::default();
    config.detection.detect_bias = false;
    config.secrets.encryption_keys.insert(
        "primary".to_string(),
        secret_string(format!("{}=", "A".repeat(43))),
    );
    config.anonymization.operators = OperatorMapping::new().with_default(Operator::Encrypt {
        key_ref: "primary".to_string(),
    });
    let engine = AnonymizationEngine::new(config).unwrap();

    let result = engine.anonymize(&json!({ "note": "a@b.io" })).unwrap();
    let token = result.anonymized_data["note"].as_str().unwrap();
    assert_ne!(token, "a@b.io");
    assert_eq!(engine.decrypt(token).unwrap(), "a@b.io");
}

#[test]
fn test_empty_hash_salt_rejected() {
    let mut config = AnonymizationConfig::default();
    config.secrets.hash_salt = Some(secret_string(String::new()));
    let err = AnonymizationEngine::new(config).unwrap_err();
    assert!(matches!(err, AnonymizerError::Configuration(_)));
}

#[test]
fn test_too_deep_document_fails_with_path() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let err = engine.anonymize(&nested(80)).unwrap_err();

    assert!(matches!(err, AnonymizerError::MalformedInput { .. }));
    let path = err.field_path().unwrap();
    assert!(path.starts_with("n.n.n"));
}

#[test]
fn test_failing_recognizer_is_contained() {
    let mut engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    engine
        .register_recognizer(Arc::new(Broken(vec![EntityType::new("BROKEN").unwrap()])))
        .unwrap();

    let result = engine.anonymize(&json!({ "note": "mail a@b.io" })).unwrap();

    // other recognizers still ran
    assert_eq!(result.anonymized_data["note"], "mail ******");
    assert!(!result.complete);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].recognizer_id, "broken");
    assert_eq!(result.failures[0].field_path.as_deref(), Some("note"));
}

#[test]
fn test_out_of_range_span_fails_only_its_recognizer() {
    let mut config = AnonymizationConfig::default();
    config.detection.detect_bias = false;
    let mut engine = AnonymizationEngine::new(config).unwrap();
    engine
        .register_recognizer(Arc::new(Overrunning(vec![
            EntityType::new("EMPLOYEE_ID").unwrap()
        ])))
        .unwrap();

    let result = engine
        .anonymize(&json!({ "note": "mail a@b.io", "other": "x" }))
        .unwrap();

    assert_eq!(result.anonymized_data["note"], "mail ******");
    assert_eq!(result.anonymized_data["other"], "x");
    assert!(!result.complete);
    assert_eq!(result.failures.len(), 2);
    assert!(result
        .failures
        .iter()
        .all(|f| f.recognizer_id == "overrunning"));
}

#[test]
fn test_incomplete_analysis_is_flagged() {
    let mut engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    engine
        .register_recognizer(Arc::new(Broken(vec![EntityType::new("BROKEN").unwrap()])))
        .unwrap();

    let report = engine.analyze(&json!({ "a": "x", "b": "y" })).unwrap();
    assert!(!report.complete);
    assert_eq!(report.failures.len(), 2);
}

#[tokio::test]
async fn test_batch_isolates_failed_documents() {
    let mut config = AnonymizationConfig::default();
    config.anonymization.max_depth = 4;
    let engine = Arc::new(AnonymizationEngine::new(config).unwrap());

    let documents = vec![json!({ "note": "a@b.io" }), nested(10), json!({ "note": "ok" })];
    let (results, report) = engine.anonymize_batch_with_report(documents).await;

    assert_eq!(results.len(), 2);
    assert_eq!(report.failed_documents, 1);
    assert!(!report.is_complete());
}

#[test]
fn test_invalid_custom_regex_rejected() {
    let config: AnonymizationConfig = toml::from_str(
        r#"
[field_policy]
default_policy = "anonymize"

[[recognizers]]
id = "bad"
entity_type = "BAD"
patterns = [{ name = "p", regex = "(unclosed" }]
"#,
    )
    .unwrap();
    assert!(AnonymizationEngine::new(config).is_err());
}
