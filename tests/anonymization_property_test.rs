//! Property tests for traversal and span resolution

use bias_anonymizer::anonymization::models::CandidateSpan;
use bias_anonymizer::anonymization::resolver::EntityResolver;
use bias_anonymizer::anonymization::{AnonymizationConfig, AnonymizationEngine};
use bias_anonymizer::config::secret_string;
use bias_anonymizer::domain::entity::EntityType;
use proptest::prelude::*;
use serde_json::{json, Value};

const PHRASES: &[&str] = &[
    "john@xyz.com",
    "She is a young engineer",
    "Call 555-123-4567 after lunch",
    "Quarterly goals met",
    "Büro in Zürich, 4th floor",
];

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,16}".prop_map(Value::String),
        prop::sample::select(PHRASES).prop_map(|s| Value::String(s.to_string())),
    ]
}

fn document() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Documents whose maps sometimes carry a `keep` key
fn document_with_kept_fields() -> impl Strategy<Value = Value> {
    let key = prop_oneof![1 => Just("keep".to_string()), 3 => "[a-z]{1,6}"];
    let body = leaf().prop_recursive(4, 48, 4, move |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key.clone(), inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    });
    (body, prop::sample::select(PHRASES))
        .prop_map(|(body, phrase)| json!({ "keep": phrase, "body": body }))
}

/// Every value stored under a `keep` key comes out unchanged
fn kept_values_unchanged(input: &Value, output: &Value) -> bool {
    match (input, output) {
        (Value::Object(a), Value::Object(b)) => a.iter().all(|(key, x)| match b.get(key) {
            Some(y) if key == "keep" => x == y,
            Some(y) => kept_values_unchanged(x, y),
            None => false,
        }),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| kept_values_unchanged(x, y))
        }
        _ => true,
    }
}

/// Same containers, keys, lengths and non-string scalars
fn same_shape(input: &Value, output: &Value) -> bool {
    match (input, output) {
        (Value::Object(a), Value::Object(b)) => {
            a.keys().eq(b.keys()) && a.values().zip(b.values()).all(|(x, y)| same_shape(x, y))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_shape(x, y))
        }
        (Value::String(_), Value::String(_)) => true,
        (a, b) => a == b,
    }
}

fn engine() -> AnonymizationEngine {
    let mut config = AnonymizationConfig::default();
    config.secrets.hash_salt = Some(secret_string("property-salt".to_string()));
    AnonymizationEngine::new(config).expect("Failed to create engine")
}

fn engine_preserving_keep() -> AnonymizationEngine {
    let mut config = AnonymizationConfig::default();
    config.secrets.hash_salt = Some(secret_string("property-salt".to_string()));
    config.field_policy.preserve = vec!["keep".to_string(), "**.keep".to_string()];
    AnonymizationEngine::new(config).expect("Failed to create engine")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_anonymize_keeps_shape(doc in document()) {
        let engine = engine();
        let result = engine.anonymize(&doc).unwrap();
        prop_assert!(same_shape(&doc, &result.anonymized_data));
        prop_assert!(result.complete);
    }

    #[test]
    fn prop_preserved_paths_are_untouched(doc in document_with_kept_fields()) {
        let result = engine_preserving_keep().anonymize(&doc).unwrap();
        prop_assert_eq!(&result.anonymized_data["keep"], &doc["keep"]);
        prop_assert!(kept_values_unchanged(&doc, &result.anonymized_data));
        prop_assert!(same_shape(&doc, &result.anonymized_data));
    }

    #[test]
    fn prop_anonymize_is_deterministic(doc in document()) {
        let engine = engine();
        let first = engine.anonymize(&doc).unwrap();
        let second = engine.anonymize(&doc).unwrap();
        prop_assert_eq!(first.anonymized_data, second.anonymized_data);
    }

    #[test]
    fn prop_analyze_never_changes_input(doc in document()) {
        let before = doc.clone();
        let report = engine().analyze(&doc).unwrap();
        prop_assert_eq!(&doc, &before);
        prop_assert!(report.risk_score <= 100);
    }

    #[test]
    fn prop_resolved_spans_do_not_overlap(
        raw in prop::collection::vec((0usize..60, 1usize..12, 0.0f32..=1.0f32), 0..24)
    ) {
        let entity = EntityType::new("TEST").unwrap();
        let candidates: Vec<CandidateSpan> = raw
            .iter()
            .map(|&(start, len, score)| {
                CandidateSpan::new(start, start + len, entity.clone(), score, "prop")
            })
            .collect();

        let resolver = EntityResolver::new(0.5);
        let resolved = resolver.resolve(candidates);

        for pair in resolved.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for span in &resolved {
            prop_assert!(span.confidence >= 0.5);
            prop_assert!(raw.iter().any(|&(s, l, _)| s == span.start && s + l == span.end));
        }
    }
}
