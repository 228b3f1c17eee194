//! Document walker
//!
//! Single recursive descent over a `serde_json::Value`. Maps keep their key
//! order and lists their element order; only scalar content changes. Each
//! leaf is classified by the field policy table and then preserved, handed
//! to its micro-operator, or analyzed and rewritten.

use crate::anonymization::models::{Detection, RecognizerFailure, SpecialField};
use crate::anonymization::operators::{OperatorDispatcher, OperatorMapping};
use crate::anonymization::policy::{FieldPath, FieldPolicyTable, LeafAction};
use crate::anonymization::registry::RecognizerRegistry;
use crate::anonymization::resolver::EntityResolver;
use crate::domain::entity::EntityType;
use crate::domain::{AnonymizerError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Nesting limit for documents
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Whether leaves are rewritten or only inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    Anonymize,
    Analyze,
}

/// Everything a walk found besides the output document
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Rewritten document (a copy of the input in analyze mode)
    pub document: Value,
    pub detections: Vec<Detection>,
    pub special_fields: Vec<SpecialField>,
    pub failures: Vec<RecognizerFailure>,
    /// String leaves that went through detection
    pub analyzed_fields: usize,
}

/// Borrowing view over the engine components needed for one walk
pub struct DocumentWalker<'a> {
    registry: &'a RecognizerRegistry,
    resolver: EntityResolver,
    dispatcher: &'a OperatorDispatcher,
    mapping: &'a OperatorMapping,
    policy: &'a FieldPolicyTable,
    entity_filter: Option<&'a HashSet<EntityType>>,
    max_depth: usize,
}

impl<'a> DocumentWalker<'a> {
    pub fn new(
        registry: &'a RecognizerRegistry,
        resolver: EntityResolver,
        dispatcher: &'a OperatorDispatcher,
        mapping: &'a OperatorMapping,
        policy: &'a FieldPolicyTable,
    ) -> Self {
        Self {
            registry,
            resolver,
            dispatcher,
            mapping,
            policy,
            entity_filter: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Only run recognizers for these entity types
    pub fn with_entity_filter(mut self, filter: Option<&'a HashSet<EntityType>>) -> Self {
        self.entity_filter = filter;
        self
    }

    /// Walk a whole document.
    ///
    /// Fails with [`AnonymizerError::MalformedInput`] when the nesting limit
    /// is exceeded; no partial output is returned in that case.
    pub fn process(&self, document: &Value, mode: WalkMode) -> Result<WalkOutput> {
        let mut output = WalkOutput::default();
        let document = self.walk(document, &FieldPath::root(), 0, mode, &mut output)?;
        Ok(WalkOutput { document, ..output })
    }

    fn walk(
        &self,
        value: &Value,
        path: &FieldPath,
        depth: usize,
        mode: WalkMode,
        output: &mut WalkOutput,
    ) -> Result<Value> {
        if depth > self.max_depth {
            return Err(AnonymizerError::malformed(
                display_path(path),
                format!("nesting exceeds the maximum depth of {}", self.max_depth),
            ));
        }

        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let child_path = path.child_key(key);
                    out.insert(
                        key.clone(),
                        self.walk(child, &child_path, depth + 1, mode, output)?,
                    );
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.walk(item, &path.child_index(i), depth + 1, mode, output))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            scalar => self.leaf(scalar, path, mode, output),
        }
    }

    fn leaf(
        &self,
        value: &Value,
        path: &FieldPath,
        mode: WalkMode,
        output: &mut WalkOutput,
    ) -> Result<Value> {
        match self.policy.action(path) {
            LeafAction::Preserve => Ok(value.clone()),
            LeafAction::Special(operator) => {
                output.special_fields.push(SpecialField {
                    field_path: path.to_string(),
                    micro_operator: operator.name().to_string(),
                });
                match mode {
                    WalkMode::Anonymize => Ok(operator.apply(value, self.dispatcher.salt())),
                    WalkMode::Analyze => Ok(value.clone()),
                }
            }
            LeafAction::Analyze => match value {
                Value::String(text) if !text.is_empty() => self
                    .analyze_text(text, path, mode, output)
                    .map(Value::String),
                // Non-string scalars only change under a SPECIAL policy
                other => Ok(other.clone()),
            },
        }
    }

    fn analyze_text(
        &self,
        text: &str,
        path: &FieldPath,
        mode: WalkMode,
        output: &mut WalkOutput,
    ) -> Result<String> {
        let field_path = path.to_string();
        let analysis = self.registry.analyze(text, self.entity_filter);
        output.analyzed_fields += 1;

        output
            .failures
            .extend(analysis.failures.into_iter().map(|mut failure| {
                failure.field_path = Some(field_path.clone());
                failure
            }));

        let spans = self.resolver.resolve(analysis.candidates);
        if spans.is_empty() {
            return Ok(text.to_string());
        }

        tracing::debug!(
            field_path = %field_path,
            spans = spans.len(),
            "Resolved entities in field"
        );

        match mode {
            WalkMode::Analyze => {
                output.detections.extend(
                    spans
                        .iter()
                        .map(|span| Detection::from_span(span, text, &field_path)),
                );
                Ok(text.to_string())
            }
            WalkMode::Anonymize => {
                for span in spans.iter().filter(|s| !s.is_empty()) {
                    let operator = self.mapping.operator_for(&span.entity_type)?;
                    output.detections.push(
                        Detection::from_span(span, text, &field_path).with_operator(operator.name()),
                    );
                }
                self.dispatcher.apply(text, &spans, self.mapping)
            }
        }
    }
}

fn display_path(path: &FieldPath) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::operators::{HashSalt, KeyRing, Operator};
    use crate::anonymization::policy::{DefaultPolicy, MicroOperator};
    use crate::anonymization::recognizer::PatternRule;
    use crate::anonymization::registry::BuiltinSelection;
    use serde_json::json;

    struct Fixture {
        registry: RecognizerRegistry,
        dispatcher: OperatorDispatcher,
        mapping: OperatorMapping,
        policy: FieldPolicyTable,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = RecognizerRegistry::with_builtins(&BuiltinSelection::default()).unwrap();
            registry
                .register_rules(
                    "person_names",
                    vec![PatternRule::new(
                        "names",
                        EntityType::new("PERSON").unwrap(),
                        r"\b(?:John|Jane) Smith\b",
                        0.9,
                    )
                    .unwrap()],
                )
                .unwrap();

            let policy = FieldPolicyTable::new(DefaultPolicy::Anonymize)
                .preserve("id")
                .unwrap()
                .special("distance", MicroOperator::categorize())
                .unwrap();

            Self {
                registry,
                dispatcher: OperatorDispatcher::new(HashSalt::from_bytes(b"t"), KeyRing::new()),
                mapping: OperatorMapping::reference(),
                policy,
            }
        }

        fn walker(&self) -> DocumentWalker<'_> {
            DocumentWalker::new(
                &self.registry,
                EntityResolver::default(),
                &self.dispatcher,
                &self.mapping,
                &self.policy,
            )
        }
    }

    #[test]
    fn test_walk_rewrites_leaves_and_keeps_shape() {
        let fixture = Fixture::new();
        let doc = json!({
            "id": "John Smith",
            "profile": {
                "name": "John Smith",
                "notes": ["female engineer", 42, true, null],
            },
            "distance": 5
        });

        let out = fixture.walker().process(&doc, WalkMode::Anonymize).unwrap();

        assert_eq!(out.document["id"], "John Smith");
        assert_eq!(out.document["profile"]["name"], "[PERSON]");
        assert_eq!(out.document["profile"]["notes"][0], "engineer");
        assert_eq!(out.document["profile"]["notes"][1], 42);
        assert_eq!(out.document["profile"]["notes"][2], true);
        assert_eq!(out.document["profile"]["notes"][3], Value::Null);
        assert_eq!(out.document["distance"], "Mid-level");

        let keys: Vec<&String> = out.document.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "profile", "distance"]);

        assert_eq!(out.detections.len(), 2);
        assert_eq!(out.detections[1].field_path, "profile.notes[0]");
        assert_eq!(out.detections[1].operator.as_deref(), Some("redact"));
        assert_eq!(out.special_fields.len(), 1);
        assert_eq!(out.analyzed_fields, 2);
        assert!(out.failures.is_empty());
    }

    #[test]
    fn test_analyze_mode_leaves_document_untouched() {
        let fixture = Fixture::new();
        let doc = json!({"bio": "Contact jane@corp.example", "distance": 3});
        let out = fixture.walker().process(&doc, WalkMode::Analyze).unwrap();

        assert_eq!(out.document, doc);
        assert_eq!(out.detections.len(), 1);
        assert_eq!(out.detections[0].entity_type.as_str(), "EMAIL_ADDRESS");
        assert!(out.detections[0].operator.is_none());
    }

    #[test]
    fn test_depth_limit_reports_path() {
        let fixture = Fixture::new();
        let doc = json!({"a": {"b": {"c": {"d": "x"}}}});
        let err = fixture
            .walker()
            .with_max_depth(2)
            .process(&doc, WalkMode::Anonymize)
            .unwrap_err();

        assert!(matches!(err, AnonymizerError::MalformedInput { .. }));
        assert_eq!(err.field_path(), Some("a.b.c"));
    }

    #[test]
    fn test_entity_filter() {
        let fixture = Fixture::new();
        let filter: HashSet<EntityType> = [EntityType::new("PERSON").unwrap()].into();
        let doc = json!({"bio": "John Smith, jane@corp.example"});
        let out = fixture
            .walker()
            .with_entity_filter(Some(&filter))
            .process(&doc, WalkMode::Anonymize)
            .unwrap();
        assert_eq!(out.document["bio"], "[PERSON], jane@corp.example");
    }

    #[test]
    fn test_missing_operator_fails_document() {
        let mut fixture = Fixture::new();
        fixture.mapping = OperatorMapping::new().with(
            EntityType::new("PERSON").unwrap(),
            Operator::replace("[P]"),
        );
        let doc = json!({"bio": "female"});
        let err = fixture
            .walker()
            .process(&doc, WalkMode::Anonymize)
            .unwrap_err();
        assert!(matches!(err, AnonymizerError::OperatorMisconfiguration(_)));
    }
}
