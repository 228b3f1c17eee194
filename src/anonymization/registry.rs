//! Recognizer registry
//!
//! Holds every active recognizer and runs them over a unit of text. A
//! recognizer that fails is skipped for that text unit only; the failure is
//! logged and returned next to the candidates so the caller can mark the
//! result as incomplete.

use crate::anonymization::models::{CandidateSpan, RecognizerFailure};
use crate::anonymization::recognizer::pattern::{DEFAULT_CONTEXT_BOOST, DEFAULT_CONTEXT_WINDOW};
use crate::anonymization::recognizer::{bias, pii, PatternRecognizer, PatternRule, Recognizer};
use crate::domain::entity::{BiasCategory, EntityType};
use crate::domain::{AnonymizerError, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Which built-in recognizers to load
#[derive(Debug, Clone)]
pub struct BuiltinSelection {
    /// Load the PII pattern recognizers
    pub pii: bool,
    /// Load the bias word-list recognizers
    pub bias: bool,
    /// Restrict bias recognizers to these categories (empty means all)
    pub bias_categories: Vec<BiasCategory>,
    /// Extra descriptor terms per category
    pub extra_bias_terms: BTreeMap<BiasCategory, Vec<String>>,
    /// Words inspected on each side of a match for context
    pub context_window: usize,
    /// Confidence boost for a context hit
    pub context_boost: f32,
}

impl Default for BuiltinSelection {
    fn default() -> Self {
        Self {
            pii: true,
            bias: true,
            bias_categories: Vec::new(),
            extra_bias_terms: BTreeMap::new(),
            context_window: DEFAULT_CONTEXT_WINDOW,
            context_boost: DEFAULT_CONTEXT_BOOST,
        }
    }
}

/// Output of one registry pass over a text unit
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Unordered candidates from every recognizer that succeeded
    pub candidates: Vec<CandidateSpan>,
    /// Recognizers skipped because they failed
    pub failures: Vec<RecognizerFailure>,
}

impl Analysis {
    /// Whether every selected recognizer ran to completion
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry of active recognizers
#[derive(Clone, Default)]
pub struct RecognizerRegistry {
    recognizers: Vec<Arc<dyn Recognizer>>,
    suppressed: HashSet<EntityType>,
}

impl RecognizerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the selected built-in recognizers
    pub fn with_builtins(selection: &BuiltinSelection) -> Result<Self> {
        let mut registry = Self::new();
        let mut recognizers: Vec<PatternRecognizer> = Vec::new();

        if selection.pii {
            recognizers.extend(pii::builtin_recognizers()?);
        }
        if selection.bias {
            recognizers.extend(bias::builtin_recognizers(
                &selection.bias_categories,
                &selection.extra_bias_terms,
            )?);
        }

        for recognizer in recognizers {
            let recognizer = recognizer
                .with_context_scoring(selection.context_window, selection.context_boost);
            registry.register(Arc::new(recognizer))?;
        }

        tracing::debug!(
            recognizers = registry.len(),
            pii = selection.pii,
            bias = selection.bias,
            "Loaded built-in recognizers"
        );

        Ok(registry)
    }

    /// Register a recognizer; ids must be unique
    pub fn register(&mut self, recognizer: Arc<dyn Recognizer>) -> Result<()> {
        if self.recognizers.iter().any(|r| r.id() == recognizer.id()) {
            return Err(AnonymizerError::Configuration(format!(
                "Recognizer '{}' is already registered",
                recognizer.id()
            )));
        }
        if recognizer.supported_entities().is_empty() {
            return Err(AnonymizerError::Configuration(format!(
                "Recognizer '{}' supports no entity types",
                recognizer.id()
            )));
        }

        for entity in recognizer.supported_entities() {
            self.suppressed.remove(entity);
        }
        tracing::debug!(recognizer = recognizer.id(), "Registered recognizer");
        self.recognizers.push(recognizer);
        Ok(())
    }

    /// Compile a rule set into a pattern recognizer and register it
    pub fn register_rules(&mut self, id: impl Into<String>, rules: Vec<PatternRule>) -> Result<()> {
        let recognizer = PatternRecognizer::new(id, rules)?;
        self.register(Arc::new(recognizer))
    }

    /// Stop emitting an entity type
    ///
    /// Recognizers dedicated to the type are removed; recognizers that also
    /// emit other types stay registered with this type filtered from their
    /// output. Returns the number of recognizers affected.
    pub fn deregister(&mut self, entity_type: &EntityType) -> usize {
        let before = self.recognizers.len();
        self.recognizers.retain(|r| {
            !r.supported_entities()
                .iter()
                .all(|supported| supported == entity_type)
        });
        let removed = before - self.recognizers.len();

        let shared = self
            .recognizers
            .iter()
            .filter(|r| r.supported_entities().contains(entity_type))
            .count();
        if shared > 0 {
            self.suppressed.insert(entity_type.clone());
        }

        tracing::debug!(
            entity_type = %entity_type,
            removed,
            shared,
            "Deregistered entity type"
        );
        removed + shared
    }

    /// Entity types that can currently be emitted
    pub fn entity_types(&self) -> BTreeSet<EntityType> {
        self.recognizers
            .iter()
            .flat_map(|r| r.supported_entities().iter().cloned())
            .filter(|e| !self.suppressed.contains(e))
            .collect()
    }

    /// Number of registered recognizers
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    /// Whether no recognizer is registered
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Run every selected recognizer over `text`
    pub fn analyze(&self, text: &str, filter: Option<&HashSet<EntityType>>) -> Analysis {
        let allowed = |entity: &EntityType| {
            !self.suppressed.contains(entity) && filter.map_or(true, |f| f.contains(entity))
        };

        let mut analysis = Analysis::default();

        for recognizer in &self.recognizers {
            if !recognizer.supported_entities().iter().any(allowed) {
                continue;
            }

            let detected = recognizer.detect(text).and_then(|spans| {
                let invalid = spans
                    .iter()
                    .find(|span| !span.fits(text))
                    .map(|span| (span.start, span.end));
                match invalid {
                    Some((start, end)) => Err(AnonymizerError::recognizer(
                        recognizer.id(),
                        format!(
                            "span {start}..{end} is not a valid range of a {}-byte text",
                            text.len()
                        ),
                    )),
                    None => Ok(spans),
                }
            });

            match detected {
                Ok(spans) => {
                    let supported = recognizer.supported_entities();
                    analysis.candidates.extend(spans.into_iter().filter(|span| {
                        let keep = supported.contains(&span.entity_type) && allowed(&span.entity_type);
                        if !keep {
                            tracing::trace!(
                                recognizer = recognizer.id(),
                                entity_type = %span.entity_type,
                                "Dropping span outside the recognizer's selected entity types"
                            );
                        }
                        keep
                    }));
                }
                Err(e) => {
                    tracing::warn!(
                        recognizer = recognizer.id(),
                        error = %e,
                        "Recognizer failed; skipping it for this text unit"
                    );
                    analysis.failures.push(RecognizerFailure {
                        recognizer_id: recognizer.id().to_string(),
                        field_path: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        analysis
    }
}

impl std::fmt::Debug for RecognizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerRegistry")
            .field(
                "recognizers",
                &self.recognizers.iter().map(|r| r.id()).collect::<Vec<_>>(),
            )
            .field("suppressed", &self.suppressed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::pii as pii_types;
    use test_case::test_case;

    struct Failing;

    impl Recognizer for Failing {
        fn id(&self) -> &str {
            "failing"
        }

        fn supported_entities(&self) -> &[EntityType] {
            static ENTITIES: std::sync::OnceLock<Vec<EntityType>> = std::sync::OnceLock::new();
            ENTITIES.get_or_init(|| vec![EntityType::known("EMPLOYEE_ID")])
        }

        fn detect(&self, _text: &str) -> Result<Vec<CandidateSpan>> {
            Err(AnonymizerError::recognizer("failing", "boom"))
        }
    }

    struct MultiType {
        entities: Vec<EntityType>,
    }

    impl Recognizer for MultiType {
        fn id(&self) -> &str {
            "multi"
        }

        fn supported_entities(&self) -> &[EntityType] {
            &self.entities
        }

        fn detect(&self, text: &str) -> Result<Vec<CandidateSpan>> {
            Ok(self
                .entities
                .iter()
                .map(|e| CandidateSpan::new(0, text.len(), e.clone(), 0.9, "multi"))
                .collect())
        }
    }

    fn employee_rules() -> Vec<PatternRule> {
        vec![PatternRule::new(
            "employee_id",
            EntityType::new("EMPLOYEE_ID").unwrap(),
            r"\bEMP-\d{6}\b",
            0.9,
        )
        .unwrap()]
    }

    #[test]
    fn test_builtins_cover_reference_types() {
        let registry = RecognizerRegistry::with_builtins(&BuiltinSelection::default()).unwrap();
        let types = registry.entity_types();
        assert_eq!(registry.len(), 21);
        assert!(types.contains(&EntityType::known(pii_types::EMAIL_ADDRESS)));
        assert!(types.contains(&BiasCategory::Gender.entity_type()));
        assert!(!types.contains(&EntityType::known(pii_types::PERSON)));
    }

    #[test]
    fn test_filter_restricts_recognizers() {
        let registry = RecognizerRegistry::with_builtins(&BuiltinSelection::default()).unwrap();
        let filter: HashSet<EntityType> = [EntityType::known(pii_types::EMAIL_ADDRESS)].into();
        let analysis = registry.analyze("she wrote to a@b.io from 555-123-4567", Some(&filter));
        assert_eq!(analysis.candidates.len(), 1);
        assert_eq!(analysis.candidates[0].entity_type.as_str(), "EMAIL_ADDRESS");
    }

    #[test]
    fn test_custom_rules_extend_builtins() {
        let mut registry = RecognizerRegistry::with_builtins(&BuiltinSelection::default()).unwrap();
        registry.register_rules("employee_id", employee_rules()).unwrap();
        let analysis = registry.analyze("badge EMP-004211", None);
        assert!(analysis
            .candidates
            .iter()
            .any(|c| c.entity_type.as_str() == "EMPLOYEE_ID"));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut registry = RecognizerRegistry::new();
        registry.register_rules("employee_id", employee_rules()).unwrap();
        assert!(registry.register_rules("employee_id", employee_rules()).is_err());
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut registry = RecognizerRegistry::new();
        registry.register(Arc::new(Failing)).unwrap();
        registry.register_rules("employee_id", employee_rules()).unwrap();

        let analysis = registry.analyze("EMP-000001", None);
        assert_eq!(analysis.candidates.len(), 1);
        assert_eq!(analysis.failures.len(), 1);
        assert_eq!(analysis.failures[0].recognizer_id, "failing");
        assert!(!analysis.is_complete());
    }

    struct Overrunning;

    impl Recognizer for Overrunning {
        fn id(&self) -> &str {
            "overrunning"
        }

        fn supported_entities(&self) -> &[EntityType] {
            static ENTITIES: std::sync::OnceLock<Vec<EntityType>> = std::sync::OnceLock::new();
            ENTITIES.get_or_init(|| vec![EntityType::known("EMPLOYEE_ID")])
        }

        fn detect(&self, text: &str) -> Result<Vec<CandidateSpan>> {
            Ok(vec![
                CandidateSpan::new(0, 1, EntityType::known("EMPLOYEE_ID"), 0.95, "overrunning"),
                CandidateSpan::new(0, text.len() + 5, EntityType::known("EMPLOYEE_ID"), 0.95, "overrunning"),
            ])
        }
    }

    #[test_case("mail a@b.io" ; "past the end")]
    #[test_case("é" ; "inside a multibyte char")]
    fn test_invalid_span_fails_only_its_recognizer(text: &str) {
        let mut registry = RecognizerRegistry::with_builtins(&BuiltinSelection::default()).unwrap();
        registry.register(Arc::new(Overrunning)).unwrap();

        let analysis = registry.analyze(text, None);
        assert!(!analysis.is_complete());
        assert_eq!(analysis.failures.len(), 1);
        assert_eq!(analysis.failures[0].recognizer_id, "overrunning");
        assert!(analysis
            .candidates
            .iter()
            .all(|c| c.recognizer_id != "overrunning"));
    }

    #[test]
    fn test_deregister_removes_dedicated_recognizers() {
        let mut registry = RecognizerRegistry::with_builtins(&BuiltinSelection::default()).unwrap();
        let email = EntityType::known(pii_types::EMAIL_ADDRESS);
        assert_eq!(registry.deregister(&email), 1);
        assert!(!registry.entity_types().contains(&email));
        assert!(registry.analyze("a@b.io", None).candidates.is_empty());
    }

    #[test]
    fn test_deregister_suppresses_shared_recognizers() {
        let person = EntityType::known(pii_types::PERSON);
        let location = EntityType::known(pii_types::LOCATION);
        let mut registry = RecognizerRegistry::new();
        registry
            .register(Arc::new(MultiType {
                entities: vec![person.clone(), location.clone()],
            }))
            .unwrap();

        assert_eq!(registry.deregister(&person), 1);
        assert_eq!(registry.len(), 1);
        let analysis = registry.analyze("Paris", None);
        assert_eq!(analysis.candidates.len(), 1);
        assert_eq!(analysis.candidates[0].entity_type, location);
    }
}
