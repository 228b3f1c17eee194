//! Pattern rules and the pattern recognizer
//!
//! A [`PatternRecognizer`] owns one or more [`PatternRule`]s for a single
//! entity type. Every regex match starts at the rule's base score and gains a
//! fixed boost when one of the rule's context words occurs within a window of
//! surrounding words.

use super::Recognizer;
use crate::anonymization::models::CandidateSpan;
use crate::domain::entity::EntityType;
use crate::domain::{AnonymizerError, Result};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Default number of words inspected on each side of a match
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// Default confidence boost for a context word hit
pub const DEFAULT_CONTEXT_BOOST: f32 = 0.15;

/// Structured validator run on each regex match
///
/// `Ok(false)` discards the candidate; `Err` fails the recognizer for the
/// current text unit.
pub type Validator = Arc<dyn Fn(&str) -> std::result::Result<bool, String> + Send + Sync>;

/// An immutable detection rule
#[derive(Clone)]
pub struct PatternRule {
    name: String,
    entity_type: EntityType,
    regex: Regex,
    base_score: f32,
    context_words: Vec<String>,
    validator: Option<Validator>,
}

impl PatternRule {
    /// Compile a new rule
    pub fn new(
        name: impl Into<String>,
        entity_type: EntityType,
        pattern: &str,
        base_score: f32,
    ) -> Result<Self> {
        let name = name.into();
        if !(0.0..=1.0).contains(&base_score) {
            return Err(AnonymizerError::Pattern(format!(
                "Rule '{name}' has base score {base_score} outside [0, 1]"
            )));
        }
        let regex = Regex::new(pattern)
            .map_err(|e| AnonymizerError::Pattern(format!("Rule '{name}': {e}")))?;

        Ok(Self {
            name,
            entity_type,
            regex,
            base_score,
            context_words: Vec::new(),
            validator: None,
        })
    }

    /// Build a case-insensitive whole-word rule from a term list
    ///
    /// Single words also match a trailing plural `s`; multi-word phrases
    /// match literally. Longer terms are tried first.
    pub fn from_terms<S: AsRef<str>>(
        name: impl Into<String>,
        entity_type: EntityType,
        terms: &[S],
        base_score: f32,
    ) -> Result<Self> {
        let name = name.into();
        let mut terms: Vec<&str> = terms
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(AnonymizerError::Pattern(format!(
                "Rule '{name}' has an empty term list"
            )));
        }
        terms.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        });
        terms.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

        let alternatives: Vec<String> = terms
            .iter()
            .map(|term| {
                let escaped = regex::escape(term);
                if term.contains(char::is_whitespace) {
                    escaped
                } else {
                    format!("{escaped}s?")
                }
            })
            .collect();
        let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));

        Self::new(name, entity_type, &pattern, base_score)
    }

    /// Attach context words (matched case-insensitively)
    pub fn with_context<S: AsRef<str>>(mut self, words: &[S]) -> Self {
        self.context_words = words
            .iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        self
    }

    /// Attach a structured validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity type emitted by this rule
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Base confidence score
    pub fn base_score(&self) -> f32 {
        self.base_score
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRule")
            .field("name", &self.name)
            .field("entity_type", &self.entity_type)
            .field("regex", &self.regex.as_str())
            .field("base_score", &self.base_score)
            .field("context_words", &self.context_words)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Recognizer backed by pattern rules for one entity type
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    id: String,
    entities: Vec<EntityType>,
    rules: Vec<PatternRule>,
    context_window: usize,
    context_boost: f32,
}

impl PatternRecognizer {
    /// Create a recognizer; every rule must emit the same entity type
    pub fn new(id: impl Into<String>, rules: Vec<PatternRule>) -> Result<Self> {
        let id = id.into();
        let entity_type = match rules.first() {
            Some(rule) => rule.entity_type.clone(),
            None => {
                return Err(AnonymizerError::Pattern(format!(
                    "Recognizer '{id}' has no rules"
                )))
            }
        };
        if let Some(rule) = rules.iter().find(|r| r.entity_type != entity_type) {
            return Err(AnonymizerError::Pattern(format!(
                "Recognizer '{id}' mixes entity types {entity_type} and {}",
                rule.entity_type
            )));
        }

        Ok(Self {
            id,
            entities: vec![entity_type],
            rules,
            context_window: DEFAULT_CONTEXT_WINDOW,
            context_boost: DEFAULT_CONTEXT_BOOST,
        })
    }

    /// Override the context window and boost
    pub fn with_context_scoring(mut self, window: usize, boost: f32) -> Self {
        self.context_window = window;
        self.context_boost = boost;
        self
    }

    /// The single entity type this recognizer emits
    pub fn entity_type(&self) -> &EntityType {
        &self.entities[0]
    }

    /// Registered rules
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    fn score(&self, rule: &PatternRule, text: &str, start: usize, end: usize) -> f32 {
        if rule.context_words.is_empty()
            || !has_context(text, start, end, self.context_window, &rule.context_words)
        {
            return rule.base_score;
        }
        (rule.base_score + self.context_boost).min(1.0)
    }
}

impl Recognizer for PatternRecognizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn supported_entities(&self) -> &[EntityType] {
        &self.entities
    }

    fn detect(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let mut spans = Vec::new();

        for rule in &self.rules {
            for m in rule.regex.find_iter(text) {
                if let Some(validator) = &rule.validator {
                    match validator(m.as_str()) {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(reason) => {
                            return Err(AnonymizerError::recognizer(
                                &self.id,
                                format!("validator for rule '{}': {reason}", rule.name),
                            ))
                        }
                    }
                }

                spans.push(CandidateSpan::new(
                    m.start(),
                    m.end(),
                    rule.entity_type.clone(),
                    self.score(rule, text, m.start(), m.end()),
                    &self.id,
                ));
            }
        }

        Ok(spans)
    }
}

/// Whether any context word occurs within `window` words around `start..end`
fn has_context(text: &str, start: usize, end: usize, window: usize, words: &[String]) -> bool {
    if window == 0 {
        return false;
    }

    let mut tokens: Vec<String> = text[..start]
        .split_whitespace()
        .rev()
        .take(window)
        .map(normalize_token)
        .collect();
    tokens.reverse();
    tokens.extend(
        text[end..]
            .split_whitespace()
            .take(window)
            .map(normalize_token),
    );

    let joined = tokens.join(" ");
    words.iter().any(|word| {
        if word.contains(' ') {
            joined.contains(word.as_str())
        } else {
            tokens.iter().any(|token| token == word)
        }
    })
}

fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> EntityType {
        EntityType::new("PHONE_NUMBER").unwrap()
    }

    fn short_phone_recognizer() -> PatternRecognizer {
        let rule = PatternRule::new("short", phone(), r"\b\d{3}-\d{4}\b", 0.7)
            .unwrap()
            .with_context(&["call", "phone"]);
        PatternRecognizer::new("phone", vec![rule]).unwrap()
    }

    #[test]
    fn test_base_score_without_context() {
        let spans = short_phone_recognizer().detect("office 555-1234").unwrap();
        assert_eq!(spans.len(), 1);
        assert!((spans[0].confidence - 0.7).abs() < f32::EPSILON);
        assert_eq!((spans[0].start, spans[0].end), (7, 15));
    }

    #[test]
    fn test_context_word_boosts_score() {
        let spans = short_phone_recognizer().detect("Call: 555-1234").unwrap();
        assert!((spans[0].confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_context_outside_window_is_ignored() {
        let text = "call one two three four five six 555-1234";
        let spans = short_phone_recognizer().detect(text).unwrap();
        assert!((spans[0].confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_boost_is_capped() {
        let rule = PatternRule::new("full", phone(), r"\d{3}-\d{4}", 0.95)
            .unwrap()
            .with_context(&["phone"]);
        let recognizer = PatternRecognizer::new("phone", vec![rule]).unwrap();
        let spans = recognizer.detect("phone 555-1234").unwrap();
        assert_eq!(spans[0].confidence, 1.0);
    }

    #[test]
    fn test_validator_discards_candidate() {
        let rule = PatternRule::new("digits", phone(), r"\d+", 0.8)
            .unwrap()
            .with_validator(Arc::new(|s: &str| Ok(s.len() == 4)));
        let recognizer = PatternRecognizer::new("digits", vec![rule]).unwrap();
        let spans = recognizer.detect("12 1234 123456").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 3);
    }

    #[test]
    fn test_validator_error_fails_recognizer() {
        let rule = PatternRule::new("digits", phone(), r"\d+", 0.8)
            .unwrap()
            .with_validator(Arc::new(|_: &str| Err("bad input".to_string())));
        let recognizer = PatternRecognizer::new("digits", vec![rule]).unwrap();
        let err = recognizer.detect("1234").unwrap_err();
        assert!(matches!(err, AnonymizerError::Recognizer { .. }));
    }

    #[test]
    fn test_terms_match_whole_words_and_plurals() {
        let gender = EntityType::new("GENDER_BIAS").unwrap();
        let rule = PatternRule::from_terms("gender", gender, &["woman", "he", "gentleman"], 0.85)
            .unwrap();
        let recognizer = PatternRecognizer::new("gender", vec![rule]).unwrap();

        let spans = recognizer.detect("The gentlemen and he met two women").unwrap();
        let matched: Vec<&str> = spans
            .iter()
            .map(|s| &"The gentlemen and he met two women"[s.start..s.end])
            .collect();
        assert_eq!(matched, vec!["he"]);

        let spans = recognizer.detect("Gentlemans and womans").unwrap();
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_terms_match_phrases_case_insensitively() {
        let age = EntityType::new("AGE_BIAS").unwrap();
        let rule = PatternRule::from_terms("age", age, &["recent graduate"], 0.85).unwrap();
        let recognizer = PatternRecognizer::new("age", vec![rule]).unwrap();
        assert_eq!(recognizer.detect("A Recent Graduate").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        assert!(PatternRule::new("bad", phone(), "(", 0.5).is_err());
        assert!(PatternRule::new("bad", phone(), "a", 1.5).is_err());
        assert!(PatternRule::from_terms::<&str>("bad", phone(), &[], 0.5).is_err());
        assert!(PatternRecognizer::new("empty", vec![]).is_err());
    }

    #[test]
    fn test_mixed_entity_types_are_rejected() {
        let a = PatternRule::new("a", phone(), "a", 0.5).unwrap();
        let b = PatternRule::new("b", EntityType::new("US_SSN").unwrap(), "b", 0.5).unwrap();
        assert!(PatternRecognizer::new("mixed", vec![a, b]).is_err());
    }
}
