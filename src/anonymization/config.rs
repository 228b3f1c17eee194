//! Anonymization engine configuration
//!
//! Everything the engine needs, fixed at construction time: which
//! recognizers run, the operator table and strategy, the field policy,
//! custom recognizers, run secrets and audit settings.

use crate::anonymization::operators::{AnonymizationStrategy, OperatorMapping};
use crate::anonymization::policy::FieldPolicyConfig;
use crate::anonymization::recognizer::pattern::{DEFAULT_CONTEXT_BOOST, DEFAULT_CONTEXT_WINDOW};
use crate::anonymization::recognizer::{PatternRecognizer, PatternRule};
use crate::anonymization::registry::BuiltinSelection;
use crate::anonymization::resolver::DEFAULT_MIN_CONFIDENCE;
use crate::anonymization::walker::DEFAULT_MAX_DEPTH;
use crate::config::{secret_string, SecretString};
use crate::domain::entity::{BiasCategory, EntityType};
use crate::domain::{AnonymizerError, Result};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Recognizer selection and scoring
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Operators, strategy and traversal limits
    #[serde(default)]
    pub anonymization: AnonymizationSettings,

    /// Per-path policy; `default_policy` must be given explicitly
    pub field_policy: FieldPolicyConfig,

    /// Additional pattern recognizers
    #[serde(default)]
    pub recognizers: Vec<CustomRecognizerConfig>,

    /// Hash salt and encryption keys
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            anonymization: AnonymizationSettings::default(),
            field_policy: FieldPolicyConfig::default(),
            recognizers: Vec::new(),
            secrets: SecretsConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    /// Validate the configuration
    ///
    /// Operator coverage depends on the final recognizer set and is checked
    /// when the engine is built.
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.anonymization.validate()?;
        self.field_policy.build()?;

        let mut ids = HashSet::new();
        for recognizer in &self.recognizers {
            if !ids.insert(recognizer.id.as_str()) {
                return Err(AnonymizerError::Configuration(format!(
                    "Duplicate custom recognizer id '{}'",
                    recognizer.id
                )));
            }
            recognizer.build(&self.detection)?;
        }

        if let Some(salt) = &self.secrets.hash_salt {
            if salt.expose_secret().is_empty() {
                return Err(AnonymizerError::Configuration(
                    "secrets.hash_salt cannot be empty".to_string(),
                ));
            }
        }

        self.audit.validate()?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_STRATEGY") {
            self.anonymization.strategy = val.parse()?;
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_CONFIDENCE_THRESHOLD") {
            self.detection.confidence_threshold =
                parse_env("BIAS_ANONYMIZER_CONFIDENCE_THRESHOLD", &val)?;
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_DETECT_PII") {
            self.detection.detect_pii = parse_env("BIAS_ANONYMIZER_DETECT_PII", &val)?;
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_DETECT_BIAS") {
            self.detection.detect_bias = parse_env("BIAS_ANONYMIZER_DETECT_BIAS", &val)?;
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_MAX_WORKERS") {
            self.anonymization.max_workers = parse_env("BIAS_ANONYMIZER_MAX_WORKERS", &val)?;
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_HASH_SALT") {
            self.secrets.hash_salt = Some(secret_string(val));
        }

        self.audit.apply_env_overrides()?;
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AnonymizerError::Configuration(format!("Invalid {name} value: {value}")))
}

/// Which recognizers run and how candidates are scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Load the built-in PII recognizers
    #[serde(default = "default_true")]
    pub detect_pii: bool,

    /// Load the bias word-list recognizers
    #[serde(default = "default_true")]
    pub detect_bias: bool,

    /// Bias categories to detect (empty means all)
    #[serde(default)]
    pub bias_categories: Vec<BiasCategory>,

    /// Additional descriptor words per bias category
    #[serde(default)]
    pub custom_bias_words: BTreeMap<BiasCategory, Vec<String>>,

    /// Minimum confidence for a span to be kept
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Words inspected on each side of a match for context
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Confidence added when a context word is found
    #[serde(default = "default_context_boost")]
    pub context_boost: f32,

    /// Language passed to the NLP recognizer
    #[serde(default = "default_language")]
    pub language: String,

    /// Only run recognizers for these entity types (empty means all)
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            detect_pii: true,
            detect_bias: true,
            bias_categories: Vec::new(),
            custom_bias_words: BTreeMap::new(),
            confidence_threshold: DEFAULT_MIN_CONFIDENCE,
            context_window: DEFAULT_CONTEXT_WINDOW,
            context_boost: DEFAULT_CONTEXT_BOOST,
            language: default_language(),
            entity_types: Vec::new(),
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AnonymizerError::Configuration(format!(
                "confidence_threshold must be between 0 and 1, got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.context_boost) {
            return Err(AnonymizerError::Configuration(format!(
                "context_boost must be between 0 and 1, got {}",
                self.context_boost
            )));
        }
        if self.language.trim().is_empty() {
            return Err(AnonymizerError::Configuration(
                "language cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in recognizer selection
    pub fn builtin_selection(&self) -> BuiltinSelection {
        BuiltinSelection {
            pii: self.detect_pii,
            bias: self.detect_bias,
            bias_categories: self.bias_categories.clone(),
            extra_bias_terms: self.custom_bias_words.clone(),
            context_window: self.context_window,
            context_boost: self.context_boost,
        }
    }

    /// Entity type filter, `None` when every type is wanted
    pub fn entity_filter(&self) -> Option<HashSet<EntityType>> {
        if self.entity_types.is_empty() {
            None
        } else {
            Some(self.entity_types.iter().cloned().collect())
        }
    }
}

/// Operator table, strategy and traversal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationSettings {
    #[serde(default)]
    pub strategy: AnonymizationStrategy,

    /// Operator per entity type plus `DEFAULT`
    #[serde(default = "OperatorMapping::reference")]
    pub operators: OperatorMapping,

    /// Tokens used by the `replace_all` strategy
    #[serde(default)]
    pub replacement_tokens: BTreeMap<String, String>,

    /// Nesting limit for documents
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Documents processed concurrently in a batch
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Top-level field holding the document id
    #[serde(default = "default_document_id_field")]
    pub document_id_field: String,
}

impl Default for AnonymizationSettings {
    fn default() -> Self {
        Self {
            strategy: AnonymizationStrategy::default(),
            operators: OperatorMapping::reference(),
            replacement_tokens: BTreeMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_workers: default_max_workers(),
            document_id_field: default_document_id_field(),
        }
    }
}

impl AnonymizationSettings {
    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(AnonymizerError::Configuration(
                "max_depth must be greater than 0".to_string(),
            ));
        }
        if self.max_workers == 0 || self.max_workers > 256 {
            return Err(AnonymizerError::Configuration(format!(
                "max_workers must be between 1 and 256, got {}",
                self.max_workers
            )));
        }
        if self.document_id_field.trim().is_empty() {
            return Err(AnonymizerError::Configuration(
                "document_id_field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A regex in a custom recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPatternConfig {
    pub name: String,
    pub regex: String,
    #[serde(default = "default_custom_score")]
    pub score: f32,
}

/// Pattern recognizer declared in configuration
///
/// ```toml
/// [[recognizers]]
/// id = "employee_id"
/// entity_type = "EMPLOYEE_ID"
/// patterns = [{ name = "emp", regex = "\\bEMP-\\d{6}\\b", score = 0.9 }]
/// context = ["employee", "badge"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRecognizerConfig {
    pub id: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub patterns: Vec<CustomPatternConfig>,
    #[serde(default)]
    pub context: Vec<String>,
    /// Literal terms matched as whole words
    #[serde(default)]
    pub deny_list: Vec<String>,
    #[serde(default = "default_custom_score")]
    pub deny_list_score: f32,
}

impl CustomRecognizerConfig {
    /// Compile into a pattern recognizer
    pub fn build(&self, detection: &DetectionConfig) -> Result<PatternRecognizer> {
        if self.patterns.is_empty() && self.deny_list.is_empty() {
            return Err(AnonymizerError::Configuration(format!(
                "Recognizer '{}' needs at least one pattern or deny_list entry",
                self.id
            )));
        }

        let mut rules = self
            .patterns
            .iter()
            .map(|p| {
                PatternRule::new(&p.name, self.entity_type.clone(), &p.regex, p.score)
                    .map(|rule| rule.with_context(&self.context))
            })
            .collect::<Result<Vec<_>>>()?;

        if !self.deny_list.is_empty() {
            rules.push(
                PatternRule::from_terms(
                    format!("{}_deny_list", self.id),
                    self.entity_type.clone(),
                    &self.deny_list,
                    self.deny_list_score,
                )?
                .with_context(&self.context),
            );
        }

        Ok(PatternRecognizer::new(&self.id, rules)?
            .with_context_scoring(detection.context_window, detection.context_boost))
    }
}

/// Run secrets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Salt for HASH operators; a random per-run salt is used when absent
    #[serde(default)]
    pub hash_salt: Option<SecretString>,

    /// Base64 AES-256 keys by reference name
    #[serde(default)]
    pub encryption_keys: BTreeMap<String, SecretString>,
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_true")]
    pub json_format: bool,
}

fn default_true() -> bool {
    true
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}

fn default_context_boost() -> f32 {
    DEFAULT_CONTEXT_BOOST
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_workers() -> usize {
    4
}

fn default_document_id_field() -> String {
    "id".to_string()
}

fn default_custom_score() -> f32 {
    0.85
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/anonymization.log")
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err(AnonymizerError::Configuration(
                "audit.log_path cannot be empty when auditing is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_AUDIT_ENABLED") {
            self.enabled = parse_env("BIAS_ANONYMIZER_AUDIT_ENABLED", &val)?;
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("BIAS_ANONYMIZER_AUDIT_JSON_FORMAT") {
            self.json_format = parse_env("BIAS_ANONYMIZER_AUDIT_JSON_FORMAT", &val)?;
        }

        Ok(())
    }
}
