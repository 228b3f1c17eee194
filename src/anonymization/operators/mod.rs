//! Span operators and the per-entity-type operator mapping
//!
//! An [`Operator`] rewrites one resolved span. An [`OperatorMapping`] assigns
//! operators to entity types with an optional `DEFAULT` fallback, and an
//! [`AnonymizationStrategy`] decides which mapping a run actually uses.
//!
//! In TOML an operator is a tagged table:
//!
//! ```toml
//! [anonymization.operators]
//! PERSON = { type = "replace", new_value = "[PERSON]" }
//! EMAIL_ADDRESS = { type = "mask", masking_char = "*", chars_to_mask = 10 }
//! US_SSN = { type = "encrypt", key_ref = "hr" }
//! DEFAULT = { type = "redact" }
//! ```

pub mod dispatcher;
pub mod encrypt;
pub mod hash;

pub use dispatcher::OperatorDispatcher;
pub use encrypt::KeyRing;
pub use hash::{HashAlgorithm, HashSalt};

use crate::domain::entity::{pii, EntityGroup, EntityType};
use crate::domain::{AnonymizerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Key of the fallback operator in an operator table
pub const DEFAULT_OPERATOR_KEY: &str = "DEFAULT";

/// Replacement used by the replace-all strategy when no token is configured
pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";

fn default_masking_char() -> char {
    '*'
}

/// Transformation applied to a single resolved span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// Substitute a fixed string
    Replace { new_value: String },
    /// Overwrite `chars_to_mask` characters from the start (or end)
    Mask {
        #[serde(default = "default_masking_char")]
        masking_char: char,
        chars_to_mask: usize,
        #[serde(default)]
        from_end: bool,
    },
    /// Salted hex digest of the span
    Hash {
        #[serde(default)]
        algorithm: HashAlgorithm,
    },
    /// Remove the span and collapse the surrounding whitespace
    Redact,
    /// AES-256-GCM ciphertext under a named key
    Encrypt { key_ref: String },
    /// Leave the span untouched
    Keep,
}

impl Operator {
    /// Short operator name used in reports and audit entries
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Replace { .. } => "replace",
            Operator::Mask { .. } => "mask",
            Operator::Hash { .. } => "hash",
            Operator::Redact => "redact",
            Operator::Encrypt { .. } => "encrypt",
            Operator::Keep => "keep",
        }
    }

    /// Replace with `value`
    pub fn replace(value: impl Into<String>) -> Self {
        Operator::Replace {
            new_value: value.into(),
        }
    }

    /// Mask the first `count` characters with `masking_char`
    pub fn mask(masking_char: char, count: usize, from_end: bool) -> Self {
        Operator::Mask {
            masking_char,
            chars_to_mask: count,
            from_end,
        }
    }

    fn validate(&self, keys: &KeyRing) -> Result<()> {
        match self {
            Operator::Encrypt { key_ref } if !keys.contains(key_ref) => {
                Err(AnonymizerError::OperatorMisconfiguration(format!(
                    "Encrypt operator references unknown key '{key_ref}'"
                )))
            }
            Operator::Mask { masking_char, .. } if masking_char.is_control() => {
                Err(AnonymizerError::OperatorMisconfiguration(
                    "Mask character must be printable".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entity type to operator table with optional fallback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Operator>",
    into = "BTreeMap<String, Operator>"
)]
pub struct OperatorMapping {
    operators: BTreeMap<EntityType, Operator>,
    default: Option<Operator>,
}

impl OperatorMapping {
    /// Empty mapping without a fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an operator to an entity type
    pub fn with(mut self, entity_type: EntityType, operator: Operator) -> Self {
        self.operators.insert(entity_type, operator);
        self
    }

    /// Set the fallback operator
    pub fn with_default(mut self, operator: Operator) -> Self {
        self.default = Some(operator);
        self
    }

    /// Operator explicitly assigned to an entity type
    pub fn get(&self, entity_type: &EntityType) -> Option<&Operator> {
        self.operators.get(entity_type)
    }

    pub fn default_operator(&self) -> Option<&Operator> {
        self.default.as_ref()
    }

    /// Operator for an entity type, falling back to the default
    pub fn operator_for(&self, entity_type: &EntityType) -> Result<&Operator> {
        self.operators
            .get(entity_type)
            .or(self.default.as_ref())
            .ok_or_else(|| {
                AnonymizerError::OperatorMisconfiguration(format!(
                    "No operator for entity type '{entity_type}' and no DEFAULT operator configured"
                ))
            })
    }

    /// Entity types with an explicit operator
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.operators.keys()
    }

    /// Check that every detectable entity type resolves to a usable operator
    pub fn validate<'a>(
        &self,
        entity_types: impl IntoIterator<Item = &'a EntityType>,
        keys: &KeyRing,
    ) -> Result<()> {
        for entity_type in entity_types {
            self.operator_for(entity_type)?;
        }
        for operator in self.operators.values().chain(self.default.iter()) {
            operator.validate(keys)?;
        }
        Ok(())
    }

    /// Reference mapping for PII types with bias types and the fallback redacted
    pub fn reference() -> Self {
        Self::new()
            .with(EntityType::known(pii::PERSON), Operator::replace("[PERSON]"))
            .with(
                EntityType::known(pii::EMAIL_ADDRESS),
                Operator::mask('*', 10, false),
            )
            .with(
                EntityType::known(pii::PHONE_NUMBER),
                Operator::Hash {
                    algorithm: HashAlgorithm::Sha256,
                },
            )
            .with(
                EntityType::known(pii::LOCATION),
                Operator::replace("[LOCATION]"),
            )
            .with(EntityType::known(pii::DATE_TIME), Operator::replace("[DATE]"))
            .with(
                EntityType::known(pii::CREDIT_CARD),
                Operator::mask('*', 12, false),
            )
            .with(
                EntityType::known(pii::IP_ADDRESS),
                Operator::mask('*', 7, true),
            )
            .with(EntityType::known(pii::US_SSN), Operator::mask('*', 5, false))
            .with_default(Operator::Redact)
    }
}

impl TryFrom<BTreeMap<String, Operator>> for OperatorMapping {
    type Error = AnonymizerError;

    fn try_from(table: BTreeMap<String, Operator>) -> Result<Self> {
        let mut mapping = Self::new();
        for (key, operator) in table {
            if key.eq_ignore_ascii_case(DEFAULT_OPERATOR_KEY) {
                mapping.default = Some(operator);
            } else {
                let entity_type = EntityType::new(&key).map_err(|e| {
                    AnonymizerError::OperatorMisconfiguration(format!(
                        "Invalid entity type '{key}' in operator table: {e}"
                    ))
                })?;
                mapping.operators.insert(entity_type, operator);
            }
        }
        Ok(mapping)
    }
}

impl From<OperatorMapping> for BTreeMap<String, Operator> {
    fn from(mapping: OperatorMapping) -> Self {
        let mut table: BTreeMap<String, Operator> = mapping
            .operators
            .into_iter()
            .map(|(entity_type, operator)| (entity_type.to_string(), operator))
            .collect();
        if let Some(default) = mapping.default {
            table.insert(DEFAULT_OPERATOR_KEY.to_string(), default);
        }
        table
    }
}

/// How the operator mapping of a run is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnonymizationStrategy {
    /// Use the configured operator table as is
    #[default]
    Custom,
    /// Redact every detected span
    RedactAll,
    /// Replace every span with a per-type token
    ReplaceAll,
}

impl AnonymizationStrategy {
    /// Build the complete mapping for this strategy.
    ///
    /// `replacement_tokens` are keyed by entity type name (plus `DEFAULT`)
    /// and only used by [`AnonymizationStrategy::ReplaceAll`].
    pub fn build_mapping(
        &self,
        custom: &OperatorMapping,
        replacement_tokens: &BTreeMap<String, String>,
        entity_types: &BTreeSet<EntityType>,
    ) -> OperatorMapping {
        match self {
            AnonymizationStrategy::Custom => custom.clone(),
            AnonymizationStrategy::RedactAll => OperatorMapping::new().with_default(Operator::Redact),
            AnonymizationStrategy::ReplaceAll => {
                let fallback = replacement_tokens
                    .get(DEFAULT_OPERATOR_KEY)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_REPLACEMENT.to_string());

                entity_types.iter().fold(
                    OperatorMapping::new().with_default(Operator::replace(fallback)),
                    |mapping, entity_type| {
                        let token = replacement_tokens
                            .get(entity_type.as_str())
                            .cloned()
                            .unwrap_or_else(|| match entity_type.group() {
                                EntityGroup::Bias => entity_type
                                    .bias_category()
                                    .map(|c| format!("[{}]", c.as_str().to_uppercase()))
                                    .unwrap_or_else(|| format!("[{entity_type}]")),
                                EntityGroup::Pii => format!("[{entity_type}]"),
                            });
                        mapping.with(entity_type.clone(), Operator::replace(token))
                    },
                )
            }
        }
    }
}

impl fmt::Display for AnonymizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnonymizationStrategy::Custom => write!(f, "custom"),
            AnonymizationStrategy::RedactAll => write!(f, "redact_all"),
            AnonymizationStrategy::ReplaceAll => write!(f, "replace_all"),
        }
    }
}

impl FromStr for AnonymizationStrategy {
    type Err = AnonymizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "custom" => Ok(AnonymizationStrategy::Custom),
            "redact_all" => Ok(AnonymizationStrategy::RedactAll),
            "replace_all" => Ok(AnonymizationStrategy::ReplaceAll),
            _ => Err(AnonymizerError::Configuration(format!(
                "Unknown strategy '{s}'. Must be one of: custom, redact_all, replace_all"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::BiasCategory;

    fn entity(name: &str) -> EntityType {
        EntityType::new(name).unwrap()
    }

    #[test]
    fn test_operator_for_falls_back_to_default() {
        let mapping = OperatorMapping::reference();
        assert_eq!(
            mapping.operator_for(&entity("PERSON")).unwrap(),
            &Operator::replace("[PERSON]")
        );
        assert_eq!(
            mapping.operator_for(&entity("GENDER_BIAS")).unwrap(),
            &Operator::Redact
        );
    }

    #[test]
    fn test_missing_operator_without_default() {
        let mapping = OperatorMapping::new().with(entity("PERSON"), Operator::Keep);
        let err = mapping
            .validate([&entity("PERSON"), &entity("EMPLOYEE_ID")], &KeyRing::new())
            .unwrap_err();
        assert!(matches!(err, AnonymizerError::OperatorMisconfiguration(_)));
        assert!(err.to_string().contains("EMPLOYEE_ID"));
    }

    #[test]
    fn test_encrypt_requires_known_key() {
        let mapping = OperatorMapping::new().with_default(Operator::Encrypt {
            key_ref: "hr".to_string(),
        });
        assert!(mapping.validate([], &KeyRing::new()).is_err());

        let mut keys = KeyRing::new();
        keys.insert("hr", vec![0u8; 32]).unwrap();
        assert!(mapping.validate([], &keys).is_ok());
    }

    #[test]
    fn test_operator_table_from_toml() {
        let toml_str = r#"
            PERSON = { type = "replace", new_value = "[NAME]" }
            email_address = { type = "mask", chars_to_mask = 4, from_end = true }
            PHONE_NUMBER = { type = "hash", algorithm = "sha512" }
            DEFAULT = { type = "redact" }
        "#;
        let mapping: OperatorMapping = toml::from_str(toml_str).unwrap();

        assert_eq!(mapping.get(&entity("PERSON")), Some(&Operator::replace("[NAME]")));
        assert_eq!(
            mapping.get(&entity("EMAIL_ADDRESS")),
            Some(&Operator::mask('*', 4, true))
        );
        assert_eq!(
            mapping.get(&entity("PHONE_NUMBER")),
            Some(&Operator::Hash {
                algorithm: HashAlgorithm::Sha512
            })
        );
        assert_eq!(mapping.default_operator(), Some(&Operator::Redact));
    }

    #[test]
    fn test_unknown_operator_type_rejected() {
        let toml_str = r#"PERSON = { type = "shred" }"#;
        assert!(toml::from_str::<OperatorMapping>(toml_str).is_err());
    }

    #[test]
    fn test_redact_all_strategy() {
        let mapping = AnonymizationStrategy::RedactAll.build_mapping(
            &OperatorMapping::reference(),
            &BTreeMap::new(),
            &BTreeSet::new(),
        );
        assert_eq!(
            mapping.operator_for(&entity("PERSON")).unwrap(),
            &Operator::Redact
        );
    }

    #[test]
    fn test_replace_all_strategy_tokens() {
        let mut tokens = BTreeMap::new();
        tokens.insert("PERSON".to_string(), "[CANDIDATE]".to_string());
        let types: BTreeSet<EntityType> = [
            entity("PERSON"),
            entity("EMAIL_ADDRESS"),
            BiasCategory::Gender.entity_type(),
        ]
        .into_iter()
        .collect();

        let mapping =
            AnonymizationStrategy::ReplaceAll.build_mapping(&OperatorMapping::new(), &tokens, &types);

        assert_eq!(
            mapping.operator_for(&entity("PERSON")).unwrap(),
            &Operator::replace("[CANDIDATE]")
        );
        assert_eq!(
            mapping.operator_for(&entity("EMAIL_ADDRESS")).unwrap(),
            &Operator::replace("[EMAIL_ADDRESS]")
        );
        assert_eq!(
            mapping
                .operator_for(&BiasCategory::Gender.entity_type())
                .unwrap(),
            &Operator::replace("[GENDER]")
        );
        assert_eq!(
            mapping.operator_for(&entity("UNSEEN")).unwrap(),
            &Operator::replace(DEFAULT_REPLACEMENT)
        );
    }

    #[test]
    fn test_strategy_serde() {
        let s: AnonymizationStrategy = serde_json::from_str("\"replace_all\"").unwrap();
        assert_eq!(s, AnonymizationStrategy::ReplaceAll);
        assert_eq!(s.to_string(), "replace_all");
        assert_eq!(
            "Redact-All".parse::<AnonymizationStrategy>().unwrap(),
            AnonymizationStrategy::RedactAll
        );
        assert!("scramble".parse::<AnonymizationStrategy>().is_err());
    }
}
