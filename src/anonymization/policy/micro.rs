//! Micro-operators for SPECIAL field policies
//!
//! Unlike span operators these transform a whole leaf value, and they are
//! the only way a number, boolean or null can change.

use crate::anonymization::operators::{HashAlgorithm, HashSalt};
use crate::domain::{AnonymizerError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static YEAR_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").ok());

fn default_hash_prefix() -> String {
    "HASH_".to_string()
}

fn default_hash_length() -> usize {
    16
}

fn default_year_fallback() -> String {
    "[YEAR]".to_string()
}

fn default_buckets() -> Vec<Bucket> {
    vec![
        Bucket::new(2.0, "Direct"),
        Bucket::new(4.0, "Close"),
        Bucket::new(6.0, "Mid-level"),
    ]
}

fn default_overflow() -> String {
    "Distant".to_string()
}

fn default_level_fallback() -> String {
    "[LEVEL]".to_string()
}

/// Inclusive upper bound and the label for values up to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub max: f64,
    pub label: String,
}

impl Bucket {
    pub fn new(max: f64, label: impl Into<String>) -> Self {
        Self {
            max,
            label: label.into(),
        }
    }
}

/// Whole-value transformation attached to a SPECIAL field policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MicroOperator {
    /// Salted digest, truncated and prefixed (`HASH_3f2a...`)
    Hash {
        #[serde(default)]
        algorithm: HashAlgorithm,
        #[serde(default = "default_hash_prefix")]
        prefix: String,
        #[serde(default = "default_hash_length")]
        length: usize,
    },
    /// Keep only the first four-digit year
    YearOnly {
        #[serde(default = "default_year_fallback")]
        fallback: String,
    },
    /// Map a number onto an ordered threshold table
    Categorize {
        #[serde(default = "default_buckets")]
        buckets: Vec<Bucket>,
        #[serde(default = "default_overflow")]
        overflow: String,
        #[serde(default = "default_level_fallback")]
        fallback: String,
    },
    /// Replace the value with `null`
    Remove,
    /// Replace the value with a fixed string
    Replace { value: String },
}

impl MicroOperator {
    /// Hash with the default prefix and length
    pub fn hash() -> Self {
        MicroOperator::Hash {
            algorithm: HashAlgorithm::default(),
            prefix: default_hash_prefix(),
            length: default_hash_length(),
        }
    }

    /// Year extraction with the default fallback
    pub fn year_only() -> Self {
        MicroOperator::YearOnly {
            fallback: default_year_fallback(),
        }
    }

    /// Categorization with the reporting-distance table
    pub fn categorize() -> Self {
        MicroOperator::Categorize {
            buckets: default_buckets(),
            overflow: default_overflow(),
            fallback: default_level_fallback(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MicroOperator::Hash { .. } => "hash",
            MicroOperator::YearOnly { .. } => "year_only",
            MicroOperator::Categorize { .. } => "categorize",
            MicroOperator::Remove => "remove",
            MicroOperator::Replace { .. } => "replace",
        }
    }

    /// Reject tables that cannot be applied deterministically
    pub fn validate(&self) -> Result<()> {
        match self {
            MicroOperator::Hash { length, .. } if *length == 0 => Err(
                AnonymizerError::Configuration("Hash length must be positive".to_string()),
            ),
            MicroOperator::Categorize { buckets, .. } => {
                if buckets.is_empty() {
                    return Err(AnonymizerError::Configuration(
                        "Categorize needs at least one bucket".to_string(),
                    ));
                }
                if buckets.iter().any(|b| !b.max.is_finite()) {
                    return Err(AnonymizerError::Configuration(
                        "Categorize bucket bounds must be finite".to_string(),
                    ));
                }
                if buckets.windows(2).any(|w| w[0].max >= w[1].max) {
                    return Err(AnonymizerError::Configuration(
                        "Categorize bucket bounds must be strictly ascending".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Transform a leaf value
    pub fn apply(&self, value: &Value, salt: &HashSalt) -> Value {
        match self {
            MicroOperator::Remove => Value::Null,
            MicroOperator::Replace { value } => Value::String(value.clone()),
            MicroOperator::Hash {
                algorithm,
                prefix,
                length,
            } => match scalar_text(value) {
                Some(text) => {
                    let digest = salt.digest_hex(*algorithm, &text);
                    let end = (*length).min(digest.len());
                    Value::String(format!("{prefix}{}", &digest[..end]))
                }
                None => Value::Null,
            },
            MicroOperator::YearOnly { fallback } => match value {
                Value::Null => Value::Null,
                Value::Number(n) => match n.as_u64() {
                    Some(year @ 1900..=2099) => Value::from(year),
                    _ => Value::String(fallback.clone()),
                },
                other => scalar_text(other)
                    .and_then(|text| extract_year(&text))
                    .map(Value::String)
                    .unwrap_or_else(|| Value::String(fallback.clone())),
            },
            MicroOperator::Categorize {
                buckets,
                overflow,
                fallback,
            } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                let label = match number.filter(|n| n.is_finite()) {
                    Some(n) => buckets
                        .iter()
                        .find(|bucket| n <= bucket.max)
                        .map_or(overflow, |bucket| &bucket.label),
                    None => fallback,
                };
                Value::String(label.clone())
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn extract_year(text: &str) -> Option<String> {
    YEAR_PATTERN
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn salt() -> HashSalt {
        HashSalt::from_bytes(b"salt")
    }

    #[test]
    fn test_hash_prefix_and_length() {
        let out = MicroOperator::hash().apply(&json!("user-42"), &salt());
        let s = out.as_str().unwrap();
        assert!(s.starts_with("HASH_"));
        assert_eq!(s.len(), "HASH_".len() + 16);
        assert_eq!(out, MicroOperator::hash().apply(&json!("user-42"), &salt()));
    }

    #[test]
    fn test_hash_number_matches_string_form() {
        let op = MicroOperator::hash();
        assert_eq!(
            op.apply(&json!(12345), &salt()),
            op.apply(&json!("12345"), &salt())
        );
        assert_eq!(op.apply(&Value::Null, &salt()), Value::Null);
    }

    #[test_case(json!("2019-03-01"), json!("2019") ; "iso date")]
    #[test_case(json!("March 2020 - present"), json!("2020") ; "free text")]
    #[test_case(json!(2015), json!(2015) ; "number year")]
    #[test_case(json!("present"), json!("[YEAR]") ; "no year")]
    #[test_case(json!(42), json!("[YEAR]") ; "number not a year")]
    #[test_case(Value::Null, Value::Null ; "null stays null")]
    fn test_year_only(input: Value, expected: Value) {
        assert_eq!(MicroOperator::year_only().apply(&input, &salt()), expected);
    }

    #[test_case(json!(1), "Direct" ; "one")]
    #[test_case(json!(2), "Direct" ; "inclusive bound")]
    #[test_case(json!(3), "Close" ; "three")]
    #[test_case(json!(6), "Mid-level" ; "six")]
    #[test_case(json!(7), "Distant" ; "overflow")]
    #[test_case(json!("4"), "Close" ; "numeric string")]
    #[test_case(json!("far"), "[LEVEL]" ; "not numeric")]
    #[test_case(json!(true), "[LEVEL]" ; "boolean")]
    fn test_categorize_reference_table(input: Value, expected: &str) {
        assert_eq!(
            MicroOperator::categorize().apply(&input, &salt()),
            json!(expected)
        );
    }

    #[test]
    fn test_remove_and_replace() {
        assert_eq!(
            MicroOperator::Remove.apply(&json!("2024-01-01T00:00:00Z"), &salt()),
            Value::Null
        );
        let replace = MicroOperator::Replace {
            value: "[HIDDEN]".to_string(),
        };
        assert_eq!(replace.apply(&json!(5), &salt()), json!("[HIDDEN]"));
    }

    #[test]
    fn test_validate_bucket_table() {
        assert!(MicroOperator::categorize().validate().is_ok());
        let unordered = MicroOperator::Categorize {
            buckets: vec![Bucket::new(5.0, "b"), Bucket::new(2.0, "a")],
            overflow: default_overflow(),
            fallback: default_level_fallback(),
        };
        assert!(unordered.validate().is_err());
        let empty = MicroOperator::Categorize {
            buckets: vec![],
            overflow: default_overflow(),
            fallback: default_level_fallback(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let op: MicroOperator = toml::from_str(r#"type = "categorize""#).unwrap();
        assert_eq!(op, MicroOperator::categorize());

        let op: MicroOperator = toml::from_str(
            r#"
            type = "categorize"
            overflow = "Far"
            buckets = [{ max = 1, label = "Near" }]
            "#,
        )
        .unwrap();
        assert_eq!(op.apply(&json!(3), &salt()), json!("Far"));

        let op: MicroOperator = toml::from_str(r#"type = "hash""#).unwrap();
        assert_eq!(op, MicroOperator::hash());
    }
}
