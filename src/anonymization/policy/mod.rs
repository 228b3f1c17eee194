//! Field policy resolution
//!
//! Decides per leaf path whether a value is preserved, always analyzed,
//! rewritten by a micro-operator, or handled by the explicit default policy.
//!
//! Lists are consulted in fixed precedence order: PRESERVE, SPECIAL,
//! ALWAYS_ANONYMIZE, then the default. The first list with a matching rule
//! decides. Within a list the most specific rule wins (see [`MatchRank`]),
//! ties keep the rule listed first.

pub mod micro;
pub mod path;
pub mod talent_profile;

pub use micro::{Bucket, MicroOperator};
pub use path::{FieldPath, MatchKind, MatchRank, PathPattern, PathSegment};

use crate::domain::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What happens to paths that no rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Run detection and rewrite findings
    Anonymize,
    /// Copy the value unchanged
    Preserve,
}

impl fmt::Display for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultPolicy::Anonymize => write!(f, "anonymize"),
            DefaultPolicy::Preserve => write!(f, "preserve"),
        }
    }
}

/// Classification of a single field path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldPolicy<'a> {
    Preserve,
    AlwaysAnonymize,
    Special(&'a MicroOperator),
    Default(DefaultPolicy),
}

/// What the walker does with a leaf
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafAction<'a> {
    /// Copy unchanged, no detection
    Preserve,
    /// Run detection and the operator dispatcher
    Analyze,
    /// Apply the micro-operator, no detection
    Special(&'a MicroOperator),
}

impl<'a> FieldPolicy<'a> {
    pub fn action(self) -> LeafAction<'a> {
        match self {
            FieldPolicy::Preserve | FieldPolicy::Default(DefaultPolicy::Preserve) => {
                LeafAction::Preserve
            }
            FieldPolicy::AlwaysAnonymize | FieldPolicy::Default(DefaultPolicy::Anonymize) => {
                LeafAction::Analyze
            }
            FieldPolicy::Special(op) => LeafAction::Special(op),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldPolicy::Preserve => "preserve",
            FieldPolicy::AlwaysAnonymize => "always_anonymize",
            FieldPolicy::Special(_) => "special",
            FieldPolicy::Default(_) => "default",
        }
    }
}

/// Immutable per-path policy table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPolicyTable {
    preserve: Vec<PathPattern>,
    special: Vec<(PathPattern, MicroOperator)>,
    always_anonymize: Vec<PathPattern>,
    default_policy: DefaultPolicy,
}

impl FieldPolicyTable {
    /// Empty table with an explicit default
    pub fn new(default_policy: DefaultPolicy) -> Self {
        Self {
            preserve: Vec::new(),
            special: Vec::new(),
            always_anonymize: Vec::new(),
            default_policy,
        }
    }

    /// Add a PRESERVE rule
    pub fn preserve(mut self, pattern: &str) -> Result<Self> {
        self.preserve.push(PathPattern::parse(pattern)?);
        Ok(self)
    }

    /// Add an ALWAYS_ANONYMIZE rule
    pub fn always_anonymize(mut self, pattern: &str) -> Result<Self> {
        self.always_anonymize.push(PathPattern::parse(pattern)?);
        Ok(self)
    }

    /// Add a SPECIAL rule
    pub fn special(mut self, pattern: &str, operator: MicroOperator) -> Result<Self> {
        operator.validate()?;
        self.special.push((PathPattern::parse(pattern)?, operator));
        Ok(self)
    }

    /// Replace the default policy
    pub fn with_default_policy(mut self, default_policy: DefaultPolicy) -> Self {
        self.default_policy = default_policy;
        self
    }

    /// Append the rules of a configuration section
    pub fn extend(mut self, config: &FieldPolicyConfig) -> Result<Self> {
        for pattern in &config.preserve {
            self = self.preserve(pattern)?;
        }
        for (pattern, operator) in &config.special {
            self = self.special(pattern, operator.clone())?;
        }
        for pattern in &config.always_anonymize {
            self = self.always_anonymize(pattern)?;
        }
        Ok(self)
    }

    pub fn default_policy(&self) -> DefaultPolicy {
        self.default_policy
    }

    pub fn preserve_patterns(&self) -> &[PathPattern] {
        &self.preserve
    }

    pub fn always_anonymize_patterns(&self) -> &[PathPattern] {
        &self.always_anonymize
    }

    pub fn special_rules(&self) -> &[(PathPattern, MicroOperator)] {
        &self.special
    }

    /// Classify a field path
    pub fn classify(&self, path: &FieldPath) -> FieldPolicy<'_> {
        if best_match(self.preserve.iter().map(|p| (p, ())), path).is_some() {
            return FieldPolicy::Preserve;
        }
        if let Some(operator) = best_match(self.special.iter().map(|(p, op)| (p, op)), path) {
            return FieldPolicy::Special(operator);
        }
        if best_match(self.always_anonymize.iter().map(|p| (p, ())), path).is_some() {
            return FieldPolicy::AlwaysAnonymize;
        }
        FieldPolicy::Default(self.default_policy)
    }

    /// Leaf action for a field path
    pub fn action(&self, path: &FieldPath) -> LeafAction<'_> {
        self.classify(path).action()
    }
}

fn best_match<'p, T>(
    rules: impl Iterator<Item = (&'p PathPattern, T)>,
    path: &FieldPath,
) -> Option<T> {
    let mut best: Option<(MatchRank, T)> = None;
    for (pattern, payload) in rules {
        let Some(kind) = pattern.matches(path) else {
            continue;
        };
        let rank = pattern.rank(kind);
        if best.as_ref().map_or(true, |(current, _)| rank > *current) {
            best = Some((rank, payload));
        }
    }
    best.map(|(_, payload)| payload)
}

/// Field policy section as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPolicyConfig {
    /// Named preset the lists below extend (`talent_profile`)
    #[serde(default)]
    pub preset: Option<String>,

    /// Required: what happens to unmatched paths
    pub default_policy: DefaultPolicy,

    #[serde(default)]
    pub preserve: Vec<String>,

    #[serde(default)]
    pub always_anonymize: Vec<String>,

    /// Path pattern to micro-operator
    #[serde(default)]
    pub special: BTreeMap<String, MicroOperator>,
}

impl Default for FieldPolicyConfig {
    fn default() -> Self {
        Self {
            preset: None,
            default_policy: DefaultPolicy::Anonymize,
            preserve: Vec::new(),
            always_anonymize: Vec::new(),
            special: BTreeMap::new(),
        }
    }
}

impl FieldPolicyConfig {
    /// Build the table, starting from the preset when one is named
    pub fn build(&self) -> Result<FieldPolicyTable> {
        let base = match self.preset.as_deref() {
            Some(name) => talent_profile::preset(name)?.with_default_policy(self.default_policy),
            None => FieldPolicyTable::new(self.default_policy),
        };
        base.extend(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn table() -> FieldPolicyTable {
        FieldPolicyTable::new(DefaultPolicy::Anonymize)
            .preserve("core.jobCode")
            .unwrap()
            .preserve("core.rank")
            .unwrap()
            .special("core.reportingDistance.*", MicroOperator::categorize())
            .unwrap()
            .special("**.startDate", MicroOperator::year_only())
            .unwrap()
            .always_anonymize("core.businessTitle")
            .unwrap()
            .always_anonymize("experience.experiences")
            .unwrap()
    }

    #[test]
    fn test_classification_by_list() {
        let t = table();
        assert_eq!(t.classify(&path("core.jobCode")), FieldPolicy::Preserve);
        assert_eq!(t.classify(&path("core.rank.code")), FieldPolicy::Preserve);
        assert_eq!(
            t.classify(&path("core.reportingDistance.ceo")),
            FieldPolicy::Special(&MicroOperator::categorize())
        );
        assert_eq!(
            t.classify(&path("core.businessTitle")),
            FieldPolicy::AlwaysAnonymize
        );
        assert_eq!(
            t.classify(&path("experience.experiences[0].company")),
            FieldPolicy::AlwaysAnonymize
        );
        assert_eq!(
            t.classify(&path("personal.summary")),
            FieldPolicy::Default(DefaultPolicy::Anonymize)
        );
    }

    #[test]
    fn test_special_beats_always_anonymize() {
        // `experience.experiences` covers startDate, but SPECIAL has precedence
        assert_eq!(
            table().classify(&path("experience.experiences[1].startDate")),
            FieldPolicy::Special(&MicroOperator::year_only())
        );
    }

    #[test]
    fn test_preserve_beats_conflicting_rules() {
        let t = FieldPolicyTable::new(DefaultPolicy::Anonymize)
            .preserve("core.jobTitle")
            .unwrap()
            .always_anonymize("core.jobTitle")
            .unwrap()
            .special("core.jobTitle", MicroOperator::Remove)
            .unwrap();
        assert_eq!(t.classify(&path("core.jobTitle")), FieldPolicy::Preserve);
    }

    #[test]
    fn test_most_specific_special_rule_wins() {
        let t = FieldPolicyTable::new(DefaultPolicy::Preserve)
            .special("core.reportingDistance", MicroOperator::Remove)
            .unwrap()
            .special("core.reportingDistance.*", MicroOperator::categorize())
            .unwrap()
            .special("core.reportingDistance.ceo", MicroOperator::hash())
            .unwrap();

        assert_eq!(
            t.classify(&path("core.reportingDistance.ceo")),
            FieldPolicy::Special(&MicroOperator::hash())
        );
        assert_eq!(
            t.classify(&path("core.reportingDistance.manager")),
            FieldPolicy::Special(&MicroOperator::categorize())
        );
    }

    #[test]
    fn test_equal_specificity_keeps_first_rule() {
        let t = FieldPolicyTable::new(DefaultPolicy::Preserve)
            .special("a.b", MicroOperator::Remove)
            .unwrap()
            .special("a.b", MicroOperator::hash())
            .unwrap();
        assert_eq!(
            t.classify(&path("a.b")),
            FieldPolicy::Special(&MicroOperator::Remove)
        );
    }

    #[test]
    fn test_default_policy_preserve() {
        let t = FieldPolicyTable::new(DefaultPolicy::Preserve);
        assert_eq!(t.action(&path("anything.at.all")), LeafAction::Preserve);
        let t = t.with_default_policy(DefaultPolicy::Anonymize);
        assert_eq!(t.action(&path("anything.at.all")), LeafAction::Analyze);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(FieldPolicyTable::new(DefaultPolicy::Anonymize)
            .preserve("a[")
            .is_err());
    }

    #[test]
    fn test_config_requires_default_policy() {
        let missing = toml::from_str::<FieldPolicyConfig>(r#"preserve = ["id"]"#);
        assert!(missing.is_err());

        let config: FieldPolicyConfig = toml::from_str(
            r#"
            default_policy = "preserve"
            always_anonymize = ["notes"]

            [special]
            "audit.createdAt" = { type = "remove" }
            "#,
        )
        .unwrap();
        let table = config.build().unwrap();
        assert_eq!(table.action(&path("notes")), LeafAction::Analyze);
        assert_eq!(
            table.action(&path("audit.createdAt")),
            LeafAction::Special(&MicroOperator::Remove)
        );
        assert_eq!(table.action(&path("id")), LeafAction::Preserve);
    }

    #[test]
    fn test_config_extends_preset() {
        let config = FieldPolicyConfig {
            preset: Some("talent_profile".to_string()),
            default_policy: DefaultPolicy::Anonymize,
            preserve: vec!["personal.pronouns".to_string()],
            ..Default::default()
        };
        let table = config.build().unwrap();
        assert_eq!(table.action(&path("core.jobCode")), LeafAction::Preserve);
        assert_eq!(table.action(&path("personal.pronouns")), LeafAction::Preserve);

        let unknown = FieldPolicyConfig {
            preset: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(unknown.build().is_err());
    }
}
