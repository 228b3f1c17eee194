//! Entity type identifiers
//!
//! Entity types are an open set: the built-in recognizers cover the reference
//! PII types and bias categories, but custom recognizers may introduce any
//! upper snake case tag. The group of a tag is derived from its name, so new
//! bias categories only need the `_BIAS` suffix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix shared by every bias entity type
pub const BIAS_SUFFIX: &str = "_BIAS";

/// Reference PII entity types
pub mod pii {
    pub const PERSON: &str = "PERSON";
    pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
    pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
    pub const LOCATION: &str = "LOCATION";
    pub const DATE_TIME: &str = "DATE_TIME";
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    pub const IP_ADDRESS: &str = "IP_ADDRESS";
    pub const US_SSN: &str = "US_SSN";

    /// All reference PII types
    pub const ALL: [&str; 8] = [
        PERSON,
        EMAIL_ADDRESS,
        PHONE_NUMBER,
        LOCATION,
        DATE_TIME,
        CREDIT_CARD,
        IP_ADDRESS,
        US_SSN,
    ];
}

/// Entity type newtype wrapper
///
/// # Examples
///
/// ```
/// use bias_anonymizer::domain::entity::{EntityGroup, EntityType};
///
/// let email = EntityType::new("email_address").unwrap();
/// assert_eq!(email.as_str(), "EMAIL_ADDRESS");
/// assert_eq!(email.group(), EntityGroup::Pii);
///
/// let gender = EntityType::new("GENDER_BIAS").unwrap();
/// assert_eq!(gender.group(), EntityGroup::Bias);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType(String);

impl EntityType {
    /// Creates a new EntityType, normalizing to upper case
    ///
    /// Only ASCII letters, digits and underscores are accepted.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into().trim().to_ascii_uppercase();
        if name.is_empty() {
            return Err("Entity type cannot be empty".to_string());
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "Entity type '{name}' must contain only letters, digits and underscores"
            ));
        }
        Ok(Self(name))
    }

    /// Builds an entity type from a constant known to be valid
    pub(crate) fn known(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Returns the entity type as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns which group this entity type belongs to
    pub fn group(&self) -> EntityGroup {
        if self.0.ends_with(BIAS_SUFFIX) {
            EntityGroup::Bias
        } else {
            EntityGroup::Pii
        }
    }

    /// Returns the lower-case bias category name (`GENDER_BIAS` -> `gender`)
    pub fn bias_category(&self) -> Option<String> {
        self.0
            .strip_suffix(BIAS_SUFFIX)
            .filter(|name| !name.is_empty())
            .map(|name| name.to_ascii_lowercase())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.0
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The two disjoint groups of entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityGroup {
    Pii,
    Bias,
}

/// Reference bias categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasCategory {
    Gender,
    RaceEthnicity,
    Age,
    Disability,
    MaritalStatus,
    Nationality,
    SexualOrientation,
    Religion,
    PoliticalAffiliation,
    SocioeconomicBackground,
    PregnancyMaternity,
    UnionMembership,
    HealthCondition,
    CriminalBackground,
}

impl BiasCategory {
    /// All reference categories
    pub const ALL: [BiasCategory; 14] = [
        BiasCategory::Gender,
        BiasCategory::RaceEthnicity,
        BiasCategory::Age,
        BiasCategory::Disability,
        BiasCategory::MaritalStatus,
        BiasCategory::Nationality,
        BiasCategory::SexualOrientation,
        BiasCategory::Religion,
        BiasCategory::PoliticalAffiliation,
        BiasCategory::SocioeconomicBackground,
        BiasCategory::PregnancyMaternity,
        BiasCategory::UnionMembership,
        BiasCategory::HealthCondition,
        BiasCategory::CriminalBackground,
    ];

    /// Snake case name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasCategory::Gender => "gender",
            BiasCategory::RaceEthnicity => "race_ethnicity",
            BiasCategory::Age => "age",
            BiasCategory::Disability => "disability",
            BiasCategory::MaritalStatus => "marital_status",
            BiasCategory::Nationality => "nationality",
            BiasCategory::SexualOrientation => "sexual_orientation",
            BiasCategory::Religion => "religion",
            BiasCategory::PoliticalAffiliation => "political_affiliation",
            BiasCategory::SocioeconomicBackground => "socioeconomic_background",
            BiasCategory::PregnancyMaternity => "pregnancy_maternity",
            BiasCategory::UnionMembership => "union_membership",
            BiasCategory::HealthCondition => "health_condition",
            BiasCategory::CriminalBackground => "criminal_background",
        }
    }

    /// Entity type emitted by this category's recognizer (`GENDER_BIAS`)
    pub fn entity_type(&self) -> EntityType {
        EntityType(format!(
            "{}{}",
            self.as_str().to_ascii_uppercase(),
            BIAS_SUFFIX
        ))
    }
}

impl fmt::Display for BiasCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiasCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        BiasCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("Unknown bias category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_entity_type_normalizes_case() {
        let entity = EntityType::new("  phone_number ").unwrap();
        assert_eq!(entity.as_str(), "PHONE_NUMBER");
    }

    #[test_case("" ; "empty")]
    #[test_case("EMAIL ADDRESS" ; "space")]
    #[test_case("EMAIL-ADDRESS" ; "dash")]
    fn test_entity_type_rejects_invalid(name: &str) {
        assert!(EntityType::new(name).is_err());
    }

    #[test]
    fn test_entity_group() {
        assert_eq!(EntityType::known(pii::US_SSN).group(), EntityGroup::Pii);
        assert_eq!(
            EntityType::new("EDUCATION_BIAS").unwrap().group(),
            EntityGroup::Bias
        );
        assert_eq!(EntityType::new("EMPLOYEE_ID").unwrap().group(), EntityGroup::Pii);
    }

    #[test]
    fn test_bias_category_round_trip() {
        for category in BiasCategory::ALL {
            let entity = category.entity_type();
            assert_eq!(entity.group(), EntityGroup::Bias);
            assert_eq!(entity.bias_category().as_deref(), Some(category.as_str()));
            assert_eq!(category.as_str().parse::<BiasCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_bias_entity_names() {
        assert_eq!(BiasCategory::Gender.entity_type().as_str(), "GENDER_BIAS");
        assert_eq!(
            BiasCategory::RaceEthnicity.entity_type().as_str(),
            "RACE_ETHNICITY_BIAS"
        );
    }

    #[test]
    fn test_bare_suffix_has_no_category() {
        let entity = EntityType::new("_BIAS").unwrap();
        assert!(entity.bias_category().is_none());
    }

    #[test]
    fn test_entity_type_deserialize_validates() {
        let ok: EntityType = serde_json::from_str("\"person\"").unwrap();
        assert_eq!(ok.as_str(), "PERSON");
        assert!(serde_json::from_str::<EntityType>("\"not valid\"").is_err());
    }
}
