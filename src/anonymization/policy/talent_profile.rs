//! Reference policy for enterprise talent profiles
//!
//! Codes, ranks and qualifications stay intact so profiles remain matchable.
//! Titles, descriptions, locations and employers are always analyzed. User
//! ids are hashed rather than preserved, so one person keeps the same
//! pseudonym across documents of a run.

use super::{DefaultPolicy, FieldPolicyTable, MicroOperator};
use crate::domain::{AnonymizerError, Result};

/// Preset name accepted by `field_policy.preset`
pub const TALENT_PROFILE: &str = "talent_profile";

const PRESERVE: &[&str] = &[
    "core.rank.code",
    "core.rank.id",
    "core.employeeType.code",
    "core.jobCode",
    "core.gcrs.businessDivisionCode",
    "core.gcrs.businessUnitCode",
    "core.gcrs.businessAreaCode",
    "core.gcrs.businessSectorCode",
    "core.gcrs.businessSegmentCode",
    "core.gcrs.businessFunctionCode",
    "core.workLocation.code",
    "core.workLocation.buildingCode",
    "core.workLocation.postalCode",
    "core.workLocation.stateCode",
    "core.workLocation.countryCode",
    "experience.crossDivisionalExperience",
    "experience.internationalExperience",
    "experience.timeInCurrentRoleInDays",
    "qualification.educations[*].degree",
    "qualification.educations[*].areaOfStudy",
    "qualification.educations[*].completionYear",
    "qualification.certifications",
    "version",
    "completionScore",
    "externalSourceType",
];

const ALWAYS_ANONYMIZE: &[&str] = &[
    "core.rank.description",
    "core.employeeType.description",
    "core.businessTitle",
    "core.gcrs.*Description",
    "core.workLocation.description",
    "core.workLocation.city",
    "core.workLocation.state",
    "core.workLocation.county",
    "core.workLocation.country",
    "core.workLocation.region",
    "core.enterpriseSeniorityDate",
    "workEligibility",
    "language.languages",
    "affiliation.awards",
    "affiliation.boards",
    "affiliation.mandates",
    "affiliation.memberships",
    "experience.experiences[*].company",
    "experience.experiences[*].description",
    "experience.experiences[*].jobTitle",
    "experience.experiences[*].country.description",
    "qualification.educations[*].institutionName",
    "qualification.educations[*].achievements",
    "careerAspirationPreference",
    "careerLocationPreference",
    "careerRolePreference",
    "*.createdBy",
    "*.lastModifiedBy",
];

/// The talent profile table with anonymization as the default
pub fn talent_profile_policy() -> Result<FieldPolicyTable> {
    let mut table = FieldPolicyTable::new(DefaultPolicy::Anonymize);
    for pattern in PRESERVE {
        table = table.preserve(pattern)?;
    }
    table = table
        .special("userId", MicroOperator::hash())?
        .special("experience.experiences[*].startDate", MicroOperator::year_only())?
        .special("experience.experiences[*].endDate", MicroOperator::year_only())?
        .special("createdDateTime", MicroOperator::Remove)?
        .special("lastModifiedDateTime", MicroOperator::Remove)?
        .special("core.reportingDistance.*", MicroOperator::categorize())?;
    for pattern in ALWAYS_ANONYMIZE {
        table = table.always_anonymize(pattern)?;
    }
    Ok(table)
}

/// Look up a preset by name
pub fn preset(name: &str) -> Result<FieldPolicyTable> {
    match name.trim() {
        TALENT_PROFILE => talent_profile_policy(),
        other => Err(AnonymizerError::Configuration(format!(
            "Unknown field policy preset '{other}' (available: {TALENT_PROFILE})"
        ))),
    }
}
