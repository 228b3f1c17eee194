//! Built-in bias descriptor recognizers
//!
//! One word-list recognizer per reference bias category. Lists combine the
//! descriptors on both sides of each axis (for example young and older age
//! terms), since either side can induce a biased decision.

use super::pattern::{PatternRecognizer, PatternRule};
use crate::domain::entity::BiasCategory;
use crate::domain::Result;
use std::collections::BTreeMap;

/// Base score for every bias term match
pub const BIAS_BASE_SCORE: f32 = 0.85;

const GENDER: &[&str] = &[
    "he", "him", "his", "man", "male", "boy", "father", "son", "brother", "husband",
    "boyfriend", "gentleman", "guy", "mr", "masculine", "paternal", "dad", "she", "her", "hers",
    "woman", "female", "girl", "mother", "daughter", "sister", "wife", "girlfriend", "lady", "ms",
    "mrs", "feminine", "maternal", "mom", "they", "them", "their", "non-binary", "genderfluid",
    "transgender", "agender", "genderqueer", "enby", "gender-neutral", "fluid", "queer",
];

const RACE_ETHNICITY: &[&str] = &[
    "European", "Caucasian", "white", "Anglo", "Nordic", "Germanic", "British", "French",
    "German", "Italian", "Spanish", "Scandinavian", "African", "Black", "Afro-Caribbean",
    "Sub-Saharan", "Nigerian", "Kenyan", "Ethiopian", "Ghanaian", "Somali", "African-American",
    "Afro", "Caribbean", "Asian", "Chinese", "Japanese", "Korean", "Vietnamese", "Thai",
    "Indian", "Pakistani", "Filipino", "Indonesian", "Cambodian", "Laotian", "Hispanic",
    "Latino", "Mexican", "Colombian", "Puerto Rican", "Guatemalan", "Cuban", "Peruvian",
    "Venezuelan", "Argentinian", "Chilean", "Salvadoran", "Middle Eastern", "Arab", "Persian",
    "Lebanese", "Turkish", "Iranian", "Iraqi", "Syrian", "Jordanian", "Palestinian", "Egyptian",
    "Moroccan",
];

const AGE: &[&str] = &[
    "young", "millennial", "Gen-Z", "recent graduate", "entry-level", "twenties",
    "early career", "junior", "new", "fresh", "emerging", "rising", "middle-aged",
    "experienced", "mid-career", "forties", "fifties", "established", "seasoned", "mature",
    "veteran", "accomplished", "proven", "senior-level", "senior", "elder", "older worker",
    "baby boomer", "retirement-age", "elderly", "aged", "geriatric", "golden years",
    "late career", "legacy",
];

const DISABILITY: &[&str] = &[
    "disabled", "wheelchair user", "blind", "deaf", "mobility impaired", "visually impaired",
    "hearing impaired", "handicapped", "special needs", "accessibility", "accommodation",
    "impairment", "disability", "able-bodied", "non-disabled", "fully capable",
    "physically fit", "healthy", "normal", "typical", "standard", "regular", "conventional",
    "mainstream",
];

const MARITAL_STATUS: &[&str] = &[
    "single", "unmarried", "bachelor", "bachelorette", "unattached", "independent", "solo",
    "alone", "unwed", "celibate", "divorced", "separated", "married", "spouse", "husband",
    "wife", "partnership", "committed", "wedded", "coupled", "union", "matrimony", "engaged",
    "relationship", "parent", "mother", "father", "children", "childcare",
    "family responsibilities", "kids", "offspring", "parental", "maternal", "paternal",
    "guardian",
];

const NATIONALITY: &[&str] = &[
    "American", "US citizen", "native-born", "domestic", "local", "citizen", "national",
    "homeland", "indigenous", "native", "patriotic", "foreign", "international", "immigrant",
    "visa holder", "non-citizen", "overseas", "alien", "expatriate", "refugee",
    "asylum seeker", "migrant", "outsider",
];

const SEXUAL_ORIENTATION: &[&str] = &[
    "heterosexual", "straight", "traditional", "conventional", "normal", "typical", "standard",
    "mainstream", "orthodox", "classical", "regular", "gay", "lesbian", "homosexual", "LGBTQ",
    "same-sex", "queer", "bisexual", "pansexual", "rainbow", "pride", "alternative", "diverse",
];

const RELIGION: &[&str] = &[
    "Christian", "Catholic", "Protestant", "biblical", "church-going", "faith-based", "Baptist",
    "Methodist", "Presbyterian", "evangelical", "Orthodox", "religious", "Muslim", "Islamic",
    "mosque", "halal", "imam", "Quran", "Sunni", "Shia", "hajj", "Ramadan", "prayer",
    "faithful", "Jewish", "Hebrew", "synagogue", "Torah", "Sabbath", "kosher", "rabbi",
    "Passover", "Yom Kippur", "Conservative", "Reform", "Hindu", "Buddhist", "Sikh",
    "meditation", "karma", "dharma", "temple", "monastery", "enlightenment", "spiritual",
    "Eastern", "philosophy", "atheist", "secular", "non-religious", "agnostic", "humanist",
    "rationalist", "skeptic", "freethinker", "irreligious", "godless", "scientific", "logical",
];

const POLITICAL_AFFILIATION: &[&str] = &[
    "conservative", "Republican", "right-wing", "traditional values", "patriotic", "GOP",
    "libertarian", "nationalist", "pro-business", "capitalist", "traditional", "liberal",
    "Democratic", "progressive", "left-wing", "social justice", "Democrat", "socialist",
    "activist", "reform", "inclusive", "diverse",
];

const SOCIOECONOMIC_BACKGROUND: &[&str] = &[
    "wealthy", "privileged", "elite", "upper-class", "private school", "trust fund", "affluent",
    "rich", "luxury", "exclusive", "prestigious", "high-society", "working-class",
    "blue-collar", "public school", "first-generation college", "scholarship", "low-income",
    "disadvantaged", "struggling", "poor", "underprivileged", "modest",
];

const PREGNANCY_MATERNITY: &[&str] = &[
    "pregnant", "maternity", "expecting", "prenatal", "childbirth", "newborn", "breastfeeding",
    "maternity leave", "baby", "infant", "delivery", "labor",
];

const UNION_MEMBERSHIP: &[&str] = &[
    "union", "unionized", "collective bargaining", "labor union", "organized labor",
    "solidarity", "strike", "picket", "workers rights", "trade union", "guild", "non-union",
    "independent", "individual", "freelance", "contractor", "at-will", "right-to-work",
    "open shop", "merit-based", "competitive", "flexible",
];

const HEALTH_CONDITION: &[&str] = &[
    "diabetes", "depression", "anxiety", "cancer", "HIV", "mental health", "chronic illness",
    "medical condition", "therapy", "medication", "treatment", "recovery",
];

const CRIMINAL_BACKGROUND: &[&str] = &[
    "criminal record", "conviction", "felony", "misdemeanor", "arrest", "charges", "prison",
    "jail", "parole", "probation", "offense", "rehabilitation", "clean record",
    "no convictions", "law-abiding", "upstanding", "exemplary", "trustworthy", "honest",
    "reliable", "reputable", "respectable", "credible",
];

/// Descriptor terms for a category
pub fn terms(category: BiasCategory) -> &'static [&'static str] {
    match category {
        BiasCategory::Gender => GENDER,
        BiasCategory::RaceEthnicity => RACE_ETHNICITY,
        BiasCategory::Age => AGE,
        BiasCategory::Disability => DISABILITY,
        BiasCategory::MaritalStatus => MARITAL_STATUS,
        BiasCategory::Nationality => NATIONALITY,
        BiasCategory::SexualOrientation => SEXUAL_ORIENTATION,
        BiasCategory::Religion => RELIGION,
        BiasCategory::PoliticalAffiliation => POLITICAL_AFFILIATION,
        BiasCategory::SocioeconomicBackground => SOCIOECONOMIC_BACKGROUND,
        BiasCategory::PregnancyMaternity => PREGNANCY_MATERNITY,
        BiasCategory::UnionMembership => UNION_MEMBERSHIP,
        BiasCategory::HealthCondition => HEALTH_CONDITION,
        BiasCategory::CriminalBackground => CRIMINAL_BACKGROUND,
    }
}

/// Word-list recognizer for one category, with optional extra terms
pub fn category_recognizer(
    category: BiasCategory,
    extra_terms: &[String],
) -> Result<PatternRecognizer> {
    let id = format!("{}_bias", category.as_str());
    let mut all_terms: Vec<&str> = terms(category).to_vec();
    all_terms.extend(extra_terms.iter().map(String::as_str));

    let rule = PatternRule::from_terms(
        format!("{}_terms", category.as_str()),
        category.entity_type(),
        &all_terms,
        BIAS_BASE_SCORE,
    )?;
    PatternRecognizer::new(id, vec![rule])
}

/// Recognizers for the given categories (all categories when empty),
/// each extended with its configured extra terms
pub fn builtin_recognizers(
    categories: &[BiasCategory],
    extra_terms: &BTreeMap<BiasCategory, Vec<String>>,
) -> Result<Vec<PatternRecognizer>> {
    let selected: &[BiasCategory] = if categories.is_empty() {
        &BiasCategory::ALL
    } else {
        categories
    };
    selected
        .iter()
        .map(|&category| {
            let extra = extra_terms.get(&category).map_or(&[][..], Vec::as_slice);
            category_recognizer(category, extra)
        })
        .collect()
}
