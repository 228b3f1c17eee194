//! Built-in PII recognizers
//!
//! Each recognizer is a table of `(rule name, regex, base score)` entries plus
//! the context words that raise confidence. PERSON has no pattern table; it
//! is supplied by the injected named-entity recognizer or a custom one.

use super::pattern::{PatternRecognizer, PatternRule, Validator};
use super::validators;
use crate::domain::entity::{pii, EntityType};
use crate::domain::Result;

type PatternTable = &'static [(&'static str, &'static str, f32)];

const EMAIL_PATTERNS: PatternTable = &[(
    "email",
    r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b",
    0.9,
)];
const EMAIL_CONTEXT: &[&str] = &["email", "e-mail", "mail", "contact"];

const PHONE_PATTERNS: PatternTable = &[
    ("phone_with_dashes", r"\b\d{3}-\d{3}-\d{4}\b", 0.85),
    ("phone_with_parentheses", r"\(\d{3}\)\s*\d{3}-\d{4}\b", 0.9),
    ("phone_with_dots", r"\b\d{3}\.\d{3}\.\d{4}\b", 0.85),
    ("phone_with_spaces", r"\b\d{3}\s\d{3}\s\d{4}\b", 0.8),
    ("phone_short", r"\b\d{3}-\d{4}\b", 0.7),
    ("phone_international", r"\+1\s?\(?\d{3}\)?\s?\d{3}-?\d{4}\b", 0.95),
    (
        "phone_with_extension",
        r"\b\d{3}-\d{3}-\d{4}\s*(?:ext|x|extension)\s*\d{1,5}\b",
        0.95,
    ),
    (
        "phone_toll_free",
        r"\b(?:800|888|877|866|855|844|833)-\d{3}-\d{4}\b",
        0.9,
    ),
];
const PHONE_CONTEXT: &[&str] = &[
    "phone",
    "telephone",
    "tel",
    "cell",
    "mobile",
    "call",
    "fax",
    "contact",
    "number",
];

const SSN_PATTERNS: PatternTable = &[
    ("ssn_with_dashes", r"\b\d{3}-\d{2}-\d{4}\b", 0.9),
    ("ssn_with_spaces", r"\b\d{3}\s\d{2}\s\d{4}\b", 0.9),
    ("ssn_no_separator", r"\b\d{9}\b", 0.7),
];
const SSN_LABELLED: (&str, &str, f32) = (
    "ssn_with_label",
    r"(?i)(?:ssn|social\s*security|ss\s*#)\s*:?\s*\d{3}[-\s]?\d{2}[-\s]?\d{4}\b",
    0.95,
);
const SSN_CONTEXT: &[&str] = &["ssn", "social", "security", "ss#"];

const CREDIT_CARD_PATTERNS: PatternTable = &[("credit_card", r"\b(?:\d[ -]?){12,18}\d\b", 0.9)];
const CREDIT_CARD_CONTEXT: &[&str] = &[
    "credit",
    "card",
    "visa",
    "mastercard",
    "amex",
    "discover",
    "payment",
    "cc",
];

const IP_PATTERNS: PatternTable = &[
    (
        "ipv4",
        r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
        0.85,
    ),
    (
        "ipv6",
        r"\b(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}\b",
        0.8,
    ),
];
const IP_CONTEXT: &[&str] = &["ip", "ipv4", "ipv6", "address", "host", "server"];

const DATE_PATTERNS: PatternTable = &[
    (
        "date_iso",
        r"\b(?:19|20)\d{2}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])(?:[T ]\d{2}:\d{2}(?::\d{2})?(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)?\b",
        0.85,
    ),
    (
        "date_us",
        r"\b(?:0?[1-9]|1[0-2])/(?:0?[1-9]|[12]\d|3[01])/(?:19|20)?\d{2}\b",
        0.75,
    ),
    (
        "date_month_name",
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+(?:19|20)\d{2}\b",
        0.8,
    ),
];
const DATE_CONTEXT: &[&str] = &["date", "born", "birth", "birthday", "dob", "since", "started"];

const LOCATION_PATTERNS: PatternTable = &[
    (
        "street_address",
        r"\b\d{1,5}\s+[\w\s]{1,30}\s+(?:Street|St|Avenue|Ave|Boulevard|Blvd|Road|Rd|Lane|Ln|Drive|Dr|Court|Ct|Way|Parkway|Pkwy|Circle|Cir|Plaza|Place|Pl)\b",
        0.85,
    ),
    ("po_box", r"(?i)\bP\.?O\.?\s*Box\s*\d+\b", 0.95),
    (
        "full_address",
        r"\b\d{1,5}\s+[\w\s]{1,30},\s*[\w\s]{2,30},\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?\b",
        0.95,
    ),
    ("zip_code", r"\b\d{5}(?:-\d{4})?\b", 0.6),
    (
        "apartment_or_suite",
        r"(?i)\b(?:apt|apartment|suite|ste|unit)\.?\s*#?\s*\d[\w-]{0,9}\b",
        0.7,
    ),
];
const LOCATION_CONTEXT: &[&str] = &[
    "address", "street", "zip", "postal", "city", "lives", "located", "residence",
];

/// All built-in PII recognizers
pub fn builtin_recognizers() -> Result<Vec<PatternRecognizer>> {
    Ok(vec![
        email_recognizer()?,
        phone_recognizer()?,
        ssn_recognizer()?,
        credit_card_recognizer()?,
        ip_address_recognizer()?,
        date_time_recognizer()?,
        location_recognizer()?,
    ])
}

/// EMAIL_ADDRESS recognizer
pub fn email_recognizer() -> Result<PatternRecognizer> {
    from_table("email_address", pii::EMAIL_ADDRESS, EMAIL_PATTERNS, EMAIL_CONTEXT, None)
}

/// PHONE_NUMBER recognizer covering the common US layouts
pub fn phone_recognizer() -> Result<PatternRecognizer> {
    from_table("phone_number", pii::PHONE_NUMBER, PHONE_PATTERNS, PHONE_CONTEXT, None)
}

/// US_SSN recognizer with structural validation
///
/// The labelled pattern is exempt from validation because the label itself is
/// strong evidence.
pub fn ssn_recognizer() -> Result<PatternRecognizer> {
    let entity = EntityType::known(pii::US_SSN);
    let mut rules = table_rules(&entity, SSN_PATTERNS, SSN_CONTEXT, Some(validators::ssn()))?;
    let (name, pattern, score) = SSN_LABELLED;
    rules.push(PatternRule::new(name, entity, pattern, score)?.with_context(SSN_CONTEXT));
    PatternRecognizer::new("us_ssn", rules)
}

/// CREDIT_CARD recognizer with Luhn validation
pub fn credit_card_recognizer() -> Result<PatternRecognizer> {
    from_table(
        "credit_card",
        pii::CREDIT_CARD,
        CREDIT_CARD_PATTERNS,
        CREDIT_CARD_CONTEXT,
        Some(validators::luhn()),
    )
}

/// IP_ADDRESS recognizer (v4 and full-form v6)
pub fn ip_address_recognizer() -> Result<PatternRecognizer> {
    from_table("ip_address", pii::IP_ADDRESS, IP_PATTERNS, IP_CONTEXT, None)
}

/// DATE_TIME recognizer (ISO, US numeric, month name)
pub fn date_time_recognizer() -> Result<PatternRecognizer> {
    from_table("date_time", pii::DATE_TIME, DATE_PATTERNS, DATE_CONTEXT, None)
}

/// LOCATION recognizer for postal addresses
pub fn location_recognizer() -> Result<PatternRecognizer> {
    from_table("location", pii::LOCATION, LOCATION_PATTERNS, LOCATION_CONTEXT, None)
}

fn from_table(
    id: &str,
    entity: &'static str,
    table: PatternTable,
    context: &[&str],
    validator: Option<Validator>,
) -> Result<PatternRecognizer> {
    let entity = EntityType::known(entity);
    PatternRecognizer::new(id, table_rules(&entity, table, context, validator)?)
}

fn table_rules(
    entity: &EntityType,
    table: PatternTable,
    context: &[&str],
    validator: Option<Validator>,
) -> Result<Vec<PatternRule>> {
    table
        .iter()
        .map(|&(name, pattern, score)| {
            let rule = PatternRule::new(name, entity.clone(), pattern, score)?.with_context(context);
            Ok(match &validator {
                Some(v) => rule.with_validator(v.clone()),
                None => rule,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::recognizer::Recognizer;
    use test_case::test_case;

    fn matches(recognizer: &PatternRecognizer, text: &str) -> Vec<String> {
        recognizer
            .detect(text)
            .unwrap()
            .into_iter()
            .map(|s| text[s.start..s.end].to_string())
            .collect()
    }

    #[test]
    fn test_builtins_compile() {
        let recognizers = builtin_recognizers().unwrap();
        assert_eq!(recognizers.len(), 7);
    }

    #[test_case("reach me at jane.doe+hr@corp.example.org today", "jane.doe+hr@corp.example.org")]
    #[test_case("Email john@x.com call", "john@x.com")]
    fn test_email(text: &str, expected: &str) {
        assert_eq!(matches(&email_recognizer().unwrap(), text), vec![expected]);
    }

    #[test_case("555-123-4567" ; "dashes")]
    #[test_case("(555) 123-4567" ; "parentheses")]
    #[test_case("555.123.4567" ; "dots")]
    #[test_case("+1 555 123-4567" ; "international")]
    fn test_phone_layouts(text: &str) {
        let spans = phone_recognizer().unwrap().detect(text).unwrap();
        assert!(spans.iter().any(|s| s.start == 0 && s.end == text.len()));
    }

    #[test]
    fn test_ssn_validation_discards_invalid_area() {
        let recognizer = ssn_recognizer().unwrap();
        assert_eq!(matches(&recognizer, "id 123-45-6789"), vec!["123-45-6789"]);
        assert!(matches(&recognizer, "id 666-45-6789").is_empty());
    }

    #[test]
    fn test_ssn_label_boosts_confidence() {
        let spans = ssn_recognizer().unwrap().detect("SSN: 123-45-6789").unwrap();
        let best = spans
            .iter()
            .map(|s| s.confidence)
            .fold(0.0_f32, f32::max);
        assert_eq!(best, 1.0);
    }

    #[test]
    fn test_credit_card_requires_luhn() {
        let recognizer = credit_card_recognizer().unwrap();
        assert_eq!(
            matches(&recognizer, "card 4532 0151 1283 0366 on file"),
            vec!["4532 0151 1283 0366"]
        );
        assert!(matches(&recognizer, "ref 4532 0151 1283 0367").is_empty());
    }

    #[test]
    fn test_ip_address() {
        let recognizer = ip_address_recognizer().unwrap();
        assert_eq!(matches(&recognizer, "host 10.0.12.255 up"), vec!["10.0.12.255"]);
        assert!(matches(&recognizer, "999.1.1.1").is_empty());
    }

    #[test_case("joined 2019-03-04", "2019-03-04")]
    #[test_case("started 3/4/2019", "3/4/2019")]
    #[test_case("since March 4, 2019", "March 4, 2019")]
    fn test_dates(text: &str, expected: &str) {
        assert_eq!(matches(&date_time_recognizer().unwrap(), text), vec![expected]);
    }

    #[test]
    fn test_location_po_box() {
        let recognizer = location_recognizer().unwrap();
        assert!(matches(&recognizer, "mail to PO Box 1234").contains(&"PO Box 1234".to_string()));
    }

    #[test]
    fn test_zip_needs_context_to_pass_default_threshold() {
        let recognizer = location_recognizer().unwrap();
        let plain = recognizer.detect("ref 10001").unwrap();
        let with_context = recognizer.detect("zip 10001").unwrap();
        assert!(plain[0].confidence < 0.7);
        assert!(with_context[0].confidence >= 0.7);
    }
}
