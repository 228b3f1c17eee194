//! Structured validators for checksum-style entities

use super::pattern::Validator;
use std::sync::Arc;

/// Luhn checksum over the digits of `candidate`, ignoring spaces and dashes
///
/// Returns `false` for fewer than 13 or more than 19 digits.
pub fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// US social security number structure check
///
/// Rejects area 000, 666 and 900-999, group 00 and serial 0000, as well as
/// numbers made of a single repeated digit.
pub fn ssn_valid(candidate: &str) -> bool {
    let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return false;
    }
    if digits.chars().all(|c| Some(c) == digits.chars().next()) {
        return false;
    }

    let area = &digits[0..3];
    let group = &digits[3..5];
    let serial = &digits[5..9];

    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

/// [`luhn_valid`] as a pattern rule validator
pub fn luhn() -> Validator {
    Arc::new(|candidate: &str| Ok(luhn_valid(candidate)))
}

/// [`ssn_valid`] as a pattern rule validator
pub fn ssn() -> Validator {
    Arc::new(|candidate: &str| Ok(ssn_valid(candidate)))
}
