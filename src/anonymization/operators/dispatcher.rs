//! Rewrites a text unit from its resolved spans

use super::{HashSalt, KeyRing, Operator, OperatorMapping};
use crate::anonymization::models::ResolvedSpan;
use crate::domain::{AnonymizerError, Result};

/// Applies operators to resolved spans.
///
/// Holds the run-scoped salt and keys so that deterministic operators give
/// identical output for identical input across every document of a run.
#[derive(Debug)]
pub struct OperatorDispatcher {
    salt: HashSalt,
    keys: KeyRing,
}

impl OperatorDispatcher {
    pub fn new(salt: HashSalt, keys: KeyRing) -> Self {
        Self { salt, keys }
    }

    pub fn salt(&self) -> &HashSalt {
        &self.salt
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Rewrite `text`, processing spans right to left over the original string.
    ///
    /// Spans must be non-overlapping, as produced by the entity resolver.
    /// Empty spans are skipped.
    pub fn apply(
        &self,
        text: &str,
        spans: &[ResolvedSpan],
        mapping: &OperatorMapping,
    ) -> Result<String> {
        let mut ordered: Vec<&ResolvedSpan> = spans.iter().filter(|s| !s.is_empty()).collect();
        ordered.sort_by(|a, b| b.start.cmp(&a.start));

        let mut output = text.to_string();
        for (i, span) in ordered.iter().enumerate() {
            let matched = text.get(span.start..span.end).ok_or_else(|| {
                AnonymizerError::Validation(format!(
                    "Span {}..{} is not a valid range of a {}-byte text",
                    span.start,
                    span.end,
                    text.len()
                ))
            })?;
            // Next span to the left, already known to end at or before this one
            let floor = ordered.get(i + 1).map_or(0, |left| left.end);
            if floor > span.start {
                return Err(AnonymizerError::Validation(format!(
                    "Overlapping spans at {}..{}",
                    span.start, span.end
                )));
            }

            let operator = mapping.operator_for(&span.entity_type)?;
            match operator {
                Operator::Redact => redact(&mut output, span.start, span.end, floor),
                Operator::Keep => {}
                _ => {
                    let replacement = self.apply_operator(operator, matched)?;
                    output.replace_range(span.start..span.end, &replacement);
                }
            }
        }

        Ok(output)
    }

    /// Transform a single matched string.
    ///
    /// REDACT yields an empty string here; whitespace collapsing only happens
    /// in [`OperatorDispatcher::apply`].
    pub fn apply_operator(&self, operator: &Operator, matched: &str) -> Result<String> {
        Ok(match operator {
            Operator::Replace { new_value } => new_value.clone(),
            Operator::Mask {
                masking_char,
                chars_to_mask,
                from_end,
            } => mask(matched, *masking_char, *chars_to_mask, *from_end),
            Operator::Hash { algorithm } => self.salt.digest_hex(*algorithm, matched),
            Operator::Redact => String::new(),
            Operator::Encrypt { key_ref } => self.keys.encrypt(key_ref, matched)?,
            Operator::Keep => matched.to_string(),
        })
    }
}

fn mask(text: &str, masking_char: char, chars_to_mask: usize, from_end: bool) -> String {
    let len = text.chars().count();
    let count = chars_to_mask.min(len);
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            let masked = if from_end { i >= len - count } else { i < count };
            if masked {
                masking_char
            } else {
                c
            }
        })
        .collect()
}

/// Remove `start..end` from `output` together with the whitespace around it,
/// leaving one space when the removal joined two words. Never reaches left of
/// `floor`.
fn redact(output: &mut String, start: usize, end: usize, floor: usize) {
    let mut left = start;
    while left > floor {
        match output[..left].chars().next_back() {
            Some(c) if c.is_whitespace() => left -= c.len_utf8(),
            _ => break,
        }
    }

    let mut right = end;
    while let Some(c) = output[right..].chars().next() {
        if !c.is_whitespace() {
            break;
        }
        right += c.len_utf8();
    }

    let had_whitespace = left < start || right > end;
    let joins_words = left > 0 && right < output.len();
    let replacement = if had_whitespace && joins_words { " " } else { "" };
    output.replace_range(left..right, replacement);
}
