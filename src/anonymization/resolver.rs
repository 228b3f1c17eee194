//! Entity resolver
//!
//! Turns the unordered candidates of one text unit into a non-overlapping
//! span set. Candidates are ranked by confidence, then length, then start
//! offset (entity type name as the last key, so the order is total), and
//! accepted greedily unless they intersect an already accepted span.

use crate::anonymization::models::{CandidateSpan, ResolvedSpan};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Default minimum confidence for a candidate to be considered
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

/// Priority-based interval scheduler for candidate spans
#[derive(Debug, Clone, Copy)]
pub struct EntityResolver {
    min_confidence: f32,
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl EntityResolver {
    /// Create a resolver that discards candidates below `min_confidence`
    pub fn new(min_confidence: f32) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    /// Confidence threshold
    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Resolve candidates into spans ordered by start offset
    pub fn resolve(&self, candidates: Vec<CandidateSpan>) -> Vec<ResolvedSpan> {
        let mut ranked: Vec<CandidateSpan> = candidates
            .into_iter()
            .filter(|c| c.confidence >= self.min_confidence && c.start <= c.end)
            .collect();
        ranked.sort_by(priority);

        // start -> occupied end of every accepted span
        let mut occupied: BTreeMap<usize, usize> = BTreeMap::new();
        let mut accepted = Vec::with_capacity(ranked.len());

        for candidate in ranked {
            let end = candidate.occupied_end();
            let blocked_left = occupied
                .range(..=candidate.start)
                .next_back()
                .is_some_and(|(_, &prev_end)| prev_end > candidate.start);
            let blocked_right = occupied
                .range(candidate.start..)
                .next()
                .is_some_and(|(&next_start, _)| next_start < end);

            if blocked_left || blocked_right {
                tracing::trace!(
                    entity_type = %candidate.entity_type,
                    start = candidate.start,
                    end = candidate.end,
                    "Discarding overlapped candidate"
                );
                continue;
            }

            occupied.insert(candidate.start, end);
            accepted.push(candidate);
        }

        accepted.sort_by_key(|c| c.start);
        accepted.into_iter().map(ResolvedSpan::from).collect()
    }
}

fn priority(a: &CandidateSpan, b: &CandidateSpan) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.entity_type.cmp(&b.entity_type))
}
