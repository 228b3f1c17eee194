//! Field paths and path patterns
//!
//! A [`FieldPath`] is the concrete address of a value (`core.workLocation.city`,
//! `experience.experiences[2].company`). A [`PathPattern`] addresses a family
//! of paths:
//!
//! - `a.b` matches `a.b` and, as a container rule, everything below it
//! - `[*]` matches any list index, `[3]` only index 3
//! - list indices in a path that the pattern does not mention are skipped,
//!   so `language.languages` covers `language.languages[0]`
//! - `*` matches any single key, `*Description` / `institution*` match by
//!   suffix / prefix
//! - a `**` segment matches any number of segments (`**.email`)

use crate::domain::{AnonymizerError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One step of a concrete path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Concrete address of a value inside a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a map entry below this path
    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Path of a list element below this path
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Path segments from the root
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the document root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = AnonymizerError;

    fn from_str(s: &str) -> Result<Self> {
        let pattern = PathPattern::parse(s)?;
        let segments = pattern
            .segments
            .into_iter()
            .map(|segment| match segment {
                PatternSegment::Key(key) => Ok(PathSegment::Key(key)),
                PatternSegment::Index(index) => Ok(PathSegment::Index(index)),
                _ => Err(AnonymizerError::Configuration(format!(
                    "Field path '{s}' must not contain wildcards"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    Glob { prefix: String, suffix: String },
    AnyKey,
    Index(usize),
    AnyIndex,
    AnyDepth,
}

impl PatternSegment {
    fn is_index(&self) -> bool {
        matches!(self, PatternSegment::Index(_) | PatternSegment::AnyIndex)
    }

    fn is_literal(&self) -> bool {
        matches!(self, PatternSegment::Key(_) | PatternSegment::Index(_))
    }

    fn matches_key(&self, key: &str) -> bool {
        match self {
            PatternSegment::Key(expected) => expected == key,
            PatternSegment::Glob { prefix, suffix } => {
                key.len() >= prefix.len() + suffix.len()
                    && key.starts_with(prefix.as_str())
                    && key.ends_with(suffix.as_str())
            }
            PatternSegment::AnyKey => true,
            _ => false,
        }
    }
}

/// How a pattern matched a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// The pattern addresses an ancestor container of the path
    Descendant,
    /// The pattern addresses the path itself (or the list holding it)
    Exact,
}

/// Ordering key used to pick the most specific of several matching patterns.
///
/// Exact beats descendant, then more literal segments win, then fewer
/// wildcard segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRank {
    pub kind: MatchKind,
    pub literal_segments: usize,
    pub wildcard_segments: usize,
}

impl Ord for MatchRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then(self.literal_segments.cmp(&other.literal_segments))
            .then(other.wildcard_segments.cmp(&self.wildcard_segments))
    }
}

impl PartialOrd for MatchRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pattern addressing a family of field paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Parse a pattern string
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = |reason: &str| {
            AnonymizerError::Configuration(format!("Invalid path pattern '{raw}': {reason}"))
        };
        if trimmed.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            let (name, mut brackets) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };

            match name {
                "" if brackets.is_empty() => return Err(invalid("empty segment")),
                "" => {}
                "**" => segments.push(PatternSegment::AnyDepth),
                "*" => segments.push(PatternSegment::AnyKey),
                _ if name.contains(']') => return Err(invalid("unbalanced brackets")),
                _ => match name.matches('*').count() {
                    0 => segments.push(PatternSegment::Key(name.to_string())),
                    1 => {
                        let (prefix, suffix) = name.split_once('*').unwrap_or((name, ""));
                        segments.push(PatternSegment::Glob {
                            prefix: prefix.to_string(),
                            suffix: suffix.to_string(),
                        });
                    }
                    _ => return Err(invalid("at most one '*' per key")),
                },
            }

            while !brackets.is_empty() {
                let close = brackets.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let inner = &brackets[1..close];
                if inner == "*" {
                    segments.push(PatternSegment::AnyIndex);
                } else {
                    let index = inner
                        .parse::<usize>()
                        .map_err(|_| invalid("index must be a number or '*'"))?;
                    segments.push(PatternSegment::Index(index));
                }
                brackets = &brackets[close + 1..];
                if !brackets.is_empty() && !brackets.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match this pattern against a concrete path
    pub fn matches(&self, path: &FieldPath) -> Option<MatchKind> {
        match_segments(&self.segments, path.segments())
    }

    /// Rank of a match of this pattern
    pub fn rank(&self, kind: MatchKind) -> MatchRank {
        let literal_segments = self.segments.iter().filter(|s| s.is_literal()).count();
        MatchRank {
            kind,
            literal_segments,
            wildcard_segments: self.segments.len() - literal_segments,
        }
    }
}

fn match_segments(pattern: &[PatternSegment], path: &[PathSegment]) -> Option<MatchKind> {
    let Some(head) = pattern.first() else {
        // Trailing list indices still address the same field
        return Some(
            if path.iter().all(|s| matches!(s, PathSegment::Index(_))) {
                MatchKind::Exact
            } else {
                MatchKind::Descendant
            },
        );
    };

    if *head == PatternSegment::AnyDepth {
        return (0..=path.len())
            .filter_map(|skip| match_segments(&pattern[1..], &path[skip..]))
            .max();
    }

    match (head, path.first()?) {
        (PatternSegment::AnyIndex, PathSegment::Index(_)) => {
            match_segments(&pattern[1..], &path[1..])
        }
        (PatternSegment::Index(expected), PathSegment::Index(actual)) if expected == actual => {
            match_segments(&pattern[1..], &path[1..])
        }
        (segment, PathSegment::Index(_)) if !segment.is_index() => {
            match_segments(pattern, &path[1..])
        }
        (segment, PathSegment::Key(key)) if segment.matches_key(key) => {
            match_segments(&pattern[1..], &path[1..])
        }
        _ => None,
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PathPattern {
    type Err = AnonymizerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathPattern {
    type Error = AnonymizerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(value: PathPattern) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn pattern(s: &str) -> PathPattern {
        PathPattern::parse(s).unwrap()
    }

    #[test]
    fn test_field_path_display() {
        let p = FieldPath::root()
            .child_key("experience")
            .child_key("experiences")
            .child_index(2)
            .child_key("company");
        assert_eq!(p.to_string(), "experience.experiences[2].company");
        assert_eq!(path("experience.experiences[2].company"), p);
        assert_eq!(p.depth(), 4);
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn test_field_path_rejects_wildcards() {
        assert!("a.*".parse::<FieldPath>().is_err());
        assert!("a[*]".parse::<FieldPath>().is_err());
    }

    #[test_case("core.jobCode", "core.jobCode", Some(MatchKind::Exact) ; "exact")]
    #[test_case("core.jobCode", "core.jobCodes", None ; "different key")]
    #[test_case("affiliation.awards", "affiliation.awards[0].name", Some(MatchKind::Descendant) ; "descendant")]
    #[test_case("language.languages", "language.languages[1]", Some(MatchKind::Exact) ; "list element")]
    #[test_case("experience.experiences[*].company", "experience.experiences[3].company", Some(MatchKind::Exact) ; "any index")]
    #[test_case("experience.experiences.company", "experience.experiences[3].company", Some(MatchKind::Exact) ; "implicit index")]
    #[test_case("experience.experiences[1].company", "experience.experiences[3].company", None ; "other index")]
    #[test_case("core.gcrs.*Description", "core.gcrs.businessUnitDescription", Some(MatchKind::Exact) ; "suffix glob")]
    #[test_case("core.gcrs.*Description", "core.gcrs.businessUnitCode", None ; "suffix glob miss")]
    #[test_case("**.email", "employee.personal.email", Some(MatchKind::Exact) ; "any depth")]
    #[test_case("**.email", "email", Some(MatchKind::Exact) ; "any depth at root")]
    #[test_case("core.*.code", "core.rank.code", Some(MatchKind::Exact) ; "any key")]
    #[test_case("core.rank.code", "core", None ; "pattern longer than path")]
    fn test_pattern_matching(p: &str, concrete: &str, expected: Option<MatchKind>) {
        assert_eq!(pattern(p).matches(&path(concrete)), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("a..b" ; "empty segment")]
    #[test_case("a[x]" ; "bad index")]
    #[test_case("a[1" ; "unclosed")]
    #[test_case("a[1]b" ; "text after bracket")]
    #[test_case("*a*" ; "two stars")]
    fn test_invalid_patterns(p: &str) {
        assert!(PathPattern::parse(p).is_err());
    }

    #[test]
    fn test_rank_prefers_exact_then_literals() {
        let exact = pattern("core.reportingDistance.ceo");
        let wildcard = pattern("core.reportingDistance.*");
        let parent = pattern("core.reportingDistance");
        let target = path("core.reportingDistance.ceo");

        let exact_rank = exact.rank(exact.matches(&target).unwrap());
        let wildcard_rank = wildcard.rank(wildcard.matches(&target).unwrap());
        let parent_rank = parent.rank(parent.matches(&target).unwrap());

        assert!(exact_rank > wildcard_rank);
        assert!(wildcard_rank > parent_rank);

        let any_depth = pattern("**.ceo");
        let any_depth_rank = any_depth.rank(any_depth.matches(&target).unwrap());
        assert!(exact_rank > any_depth_rank);
    }

    #[test]
    fn test_pattern_serde() {
        let p: PathPattern = serde_json::from_str("\"userId\"").unwrap();
        assert_eq!(p.as_str(), "userId");
        assert!(serde_json::from_str::<PathPattern>("\"a[\"").is_err());
    }
}
