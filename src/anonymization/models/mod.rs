//! Anonymization data models

mod detection;
mod span;

pub use detection::{AnonymizedDocument, Detection, SpecialField};
pub use span::{CandidateSpan, DetectionMethod, RecognizerFailure, ResolvedSpan};
