//! Domain types shared across the anonymizer
//!
//! - **Entity types** ([`EntityType`], [`EntityGroup`], [`BiasCategory`]): the open
//!   set of tags a recognizer can emit
//! - **Error types** ([`AnonymizerError`])
//! - **Result type alias** ([`Result`])
//!
//! ```rust
//! use bias_anonymizer::domain::{AnonymizerError, Result};
//!
//! fn check_depth(depth: usize) -> Result<()> {
//!     if depth > 64 {
//!         return Err(AnonymizerError::malformed("a.b", "too deep"));
//!     }
//!     Ok(())
//! }
//! # assert!(check_depth(65).is_err());
//! ```

pub mod entity;
pub mod errors;
pub mod result;

pub use entity::{BiasCategory, EntityGroup, EntityType};
pub use errors::AnonymizerError;
pub use result::Result;
