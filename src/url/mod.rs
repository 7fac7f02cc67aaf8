//! URL handling module
//!
//! This module provides dedup-key normalization and the same-domain scope
//! check that together decide whether a discovered link is new work.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, in_scope};
pub use normalize::{normalize_str, normalize_url, without_fragment, NormalizedUrl, QueryPolicy};
