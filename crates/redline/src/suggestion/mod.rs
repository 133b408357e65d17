//! Suggestions for flagged writing issues.
//!
//! This module defines the parsed and final suggestion types and the
//! deterministic fallback rewriter used when generation is unavailable.

mod fallback;
mod suggestion;

pub use fallback::{FallbackRewriter, Rewrite, RewriteRule};
pub use suggestion::{
    Degradation, ParsedSuggestion, Suggestion, SuggestionMethod, SuggestionStatus,
};
