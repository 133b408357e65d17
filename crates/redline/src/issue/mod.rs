//! Flagged issues produced by the rule-checking layer.
//!
//! The pipeline consumes these read-only; it never creates or mutates them.

mod flagged;

pub use flagged::{FlaggedIssue, IssueType, Severity};
