//! Content-addressed cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::issue::FlaggedIssue;

/// Separates key components so `("ab", "c")` and `("a", "bc")` differ.
const UNIT_SEPARATOR: char = '\u{1f}';

/// SHA-256 hex digest of (sentence, issue type, surrounding context).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for raw components.
    pub fn new(sentence: &str, issue_type: &str, context: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sentence.as_bytes());
        hasher.update(UNIT_SEPARATOR.to_string().as_bytes());
        hasher.update(issue_type.as_bytes());
        hasher.update(UNIT_SEPARATOR.to_string().as_bytes());
        hasher.update(context.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Derive the key for a flagged issue. Severity and hints are not part of it.
    pub fn for_issue(issue: &FlaggedIssue) -> Self {
        Self::new(&issue.sentence, issue.issue_type.as_str(), issue.context())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
