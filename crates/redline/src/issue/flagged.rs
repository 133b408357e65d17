//! Flagged issue types.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RedlineError, Result};
use crate::routing::IntelligenceTier;

/// Normalized issue-type key used to look up knowledge base entries.
///
/// Normalization lowercases, turns `_` and `-` into spaces and collapses
/// whitespace, so `"Passive_Voice"` and `"passive voice"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct IssueType(String);

impl IssueType {
    /// Create a normalized issue type.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let cleaned = raw.as_ref().to_lowercase().replace(['_', '-'], " ");
        let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(normalized)
    }

    /// The normalized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the normalized key contains any of the given fragments.
    pub fn mentions(&self, fragments: &[&str]) -> bool {
        fragments.iter().any(|f| self.0.contains(f))
    }
}

impl From<String> for IssueType {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for IssueType {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<IssueType> for String {
    fn from(issue_type: IssueType) -> Self {
        issue_type.0
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Severity assigned by the rule checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A detected writing-quality problem and the sentence it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedIssue {
    /// The flagged sentence, verbatim.
    pub sentence: String,

    /// Issue type reported by the checker.
    #[serde(alias = "issue")]
    pub issue_type: IssueType,

    /// Text around the sentence (previous/next sentences), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrounding_context: Option<String>,

    /// Checker-assigned severity.
    #[serde(default)]
    pub severity: Severity,

    /// Explicit tier override from the checker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_hint: Option<IntelligenceTier>,
}

impl FlaggedIssue {
    /// Create a new flagged issue with medium severity and no context.
    pub fn new(sentence: impl Into<String>, issue_type: impl Into<IssueType>) -> Self {
        Self {
            sentence: sentence.into(),
            issue_type: issue_type.into(),
            surrounding_context: None,
            severity: Severity::default(),
            complexity_hint: None,
        }
    }

    /// Set the surrounding context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.surrounding_context = Some(context.into());
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set an explicit complexity hint.
    pub fn with_complexity_hint(mut self, tier: IntelligenceTier) -> Self {
        self.complexity_hint = Some(tier);
        self
    }

    /// Surrounding context, or an empty string.
    pub fn context(&self) -> &str {
        self.surrounding_context.as_deref().unwrap_or("")
    }

    /// Load a batch of flagged issues from a JSON array file.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<FlaggedIssue>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RedlineError::io(path, e))?;
        let issues: Vec<FlaggedIssue> = serde_json::from_reader(BufReader::new(file))?;
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_type_normalization() {
        assert_eq!(IssueType::new("Passive_Voice"), IssueType::new("passive voice"));
        assert_eq!(IssueType::new("  long-sentence ").as_str(), "long sentence");
        assert_eq!(IssueType::new("WEAK   modifiers").as_str(), "weak modifiers");
    }

    #[test]
    fn test_deserialize_flagged_issue() {
        let json = r#"{
            "sentence": "The report was written by the team.",
            "issue_type": "Passive_Voice",
            "severity": "high",
            "complexity_hint": "deep"
        }"#;

        let issue: FlaggedIssue = serde_json::from_str(json).unwrap();

        assert_eq!(issue.issue_type.as_str(), "passive voice");
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.complexity_hint, Some(IntelligenceTier::Deep));
        assert!(issue.surrounding_context.is_none());
    }

    #[test]
    fn test_defaults_and_alias() {
        let json = r#"{"sentence": "Hi.", "issue": "wordiness"}"#;
        let issue: FlaggedIssue = serde_json::from_str(json).unwrap();

        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.context(), "");
        assert_eq!(issue.issue_type.as_str(), "wordiness");
    }
}
