//! Knowledge entry types.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::issue::IssueType;
use crate::routing::IntelligenceTier;

/// `"before" → "after"` pairs inside free-form guidance text.
static EXAMPLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["“]([^"“”]+)["”]\s*(?:→|->|=>)\s*["“]([^"“”]+)["”]"#)
        .unwrap()
});

/// A before/after rewrite illustrating an issue type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteExample {
    pub before: String,
    pub after: String,
}

impl RewriteExample {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Guidance for one issue type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Issue type this entry covers.
    pub issue_type: IssueType,

    /// Short imperative instruction.
    pub guidance: String,

    /// Longer rationale text.
    pub detailed_context: String,

    /// Ordered before/after examples.
    pub examples: Vec<RewriteExample>,

    /// Static complexity hint for the classifier.
    pub declared_complexity: IntelligenceTier,
}

impl KnowledgeEntry {
    /// Create an entry, deriving examples from the detailed context.
    pub fn new(
        issue_type: impl Into<IssueType>,
        guidance: impl Into<String>,
        detailed_context: impl Into<String>,
    ) -> Self {
        let detailed_context = detailed_context.into();
        let examples = extract_examples(&detailed_context);

        Self {
            issue_type: issue_type.into(),
            guidance: guidance.into(),
            detailed_context,
            examples,
            declared_complexity: IntelligenceTier::Standard,
        }
    }

    /// Placeholder used when the knowledge base has no entry for an issue type.
    pub fn empty(issue_type: IssueType) -> Self {
        Self {
            issue_type,
            guidance: String::new(),
            detailed_context: String::new(),
            examples: Vec::new(),
            declared_complexity: IntelligenceTier::Standard,
        }
    }

    /// Set the declared complexity.
    pub fn with_declared_complexity(mut self, tier: IntelligenceTier) -> Self {
        self.declared_complexity = tier;
        self
    }

    /// Replace the example list.
    pub fn with_examples(mut self, examples: Vec<RewriteExample>) -> Self {
        self.examples = examples;
        self
    }

    /// Whether this entry carries no guidance at all.
    pub fn is_empty(&self) -> bool {
        self.guidance.is_empty() && self.detailed_context.is_empty() && self.examples.is_empty()
    }
}

/// Scan text for `"X" → "Y"` pairs, in order of appearance.
pub fn extract_examples(text: &str) -> Vec<RewriteExample> {
    EXAMPLE_PATTERN
        .captures_iter(text)
        .map(|caps| RewriteExample::new(caps[1].trim(), caps[2].trim()))
        .filter(|ex| !ex.before.is_empty() && !ex.after.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_examples_arrow_variants() {
        let text = r#"Prefer active voice. "The ball was thrown by Sam" → "Sam threw the ball".
            Also "It is believed by many" -> "Many believe", and “Mistakes were made” => “We made mistakes”."#;

        let examples = extract_examples(text);

        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0], RewriteExample::new("The ball was thrown by Sam", "Sam threw the ball"));
        assert_eq!(examples[1].after, "Many believe");
        assert_eq!(examples[2].before, "Mistakes were made");
    }

    #[test]
    fn test_extract_examples_ignores_plain_quotes() {
        assert!(extract_examples(r#"Avoid words like "very" and "really"."#).is_empty());
    }

    #[test]
    fn test_new_entry_derives_examples() {
        let entry = KnowledgeEntry::new(
            "wordiness",
            "Cut filler phrases.",
            r#""in order to" → "to""#,
        );

        assert_eq!(entry.examples.len(), 1);
        assert_eq!(entry.declared_complexity, IntelligenceTier::Standard);
        assert!(!entry.is_empty());
        assert!(KnowledgeEntry::empty(IssueType::new("x")).is_empty());
    }
}
