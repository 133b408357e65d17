//! Complexity classification: which tier an issue deserves.
//!
//! Rules are checked in a fixed order and the first match wins; there is no
//! scoring or blending between rules.

use serde::{Deserialize, Serialize};

use crate::issue::{FlaggedIssue, Severity};
use crate::knowledge::KnowledgeEntry;

use super::IntelligenceTier;

/// Word-count thresholds used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Sentences longer than this go to the deep tier.
    pub deep_sentence_words: usize,
    /// Context longer than this goes to the deep tier.
    pub deep_context_words: usize,
    /// Sentences shorter than this go to the fast tier.
    pub fast_sentence_words: usize,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            deep_sentence_words: 25,
            deep_context_words: 50,
            fast_sentence_words: 10,
        }
    }
}

/// The rule that decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRule {
    ExplicitHint,
    DeclaredDeep,
    LongSentence,
    LongContext,
    HighSeverity,
    DeclaredFast,
    ShortSentence,
    LowSeverity,
    Default,
}

impl ClassificationRule {
    /// Short description for logs and CLI output.
    pub fn describe(&self) -> &'static str {
        match self {
            ClassificationRule::ExplicitHint => "explicit complexity hint",
            ClassificationRule::DeclaredDeep => "issue type declared deep",
            ClassificationRule::LongSentence => "long sentence",
            ClassificationRule::LongContext => "long surrounding context",
            ClassificationRule::HighSeverity => "high severity",
            ClassificationRule::DeclaredFast => "issue type declared fast",
            ClassificationRule::ShortSentence => "short sentence",
            ClassificationRule::LowSeverity => "low severity",
            ClassificationRule::Default => "default",
        }
    }
}

/// Picks an intelligence tier for a flagged issue.
#[derive(Debug, Clone, Default)]
pub struct ComplexityClassifier {
    thresholds: ClassifierThresholds,
}

impl ComplexityClassifier {
    /// Create a classifier with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom thresholds.
    pub fn with_thresholds(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classify an issue.
    pub fn classify(&self, issue: &FlaggedIssue, entry: &KnowledgeEntry) -> IntelligenceTier {
        self.classify_with_rule(issue, entry).0
    }

    /// Classify an issue and report which rule decided it.
    pub fn classify_with_rule(
        &self,
        issue: &FlaggedIssue,
        entry: &KnowledgeEntry,
    ) -> (IntelligenceTier, ClassificationRule) {
        use ClassificationRule as Rule;
        use IntelligenceTier::{Deep, Fast, Standard};

        if let Some(hint @ (Fast | Deep)) = issue.complexity_hint {
            return (hint, Rule::ExplicitHint);
        }

        let sentence_words = word_count(&issue.sentence);
        let context_words = word_count(issue.context());
        let t = &self.thresholds;

        if entry.declared_complexity == Deep {
            return (Deep, Rule::DeclaredDeep);
        }
        if sentence_words > t.deep_sentence_words {
            return (Deep, Rule::LongSentence);
        }
        if context_words > t.deep_context_words {
            return (Deep, Rule::LongContext);
        }
        if issue.severity == Severity::High {
            return (Deep, Rule::HighSeverity);
        }

        if entry.declared_complexity == Fast {
            return (Fast, Rule::DeclaredFast);
        }
        if sentence_words < t.fast_sentence_words {
            return (Fast, Rule::ShortSentence);
        }
        if issue.severity == Severity::Low {
            return (Fast, Rule::LowSeverity);
        }

        (Standard, Rule::Default)
    }
}

/// Whitespace word count.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueType;

    fn entry(complexity: IntelligenceTier) -> KnowledgeEntry {
        KnowledgeEntry::empty(IssueType::new("test")).with_declared_complexity(complexity)
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_explicit_hint_wins() {
        let classifier = ComplexityClassifier::new();
        let issue = FlaggedIssue::new(words(40), "passive voice")
            .with_severity(Severity::High)
            .with_complexity_hint(IntelligenceTier::Fast);

        assert_eq!(
            classifier.classify_with_rule(&issue, &entry(IntelligenceTier::Deep)),
            (IntelligenceTier::Fast, ClassificationRule::ExplicitHint)
        );
    }

    #[test]
    fn test_standard_hint_falls_through() {
        let classifier = ComplexityClassifier::new();
        let issue = FlaggedIssue::new(words(5), "wordiness")
            .with_complexity_hint(IntelligenceTier::Standard);

        assert_eq!(
            classifier.classify(&issue, &entry(IntelligenceTier::Standard)),
            IntelligenceTier::Fast
        );
    }

    #[test]
    fn test_long_sentence_overrides_declared_fast() {
        let classifier = ComplexityClassifier::new();
        let issue = FlaggedIssue::new(words(30), "contractions");

        assert_eq!(
            classifier.classify_with_rule(&issue, &entry(IntelligenceTier::Fast)),
            (IntelligenceTier::Deep, ClassificationRule::LongSentence)
        );
    }

    #[test]
    fn test_long_context_is_deep() {
        let classifier = ComplexityClassifier::new();
        let issue = FlaggedIssue::new(words(15), "wordiness").with_context(words(51));

        assert_eq!(
            classifier.classify_with_rule(&issue, &entry(IntelligenceTier::Standard)).1,
            ClassificationRule::LongContext
        );
    }

    #[test]
    fn test_high_severity_before_fast_rules() {
        let classifier = ComplexityClassifier::new();
        let issue = FlaggedIssue::new(words(4), "wordiness").with_severity(Severity::High);

        assert_eq!(
            classifier.classify(&issue, &entry(IntelligenceTier::Fast)),
            IntelligenceTier::Deep
        );
    }

    #[test]
    fn test_fast_rules() {
        let classifier = ComplexityClassifier::new();

        let short = FlaggedIssue::new(words(9), "wordiness");
        assert_eq!(
            classifier.classify_with_rule(&short, &entry(IntelligenceTier::Standard)).1,
            ClassificationRule::ShortSentence
        );

        let low = FlaggedIssue::new(words(15), "wordiness").with_severity(Severity::Low);
        assert_eq!(
            classifier.classify_with_rule(&low, &entry(IntelligenceTier::Standard)).1,
            ClassificationRule::LowSeverity
        );
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let classifier = ComplexityClassifier::new();

        // 25 words is not "more than 25", 10 words is not "fewer than 10".
        let at_deep_edge = FlaggedIssue::new(words(25), "wordiness");
        let at_fast_edge = FlaggedIssue::new(words(10), "wordiness");

        assert_eq!(
            classifier.classify(&at_deep_edge, &entry(IntelligenceTier::Standard)),
            IntelligenceTier::Standard
        );
        assert_eq!(
            classifier.classify(&at_fast_edge, &entry(IntelligenceTier::Standard)),
            IntelligenceTier::Standard
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = ComplexityClassifier::with_thresholds(ClassifierThresholds {
            deep_sentence_words: 12,
            ..Default::default()
        });
        let issue = FlaggedIssue::new(words(13), "wordiness");

        assert_eq!(
            classifier.classify(&issue, &entry(IntelligenceTier::Standard)),
            IntelligenceTier::Deep
        );
    }
}
