//! Suggestion types: parsed generation output and the final result.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::issue::{FlaggedIssue, IssueType};
use crate::routing::IntelligenceTier;

/// Structured fields extracted from a generated response (or a fallback).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedSuggestion {
    /// The rewritten sentence.
    pub corrected_text: String,

    /// Why the rewrite fixes the issue.
    pub reasoning: String,

    /// User-facing explanation.
    pub explanation: String,

    /// Deeper analysis (deep tier only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    /// Alternative rewrites (deep tier only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,

    /// Confidence in the rewrite (0.0-1.0).
    pub confidence: f64,
}

impl ParsedSuggestion {
    /// Create a suggestion with just a corrected text.
    pub fn new(corrected_text: impl Into<String>) -> Self {
        Self {
            corrected_text: corrected_text.into(),
            ..Default::default()
        }
    }

    /// Set the reasoning.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Set the explanation.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Set confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Whether the corrected text is a real change to `original`.
    pub fn changes(&self, original: &str) -> bool {
        let corrected = self.corrected_text.trim();
        !corrected.is_empty() && corrected != original.trim()
    }

    /// Whether this suggestion can be returned as a success.
    pub fn is_usable(&self, original: &str, threshold: f64) -> bool {
        self.changes(original) && self.confidence > threshold
    }
}

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMethod {
    /// Served from the result cache.
    Cache,
    /// Produced by the generation service.
    Generated,
    /// Produced by the deterministic rewriter.
    Fallback,
}

impl SuggestionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionMethod::Cache => "cache",
            SuggestionMethod::Generated => "generated",
            SuggestionMethod::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SuggestionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal state of a suggestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    /// Confidence above the success threshold.
    Success,
    /// Fallback or low-confidence result.
    Degraded,
}

/// A recoverable problem hit while producing a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// No knowledge base entry for the issue type.
    RetrievalMiss,
    /// The generation service failed or timed out.
    GenerationUnavailable { reason: String },
    /// The response had no labeled sections.
    MalformedResponse,
    /// A parsed response was rejected as too weak or a no-op.
    LowConfidence { confidence: f64 },
}

/// A rewrite for one flagged issue, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Issue type of the flagged issue.
    pub issue_type: IssueType,

    /// The flagged sentence.
    pub original: String,

    /// The rewritten sentence. Never equal to `original`.
    pub corrected_text: String,

    pub reasoning: String,

    pub explanation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,

    /// Confidence in this suggestion (0.0-1.0).
    pub confidence: f64,

    /// Provenance tag.
    pub method: SuggestionMethod,

    pub status: SuggestionStatus,

    /// Tier used for generation; absent on cache hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<IntelligenceTier>,

    /// Problems recovered from along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,

    /// When this suggestion was produced.
    pub suggested_at: DateTime<Utc>,
}

impl Suggestion {
    /// Assemble a suggestion for an issue from parsed fields.
    pub fn from_parsed(
        issue: &FlaggedIssue,
        parsed: ParsedSuggestion,
        method: SuggestionMethod,
        status: SuggestionStatus,
    ) -> Self {
        Self {
            issue_type: issue.issue_type.clone(),
            original: issue.sentence.clone(),
            corrected_text: parsed.corrected_text,
            reasoning: parsed.reasoning,
            explanation: parsed.explanation,
            analysis: parsed.analysis,
            alternatives: parsed.alternatives,
            confidence: parsed.confidence,
            method,
            status,
            tier: None,
            degradations: Vec::new(),
            suggested_at: Utc::now(),
        }
    }

    /// Set the tier.
    pub fn with_tier(mut self, tier: IntelligenceTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Set the degradation list.
    pub fn with_degradations(mut self, degradations: Vec<Degradation>) -> Self {
        self.degradations = degradations;
        self
    }

    /// Whether this suggestion reached the success state.
    pub fn is_success(&self) -> bool {
        self.status == SuggestionStatus::Success
    }

    /// Whether a specific kind of degradation was recorded.
    pub fn degraded_by(&self, predicate: impl Fn(&Degradation) -> bool) -> bool {
        self.degradations.iter().any(predicate)
    }
}
