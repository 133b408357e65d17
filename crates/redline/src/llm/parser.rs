//! Response parser: raw generated text → structured suggestion fields.
//!
//! Parsing is a line state machine over the grammar in [`super::sections`].
//! It never fails; a response without labels falls back to the last quoted
//! string, and a response without either yields an empty suggestion.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::IntelligenceTier;
use crate::suggestion::ParsedSuggestion;

use super::sections::{Section, match_label};

/// Confidence for a response that produced a real rewrite.
pub const EXTRACTED_CONFIDENCE: f64 = 0.8;

/// Confidence for a response that did not.
pub const UNEXTRACTED_CONFIDENCE: f64 = 0.1;

/// Straight or curly quoted spans.
static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"|“([^“”]+)”"#).unwrap());

/// Leading list markers on alternative lines.
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").unwrap());

/// How the corrected text was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// A CORRECTED section was present.
    Labeled,
    /// No labels; corrected text is the last quoted span.
    QuotedHeuristic,
    /// Nothing usable.
    Unrecognized,
}

/// Result of parsing one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub suggestion: ParsedSuggestion,
    pub format: ResponseFormat,
}

/// Strict grammar violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing required section {0}")]
    MissingSection(&'static str),

    #[error("section {0} is empty")]
    EmptySection(&'static str),
}

/// Parses generated responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a response, scoring confidence against the original sentence.
    pub fn parse(&self, raw: &str, tier: IntelligenceTier, original: &str) -> ParsedResponse {
        let sections = collect_sections(raw, tier);

        let (corrected, format) = match sections.get(&Section::Corrected) {
            Some(text) => (strip_quotes(text).to_string(), ResponseFormat::Labeled),
            None => match last_quoted(raw) {
                Some(quoted) => (quoted.trim().to_string(), ResponseFormat::QuotedHeuristic),
                None => (String::new(), ResponseFormat::Unrecognized),
            },
        };

        let mut suggestion = ParsedSuggestion::new(corrected)
            .with_reasoning(section_text(&sections, Section::Reasoning))
            .with_explanation(section_text(&sections, Section::Explanation));

        if tier == IntelligenceTier::Deep {
            suggestion.analysis = sections
                .get(&Section::Analysis)
                .filter(|text| !text.is_empty())
                .cloned();
            suggestion.alternatives = sections
                .get(&Section::Alternatives)
                .map(|text| split_alternatives(text))
                .unwrap_or_default();
        }

        let confidence = if suggestion.changes(original) {
            EXTRACTED_CONFIDENCE
        } else {
            UNEXTRACTED_CONFIDENCE
        };
        suggestion = suggestion.with_confidence(confidence);

        ParsedResponse { suggestion, format }
    }

    /// Check a response against the label grammar for a tier.
    ///
    /// Every required section must be present and non-empty.
    pub fn parse_strict(&self, raw: &str, tier: IntelligenceTier) -> Result<ParsedSuggestion, ParseError> {
        let sections = collect_sections(raw, tier);

        for section in required_sections(tier) {
            match sections.get(section) {
                None => return Err(ParseError::MissingSection(section.label())),
                Some(text) if text.trim().is_empty() => {
                    return Err(ParseError::EmptySection(section.label()));
                }
                Some(_) => {}
            }
        }

        let mut suggestion = ParsedSuggestion::new(strip_quotes(&sections[&Section::Corrected]))
            .with_reasoning(section_text(&sections, Section::Reasoning))
            .with_explanation(section_text(&sections, Section::Explanation))
            .with_confidence(EXTRACTED_CONFIDENCE);
        if tier == IntelligenceTier::Deep {
            suggestion.analysis = sections.get(&Section::Analysis).cloned();
            suggestion.alternatives = sections
                .get(&Section::Alternatives)
                .map(|text| split_alternatives(text))
                .unwrap_or_default();
        }

        Ok(suggestion)
    }
}

fn required_sections(tier: IntelligenceTier) -> &'static [Section] {
    match tier {
        IntelligenceTier::Deep => &[
            Section::Corrected,
            Section::Reasoning,
            Section::Analysis,
            Section::Explanation,
        ],
        IntelligenceTier::Fast | IntelligenceTier::Standard => {
            &[Section::Corrected, Section::Reasoning, Section::Explanation]
        }
    }
}

/// Run the state machine. Alternatives keep one item per line; other
/// sections are space-joined. The first occurrence of a section wins.
fn collect_sections(raw: &str, tier: IntelligenceTier) -> HashMap<Section, String> {
    let mut sections = HashMap::new();
    let mut current: Option<Section> = None;
    let mut buffer: Vec<String> = Vec::new();

    for line in raw.lines() {
        if let Some((section, rest)) = match_label(line, tier) {
            flush(&mut sections, current, &mut buffer);
            current = Some(section);
            if !rest.is_empty() {
                buffer.push(rest.to_string());
            }
        } else if current.is_some() {
            let text = line.trim();
            if !text.is_empty() {
                buffer.push(text.to_string());
            }
        }
    }
    flush(&mut sections, current, &mut buffer);

    sections
}

fn flush(sections: &mut HashMap<Section, String>, current: Option<Section>, buffer: &mut Vec<String>) {
    let lines = std::mem::take(buffer);
    let Some(section) = current else {
        return;
    };

    let joined = if section == Section::Alternatives {
        lines.join("\n")
    } else {
        lines.join(" ")
    };
    sections.entry(section).or_insert(joined);
}

fn section_text(sections: &HashMap<Section, String>, section: Section) -> String {
    sections.get(&section).cloned().unwrap_or_default()
}

fn split_alternatives(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| BULLET.replace(line, "").trim().to_string())
        .map(|line| strip_quotes(&line).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Trim one pair of wrapping quotes (straight, curly, or backtick).
fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\''), ('`', '`')] {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    text
}

fn last_quoted(raw: &str) -> Option<&str> {
    QUOTED
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .filter(|s| !s.trim().is_empty())
        .last()
}
