//! Section label grammar shared by prompts and the response parser.
//!
//! Generated responses are a sequence of label-prefixed sections:
//!
//! ```text
//! response   := line*
//! line       := label_line | text_line
//! label_line := decoration* LABEL decoration* ":" text?
//! decoration := "*" | "#" | "_" | whitespace
//! LABEL      := CORRECTED | REASONING | EXPLANATION     (every tier)
//!             | ANALYSIS | ALTERNATIVES                 (deep tier only)
//! ```
//!
//! Labels match case-insensitively. The prompt builder renders the format
//! block from this module, so prompts and parser cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::routing::IntelligenceTier;

/// A labeled section of a generated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Corrected,
    Reasoning,
    Analysis,
    Alternatives,
    Explanation,
}

const STANDARD_SECTIONS: &[Section] = &[Section::Corrected, Section::Reasoning, Section::Explanation];

const DEEP_SECTIONS: &[Section] = &[
    Section::Corrected,
    Section::Reasoning,
    Section::Analysis,
    Section::Alternatives,
    Section::Explanation,
];

impl Section {
    /// The line prefix, without the colon.
    pub const fn label(&self) -> &'static str {
        match self {
            Section::Corrected => "CORRECTED",
            Section::Reasoning => "REASONING",
            Section::Analysis => "ANALYSIS",
            Section::Alternatives => "ALTERNATIVES",
            Section::Explanation => "EXPLANATION",
        }
    }

    /// Sections requested from (and recognized for) a tier, in prompt order.
    pub fn for_tier(tier: IntelligenceTier) -> &'static [Section] {
        match tier {
            IntelligenceTier::Deep => DEEP_SECTIONS,
            IntelligenceTier::Fast | IntelligenceTier::Standard => STANDARD_SECTIONS,
        }
    }

    /// Placeholder text shown after the label in the prompt's format block.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Section::Corrected => "<the rewritten sentence, nothing else>",
            Section::Reasoning => "<one sentence on what changed and why>",
            Section::Analysis => "<how the issue affects clarity, tone, and flow>",
            Section::Alternatives => "<one alternative rewrite per line>",
            Section::Explanation => "<one or two sentences addressed to the writer>",
        }
    }
}

/// Characters that may decorate a label line (markdown bold, headings).
fn is_decoration(c: char) -> bool {
    c == '*' || c == '#' || c == '_' || c.is_whitespace()
}

/// Recognize a label line for the given tier.
///
/// Returns the section and the text following the colon.
pub fn match_label(line: &str, tier: IntelligenceTier) -> Option<(Section, &str)> {
    let stripped = line.trim_start_matches(is_decoration);
    let colon = stripped.find(':')?;
    let candidate = stripped[..colon].trim_end_matches(is_decoration);

    let section = Section::for_tier(tier)
        .iter()
        .copied()
        .find(|s| candidate.eq_ignore_ascii_case(s.label()))?;

    let rest = stripped[colon + 1..].trim_start_matches(is_decoration).trim_end();
    Some((section, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_plain_label() {
        assert_eq!(
            match_label("CORRECTED: The team wrote it.", IntelligenceTier::Fast),
            Some((Section::Corrected, "The team wrote it."))
        );
    }

    #[test]
    fn test_match_decorated_label() {
        assert_eq!(
            match_label("**Reasoning:** Active voice names the actor.", IntelligenceTier::Standard),
            Some((Section::Reasoning, "Active voice names the actor."))
        );
        assert_eq!(
            match_label("## EXPLANATION:", IntelligenceTier::Standard),
            Some((Section::Explanation, ""))
        );
    }

    #[test]
    fn test_deep_only_labels() {
        assert_eq!(match_label("ANALYSIS: x", IntelligenceTier::Standard), None);
        assert_eq!(
            match_label("ANALYSIS: x", IntelligenceTier::Deep),
            Some((Section::Analysis, "x"))
        );
    }

    #[test]
    fn test_non_labels() {
        assert_eq!(match_label("The ratio is 3:1.", IntelligenceTier::Deep), None);
        assert_eq!(match_label("Note: corrected below", IntelligenceTier::Deep), None);
        assert_eq!(match_label("", IntelligenceTier::Deep), None);
    }

    #[test]
    fn test_tier_sections() {
        assert_eq!(Section::for_tier(IntelligenceTier::Fast).len(), 3);
        assert_eq!(Section::for_tier(IntelligenceTier::Deep).len(), 5);
        assert_eq!(Section::for_tier(IntelligenceTier::Deep)[0], Section::Corrected);
    }
}
