//! Prompt templates for generation requests.

use crate::issue::FlaggedIssue;
use crate::knowledge::KnowledgeEntry;
use crate::routing::IntelligenceTier;

use super::sections::Section;

/// Renders tier-specific prompts from an issue and its knowledge entry.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_examples: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self { max_examples: 3 }
    }
}

impl PromptBuilder {
    /// Create a builder that embeds up to 3 examples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of knowledge base examples to embed.
    pub fn with_max_examples(mut self, max_examples: usize) -> Self {
        self.max_examples = max_examples;
        self
    }

    /// Build the prompt for an issue at a tier.
    pub fn build(&self, issue: &FlaggedIssue, entry: &KnowledgeEntry, tier: IntelligenceTier) -> String {
        match tier {
            IntelligenceTier::Deep => self.deep_prompt(issue, entry),
            IntelligenceTier::Fast | IntelligenceTier::Standard => self.standard_prompt(issue, entry),
        }
    }

    fn standard_prompt(&self, issue: &FlaggedIssue, entry: &KnowledgeEntry) -> String {
        format!(
            r#"Rewrite this sentence to fix a writing issue.

## Issue
- Type: {}
- Severity: {}
- Guidance: {}

## Background
{}

## Examples
{}
{}
## Sentence
"{}"

## Task
Fix the {} issue while keeping the original meaning. Change only what the issue requires.

{}"#,
            issue.issue_type,
            issue.severity.label(),
            guidance_or_default(entry),
            text_or_none(&entry.detailed_context),
            self.examples_block(entry),
            context_block(issue),
            issue.sentence,
            issue.issue_type,
            format_block(IntelligenceTier::Standard)
        )
    }

    fn deep_prompt(&self, issue: &FlaggedIssue, entry: &KnowledgeEntry) -> String {
        format!(
            r#"Analyze this sentence for a writing issue and rewrite it.

## Issue
- Type: {}
- Severity: {}
- Guidance: {}

## Background
{}

## Examples
{}
{}
## Sentence
"{}"

## Task
1. Identify exactly where the {} issue occurs in the sentence
2. Consider how the surrounding context constrains word choice and terminology
3. Rewrite the sentence so the issue is gone and the meaning is unchanged
4. Offer up to two alternative rewrites with a different structure

{}"#,
            issue.issue_type,
            issue.severity.label(),
            guidance_or_default(entry),
            text_or_none(&entry.detailed_context),
            self.examples_block(entry),
            context_block(issue),
            issue.sentence,
            issue.issue_type,
            format_block(IntelligenceTier::Deep)
        )
    }

    fn examples_block(&self, entry: &KnowledgeEntry) -> String {
        if entry.examples.is_empty() || self.max_examples == 0 {
            return "None.".to_string();
        }

        entry
            .examples
            .iter()
            .take(self.max_examples)
            .map(|ex| format!("- \"{}\" → \"{}\"", ex.before, ex.after))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn guidance_or_default(entry: &KnowledgeEntry) -> &str {
    if entry.guidance.is_empty() {
        "No specific guidance available; use general editing judgment."
    } else {
        &entry.guidance
    }
}

fn text_or_none(text: &str) -> &str {
    if text.is_empty() { "None." } else { text }
}

fn context_block(issue: &FlaggedIssue) -> String {
    match issue.surrounding_context.as_deref().map(str::trim) {
        Some(context) if !context.is_empty() => {
            format!("\n## Surrounding Context\n{}\n", context)
        }
        _ => String::new(),
    }
}

/// The response format instructions for a tier.
fn format_block(tier: IntelligenceTier) -> String {
    let lines = Section::for_tier(tier)
        .iter()
        .map(|s| format!("{}: {}", s.label(), s.placeholder()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "## Response Format\nReply with exactly these labeled lines, in this order, and nothing else:\n{}",
        lines
    )
}

/// System prompt for all generation requests.
pub fn system_prompt() -> &'static str {
    r#"You are an experienced copy editor helping writers fix specific writing-quality issues.

Guidelines:
- Fix only the flagged issue; preserve the writer's meaning, facts, and terminology
- Keep the rewrite close to the original length unless the issue is length itself
- Never return the sentence unchanged
- Follow the requested response format exactly, one labeled line per section
- Do not add commentary outside the labeled sections"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::RewriteExample;

    fn entry() -> KnowledgeEntry {
        KnowledgeEntry::new(
            "passive voice",
            "Rewrite so the actor performs the action.",
            "Passive hides the actor.",
        )
        .with_examples(vec![
            RewriteExample::new("a1", "b1"),
            RewriteExample::new("a2", "b2"),
            RewriteExample::new("a3", "b3"),
            RewriteExample::new("a4", "b4"),
        ])
    }

    #[test]
    fn test_standard_prompt_contents() {
        let issue = FlaggedIssue::new("The report was written by the team.", "passive voice")
            .with_context("Quarterly summary.");

        let prompt = PromptBuilder::new().build(&issue, &entry(), IntelligenceTier::Standard);

        assert!(prompt.contains("\"The report was written by the team.\""));
        assert!(prompt.contains("passive voice"));
        assert!(prompt.contains("Rewrite so the actor performs the action."));
        assert!(prompt.contains("Passive hides the actor."));
        assert!(prompt.contains("Quarterly summary."));
        assert!(prompt.contains("CORRECTED:"));
        assert!(prompt.contains("REASONING:"));
        assert!(prompt.contains("EXPLANATION:"));
        assert!(!prompt.contains("ANALYSIS:"));
        assert!(!prompt.contains("ALTERNATIVES:"));
    }

    #[test]
    fn test_deep_prompt_requests_all_sections() {
        let issue = FlaggedIssue::new("The report was written by the team.", "passive voice");

        let prompt = PromptBuilder::new().build(&issue, &entry(), IntelligenceTier::Deep);

        for section in Section::for_tier(IntelligenceTier::Deep) {
            assert!(prompt.contains(&format!("{}:", section.label())));
        }
        assert!(!prompt.contains("Surrounding Context"));
    }

    #[test]
    fn test_examples_are_capped() {
        let issue = FlaggedIssue::new("x", "passive voice");

        let prompt = PromptBuilder::new().build(&issue, &entry(), IntelligenceTier::Fast);
        assert!(prompt.contains("\"a3\" → \"b3\""));
        assert!(!prompt.contains("\"a4\""));

        let none = PromptBuilder::new()
            .with_max_examples(0)
            .build(&issue, &entry(), IntelligenceTier::Fast);
        assert!(!none.contains("\"a1\""));
    }

    #[test]
    fn test_empty_entry_uses_defaults() {
        let issue = FlaggedIssue::new("x", "mystery");
        let empty = KnowledgeEntry::empty(issue.issue_type.clone());

        let prompt = PromptBuilder::new().build(&issue, &empty, IntelligenceTier::Fast);

        assert!(prompt.contains("No specific guidance available"));
        assert!(prompt.contains("## Examples\nNone."));
    }
}
