//! Classify command - show the tier chosen for each issue.

use std::path::PathBuf;

use colored::Colorize;
use redline::{ComplexityClassifier, FlaggedIssue, IntelligenceTier, KnowledgeEntry};

use super::load_knowledge_base;

pub fn run(issues: PathBuf, kb: Option<PathBuf>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let knowledge = load_knowledge_base(kb.as_deref())?;
    let issues = FlaggedIssue::load_all(&issues)?;
    let classifier = ComplexityClassifier::new();

    let rows: Vec<_> = issues
        .iter()
        .map(|issue| {
            let entry = knowledge
                .get(&issue.issue_type)
                .cloned()
                .unwrap_or_else(|| KnowledgeEntry::empty(issue.issue_type.clone()));
            let (tier, rule) = classifier.classify_with_rule(issue, &entry);
            (issue, tier, rule, knowledge.get(&issue.issue_type).is_some())
        })
        .collect();

    if json {
        let out: Vec<_> = rows
            .iter()
            .map(|(issue, tier, rule, known)| {
                serde_json::json!({
                    "sentence": issue.sentence,
                    "issue_type": issue.issue_type,
                    "tier": tier,
                    "rule": rule,
                    "known_issue_type": known,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (i, (issue, tier, rule, known)) in rows.iter().enumerate() {
        let tier_label = match tier {
            IntelligenceTier::Fast => tier.label().green(),
            IntelligenceTier::Standard => tier.label().blue(),
            IntelligenceTier::Deep => tier.label().magenta(),
        };
        let unknown = if *known { String::new() } else { " (no knowledge entry)".red().to_string() };

        println!(
            "{:>3}  {:8}  {:26}  {}{}",
            i + 1,
            tier_label,
            rule.describe(),
            issue.issue_type.to_string().cyan(),
            unknown
        );
    }

    Ok(())
}
