//! Prompt command - render the prompt for one issue.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use redline::llm::{GenerationClient, system_prompt};
use redline::{FlaggedIssue, MockBackend, ResultCache, SuggestionOrchestrator};

use super::load_knowledge_base;

pub fn run(issues: PathBuf, index: usize, kb: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let knowledge = load_knowledge_base(kb.as_deref())?;
    let issues = FlaggedIssue::load_all(&issues)?;

    let issue = issues.get(index).ok_or_else(|| {
        format!("Issue index {} out of range ({} issues)", index, issues.len())
    })?;

    // Planning never calls the backend.
    let orchestrator = SuggestionOrchestrator::new(
        Arc::new(knowledge),
        GenerationClient::new(Arc::new(MockBackend::new()))?,
        Arc::new(ResultCache::in_memory()),
    );
    let plan = orchestrator.plan(issue);

    println!(
        "{} {} ({})",
        "Tier:".yellow().bold(),
        plan.tier.label().white(),
        plan.rule.describe()
    );
    if plan.retrieval_miss {
        println!("{}", "No knowledge base entry for this issue type".red());
    }
    println!();
    println!("{}", "System:".yellow().bold());
    println!("{}", system_prompt());
    println!();
    println!("{}", "Prompt:".yellow().bold());
    println!("{}", plan.prompt);

    Ok(())
}
