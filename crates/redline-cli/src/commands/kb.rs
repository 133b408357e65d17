//! Kb command - validate and list a knowledge base.

use std::path::PathBuf;

use colored::Colorize;

use super::load_knowledge_base;

pub fn run(kb: Option<PathBuf>, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let knowledge = load_knowledge_base(kb.as_deref())?;

    let source = kb
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    println!(
        "{} {} ({} entries, version {})",
        "Knowledge base".cyan().bold(),
        source.white(),
        knowledge.len(),
        knowledge.version().unwrap_or("unversioned")
    );
    println!();

    for entry in knowledge.entries() {
        println!(
            "  {:28} {:8} {} examples",
            entry.issue_type.to_string().white(),
            entry.declared_complexity.label(),
            entry.examples.len()
        );
        if verbose {
            println!("    {}", entry.guidance.dimmed());
            for example in &entry.examples {
                println!("    \"{}\" → \"{}\"", example.before, example.after);
            }
        }
    }

    Ok(())
}
