//! Suggest command - run the pipeline over a file of flagged issues.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use redline::llm::OllamaEndpoint;
use redline::{
    BatchSummary, FlaggedIssue, MockBackend, RedlineConfig, Suggestion, SuggestionMethod,
    SuggestionOrchestrator,
};

pub struct SuggestArgs {
    pub issues: PathBuf,
    pub config: Option<PathBuf>,
    pub kb: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub no_cache: bool,
    pub mock: bool,
    pub endpoint: Option<OllamaEndpoint>,
    pub model_host: Option<String>,
    pub workers: Option<usize>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub verbose: bool,
}

pub fn run(args: SuggestArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.issues.exists() {
        return Err(format!("File not found: {}", args.issues.display()).into());
    }

    let mut config = match &args.config {
        Some(path) => RedlineConfig::load(path)?,
        None => {
            let mut config = RedlineConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    // CLI flags win over file and environment.
    if let Some(kb) = args.kb {
        config.knowledge_base = Some(kb);
    }
    if args.no_cache {
        config.cache.path = None;
    } else if let Some(cache) = args.cache {
        config.cache.path = Some(cache);
    }
    if let Some(endpoint) = args.endpoint {
        config.ollama.endpoint = endpoint;
    }
    if let Some(host) = args.model_host {
        config.ollama.host = Some(host);
    }
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
    config.validate()?;

    let issues = FlaggedIssue::load_all(&args.issues)?;

    let orchestrator = if args.mock {
        SuggestionOrchestrator::from_config_with_backend(&config, Arc::new(MockBackend::new()))?
    } else {
        SuggestionOrchestrator::from_config(&config)?
    };

    if !args.json {
        println!(
            "{} {} issues from {} ({})",
            "Suggesting".cyan().bold(),
            issues.len(),
            args.issues.display().to_string().white(),
            orchestrator.client().backend_name()
        );
        println!();
    }

    let suggestions = orchestrator.suggest_all(&issues);
    orchestrator.flush_cache();
    let summary = BatchSummary::from_suggestions(&suggestions);

    if let Some(output) = &args.output {
        let file = File::create(output)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &suggestions)?;
    }

    if args.json {
        let report = serde_json::json!({
            "summary": summary,
            "suggestions": suggestions,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (i, suggestion) in suggestions.iter().enumerate() {
        print_suggestion(i, suggestion, args.verbose);
    }

    println!("{}", "Summary:".yellow().bold());
    println!("  Total:     {}", summary.total.to_string().white());
    println!("  Succeeded: {}", summary.succeeded.to_string().green());
    println!("  Degraded:  {}", summary.degraded.to_string().yellow());
    for method in [SuggestionMethod::Generated, SuggestionMethod::Cache, SuggestionMethod::Fallback] {
        let count = summary.by_method.get(method.label()).copied().unwrap_or(0);
        if count > 0 {
            println!("  {:10} {}", format!("{}:", method.label()), count);
        }
    }

    if let Some(output) = &args.output {
        println!();
        println!("Suggestions saved to: {}", output.display().to_string().white());
    }

    Ok(())
}

fn print_suggestion(index: usize, suggestion: &Suggestion, verbose: bool) {
    let method = match suggestion.method {
        SuggestionMethod::Generated => suggestion.method.label().green(),
        SuggestionMethod::Cache => suggestion.method.label().blue(),
        SuggestionMethod::Fallback => suggestion.method.label().yellow(),
    };
    let tier = suggestion
        .tier
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{} {} [{} | {} | {:.2}]",
        format!("#{}", index + 1).white().bold(),
        suggestion.issue_type.to_string().cyan(),
        method,
        tier,
        suggestion.confidence
    );
    println!("  {} {}", "-".red(), suggestion.original);
    println!("  {} {}", "+".green(), suggestion.corrected_text);

    if verbose {
        if !suggestion.reasoning.is_empty() {
            println!("  Reasoning: {}", suggestion.reasoning.dimmed());
        }
        if !suggestion.explanation.is_empty() {
            println!("  Explanation: {}", suggestion.explanation.dimmed());
        }
        for alt in &suggestion.alternatives {
            println!("  Alternative: {}", alt.dimmed());
        }
    }

    for degradation in &suggestion.degradations {
        println!("  {} {:?}", "!".yellow(), degradation);
    }
    println!();
}
