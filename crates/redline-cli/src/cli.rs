//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Redline: rewrite suggestions for flagged writing issues
#[derive(Parser)]
#[command(name = "redline")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate suggestions for a file of flagged issues
    Suggest {
        /// JSON array of flagged issues
        #[arg(value_name = "ISSUES")]
        issues: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Knowledge base file (default: built-in)
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Cache file (overrides the configured path)
        #[arg(long, conflicts_with = "no_cache")]
        cache: Option<PathBuf>,

        /// Keep the cache in memory only
        #[arg(long)]
        no_cache: bool,

        /// Use the offline mock backend instead of Ollama
        #[arg(long)]
        mock: bool,

        /// Ollama endpoint: generate or chat
        #[arg(long)]
        endpoint: Option<EndpointChoice>,

        /// Ollama host URL (overrides config and OLLAMA_HOST)
        #[arg(long)]
        model_host: Option<String>,

        /// Worker threads for the batch
        #[arg(short, long)]
        workers: Option<usize>,

        /// Write suggestions as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print JSON instead of the terminal report
        #[arg(long)]
        json: bool,
    },

    /// Show the tier chosen for each issue and why
    Classify {
        /// JSON array of flagged issues
        #[arg(value_name = "ISSUES")]
        issues: PathBuf,

        /// Knowledge base file (default: built-in)
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the prompt for one issue
    Prompt {
        /// JSON array of flagged issues
        #[arg(value_name = "ISSUES")]
        issues: PathBuf,

        /// Zero-based index of the issue
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// Knowledge base file (default: built-in)
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Validate and list a knowledge base
    Kb {
        /// Knowledge base file (default: built-in)
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Inspect or clear a result cache
    Cache {
        #[arg(value_name = "ACTION")]
        action: CacheAction,

        /// Cache file
        #[arg(long, value_name = "PATH")]
        cache: PathBuf,
    },
}

#[derive(Clone, Copy, Debug)]
pub enum CacheAction {
    Stats,
    Clear,
}

impl std::str::FromStr for CacheAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stats" => Ok(CacheAction::Stats),
            "clear" => Ok(CacheAction::Clear),
            _ => Err(format!("Unknown cache action: {}. Use stats or clear.", s)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum EndpointChoice {
    Generate,
    Chat,
}

impl std::str::FromStr for EndpointChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generate" => Ok(EndpointChoice::Generate),
            "chat" => Ok(EndpointChoice::Chat),
            _ => Err(format!("Unknown endpoint: {}. Use generate or chat.", s)),
        }
    }
}

impl From<EndpointChoice> for redline::llm::OllamaEndpoint {
    fn from(choice: EndpointChoice) -> Self {
        match choice {
            EndpointChoice::Generate => redline::llm::OllamaEndpoint::Generate,
            EndpointChoice::Chat => redline::llm::OllamaEndpoint::Chat,
        }
    }
}
