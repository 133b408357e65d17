//! Redline: adaptive rewrite suggestions for flagged writing issues.
//!
//! A grammar or style checker flags a sentence and names the issue. Redline
//! grounds a prompt in per-issue guidance, sends it to a local generation
//! model sized to the difficulty of the issue, and returns a structured
//! rewrite. When the model is slow, unreachable or unhelpful, a deterministic
//! rule-based rewriter answers instead.
//!
//! # Core Principles
//!
//! - **Always answers**: a request never fails; degradations are recorded on the result
//! - **Never a no-op**: the corrected text always differs from the flagged sentence
//! - **Full provenance**: every suggestion says whether it came from the cache,
//!   the model, or the fallback rules
//!
//! # Example
//!
//! ```no_run
//! use redline::{FlaggedIssue, RedlineConfig, SuggestionOrchestrator};
//!
//! let orchestrator = SuggestionOrchestrator::from_config(&RedlineConfig::default()).unwrap();
//! let issue = FlaggedIssue::new("The report was written by the team.", "passive voice");
//!
//! let suggestion = orchestrator.suggest(&issue);
//! println!("{} ({})", suggestion.corrected_text, suggestion.method);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod issue;
pub mod knowledge;
pub mod llm;
pub mod orchestrator;
pub mod routing;
pub mod suggestion;

pub use cache::{CacheConfig, CacheKey, ResultCache};
pub use config::RedlineConfig;
pub use error::{RedlineError, Result};
pub use issue::{FlaggedIssue, IssueType, Severity};
pub use knowledge::{KnowledgeBase, KnowledgeEntry};
pub use llm::{GenerationClient, GenerationError, MockBackend, OllamaBackend};
pub use orchestrator::{BatchSummary, OrchestratorConfig, SuggestionOrchestrator};
pub use routing::{ComplexityClassifier, IntelligenceTier};
pub use suggestion::{Degradation, FallbackRewriter, Suggestion, SuggestionMethod, SuggestionStatus};
