//! The suggestion pipeline and its public entry points.
//!
//! Every request runs
//! `cache → retrieve → classify → prompt → generate → parse → (fallback) → store`
//! and always ends in a [`Suggestion`]. Failures along the way are recorded
//! as [`Degradation`]s, logged, and recovered from with the deterministic
//! [`FallbackRewriter`].

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::config::RedlineConfig;
use crate::error::Result;
use crate::issue::FlaggedIssue;
use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::llm::{
    GenerationBackend, GenerationClient, GenerationError, GenerationRequest, OllamaBackend, PromptBuilder,
    ResponseFormat, ResponseParser,
};
use crate::routing::{ClassificationRule, ComplexityClassifier, IntelligenceTier};
use crate::suggestion::{
    Degradation, FallbackRewriter, ParsedSuggestion, Suggestion, SuggestionMethod, SuggestionStatus,
};

/// Confidence of a fallback produced by a matching rewrite rule.
pub const RULE_FALLBACK_CONFIDENCE: f64 = 0.4;

/// Confidence of the generic revision marker, and the cap on any
/// suggestion made without a knowledge base entry.
pub const MINIMAL_CONFIDENCE: f64 = 0.1;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Suggestions must score above this to count as a success.
    pub success_threshold: f64,
    /// Store fallback rewrites in the cache as well as generated ones.
    pub cache_fallback_results: bool,
    /// Threads used by `suggest_all`; 1 runs sequentially.
    pub workers: usize,
    /// Knowledge base examples embedded per prompt.
    pub max_examples: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            success_threshold: 0.5,
            cache_fallback_results: true,
            workers: 4,
            max_examples: 3,
        }
    }
}

/// Everything decided about an issue before generation.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub entry: KnowledgeEntry,
    pub retrieval_miss: bool,
    pub tier: IntelligenceTier,
    pub rule: ClassificationRule,
    pub prompt: String,
}

/// Counts over a batch of suggestions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub degraded: usize,
    pub by_method: HashMap<String, usize>,
    pub by_tier: HashMap<String, usize>,
}

impl BatchSummary {
    pub fn from_suggestions(suggestions: &[Suggestion]) -> Self {
        let mut summary = BatchSummary {
            total: suggestions.len(),
            ..Default::default()
        };

        for s in suggestions {
            if s.is_success() {
                summary.succeeded += 1;
            } else {
                summary.degraded += 1;
            }
            *summary.by_method.entry(s.method.label().to_string()).or_insert(0) += 1;
            if let Some(tier) = s.tier {
                *summary.by_tier.entry(tier.label().to_string()).or_insert(0) += 1;
            }
        }

        summary
    }
}

/// Produces suggestions for flagged issues.
pub struct SuggestionOrchestrator {
    config: OrchestratorConfig,
    knowledge: Arc<KnowledgeBase>,
    client: GenerationClient,
    cache: Arc<ResultCache>,
    classifier: ComplexityClassifier,
    prompts: PromptBuilder,
    parser: ResponseParser,
}

impl SuggestionOrchestrator {
    /// Create an orchestrator with default pipeline settings.
    pub fn new(knowledge: Arc<KnowledgeBase>, client: GenerationClient, cache: Arc<ResultCache>) -> Self {
        let config = OrchestratorConfig::default();
        Self {
            prompts: PromptBuilder::new().with_max_examples(config.max_examples),
            config,
            knowledge,
            client,
            cache,
            classifier: ComplexityClassifier::new(),
            parser: ResponseParser::new(),
        }
    }

    /// Build the whole pipeline from configuration, talking to Ollama.
    pub fn from_config(config: &RedlineConfig) -> Result<Self> {
        let backend = OllamaBackend::with_host(config.ollama.host.as_deref(), config.ollama.endpoint)?;
        info!(host = backend.host(), endpoint = ?backend.endpoint(), "using Ollama backend");
        Self::from_config_with_backend(config, Arc::new(backend))
    }

    /// Build the whole pipeline from configuration with a given backend.
    pub fn from_config_with_backend(
        config: &RedlineConfig,
        backend: Arc<dyn GenerationBackend>,
    ) -> Result<Self> {
        let knowledge = match &config.knowledge_base {
            Some(path) => KnowledgeBase::load(path)?,
            None => KnowledgeBase::builtin()?,
        };

        let client = GenerationClient::new(backend)?
            .with_tiers(config.tiers.clone())
            .with_retry(config.retry.clone());

        let cache = ResultCache::from_config(&config.cache);

        Ok(Self::new(Arc::new(knowledge), client, Arc::new(cache))
            .with_config(config.pipeline.clone())
            .with_classifier(ComplexityClassifier::with_thresholds(config.classifier)))
    }

    /// Replace the pipeline settings.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.prompts = PromptBuilder::new().with_max_examples(config.max_examples);
        self.config = config;
        self
    }

    /// Replace the classifier.
    pub fn with_classifier(mut self, classifier: ComplexityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// Retrieve, classify and render the prompt for an issue.
    pub fn plan(&self, issue: &FlaggedIssue) -> RequestPlan {
        let (entry, retrieval_miss) = match self.knowledge.get(&issue.issue_type) {
            Some(entry) => (entry.clone(), false),
            None => {
                warn!(issue_type = %issue.issue_type, "no knowledge base entry, using empty entry");
                (KnowledgeEntry::empty(issue.issue_type.clone()), true)
            }
        };

        let (tier, rule) = self.classifier.classify_with_rule(issue, &entry);
        debug!(issue_type = %issue.issue_type, tier = %tier, rule = rule.describe(), "classified issue");

        let prompt = self.prompts.build(issue, &entry, tier);

        RequestPlan {
            entry,
            retrieval_miss,
            tier,
            rule,
            prompt,
        }
    }

    /// Produce a suggestion for one issue. Never fails.
    ///
    /// Blocks the calling thread for the generation call. From async code use
    /// [`suggest_async`](Self::suggest_async) instead, which does not tie up
    /// a runtime worker.
    pub fn suggest(&self, issue: &FlaggedIssue) -> Suggestion {
        let key = CacheKey::for_issue(issue);
        if let Some(hit) = self.cached(issue, &key) {
            return hit;
        }

        let plan = self.plan(issue);
        let request = self.request_for(&plan);
        let outcome = self.client.invoke(&request);
        self.complete(issue, key, plan, outcome)
    }

    /// Async variant of [`suggest`](Self::suggest), driven by the caller's runtime.
    pub async fn suggest_async(&self, issue: &FlaggedIssue) -> Suggestion {
        let key = CacheKey::for_issue(issue);
        if let Some(hit) = self.cached(issue, &key) {
            return hit;
        }

        let plan = self.plan(issue);
        let request = self.request_for(&plan);
        let outcome = self.client.invoke_async(&request).await;
        self.complete(issue, key, plan, outcome)
    }

    /// Async batch variant of [`suggest_all`](Self::suggest_all).
    ///
    /// At most `workers` generation calls are in flight at once. Output order
    /// matches input order.
    pub async fn suggest_all_async(self: &Arc<Self>, issues: &[FlaggedIssue]) -> Vec<Suggestion> {
        let permits = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();

        for (index, issue) in issues.iter().cloned().enumerate() {
            let orchestrator = Arc::clone(self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                (index, orchestrator.suggest_async(&issue).await)
            });
        }

        let mut slots: Vec<Option<Suggestion>> = vec![None; issues.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, suggestion)) => slots[index] = Some(suggestion),
                Err(e) => warn!(error = %e, "suggestion task failed"),
            }
        }

        // A task only fails by panicking; answer its issue with the fallback.
        slots
            .into_iter()
            .zip(issues)
            .map(|(slot, issue)| slot.unwrap_or_else(|| self.fallback_only(issue)))
            .collect()
    }

    /// Produce suggestions for a batch, preserving input order.
    pub fn suggest_all(&self, issues: &[FlaggedIssue]) -> Vec<Suggestion> {
        if self.config.workers <= 1 || issues.len() <= 1 {
            return issues.iter().map(|issue| self.suggest(issue)).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("redline-worker-{}", i))
            .build()
        {
            Ok(pool) => pool.install(|| issues.par_iter().map(|issue| self.suggest(issue)).collect()),
            Err(e) => {
                warn!(error = %e, "failed to build worker pool, running sequentially");
                issues.iter().map(|issue| self.suggest(issue)).collect()
            }
        }
    }

    /// Persist pending cache writes.
    pub fn flush_cache(&self) {
        self.cache.flush();
    }

    fn status_for(&self, confidence: f64) -> SuggestionStatus {
        if confidence > self.config.success_threshold {
            SuggestionStatus::Success
        } else {
            SuggestionStatus::Degraded
        }
    }

    /// Serve a cache hit, ignoring cached no-op rewrites.
    fn cached(&self, issue: &FlaggedIssue, key: &CacheKey) -> Option<Suggestion> {
        let cached = self.cache.get(key)?;
        if !cached.changes(&issue.sentence) {
            warn!(key = %key, "ignoring cached no-op rewrite");
            return None;
        }

        debug!(key = %key, "cache hit");
        let status = self.status_for(cached.confidence);
        Some(Suggestion::from_parsed(issue, cached, SuggestionMethod::Cache, status))
    }

    fn request_for(&self, plan: &RequestPlan) -> GenerationRequest {
        GenerationRequest::new(&plan.prompt, plan.tier, self.client.timeout_for(plan.tier))
    }

    /// Everything after the generation call: parse, fall back, cap, store.
    fn complete(
        &self,
        issue: &FlaggedIssue,
        key: CacheKey,
        plan: RequestPlan,
        outcome: std::result::Result<String, GenerationError>,
    ) -> Suggestion {
        let mut degradations = Vec::new();
        if plan.retrieval_miss {
            degradations.push(Degradation::RetrievalMiss);
        }

        let generated = self.interpret(issue, &plan, outcome, &mut degradations);

        let (mut parsed, method) = match generated {
            Some(parsed) => (parsed, SuggestionMethod::Generated),
            None => (self.fallback(issue, &plan.entry), SuggestionMethod::Fallback),
        };

        if plan.retrieval_miss {
            parsed.confidence = parsed.confidence.min(MINIMAL_CONFIDENCE);
        }

        let status = if method == SuggestionMethod::Fallback {
            SuggestionStatus::Degraded
        } else {
            self.status_for(parsed.confidence)
        };

        if method == SuggestionMethod::Generated || self.config.cache_fallback_results {
            self.cache.put(key, parsed.clone());
        }

        debug!(
            issue_type = %issue.issue_type,
            method = %method,
            confidence = parsed.confidence,
            "suggestion ready"
        );

        Suggestion::from_parsed(issue, parsed, method, status)
            .with_tier(plan.tier)
            .with_degradations(degradations)
    }

    /// Parse a generation outcome. `None` means the fallback should be used.
    fn interpret(
        &self,
        issue: &FlaggedIssue,
        plan: &RequestPlan,
        outcome: std::result::Result<String, GenerationError>,
        degradations: &mut Vec<Degradation>,
    ) -> Option<ParsedSuggestion> {
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                warn!(issue_type = %issue.issue_type, tier = %plan.tier, error = %e, "generation unavailable");
                degradations.push(Degradation::GenerationUnavailable { reason: e.reason() });
                return None;
            }
        };

        let response = self.parser.parse(&raw, plan.tier, &issue.sentence);
        if response.format != ResponseFormat::Labeled {
            warn!(issue_type = %issue.issue_type, format = ?response.format, "malformed generation response");
            degradations.push(Degradation::MalformedResponse);
        }

        let parsed = response.suggestion;
        if parsed.is_usable(&issue.sentence, self.config.success_threshold) {
            return Some(parsed);
        }

        if response.format != ResponseFormat::Unrecognized {
            warn!(
                issue_type = %issue.issue_type,
                confidence = parsed.confidence,
                "generated rewrite rejected"
            );
            degradations.push(Degradation::LowConfidence {
                confidence: parsed.confidence,
            });
        }
        None
    }

    /// Rule-based answer without consulting the cache or the model.
    fn fallback_only(&self, issue: &FlaggedIssue) -> Suggestion {
        let entry = self
            .knowledge
            .get(&issue.issue_type)
            .cloned()
            .unwrap_or_else(|| KnowledgeEntry::empty(issue.issue_type.clone()));
        let parsed = self.fallback(issue, &entry);
        Suggestion::from_parsed(issue, parsed, SuggestionMethod::Fallback, SuggestionStatus::Degraded)
    }

    fn fallback(&self, issue: &FlaggedIssue, entry: &KnowledgeEntry) -> ParsedSuggestion {
        let rewrite = FallbackRewriter::rewrite_detailed(issue);

        let (confidence, reasoning) = match rewrite.rule {
            Some(rule) => (RULE_FALLBACK_CONFIDENCE, rule.describe().to_string()),
            None => (
                MINIMAL_CONFIDENCE,
                "No rewrite rule matched; the sentence is marked for manual revision.".to_string(),
            ),
        };

        let explanation = if entry.guidance.is_empty() {
            format!("Revise this sentence to address the {} issue.", issue.issue_type)
        } else {
            entry.guidance.clone()
        };

        info!(issue_type = %issue.issue_type, rule = ?rewrite.rule, "using fallback rewrite");

        ParsedSuggestion::new(rewrite.text)
            .with_reasoning(reasoning)
            .with_explanation(explanation)
            .with_confidence(confidence)
    }
}
