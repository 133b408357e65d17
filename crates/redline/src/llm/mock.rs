//! Mock generation backend for testing and offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::issue::FlaggedIssue;
use crate::suggestion::FallbackRewriter;

use super::backend::{GenerationBackend, GenerationCall, GenerationError};
use super::sections::Section;

enum Behavior {
    /// Rewrite the prompt's sentence with the rule table and answer in the
    /// labeled format.
    EchoRewrite,
    Fixed(String),
    Fail(GenerationError),
}

/// Backend that returns predictable responses.
pub struct MockBackend {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Create a mock that answers every prompt with a labeled rewrite.
    pub fn new() -> Self {
        Self::from_behavior(Behavior::EchoRewrite)
    }

    /// Create a mock that always returns `text`.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self::from_behavior(Behavior::Fixed(text.into()))
    }

    /// Create a mock that always fails with `error`.
    pub fn failing(error: GenerationError) -> Self {
        Self::from_behavior(Behavior::Fail(error))
    }

    /// Create a mock that behaves like a stopped service.
    pub fn unavailable() -> Self {
        Self::failing(GenerationError::Connect("connection refused".to_string()))
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn from_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, call: &GenerationCall) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::EchoRewrite => Ok(echo_rewrite(&call.prompt)),
            Behavior::Fixed(text) => Ok(text.clone()),
            Behavior::Fail(err) => Err(err.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Build a labeled response for the sentence embedded in a prompt.
fn echo_rewrite(prompt: &str) -> String {
    let issue_type = prompt
        .lines()
        .find_map(|line| line.strip_prefix("- Type: "))
        .unwrap_or("")
        .trim();

    // The sentence runs until the next heading and may span lines.
    let quoted = prompt
        .lines()
        .skip_while(|line| line.trim() != "## Sentence")
        .skip(1)
        .take_while(|line| !line.starts_with("##"))
        .collect::<Vec<_>>()
        .join("\n");
    let quoted = quoted.trim();
    let sentence = quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(quoted);

    let issue = FlaggedIssue::new(sentence, issue_type);
    let rewrite = FallbackRewriter::rewrite_detailed(&issue);
    let reasoning = rewrite
        .rule
        .map(|r| r.describe())
        .unwrap_or("Marked the sentence for manual revision.");

    let mut response = format!(
        "{}: {}\n{}: {}\n",
        Section::Corrected.label(),
        rewrite.text.replace('\n', " "),
        Section::Reasoning.label(),
        reasoning
    );

    if prompt.contains(&format!("{}:", Section::Analysis.label())) {
        response.push_str(&format!(
            "{}: The {} issue makes the sentence harder to read.\n{}:\n- {}\n",
            Section::Analysis.label(),
            issue.issue_type,
            Section::Alternatives.label(),
            rewrite.text
        ));
    }

    response.push_str(&format!(
        "{}: This rewrite addresses the {} issue.",
        Section::Explanation.label(),
        issue.issue_type
    ));
    response
}
