//! Deadline and retry wrapper around a generation backend.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, warn};

use crate::error::{RedlineError, Result};
use crate::routing::{IntelligenceTier, TierTable};

use super::backend::{GenerationBackend, GenerationCall, GenerationError};
use super::prompts::system_prompt;

/// One prompt to send, bound to a tier and a deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub tier: IntelligenceTier,
    pub timeout_ms: u64,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, tier: IntelligenceTier, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            tier,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry settings for transient generation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 250,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self, deadline: Duration) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_delay_ms))
            .with_max_interval(Duration::from_millis(self.max_delay_ms))
            .with_multiplier(2.0)
            .with_randomization_factor(0.2)
            .with_max_elapsed_time(Some(deadline))
            .build()
    }
}

/// Invokes a backend under a per-request deadline.
///
/// The client owns a small tokio runtime so `invoke` can be called from
/// plain threads (including rayon workers). When the deadline elapses the
/// in-flight future is dropped, which aborts the HTTP request.
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    tiers: TierTable,
    retry: RetryPolicy,
    // Taken on drop so the runtime can shut down without blocking.
    runtime: Option<Runtime>,
}

impl GenerationClient {
    /// Create a client with default tiers and retry policy.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("redline-generation")
            .enable_all()
            .build()
            .map_err(|e| RedlineError::Config(format!("Failed to start async runtime: {}", e)))?;

        Ok(Self {
            backend,
            tiers: TierTable::default(),
            retry: RetryPolicy::default(),
            runtime: Some(runtime),
        })
    }

    /// Replace the tier table.
    pub fn with_tiers(mut self, tiers: TierTable) -> Self {
        self.tiers = tiers;
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Configured deadline for a tier.
    pub fn timeout_for(&self, tier: IntelligenceTier) -> Duration {
        self.tiers.get(tier).timeout()
    }

    /// Invoke the backend, blocking the calling thread until the response
    /// arrives or the deadline passes.
    ///
    /// Inside an async context the call is driven on a scoped helper thread,
    /// since a runtime cannot be entered from one of its own workers. Async
    /// callers should prefer [`invoke_async`](Self::invoke_async).
    pub fn invoke(&self, request: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        let Some(runtime) = &self.runtime else {
            return Err(GenerationError::Transport("generation runtime is shut down".to_string()));
        };

        if Handle::try_current().is_err() {
            return runtime.block_on(self.invoke_async(request));
        }

        std::thread::scope(|scope| {
            scope
                .spawn(|| runtime.block_on(self.invoke_async(request)))
                .join()
                .unwrap_or_else(|_| {
                    Err(GenerationError::Transport("generation thread panicked".to_string()))
                })
        })
    }

    /// Async variant of [`invoke`](Self::invoke).
    pub async fn invoke_async(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        let config = self.tiers.get(request.tier);
        let call = GenerationCall::from_tier(&request.prompt, system_prompt(), config);
        let deadline = request.timeout();

        debug!(
            backend = self.backend.name(),
            model = %call.model,
            tier = %request.tier,
            timeout_ms = request.timeout_ms,
            "invoking generation backend"
        );

        match tokio::time::timeout(deadline, self.call_with_retry(&call, deadline)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout {
                after_ms: request.timeout_ms,
            }),
        }
    }

    async fn call_with_retry(
        &self,
        call: &GenerationCall,
        deadline: Duration,
    ) -> std::result::Result<String, GenerationError> {
        let mut backoff = self.retry.backoff(deadline);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.backend.generate(call).await {
                Ok(text) if text.trim().is_empty() => return Err(GenerationError::EmptyResponse),
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt <= self.retry.max_retries => {
                    match backoff.next_backoff() {
                        Some(delay) => {
                            warn!(attempt, ?delay, error = %err, "retryable generation error");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Drop for GenerationClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockBackend;

    fn request(timeout_ms: u64) -> GenerationRequest {
        GenerationRequest::new(
            "Sentence: \"x\"",
            IntelligenceTier::Fast,
            Duration::from_millis(timeout_ms),
        )
    }

    #[test]
    fn test_invoke_returns_text() {
        let backend = Arc::new(MockBackend::with_response("CORRECTED: y"));
        let client = GenerationClient::new(backend.clone()).unwrap();

        assert_eq!(client.invoke(&request(1_000)).unwrap(), "CORRECTED: y");
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_deadline_elapses() {
        let backend = Arc::new(
            MockBackend::with_response("CORRECTED: y").with_delay(Duration::from_millis(500)),
        );
        let client = GenerationClient::new(backend).unwrap();

        let err = client.invoke(&request(20)).unwrap_err();
        assert_eq!(err, GenerationError::Timeout { after_ms: 20 });
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let backend = Arc::new(MockBackend::unavailable());
        let client = GenerationClient::new(backend.clone())
            .unwrap()
            .with_retry(RetryPolicy {
                max_retries: 2,
                initial_delay_ms: 1,
                max_delay_ms: 2,
            });

        assert!(matches!(
            client.invoke(&request(2_000)),
            Err(GenerationError::Connect(_))
        ));
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let backend = Arc::new(MockBackend::failing(GenerationError::ModelNotFound(
            "llama3.2:1b".to_string(),
        )));
        let client = GenerationClient::new(backend.clone()).unwrap();

        assert!(client.invoke(&request(1_000)).is_err());
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_blank_response_is_empty_error() {
        let backend = Arc::new(MockBackend::with_response("   \n"));
        let client = GenerationClient::new(backend).unwrap().with_retry(RetryPolicy::none());

        assert_eq!(
            client.invoke(&request(1_000)),
            Err(GenerationError::EmptyResponse)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_invoke_inside_runtime() {
        let client = GenerationClient::new(Arc::new(MockBackend::with_response("CORRECTED: y"))).unwrap();

        assert_eq!(client.invoke(&request(1_000)).unwrap(), "CORRECTED: y");
        assert_eq!(client.invoke_async(&request(1_000)).await.unwrap(), "CORRECTED: y");
        drop(client);
    }

    #[tokio::test]
    async fn test_blocking_invoke_inside_current_thread_runtime() {
        let client = GenerationClient::new(Arc::new(MockBackend::with_response("CORRECTED: y"))).unwrap();
        assert_eq!(client.invoke(&request(1_000)).unwrap(), "CORRECTED: y");
    }

    #[test]
    fn test_timeout_for_tier() {
        let client = GenerationClient::new(Arc::new(MockBackend::new())).unwrap();
        assert_eq!(client.timeout_for(IntelligenceTier::Deep), Duration::from_millis(25_000));
    }
}
