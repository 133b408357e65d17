//! Text generation: prompts, backends, invocation and response parsing.
//!
//! The pipeline talks to a local generation service (Ollama) through the
//! [`GenerationBackend`] trait. [`GenerationClient`] adds per-request
//! deadlines and retries, [`PromptBuilder`] renders prompts, and
//! [`ResponseParser`] turns responses back into structured fields.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use redline::llm::{GenerationClient, GenerationRequest, OllamaBackend};
//! use redline::routing::IntelligenceTier;
//!
//! let client = GenerationClient::new(Arc::new(OllamaBackend::new()?))?;
//! let tier = IntelligenceTier::Fast;
//! let request = GenerationRequest::new(prompt, tier, client.timeout_for(tier));
//! let text = client.invoke(&request)?;
//! ```

mod backend;
mod client;
mod mock;
mod ollama;
mod parser;
mod prompts;
mod sections;

pub use backend::{GenerationBackend, GenerationCall, GenerationError, GenerationOptions};
pub use client::{GenerationClient, GenerationRequest, RetryPolicy};
pub use mock::MockBackend;
pub use ollama::{DEFAULT_HOST, OllamaBackend, OllamaEndpoint};
pub use parser::{
    EXTRACTED_CONFIDENCE, ParseError, ParsedResponse, ResponseFormat, ResponseParser,
    UNEXTRACTED_CONFIDENCE,
};
pub use prompts::{PromptBuilder, system_prompt};
pub use sections::{Section, match_label};
