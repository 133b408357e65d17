//! Pipeline configuration loaded from TOML.
//!
//! Every section is optional; a tier table, when given, is given whole.
//! Resolution order (highest priority first):
//! 1. CLI flags (applied by the caller)
//! 2. `OLLAMA_HOST` for the generation host
//! 3. The TOML file passed to [`RedlineConfig::load`]
//! 4. Compiled defaults
//!
//! ```toml
//! knowledge_base = "kb.json"
//!
//! [ollama]
//! host = "http://localhost:11434"
//! endpoint = "chat"
//!
//! [tiers.deep]
//! model = "llama3.1:70b"
//! temperature = 0.4
//! top_p = 0.95
//! max_tokens = 1024
//! context_window = 8192
//! timeout_ms = 60000
//!
//! [cache]
//! path = ".redline/cache.json"
//! flush_every = 20
//!
//! [pipeline]
//! workers = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheConfig;
use crate::error::{RedlineError, Result};
use crate::llm::{OllamaEndpoint, RetryPolicy};
use crate::orchestrator::OrchestratorConfig;
use crate::routing::{ClassifierThresholds, TierTable};

/// Generation service location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Service URL; `None` means `OLLAMA_HOST` or the default host.
    pub host: Option<String>,
    pub endpoint: OllamaEndpoint,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedlineConfig {
    pub ollama: OllamaConfig,
    pub tiers: TierTable,
    pub classifier: ClassifierThresholds,
    pub cache: CacheConfig,
    pub pipeline: OrchestratorConfig,
    pub retry: RetryPolicy,
    /// Knowledge base file; the built-in base is used when unset.
    pub knowledge_base: Option<PathBuf>,
}

impl RedlineConfig {
    /// Load a TOML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| RedlineError::io(path, e))?;

        let mut config = Self::from_toml(&text)?;
        config.apply_env_overrides();
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate a TOML string. No environment overrides.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: RedlineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `OLLAMA_HOST` if set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_host_override(std::env::var("OLLAMA_HOST").ok());
    }

    fn apply_host_override(&mut self, host: Option<String>) {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.ollama.host = Some(host);
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.pipeline.success_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(RedlineError::Config(
                "pipeline.success_threshold must be in [0.0, 1.0)".to_string(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(RedlineError::Config(
                "cache.max_entries must be greater than 0".to_string(),
            ));
        }
        if self.cache.flush_every == 0 {
            return Err(RedlineError::Config(
                "cache.flush_every must be greater than 0".to_string(),
            ));
        }
        for tier in crate::routing::IntelligenceTier::ALL {
            let config = self.tiers.get(tier);
            if config.timeout_ms == 0 {
                return Err(RedlineError::Config(format!(
                    "tiers.{}.timeout_ms must be greater than 0",
                    tier
                )));
            }
            if config.model.trim().is_empty() {
                return Err(RedlineError::Config(format!("tiers.{}.model is empty", tier)));
            }
        }
        Ok(())
    }
}
