//! Intelligence tiers and their static model configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How much generation effort to spend on an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntelligenceTier {
    /// Small model, short budget, minimal output.
    Fast,
    /// Default model and budget.
    Standard,
    /// Larger context window, slower model, multi-part output.
    Deep,
}

impl IntelligenceTier {
    /// All tiers, cheapest first.
    pub const ALL: [IntelligenceTier; 3] = [
        IntelligenceTier::Fast,
        IntelligenceTier::Standard,
        IntelligenceTier::Deep,
    ];

    /// Get a lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            IntelligenceTier::Fast => "fast",
            IntelligenceTier::Standard => "standard",
            IntelligenceTier::Deep => "deep",
        }
    }
}

impl fmt::Display for IntelligenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IntelligenceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(IntelligenceTier::Fast),
            "standard" | "normal" => Ok(IntelligenceTier::Standard),
            "deep" => Ok(IntelligenceTier::Deep),
            other => Err(format!(
                "Unknown tier: {}. Use fast, standard, or deep.",
                other
            )),
        }
    }
}

/// Model and generation options bound to one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Model identifier on the generation service (e.g., "llama3.2").
    pub model: String,

    /// Sampling temperature (0.0-1.0).
    pub temperature: f64,

    /// Nucleus sampling cutoff.
    pub top_p: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Context window requested from the service.
    pub context_window: u32,

    /// Deadline for one generation call, retries included.
    pub timeout_ms: u64,
}

impl TierConfig {
    /// Deadline as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn fast() -> Self {
        Self {
            model: "llama3.2:1b".to_string(),
            temperature: 0.2,
            top_p: 0.9,
            max_tokens: 256,
            context_window: 2048,
            timeout_ms: 10_000,
        }
    }

    fn standard() -> Self {
        Self {
            model: "llama3.2".to_string(),
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 512,
            context_window: 4096,
            timeout_ms: 15_000,
        }
    }

    fn deep() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            temperature: 0.4,
            top_p: 0.95,
            max_tokens: 1024,
            context_window: 8192,
            timeout_ms: 25_000,
        }
    }
}

/// Static tier → model mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(default = "TierConfig::fast")]
    pub fast: TierConfig,
    #[serde(default = "TierConfig::standard")]
    pub standard: TierConfig,
    #[serde(default = "TierConfig::deep")]
    pub deep: TierConfig,
}

impl TierTable {
    /// Configuration for a tier.
    pub fn get(&self, tier: IntelligenceTier) -> &TierConfig {
        match tier {
            IntelligenceTier::Fast => &self.fast,
            IntelligenceTier::Standard => &self.standard,
            IntelligenceTier::Deep => &self.deep,
        }
    }

    /// Mutable configuration for a tier.
    pub fn get_mut(&mut self, tier: IntelligenceTier) -> &mut TierConfig {
        match tier {
            IntelligenceTier::Fast => &mut self.fast,
            IntelligenceTier::Standard => &mut self.standard,
            IntelligenceTier::Deep => &mut self.deep,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            fast: TierConfig::fast(),
            standard: TierConfig::standard(),
            deep: TierConfig::deep(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets_grow_with_tier() {
        let table = TierTable::default();

        assert!(table.fast.timeout_ms < table.standard.timeout_ms);
        assert!(table.standard.timeout_ms < table.deep.timeout_ms);
        assert!(table.deep.context_window > table.standard.context_window);
        assert_eq!(table.get(IntelligenceTier::Deep).timeout(), Duration::from_secs(25));
    }

    #[test]
    fn test_partial_table_deserializes_with_defaults() {
        let table: TierTable = toml::from_str(
            r#"
            [deep]
            model = "qwen2.5:14b"
            temperature = 0.5
            top_p = 0.9
            max_tokens = 2048
            context_window = 16384
            timeout_ms = 30000
            "#,
        )
        .unwrap();

        assert_eq!(table.deep.model, "qwen2.5:14b");
        assert_eq!(table.fast, TierTable::default().fast);
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("Deep".parse::<IntelligenceTier>(), Ok(IntelligenceTier::Deep));
        assert!("turbo".parse::<IntelligenceTier>().is_err());
    }
}
