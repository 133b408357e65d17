//! Intelligence tiers and the classifier that picks one per issue.

mod classifier;
mod tier;

pub use classifier::{ClassificationRule, ClassifierThresholds, ComplexityClassifier};
pub use tier::{IntelligenceTier, TierConfig, TierTable};
