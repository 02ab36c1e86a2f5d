//! Dose-response pattern classification.

mod classifier;

pub use classifier::{classify_pattern, Pattern, PatternClassifier, PatternConfig, PatternResult};
