//! Normalized per-endpoint signal score.
//!
//! The score is a weighted sum of bucketed terms divided by the largest
//! attainable sum, so it always lies in [0, 1]. Only the bucket break-points
//! are fixed; the weights are configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::model::{DoseGroupStatRow, EndpointStatistics, SIGNIFICANCE_ALPHA, STRONG_SIGNIFICANCE_ALPHA};

/// Absolute effect size counted as large.
pub const LARGE_EFFECT: f64 = 0.8;

/// Absolute effect size counted as moderate.
pub const MODERATE_EFFECT: f64 = 0.5;

/// Weights for each term of the signal score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    /// Pairwise p < 0.01.
    pub strong_significance: f64,
    /// Pairwise p < 0.05.
    pub significance: f64,
    /// |effect| >= 0.8.
    pub large_effect: f64,
    /// |effect| >= 0.5.
    pub moderate_effect: f64,
    /// Trend p < 0.05.
    pub trend: f64,
    /// Upstream judged the finding treatment-related.
    pub treatment_related: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            strong_significance: 0.35,
            significance: 0.20,
            large_effect: 0.30,
            moderate_effect: 0.15,
            trend: 0.15,
            treatment_related: 0.20,
        }
    }
}

impl SignalWeights {
    /// Reject weights that break the score's range or monotonicity.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("strong_significance", self.strong_significance),
            ("significance", self.significance),
            ("large_effect", self.large_effect),
            ("moderate_effect", self.moderate_effect),
            ("trend", self.trend),
            ("treatment_related", self.treatment_related),
        ];
        for (name, weight) in all {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SynthError::Config(format!(
                    "signal weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if self.strong_significance < self.significance {
            return Err(SynthError::Config(
                "strong_significance weight must be >= significance weight".to_string(),
            ));
        }
        if self.large_effect < self.moderate_effect {
            return Err(SynthError::Config(
                "large_effect weight must be >= moderate_effect weight".to_string(),
            ));
        }
        if self.max_score() <= 0.0 {
            return Err(SynthError::Config(
                "signal weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Largest attainable raw sum.
    pub fn max_score(&self) -> f64 {
        self.strong_significance.max(self.significance)
            + self.large_effect.max(self.moderate_effect)
            + self.trend
            + self.treatment_related
    }
}

/// Inputs for scoring one dose group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalInput {
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub trend_p: Option<f64>,
    pub treatment_related: bool,
}

impl SignalInput {
    /// Inputs for one dose group of an endpoint.
    pub fn from_row(row: &DoseGroupStatRow, trend_p: Option<f64>, treatment_related: bool) -> Self {
        Self {
            p_value: row.effective_p(),
            effect_size: row.effect_size,
            trend_p,
            treatment_related,
        }
    }
}

/// Score one input with the given weights.
pub fn compute_signal_score(input: &SignalInput, weights: &SignalWeights) -> f64 {
    let max = weights.max_score();
    if max <= 0.0 {
        return 0.0;
    }

    let mut raw = 0.0;

    match input.p_value {
        Some(p) if p < STRONG_SIGNIFICANCE_ALPHA => raw += weights.strong_significance,
        Some(p) if p < SIGNIFICANCE_ALPHA => raw += weights.significance,
        _ => {}
    }

    let magnitude = input.effect_size.map(f64::abs).filter(|e| e.is_finite());
    match magnitude {
        Some(e) if e >= LARGE_EFFECT => raw += weights.large_effect,
        Some(e) if e >= MODERATE_EFFECT => raw += weights.moderate_effect,
        _ => {}
    }

    if input.trend_p.is_some_and(|p| p < SIGNIFICANCE_ALPHA) {
        raw += weights.trend;
    }
    if input.treatment_related {
        raw += weights.treatment_related;
    }

    (raw / max).clamp(0.0, 1.0)
}

/// Scores endpoints with a fixed set of weights.
#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    weights: SignalWeights,
}

impl SignalScorer {
    /// Create a scorer with default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with validated custom weights.
    pub fn with_weights(weights: SignalWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &SignalWeights {
        &self.weights
    }

    pub fn score(&self, input: &SignalInput) -> f64 {
        compute_signal_score(input, &self.weights)
    }

    /// Endpoint score: the best-scoring treated dose group. Recomputed on
    /// every call; callers that need reuse go through the synthesis cache.
    pub fn score_endpoint(&self, stats: &EndpointStatistics, treatment_related: bool) -> f64 {
        stats
            .treated()
            .map(|row| self.score(&SignalInput::from_row(row, stats.trend_p(), treatment_related)))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataType, Sex};

    fn input(p: Option<f64>, e: Option<f64>, trend: Option<f64>, tr: bool) -> SignalInput {
        SignalInput {
            p_value: p,
            effect_size: e,
            trend_p: trend,
            treatment_related: tr,
        }
    }

    #[test]
    fn test_full_signal_is_one() {
        let w = SignalWeights::default();
        let score = compute_signal_score(&input(Some(0.001), Some(-1.2), Some(0.001), true), &w);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_signal_is_zero() {
        let w = SignalWeights::default();
        assert_eq!(compute_signal_score(&SignalInput::default(), &w), 0.0);
        assert_eq!(compute_signal_score(&input(Some(0.3), Some(0.2), Some(0.5), false), &w), 0.0);
    }

    #[test]
    fn test_break_points() {
        let w = SignalWeights::default();
        let at = |p| compute_signal_score(&input(Some(p), None, None, false), &w);
        assert!(at(0.0099) > at(0.01));
        assert!(at(0.049) > at(0.05));
        assert_eq!(at(0.05), 0.0);

        let eff = |e| compute_signal_score(&input(None, Some(e), None, false), &w);
        assert!(eff(0.8) > eff(0.79));
        assert!(eff(0.5) > eff(0.49));
        assert_eq!(eff(-0.8), eff(0.8));
    }

    #[test]
    fn test_weights_validation() {
        assert!(SignalWeights::default().validate().is_ok());

        let negative = SignalWeights {
            trend: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let inverted = SignalWeights {
            strong_significance: 0.1,
            significance: 0.2,
            ..Default::default()
        };
        assert!(SignalScorer::with_weights(inverted).is_err());

        let zero = SignalWeights {
            strong_significance: 0.0,
            significance: 0.0,
            large_effect: 0.0,
            moderate_effect: 0.0,
            trend: 0.0,
            treatment_related: 0.0,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_endpoint_score_takes_best_row() {
        let stats = EndpointStatistics::builder("ALT", Sex::Male, DataType::Continuous)
            .with_trend_p(0.002)
            .row(DoseGroupStatRow::continuous(0, 10, 1.0, 0.1))
            .row(
                DoseGroupStatRow::continuous(1, 10, 1.0, 0.1)
                    .with_adjusted_p(0.5)
                    .with_effect_size(0.2),
            )
            .row(
                DoseGroupStatRow::continuous(2, 10, 2.0, 0.1)
                    .with_adjusted_p(0.004)
                    .with_effect_size(1.5),
            )
            .build()
            .unwrap();

        let scorer = SignalScorer::new();
        let best = scorer.score_endpoint(&stats, false);
        let expected = (0.35 + 0.30 + 0.15) / 1.0;
        assert!((best - expected).abs() < 1e-12);
        assert!(scorer.score_endpoint(&stats, true) > best);
    }
}
