//! Labels the shape of an endpoint's response across ascending doses.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Direction, DoseGroupStatRow, DoseValue, EndpointStatistics};

/// Qualitative shape of a dose-response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    MonotonicIncrease,
    MonotonicDecrease,
    Threshold,
    NonMonotonic,
    Flat,
    InsufficientData,
}

impl Pattern {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Pattern::MonotonicIncrease => "Monotonic increase",
            Pattern::MonotonicDecrease => "Monotonic decrease",
            Pattern::Threshold => "Threshold",
            Pattern::NonMonotonic => "Non-monotonic",
            Pattern::Flat => "Flat",
            Pattern::InsufficientData => "Insufficient data",
        }
    }

    pub fn is_monotonic(&self) -> bool {
        matches!(self, Pattern::MonotonicIncrease | Pattern::MonotonicDecrease)
    }
}

/// Classification outcome for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub pattern: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Onset of a threshold-like response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_dose: Option<DoseValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_level: Option<u32>,
}

impl PatternResult {
    fn bare(pattern: Pattern) -> Self {
        Self {
            pattern,
            direction: None,
            onset_dose: None,
            onset_level: None,
        }
    }

    fn directed(pattern: Pattern, direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            ..Self::bare(pattern)
        }
    }
}

/// Tunables for pattern classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Minimum share of the total baseline-to-top change that the step into
    /// the onset dose must carry for the shape to count as a threshold.
    pub threshold_step_fraction: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            threshold_step_fraction: 0.5,
        }
    }
}

/// Classifies dose-response shapes.
pub struct PatternClassifier {
    config: PatternConfig,
}

impl PatternClassifier {
    /// Create a classifier with default settings.
    pub fn new() -> Self {
        Self::with_config(PatternConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Classify one endpoint. Total: every input maps to exactly one pattern.
    pub fn classify(&self, stats: &EndpointStatistics) -> PatternResult {
        let data_type = stats.data_type();
        let points: Vec<(&DoseGroupStatRow, f64)> = stats
            .treated()
            .filter_map(|row| row.response(data_type).map(|v| (row, v)))
            .collect();

        if points.len() < 2 {
            return PatternResult::bare(Pattern::InsufficientData);
        }
        if !stats.is_significant() {
            return PatternResult::bare(Pattern::Flat);
        }

        // Zero-sign steps (ties) are neither rises nor falls.
        let steps: Vec<Direction> = points
            .windows(2)
            .map(|w| Direction::of(w[1].1 - w[0].1))
            .collect();
        let rises = steps.contains(&Direction::Up);
        let falls = steps.contains(&Direction::Down);

        if rises && falls {
            return PatternResult::bare(Pattern::NonMonotonic);
        }

        let baseline = stats
            .control()
            .and_then(|c| c.response(data_type))
            .unwrap_or(points[0].1);
        let top = points[points.len() - 1].1;

        let direction = if rises {
            Direction::Up
        } else if falls {
            Direction::Down
        } else {
            Direction::of(top - baseline)
        };

        if direction == Direction::None {
            return PatternResult::bare(Pattern::Flat);
        }

        if let Some(onset_idx) = self.threshold_onset(&points, baseline, direction) {
            let onset_row = points[onset_idx].0;
            let onset_dose = stats.onset_dose().cloned().or_else(|| onset_row.dose());
            debug!(
                endpoint = %stats.key(),
                onset_level = onset_row.dose_level,
                "threshold pattern"
            );
            return PatternResult {
                onset_dose,
                onset_level: Some(onset_row.dose_level),
                ..PatternResult::directed(Pattern::Threshold, direction)
            };
        }

        match direction {
            Direction::Up => PatternResult::directed(Pattern::MonotonicIncrease, direction),
            _ => PatternResult::directed(Pattern::MonotonicDecrease, direction),
        }
    }

    /// Index of the onset dose when the response is a clear step: at least
    /// one non-significant treated dose below it, every dose from it upward
    /// significant and on the same side of baseline, and the step into it
    /// carrying enough of the total change.
    fn threshold_onset(
        &self,
        points: &[(&DoseGroupStatRow, f64)],
        baseline: f64,
        direction: Direction,
    ) -> Option<usize> {
        let onset_idx = points.iter().position(|(row, _)| row.is_significant())?;
        if onset_idx == 0 {
            return None;
        }

        let sustained = points[onset_idx..]
            .iter()
            .all(|(row, v)| row.is_significant() && Direction::of(v - baseline) == direction);
        if !sustained {
            return None;
        }

        let step = points[onset_idx].1 - points[onset_idx - 1].1;
        let total = points[points.len() - 1].1 - baseline;
        if total == 0.0 || Direction::of(step) != direction {
            return None;
        }

        (step / total >= self.config.threshold_step_fraction).then_some(onset_idx)
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with default settings.
pub fn classify_pattern(stats: &EndpointStatistics) -> PatternResult {
    PatternClassifier::new().classify(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataType, EndpointStatisticsSpec, Sex};

    fn continuous(means: &[f64], p_adj: &[f64]) -> EndpointStatistics {
        let mut spec = EndpointStatisticsSpec::new("EP", Sex::Male, DataType::Continuous)
            .row(DoseGroupStatRow::continuous(0, 10, means[0], 1.0).with_dose(0.0, "mg/kg"));
        for (i, (&m, &p)) in means[1..].iter().zip(p_adj).enumerate() {
            let level = i as u32 + 1;
            spec = spec.row(
                DoseGroupStatRow::continuous(level, 10, m, 1.0)
                    .with_dose(20.0 * 2f64.powi(i as i32), "mg/kg")
                    .with_adjusted_p(p),
            );
        }
        spec.build().unwrap()
    }

    #[test]
    fn test_threshold_step_at_top_dose() {
        let stats = continuous(&[10.0, 11.0, 12.0, 25.0], &[0.90, 0.60, 0.01]);
        let result = classify_pattern(&stats);

        assert_eq!(result.pattern, Pattern::Threshold);
        assert_eq!(result.direction, Some(Direction::Up));
        assert_eq!(result.onset_level, Some(3));
        assert_eq!(result.onset_dose, Some(DoseValue::new(80.0, "mg/kg")));
    }

    #[test]
    fn test_gradual_rise_is_monotonic() {
        let stats = continuous(&[10.0, 13.0, 16.0, 19.0], &[0.2, 0.04, 0.01]);
        assert_eq!(classify_pattern(&stats).pattern, Pattern::MonotonicIncrease);
    }

    #[test]
    fn test_monotonic_decrease() {
        let stats = continuous(&[10.0, 8.0, 6.0, 4.0], &[0.03, 0.01, 0.001]);
        let result = classify_pattern(&stats);
        assert_eq!(result.pattern, Pattern::MonotonicDecrease);
        assert_eq!(result.direction, Some(Direction::Down));
    }

    #[test]
    fn test_reversal_is_non_monotonic() {
        let stats = continuous(&[10.0, 15.0, 12.0, 18.0], &[0.01, 0.2, 0.001]);
        assert_eq!(classify_pattern(&stats).pattern, Pattern::NonMonotonic);
    }

    #[test]
    fn test_ties_are_not_reversals() {
        let stats = continuous(&[10.0, 14.0, 14.0, 17.0], &[0.01, 0.01, 0.001]);
        assert_eq!(classify_pattern(&stats).pattern, Pattern::MonotonicIncrease);
    }

    #[test]
    fn test_flat_without_significance() {
        let stats = continuous(&[10.0, 11.0, 9.0, 12.0], &[0.5, 0.7, 0.2]);
        assert_eq!(classify_pattern(&stats).pattern, Pattern::Flat);
    }

    #[test]
    fn test_insufficient_data() {
        let stats = continuous(&[10.0, 30.0], &[0.001]);
        assert_eq!(classify_pattern(&stats).pattern, Pattern::InsufficientData);
    }

    #[test]
    fn test_missing_means_count_as_unusable() {
        let stats = EndpointStatisticsSpec::new("EP", Sex::Female, DataType::Continuous)
            .row(DoseGroupStatRow::continuous(0, 10, 10.0, 1.0))
            .row(DoseGroupStatRow::continuous(1, 10, 20.0, 1.0).with_adjusted_p(0.01))
            .row(DoseGroupStatRow {
                mean: None,
                ..DoseGroupStatRow::continuous(2, 10, 0.0, 1.0).with_adjusted_p(0.01)
            })
            .build()
            .unwrap();
        assert_eq!(classify_pattern(&stats).pattern, Pattern::InsufficientData);
    }

    #[test]
    fn test_external_onset_preferred() {
        let stats = EndpointStatisticsSpec::new("EP", Sex::Male, DataType::Continuous)
            .with_onset_dose(DoseValue::new(55.0, "mg/kg"))
            .row(DoseGroupStatRow::continuous(0, 10, 10.0, 1.0))
            .row(DoseGroupStatRow::continuous(1, 10, 10.5, 1.0).with_adjusted_p(0.8))
            .row(DoseGroupStatRow::continuous(2, 10, 20.0, 1.0).with_adjusted_p(0.001))
            .build()
            .unwrap();
        let result = classify_pattern(&stats);
        assert_eq!(result.pattern, Pattern::Threshold);
        assert_eq!(result.onset_dose, Some(DoseValue::new(55.0, "mg/kg")));
    }

    #[test]
    fn test_categorical_threshold() {
        let stats = EndpointStatisticsSpec::new("Hepatocellular hypertrophy", Sex::Male, DataType::Categorical)
            .row(DoseGroupStatRow::categorical(0, 10, 0))
            .row(DoseGroupStatRow::categorical(1, 10, 1).with_p_value(0.90))
            .row(DoseGroupStatRow::categorical(2, 10, 7).with_p_value(0.003))
            .build()
            .unwrap();
        let result = classify_pattern(&stats);
        assert_eq!(result.pattern, Pattern::Threshold);
        assert_eq!(result.onset_level, Some(2));
    }
}
