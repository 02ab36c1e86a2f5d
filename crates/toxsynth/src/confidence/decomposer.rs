//! Classifies verdict trustworthiness along five independent dimensions and
//! reduces them to one level with a named limiting factor.

use serde::{Deserialize, Serialize};

use crate::evidence::{LARGE_EFFECT, MODERATE_EFFECT};
use crate::model::{EndpointStatistics, SIGNIFICANCE_ALPHA, STRONG_SIGNIFICANCE_ALPHA};
use crate::pattern::{Pattern, PatternResult};
use crate::verdict::Verdict;

/// Confidence level. Variant order is the ordinal order: `Low < Moderate < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Moderate,
    High,
}

impl ConfidenceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Moderate => "Moderate",
            ConfidenceLevel::High => "High",
        }
    }
}

/// The five confidence dimensions, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceDimension {
    StatisticalEvidence,
    BiologicalPlausibility,
    DoseResponseQuality,
    TrendValidity,
    TrendConcordance,
}

impl ConfidenceDimension {
    /// Every dimension in tie-break order.
    pub const ALL: [ConfidenceDimension; 5] = [
        ConfidenceDimension::StatisticalEvidence,
        ConfidenceDimension::BiologicalPlausibility,
        ConfidenceDimension::DoseResponseQuality,
        ConfidenceDimension::TrendValidity,
        ConfidenceDimension::TrendConcordance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceDimension::StatisticalEvidence => "statistical evidence",
            ConfidenceDimension::BiologicalPlausibility => "biological plausibility",
            ConfidenceDimension::DoseResponseQuality => "dose-response quality",
            ConfidenceDimension::TrendValidity => "trend validity",
            ConfidenceDimension::TrendConcordance => "trend concordance",
        }
    }
}

/// Level of one dimension with an optional rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionAssessment {
    pub level: ConfidenceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl DimensionAssessment {
    fn new(level: ConfidenceLevel, rationale: impl Into<String>) -> Self {
        Self {
            level,
            rationale: Some(rationale.into()),
        }
    }

    fn high() -> Self {
        Self {
            level: ConfidenceLevel::High,
            rationale: None,
        }
    }
}

/// How strongly a normalization issue confounds the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationConfound {
    Moderate,
    Severe,
}

/// Normalization caveat raised by the organ-weight tiering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationCaveat {
    pub confound: NormalizationConfound,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Significance judgements from two independently computed trend tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendConcordance {
    pub primary_significant: bool,
    pub alternative_significant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_test: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_test: Option<String>,
}

/// Caveats supplied by adjacent systems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceCaveats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<NormalizationCaveat>,
    /// Reason the trend test is unreliable for this data shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_unreliable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_concordance: Option<TrendConcordance>,
}

/// Confidence decomposition for one endpoint verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub statistical_evidence: DimensionAssessment,
    pub biological_plausibility: DimensionAssessment,
    pub dose_response_quality: DimensionAssessment,
    pub trend_validity: DimensionAssessment,
    pub trend_concordance: DimensionAssessment,
    /// Weakest dimension level.
    pub integrated: ConfidenceLevel,
    pub limiting_factor: ConfidenceDimension,
}

impl ConfidenceResult {
    pub fn dimension(&self, dimension: ConfidenceDimension) -> &DimensionAssessment {
        match dimension {
            ConfidenceDimension::StatisticalEvidence => &self.statistical_evidence,
            ConfidenceDimension::BiologicalPlausibility => &self.biological_plausibility,
            ConfidenceDimension::DoseResponseQuality => &self.dose_response_quality,
            ConfidenceDimension::TrendValidity => &self.trend_validity,
            ConfidenceDimension::TrendConcordance => &self.trend_concordance,
        }
    }

    /// Dimensions in tie-break order.
    pub fn dimensions(&self) -> impl Iterator<Item = (ConfidenceDimension, &DimensionAssessment)> {
        ConfidenceDimension::ALL
            .into_iter()
            .map(move |d| (d, self.dimension(d)))
    }
}

/// Decompose confidence in an endpoint's verdict.
pub fn decompose_confidence(
    stats: &EndpointStatistics,
    pattern: &PatternResult,
    verdict: &Verdict,
    caveats: &ConfidenceCaveats,
) -> ConfidenceResult {
    let statistical_evidence = statistical_evidence(stats, verdict);
    let biological_plausibility = match &caveats.normalization {
        Some(caveat) => {
            let level = match caveat.confound {
                NormalizationConfound::Severe => ConfidenceLevel::Low,
                NormalizationConfound::Moderate => ConfidenceLevel::Moderate,
            };
            DimensionAssessment::new(
                level,
                caveat
                    .note
                    .clone()
                    .unwrap_or_else(|| "normalization confound flagged".to_string()),
            )
        }
        None => DimensionAssessment::high(),
    };
    let dose_response_quality = dose_response_quality(pattern);
    let trend_validity = match &caveats.trend_unreliable {
        Some(reason) => DimensionAssessment::new(ConfidenceLevel::Low, reason.clone()),
        None => DimensionAssessment::high(),
    };
    let trend_concordance = match &caveats.trend_concordance {
        Some(c) if c.primary_significant != c.alternative_significant => DimensionAssessment::new(
            ConfidenceLevel::Low,
            format!(
                "{} {} but {} {}",
                c.primary_test.as_deref().unwrap_or("primary trend test"),
                significance_word(c.primary_significant),
                c.alternative_test.as_deref().unwrap_or("alternative trend test"),
                significance_word(c.alternative_significant),
            ),
        ),
        _ => DimensionAssessment::high(),
    };

    let mut result = ConfidenceResult {
        statistical_evidence,
        biological_plausibility,
        dose_response_quality,
        trend_validity,
        trend_concordance,
        integrated: ConfidenceLevel::High,
        limiting_factor: ConfidenceDimension::StatisticalEvidence,
    };

    // First dimension in order holding the minimum.
    let (limiting, weakest) = result
        .dimensions()
        .map(|(d, a)| (d, a.level))
        .fold(None, |acc: Option<(ConfidenceDimension, ConfidenceLevel)>, (d, level)| match acc {
            Some((_, min)) if min <= level => acc,
            _ => Some((d, level)),
        })
        .unwrap_or((ConfidenceDimension::StatisticalEvidence, ConfidenceLevel::High));

    result.integrated = weakest;
    result.limiting_factor = limiting;
    result
}

fn significance_word(significant: bool) -> &'static str {
    if significant {
        "significant"
    } else {
        "not significant"
    }
}

fn statistical_evidence(stats: &EndpointStatistics, verdict: &Verdict) -> DimensionAssessment {
    let min_p = stats.min_effective_p();
    let max_effect = stats
        .treated()
        .filter_map(|r| r.effect_size)
        .map(f64::abs)
        .filter(|e| e.is_finite())
        .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.max(e))));

    let strong_p = min_p.is_some_and(|p| p < STRONG_SIGNIFICANCE_ALPHA);
    let significant = min_p.is_some_and(|p| p < SIGNIFICANCE_ALPHA);
    let large = max_effect.is_some_and(|e| e >= LARGE_EFFECT);
    let moderate = max_effect.is_some_and(|e| e >= MODERATE_EFFECT);

    let level = if strong_p || (significant && large) {
        ConfidenceLevel::High
    } else if significant || moderate {
        ConfidenceLevel::Moderate
    } else {
        ConfidenceLevel::Low
    };

    let mut parts = Vec::new();
    match min_p {
        Some(p) => parts.push(format!("min p = {:.3}", p)),
        None => parts.push("no pairwise comparisons".to_string()),
    }
    if let Some(e) = max_effect {
        parts.push(format!("|effect| = {:.2}", e));
    }
    if let Some(source) = verdict.override_source() {
        parts.push(format!("severity set by clinical rule {}", source.rule_name));
    }

    DimensionAssessment::new(level, parts.join(", "))
}

fn dose_response_quality(pattern: &PatternResult) -> DimensionAssessment {
    let level = match pattern.pattern {
        Pattern::MonotonicIncrease | Pattern::MonotonicDecrease => ConfidenceLevel::High,
        Pattern::Threshold | Pattern::Flat => ConfidenceLevel::Moderate,
        Pattern::NonMonotonic | Pattern::InsufficientData => ConfidenceLevel::Low,
    };
    DimensionAssessment::new(level, pattern.pattern.label())
}
