//! Per-endpoint dose-group statistics.
//!
//! `EndpointStatistics` is immutable once built and can only be built
//! through a validating constructor: dose levels must be unique and
//! ascending, the control group never carries a p-value, and every p-value
//! lies in [0, 1]. Violations indicate an upstream contract breach and are
//! rejected rather than silently repaired.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

use super::dose::DoseValue;
use super::types::{DataType, Direction, Sex, SIGNIFICANCE_ALPHA};

/// Observed statistics for one dose group of one endpoint/sex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseGroupStatRow {
    /// Ordinal dose level (0 = control).
    pub dose_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_unit: Option<String>,
    /// Number of animals in the group.
    pub n: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence: Option<f64>,
    /// Raw pairwise p-value against control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    /// Multiplicity-adjusted pairwise p-value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value_adj: Option<f64>,
    /// Standardized effect size against control (e.g. Hedges' g).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
}

impl DoseGroupStatRow {
    /// A continuous-data dose group.
    pub fn continuous(dose_level: u32, n: u32, mean: f64, sd: f64) -> Self {
        Self {
            dose_level,
            dose_value: None,
            dose_unit: None,
            n,
            mean: Some(mean),
            sd: Some(sd),
            affected: None,
            incidence: None,
            p_value: None,
            p_value_adj: None,
            effect_size: None,
        }
    }

    /// A categorical-data dose group. Incidence is derived from the counts.
    pub fn categorical(dose_level: u32, n: u32, affected: u32) -> Self {
        let incidence = if n > 0 {
            Some(affected as f64 / n as f64)
        } else {
            None
        };
        Self {
            dose_level,
            dose_value: None,
            dose_unit: None,
            n,
            mean: None,
            sd: None,
            affected: Some(affected),
            incidence,
            p_value: None,
            p_value_adj: None,
            effect_size: None,
        }
    }

    /// Set the administered dose.
    pub fn with_dose(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.dose_value = Some(value);
        self.dose_unit = Some(unit.into());
        self
    }

    /// Set the raw p-value.
    pub fn with_p_value(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    /// Set the adjusted p-value.
    pub fn with_adjusted_p(mut self, p: f64) -> Self {
        self.p_value_adj = Some(p);
        self
    }

    /// Set the effect size.
    pub fn with_effect_size(mut self, effect: f64) -> Self {
        self.effect_size = Some(effect);
        self
    }

    pub fn is_control(&self) -> bool {
        self.dose_level == 0
    }

    /// Adjusted p-value, falling back to the raw p-value.
    pub fn effective_p(&self) -> Option<f64> {
        self.p_value_adj.or(self.p_value)
    }

    /// Whether the pairwise comparison reaches `p < 0.05`.
    pub fn is_significant(&self) -> bool {
        self.effective_p().is_some_and(|p| p < SIGNIFICANCE_ALPHA)
    }

    /// The response value the dose-response walk compares: the mean for
    /// continuous data, the incidence for categorical data.
    pub fn response(&self, data_type: DataType) -> Option<f64> {
        let value = match data_type {
            DataType::Continuous => self.mean,
            DataType::Categorical => self.incidence.or_else(|| match self.affected {
                Some(affected) if self.n > 0 => Some(affected as f64 / self.n as f64),
                _ => None,
            }),
        };
        value.filter(|v| v.is_finite())
    }

    /// The administered dose, when both value and unit are known.
    pub fn dose(&self) -> Option<DoseValue> {
        match (self.dose_value, &self.dose_unit) {
            (Some(value), Some(unit)) => Some(DoseValue::new(value, unit.clone())),
            (Some(value), None) => Some(DoseValue::new(value, "")),
            _ => None,
        }
    }
}

/// Identity of a computation: endpoint label plus sex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointKey {
    pub label: String,
    pub sex: Sex,
}

impl EndpointKey {
    pub fn new(label: impl Into<String>, sex: Sex) -> Self {
        Self {
            label: label.into(),
            sex,
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.sex)
    }
}

/// Which subjects an endpoint's row set is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortFilter {
    /// Every dosed subject.
    #[default]
    AllSubjects,
    /// Excludes subjects that died before scheduled sacrifice.
    ScheduledOnly,
}

/// Unvalidated description of an endpoint's statistics.
///
/// Doubles as a builder; `build` validates it into [`EndpointStatistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointStatisticsSpec {
    pub label: String,
    pub sex: Sex,
    pub data_type: DataType,
    /// Data domain code (e.g. "LB", "MI", "OM").
    #[serde(default)]
    pub domain: String,
    /// Organ system the endpoint belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ: Option<String>,
    /// Canonical test code (e.g. "ALT").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Trend test p-value spanning all dose groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_p: Option<f64>,
    /// Onset dose from an external equivalence-band analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_dose: Option<DoseValue>,
    #[serde(default)]
    pub rows: Vec<DoseGroupStatRow>,
}

impl EndpointStatisticsSpec {
    pub fn new(label: impl Into<String>, sex: Sex, data_type: DataType) -> Self {
        Self {
            label: label.into(),
            sex,
            data_type,
            domain: String::new(),
            organ: None,
            test_code: None,
            unit: None,
            trend_p: None,
            onset_dose: None,
            rows: Vec::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_organ(mut self, organ: impl Into<String>) -> Self {
        self.organ = Some(organ.into());
        self
    }

    pub fn with_test_code(mut self, code: impl Into<String>) -> Self {
        self.test_code = Some(code.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_trend_p(mut self, p: f64) -> Self {
        self.trend_p = Some(p);
        self
    }

    pub fn with_onset_dose(mut self, onset: DoseValue) -> Self {
        self.onset_dose = Some(onset);
        self
    }

    /// Append a dose group row.
    pub fn row(mut self, row: DoseGroupStatRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Validate into immutable statistics.
    pub fn build(self) -> Result<EndpointStatistics> {
        EndpointStatistics::try_from(self)
    }
}

/// Validated, immutable statistics for one (endpoint, sex) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "EndpointStatisticsSpec",
    into = "EndpointStatisticsSpec"
)]
pub struct EndpointStatistics {
    key: EndpointKey,
    data_type: DataType,
    domain: String,
    organ: Option<String>,
    test_code: Option<String>,
    unit: Option<String>,
    trend_p: Option<f64>,
    onset_dose: Option<DoseValue>,
    rows: Vec<DoseGroupStatRow>,
}

impl TryFrom<EndpointStatisticsSpec> for EndpointStatistics {
    type Error = SynthError;

    fn try_from(spec: EndpointStatisticsSpec) -> Result<Self> {
        validate_rows(&spec.label, &spec.rows)?;
        if let Some(p) = spec.trend_p {
            if !is_valid_p(p) {
                return Err(SynthError::InvalidPValue {
                    endpoint: spec.label,
                    level: 0,
                    value: p,
                });
            }
        }

        Ok(Self {
            key: EndpointKey::new(spec.label, spec.sex),
            data_type: spec.data_type,
            domain: spec.domain,
            organ: spec.organ,
            test_code: spec.test_code,
            unit: spec.unit,
            trend_p: spec.trend_p,
            onset_dose: spec.onset_dose,
            rows: spec.rows,
        })
    }
}

impl From<EndpointStatistics> for EndpointStatisticsSpec {
    fn from(stats: EndpointStatistics) -> Self {
        Self {
            label: stats.key.label,
            sex: stats.key.sex,
            data_type: stats.data_type,
            domain: stats.domain,
            organ: stats.organ,
            test_code: stats.test_code,
            unit: stats.unit,
            trend_p: stats.trend_p,
            onset_dose: stats.onset_dose,
            rows: stats.rows,
        }
    }
}

fn is_valid_p(p: f64) -> bool {
    p.is_finite() && (0.0..=1.0).contains(&p)
}

fn validate_rows(endpoint: &str, rows: &[DoseGroupStatRow]) -> Result<()> {
    for window in rows.windows(2) {
        let (previous, next) = (window[0].dose_level, window[1].dose_level);
        if next == previous {
            return Err(SynthError::DuplicateDoseLevel {
                endpoint: endpoint.to_string(),
                level: next,
            });
        }
        if next < previous {
            return Err(SynthError::UnsortedDoseLevels {
                endpoint: endpoint.to_string(),
                previous,
                next,
            });
        }
    }

    for row in rows {
        if row.is_control() && (row.p_value.is_some() || row.p_value_adj.is_some()) {
            return Err(SynthError::ControlPValue {
                endpoint: endpoint.to_string(),
            });
        }
        for p in [row.p_value, row.p_value_adj].into_iter().flatten() {
            if !is_valid_p(p) {
                return Err(SynthError::InvalidPValue {
                    endpoint: endpoint.to_string(),
                    level: row.dose_level,
                    value: p,
                });
            }
        }
    }

    Ok(())
}

impl EndpointStatistics {
    /// Start describing an endpoint.
    pub fn builder(label: impl Into<String>, sex: Sex, data_type: DataType) -> EndpointStatisticsSpec {
        EndpointStatisticsSpec::new(label, sex, data_type)
    }

    /// Same endpoint over an alternate row set (e.g. scheduled-only subjects).
    pub fn with_rows(&self, rows: Vec<DoseGroupStatRow>) -> Result<Self> {
        validate_rows(&self.key.label, &rows)?;
        Ok(Self {
            rows,
            ..self.clone()
        })
    }

    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.key.label
    }

    pub fn sex(&self) -> Sex {
        self.key.sex
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn organ(&self) -> Option<&str> {
        self.organ.as_deref()
    }

    pub fn test_code(&self) -> Option<&str> {
        self.test_code.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn trend_p(&self) -> Option<f64> {
        self.trend_p
    }

    pub fn onset_dose(&self) -> Option<&DoseValue> {
        self.onset_dose.as_ref()
    }

    /// All rows, control first, ascending by dose level.
    pub fn rows(&self) -> &[DoseGroupStatRow] {
        &self.rows
    }

    pub fn control(&self) -> Option<&DoseGroupStatRow> {
        self.rows.first().filter(|r| r.is_control())
    }

    /// Non-control rows in ascending dose order.
    pub fn treated(&self) -> impl Iterator<Item = &DoseGroupStatRow> {
        self.rows.iter().filter(|r| !r.is_control())
    }

    /// Whether any treated group has a pairwise comparison against control.
    pub fn has_pairwise_stats(&self) -> bool {
        self.treated().any(|r| r.effective_p().is_some())
    }

    /// Smallest pairwise p-value across treated groups.
    pub fn min_effective_p(&self) -> Option<f64> {
        self.treated()
            .filter_map(DoseGroupStatRow::effective_p)
            .min_by(f64::total_cmp)
    }

    /// Whether any treated group reaches significance.
    pub fn is_significant(&self) -> bool {
        self.treated().any(DoseGroupStatRow::is_significant)
    }

    /// Treated group with the smallest p-value; the lower dose wins ties.
    pub fn lead_row(&self) -> Option<&DoseGroupStatRow> {
        self.treated()
            .filter(|r| r.effective_p().is_some())
            .fold(None, |best: Option<&DoseGroupStatRow>, row| match best {
                Some(b) if b.effective_p() <= row.effective_p() => Some(b),
                _ => Some(row),
            })
    }

    /// Direction of the lead group's response relative to control.
    pub fn direction(&self) -> Direction {
        let baseline = self.control().and_then(|c| c.response(self.data_type));
        let lead = self.lead_row().and_then(|r| r.response(self.data_type));
        match (baseline, lead) {
            (Some(b), Some(v)) => Direction::of(v - b),
            _ => Direction::None,
        }
    }
}
