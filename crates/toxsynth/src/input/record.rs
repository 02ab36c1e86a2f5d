//! One endpoint/sex as handed over by upstream analysis.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceCaveats;
use crate::error::{Result, SynthError};
use crate::model::{CohortFilter, EndpointKey, EndpointStatistics};
use crate::verdict::StatisticalAssessment;

/// Statistics for one endpoint/sex plus the upstream judgements that travel
/// with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub statistics: EndpointStatistics,
    /// Row set recomputed without early-death subjects, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_only: Option<EndpointStatistics>,
    #[serde(default)]
    pub assessment: StatisticalAssessment,
    /// Assessment over the scheduled-only cohort; falls back to `assessment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_assessment: Option<StatisticalAssessment>,
    #[serde(default)]
    pub caveats: ConfidenceCaveats,
}

impl EndpointRecord {
    pub fn new(statistics: EndpointStatistics, assessment: StatisticalAssessment) -> Self {
        Self {
            statistics,
            scheduled_only: None,
            assessment,
            scheduled_assessment: None,
            caveats: ConfidenceCaveats::default(),
        }
    }

    /// Attach a scheduled-only row set. It must describe the same endpoint.
    pub fn with_scheduled_only(mut self, statistics: EndpointStatistics) -> Result<Self> {
        check_same_endpoint(self.statistics.key(), statistics.key())?;
        self.scheduled_only = Some(statistics);
        Ok(self)
    }

    pub fn with_scheduled_assessment(mut self, assessment: StatisticalAssessment) -> Self {
        self.scheduled_assessment = Some(assessment);
        self
    }

    pub fn with_caveats(mut self, caveats: ConfidenceCaveats) -> Self {
        self.caveats = caveats;
        self
    }

    pub fn key(&self) -> &EndpointKey {
        self.statistics.key()
    }

    /// The row set to analyze under `filter`. Endpoints without a
    /// scheduled-only row set use the full cohort either way.
    pub fn select(&self, filter: CohortFilter) -> &EndpointStatistics {
        match (filter, &self.scheduled_only) {
            (CohortFilter::ScheduledOnly, Some(scheduled)) => scheduled,
            _ => &self.statistics,
        }
    }

    /// The upstream assessment matching `select(filter)`.
    pub fn assessment_for(&self, filter: CohortFilter) -> StatisticalAssessment {
        match (filter, &self.scheduled_only, self.scheduled_assessment) {
            (CohortFilter::ScheduledOnly, Some(_), Some(assessment)) => assessment,
            _ => self.assessment,
        }
    }

    /// Re-check invariants that deserialization alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if let Some(scheduled) = &self.scheduled_only {
            check_same_endpoint(self.statistics.key(), scheduled.key())?;
        }
        Ok(())
    }
}

fn check_same_endpoint(expected: &EndpointKey, found: &EndpointKey) -> Result<()> {
    if expected != found {
        return Err(SynthError::CohortMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataType, DoseGroupStatRow, Severity, Sex};

    fn stats(label: &str, sex: Sex, top_p: f64) -> EndpointStatistics {
        EndpointStatistics::builder(label, sex, DataType::Continuous)
            .row(DoseGroupStatRow::continuous(0, 10, 1.0, 0.1))
            .row(DoseGroupStatRow::continuous(1, 10, 1.4, 0.1).with_adjusted_p(top_p))
            .build()
            .unwrap()
    }

    #[test]
    fn test_select_by_filter() {
        let record = EndpointRecord::new(
            stats("ALT", Sex::Male, 0.01),
            StatisticalAssessment::new(true, Severity::Adverse),
        )
        .with_scheduled_only(stats("ALT", Sex::Male, 0.2))
        .unwrap()
        .with_scheduled_assessment(StatisticalAssessment::new(false, Severity::Normal));

        let all = record.select(CohortFilter::AllSubjects);
        let scheduled = record.select(CohortFilter::ScheduledOnly);
        assert_eq!(all.rows()[1].p_value_adj, Some(0.01));
        assert_eq!(scheduled.rows()[1].p_value_adj, Some(0.2));
        assert!(record.assessment_for(CohortFilter::AllSubjects).treatment_related);
        assert!(!record.assessment_for(CohortFilter::ScheduledOnly).treatment_related);
    }

    #[test]
    fn test_scheduled_falls_back_to_full_cohort() {
        let record = EndpointRecord::new(
            stats("ALT", Sex::Male, 0.01),
            StatisticalAssessment::new(true, Severity::Warning),
        );
        assert_eq!(
            record.select(CohortFilter::ScheduledOnly),
            record.select(CohortFilter::AllSubjects)
        );
        assert_eq!(
            record.assessment_for(CohortFilter::ScheduledOnly).severity,
            Severity::Warning
        );
    }

    #[test]
    fn test_mismatched_cohort_rejected() {
        let record = EndpointRecord::new(stats("ALT", Sex::Male, 0.01), Default::default());
        let err = record
            .with_scheduled_only(stats("ALT", Sex::Female, 0.01))
            .unwrap_err();
        assert!(matches!(err, SynthError::CohortMismatch { .. }));
    }
}
