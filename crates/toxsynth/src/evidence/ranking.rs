//! Organ ranking and study rail statistics.

use serde::{Deserialize, Serialize};

use super::organ::OrganEvidenceSummary;

/// Totals shown alongside the ranked organ list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailStats {
    pub organ_count: usize,
    pub endpoint_count: usize,
    pub significant_count: usize,
    pub treatment_related_count: usize,
    pub adverse_count: usize,
    pub organs_with_adverse: usize,
}

/// Rank organs by evidence score, then adverse count; otherwise discovery
/// order is kept.
pub fn rank_organs(summaries: &[OrganEvidenceSummary]) -> Vec<&OrganEvidenceSummary> {
    let mut ranked: Vec<&OrganEvidenceSummary> = summaries.iter().collect();
    ranked.sort_by(|a, b| {
        b.max_signal_score
            .total_cmp(&a.max_signal_score)
            .then(b.adverse_count.cmp(&a.adverse_count))
    });
    ranked
}

/// Sum organ summaries into rail totals.
pub fn rail_stats(summaries: &[OrganEvidenceSummary]) -> RailStats {
    summaries.iter().fold(RailStats::default(), |mut acc, s| {
        acc.organ_count += 1;
        acc.endpoint_count += s.endpoint_count;
        acc.significant_count += s.significant_count;
        acc.treatment_related_count += s.treatment_related_count;
        acc.adverse_count += s.adverse_count;
        if s.adverse_count > 0 {
            acc.organs_with_adverse += 1;
        }
        acc
    })
}
