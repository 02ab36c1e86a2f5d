//! Per-organ evidence summaries.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Direction, EndpointKey, EndpointStatistics, Sex};
use crate::noael::{derive_organ_noael, NoaelResult};
use crate::verdict::Verdict;

/// One member endpoint with its already-computed verdict and score.
#[derive(Debug, Clone, Copy)]
pub struct EndpointEvidence<'a> {
    pub statistics: &'a EndpointStatistics,
    pub verdict: &'a Verdict,
    pub signal_score: f64,
}

/// Majority direction of an organ's significant endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominantDirection {
    Up,
    Down,
    Mixed,
    None,
}

/// Folded evidence for one organ and sex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganEvidenceSummary {
    pub organ: String,
    pub sex: Sex,
    pub endpoint_count: usize,
    pub significant_count: usize,
    pub treatment_related_count: usize,
    pub adverse_count: usize,
    /// Data domains present, in discovery order.
    pub domains: Vec<String>,
    /// Organ evidence score: the strongest member signal.
    pub max_signal_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_endpoint: Option<EndpointKey>,
    pub dominant_direction: DominantDirection,
    pub noael: NoaelResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noael_driver: Option<EndpointKey>,
}

/// Fold member endpoints of one organ and sex into a summary.
///
/// Members of another sex are excluded, never merged.
pub fn aggregate_organ_evidence(
    organ: &str,
    sex: Sex,
    members: &[EndpointEvidence<'_>],
) -> OrganEvidenceSummary {
    let members: Vec<&EndpointEvidence<'_>> = members
        .iter()
        .filter(|m| {
            let same_sex = m.statistics.sex() == sex;
            if !same_sex {
                warn!(
                    organ,
                    endpoint = %m.statistics.key(),
                    "excluding endpoint of other sex from organ summary"
                );
            }
            same_sex
        })
        .collect();

    let mut domains: IndexSet<String> = IndexSet::new();
    let mut significant_count = 0;
    let mut treatment_related_count = 0;
    let mut adverse_count = 0;
    let (mut up, mut down) = (0usize, 0usize);
    let mut top: Option<(&EndpointKey, f64)> = None;

    for member in &members {
        let stats = member.statistics;
        if !stats.domain().is_empty() {
            domains.insert(stats.domain().to_string());
        }
        if member.verdict.is_treatment_related() {
            treatment_related_count += 1;
        }
        if member.verdict.is_adverse() {
            adverse_count += 1;
        }
        if stats.is_significant() {
            significant_count += 1;
            match stats.direction() {
                Direction::Up => up += 1,
                Direction::Down => down += 1,
                Direction::None => {}
            }
        }
        match top {
            Some((_, best)) if best >= member.signal_score => {}
            _ => top = Some((stats.key(), member.signal_score)),
        }
    }

    let dominant_direction = if up > down {
        DominantDirection::Up
    } else if down > up {
        DominantDirection::Down
    } else if up > 0 {
        DominantDirection::Mixed
    } else {
        DominantDirection::None
    };

    let organ_noael = derive_organ_noael(members.iter().map(|m| m.statistics));

    OrganEvidenceSummary {
        organ: organ.to_string(),
        sex,
        endpoint_count: members.len(),
        significant_count,
        treatment_related_count,
        adverse_count,
        domains: domains.into_iter().collect(),
        max_signal_score: top.map(|(_, s)| s).unwrap_or(0.0),
        top_endpoint: top.map(|(k, _)| k.clone()),
        dominant_direction,
        noael: organ_noael.noael,
        noael_driver: organ_noael.driving_endpoint,
    }
}
