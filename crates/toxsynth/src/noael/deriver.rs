//! Per-endpoint NOAEL/LOAEL derivation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{DoseGroupStatRow, DoseValue, EndpointStatistics};

/// Offset added to the highest dose level when nothing is adverse, so that
/// the key never wins an organ-level minimum against a finite dose.
pub const ABOVE_RANGE_OFFSET: f64 = 1000.0;

/// Ordering key used to compare NOAELs across endpoints.
///
/// Variant order is the comparison order; smaller is more conservative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "level", rename_all = "snake_case")]
pub enum NoaelKey {
    /// Every tested dose is adverse.
    BelowLowest,
    /// NOAEL at this dose level.
    Level(u32),
    /// No tested dose is adverse; carries the highest tested level.
    AboveHighest(u32),
    /// No pairwise comparisons exist.
    NoStats,
}

impl NoaelKey {
    /// Numeric form of the key: -1 below range, the level itself, the highest
    /// level plus [`ABOVE_RANGE_OFFSET`], or infinity without statistics.
    pub fn value(&self) -> f64 {
        match self {
            NoaelKey::BelowLowest => -1.0,
            NoaelKey::Level(level) => *level as f64,
            NoaelKey::AboveHighest(level) => *level as f64 + ABOVE_RANGE_OFFSET,
            NoaelKey::NoStats => f64::INFINITY,
        }
    }

    /// Whether this key may drive an organ or study minimum.
    pub fn is_comparable(&self) -> bool {
        !matches!(self, NoaelKey::NoStats)
    }
}

/// How the NOAEL was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoaelStatus {
    /// NOAEL at a tested dose below the LOAEL.
    Established,
    /// All tested doses adverse.
    BelowLowest,
    /// No tested dose adverse; NOAEL is at least the highest dose.
    AtOrAboveHighest,
    /// No pairwise statistics to judge adversity.
    NoStats,
}

/// A tested dose, by level and (when known) amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRef {
    pub level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose: Option<DoseValue>,
}

impl From<&DoseGroupStatRow> for DoseRef {
    fn from(row: &DoseGroupStatRow) -> Self {
        Self {
            level: row.dose_level,
            dose: row.dose(),
        }
    }
}

/// NOAEL and implied LOAEL for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoaelResult {
    pub status: NoaelStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noael: Option<DoseRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loael: Option<DoseRef>,
    pub key: NoaelKey,
}

impl NoaelResult {
    /// The "no stats" sentinel.
    pub fn no_stats() -> Self {
        Self {
            status: NoaelStatus::NoStats,
            noael: None,
            loael: None,
            key: NoaelKey::NoStats,
        }
    }

    /// Numeric ordering key.
    pub fn ordering_key(&self) -> f64 {
        self.key.value()
    }
}

/// Derive the NOAEL and LOAEL for one endpoint.
///
/// The LOAEL is the first treated dose whose adjusted p-value (raw when no
/// adjusted value exists) is below 0.05; the NOAEL is the dose just below it.
pub fn derive_noael(stats: &EndpointStatistics) -> NoaelResult {
    let treated: Vec<&DoseGroupStatRow> = stats.treated().collect();

    if !stats.has_pairwise_stats() {
        warn!(endpoint = %stats.key(), "no pairwise statistics");
        return NoaelResult::no_stats();
    }

    let result = match treated.iter().position(|row| row.is_significant()) {
        None => {
            let highest = treated[treated.len() - 1];
            NoaelResult {
                status: NoaelStatus::AtOrAboveHighest,
                noael: Some(highest.into()),
                loael: None,
                key: NoaelKey::AboveHighest(highest.dose_level),
            }
        }
        Some(0) => NoaelResult {
            status: NoaelStatus::BelowLowest,
            noael: None,
            loael: Some(treated[0].into()),
            key: NoaelKey::BelowLowest,
        },
        Some(idx) => {
            let noael = treated[idx - 1];
            NoaelResult {
                status: NoaelStatus::Established,
                noael: Some(noael.into()),
                loael: Some(treated[idx].into()),
                key: NoaelKey::Level(noael.dose_level),
            }
        }
    };

    debug!(
        endpoint = %stats.key(),
        status = ?result.status,
        key = result.ordering_key(),
        "noael derived"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataType, EndpointStatisticsSpec, Sex};

    fn with_p(p_adj: &[Option<f64>]) -> EndpointStatistics {
        let mut spec = EndpointStatisticsSpec::new("EP", Sex::Male, DataType::Continuous)
            .row(DoseGroupStatRow::continuous(0, 10, 10.0, 1.0).with_dose(0.0, "mg/kg"));
        for (i, p) in p_adj.iter().enumerate() {
            let mut row = DoseGroupStatRow::continuous(i as u32 + 1, 10, 10.0, 1.0)
                .with_dose(20.0 * (i + 1) as f64, "mg/kg");
            row.p_value_adj = *p;
            spec = spec.row(row);
        }
        spec.build().unwrap()
    }

    #[test]
    fn test_established_noael() {
        let result = derive_noael(&with_p(&[Some(0.9), Some(0.6), Some(0.01)]));
        assert_eq!(result.status, NoaelStatus::Established);
        assert_eq!(result.noael.as_ref().unwrap().level, 2);
        assert_eq!(result.loael.as_ref().unwrap().level, 3);
        assert_eq!(result.key, NoaelKey::Level(2));
        assert_eq!(result.ordering_key(), 2.0);
    }

    #[test]
    fn test_below_lowest() {
        let result = derive_noael(&with_p(&[Some(0.01), Some(0.02), Some(0.001)]));
        assert_eq!(result.status, NoaelStatus::BelowLowest);
        assert!(result.noael.is_none());
        assert_eq!(result.loael.as_ref().unwrap().level, 1);
        assert_eq!(result.ordering_key(), -1.0);
    }

    #[test]
    fn test_at_or_above_highest() {
        let result = derive_noael(&with_p(&[Some(0.5), Some(0.3), Some(0.2)]));
        assert_eq!(result.status, NoaelStatus::AtOrAboveHighest);
        assert_eq!(result.noael.as_ref().unwrap().level, 3);
        assert!(result.loael.is_none());
        assert_eq!(result.ordering_key(), 3.0 + ABOVE_RANGE_OFFSET);
    }

    #[test]
    fn test_no_stats() {
        let result = derive_noael(&with_p(&[None, None]));
        assert_eq!(result, NoaelResult::no_stats());
        assert!(result.ordering_key().is_infinite());
    }

    #[test]
    fn test_rows_without_p_are_not_adverse() {
        let result = derive_noael(&with_p(&[None, Some(0.02)]));
        assert_eq!(result.status, NoaelStatus::Established);
        assert_eq!(result.key, NoaelKey::Level(1));
    }

    #[test]
    fn test_raw_p_fallback() {
        let stats = EndpointStatisticsSpec::new("EP", Sex::Male, DataType::Continuous)
            .row(DoseGroupStatRow::continuous(0, 10, 10.0, 1.0))
            .row(DoseGroupStatRow::continuous(1, 10, 10.0, 1.0).with_p_value(0.5))
            .row(DoseGroupStatRow::continuous(2, 10, 10.0, 1.0).with_p_value(0.04))
            .build()
            .unwrap();
        assert_eq!(derive_noael(&stats).key, NoaelKey::Level(1));
    }

    #[test]
    fn test_key_ordering() {
        assert!(NoaelKey::BelowLowest < NoaelKey::Level(0));
        assert!(NoaelKey::Level(50) < NoaelKey::AboveHighest(1));
        assert!(NoaelKey::AboveHighest(9) < NoaelKey::NoStats);
    }

    #[test]
    fn test_dose_values_carried() {
        let result = derive_noael(&with_p(&[Some(0.9), Some(0.01)]));
        assert_eq!(
            result.noael.unwrap().dose,
            Some(DoseValue::new(20.0, "mg/kg"))
        );
        assert_eq!(
            result.loael.unwrap().dose,
            Some(DoseValue::new(40.0, "mg/kg"))
        );
    }
}
