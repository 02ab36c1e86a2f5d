//! Study-level NOAEL per sex, with fallback to an upstream NOAEL table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{DoseValue, EndpointKey, Sex};

use super::deriver::{DoseRef, NoaelKey, NoaelResult, NoaelStatus};
use super::organ::OrganNoael;

/// One row of an upstream study-level NOAEL table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyNoaelRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noael_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noael_dose: Option<DoseValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loael_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loael_dose: Option<DoseValue>,
}

impl StudyNoaelRow {
    /// Interpret the row with the same sentinels endpoint derivation uses.
    pub fn to_result(&self) -> NoaelResult {
        let noael = self.noael_level.map(|level| DoseRef {
            level,
            dose: self.noael_dose.clone(),
        });
        let loael = self.loael_level.map(|level| DoseRef {
            level,
            dose: self.loael_dose.clone(),
        });

        let (status, key) = match (&noael, &loael) {
            (Some(n), Some(_)) => (NoaelStatus::Established, NoaelKey::Level(n.level)),
            (None, Some(_)) => (NoaelStatus::BelowLowest, NoaelKey::BelowLowest),
            (Some(n), None) => (NoaelStatus::AtOrAboveHighest, NoaelKey::AboveHighest(n.level)),
            (None, None) => (NoaelStatus::NoStats, NoaelKey::NoStats),
        };

        NoaelResult {
            status,
            noael,
            loael,
            key,
        }
    }
}

/// Upstream study-level NOAEL determinations keyed by sex.
pub type StudyNoaelTable = IndexMap<Sex, StudyNoaelRow>;

/// Where a study-level NOAEL came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NoaelSource {
    /// Minimum across organ NOAELs derived from endpoint statistics.
    Derived {
        organ: String,
        endpoint: EndpointKey,
    },
    /// No endpoint had pairwise statistics; taken from the study table.
    StudyTable,
    /// Neither endpoint statistics nor a table entry were available.
    Unavailable,
}

/// Study-level NOAEL for one sex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyNoael {
    pub sex: Sex,
    pub noael: NoaelResult,
    #[serde(flatten)]
    pub source: NoaelSource,
}

/// Resolve the study NOAEL for one sex from that sex's organ NOAELs.
///
/// Ties go to the first organ encountered. Organs of the other sex must not
/// be passed in; the sexes are resolved separately.
pub fn resolve_study_noael<'a>(
    sex: Sex,
    organs: impl IntoIterator<Item = (&'a str, &'a OrganNoael)>,
    table: &StudyNoaelTable,
) -> StudyNoael {
    let mut best: Option<(&str, &OrganNoael)> = None;
    for (organ, noael) in organs {
        if noael.driving_endpoint.is_none() {
            continue;
        }
        match best {
            Some((_, current)) if current.noael.key <= noael.noael.key => {}
            _ => best = Some((organ, noael)),
        }
    }

    if let Some((organ, noael)) = best {
        if let Some(endpoint) = noael.driving_endpoint.clone() {
            return StudyNoael {
                sex,
                noael: noael.noael.clone(),
                source: NoaelSource::Derived {
                    organ: organ.to_string(),
                    endpoint,
                },
            };
        }
    }

    match table.get(&sex) {
        Some(row) => {
            warn!(sex = %sex, "no endpoint statistics; using study-level NOAEL table");
            StudyNoael {
                sex,
                noael: row.to_result(),
                source: NoaelSource::StudyTable,
            }
        }
        None => StudyNoael {
            sex,
            noael: NoaelResult::no_stats(),
            source: NoaelSource::Unavailable,
        },
    }
}
