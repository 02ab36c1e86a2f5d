//! Dose values and study-level dose-group metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dose amount with its unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseValue {
    pub value: f64,
    pub unit: String,
}

impl DoseValue {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for DoseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 40.0 renders as "40", 2.5 stays "2.5"
        if self.value.fract() == 0.0 && self.value.abs() < 1e15 {
            write!(f, "{:.0}", self.value)?;
        } else {
            write!(f, "{}", self.value)?;
        }
        if !self.unit.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

/// One dose group as defined by the study design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseGroup {
    /// Ordinal dose level (0 = control).
    pub level: u32,
    /// Administered dose, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<DoseValue>,
    /// Display label (e.g. "Low", "Mid", "High").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Dose-group metadata for a study, used to render dose levels as labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DoseGroup>", into = "Vec<DoseGroup>")]
pub struct DoseGroupCatalog {
    groups: Vec<DoseGroup>,
}

impl DoseGroupCatalog {
    /// Create a catalog. Groups are kept sorted by level.
    pub fn new(mut groups: Vec<DoseGroup>) -> Self {
        groups.sort_by_key(|g| g.level);
        groups.dedup_by_key(|g| g.level);
        Self { groups }
    }

    /// Look up a dose group by level.
    pub fn get(&self, level: u32) -> Option<&DoseGroup> {
        self.groups
            .binary_search_by_key(&level, |g| g.level)
            .ok()
            .map(|idx| &self.groups[idx])
    }

    /// Dose for a level, if the study recorded one.
    pub fn dose(&self, level: u32) -> Option<&DoseValue> {
        self.get(level).and_then(|g| g.dose.as_ref())
    }

    /// All groups in ascending level order.
    pub fn groups(&self) -> &[DoseGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl From<Vec<DoseGroup>> for DoseGroupCatalog {
    fn from(groups: Vec<DoseGroup>) -> Self {
        Self::new(groups)
    }
}

impl From<DoseGroupCatalog> for Vec<DoseGroup> {
    fn from(catalog: DoseGroupCatalog) -> Self {
        catalog.groups
    }
}
