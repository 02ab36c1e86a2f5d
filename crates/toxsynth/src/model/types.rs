//! Core type definitions shared by every component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pairwise and trend significance cut-off.
pub const SIGNIFICANCE_ALPHA: f64 = 0.05;

/// Cut-off for the "strong" significance bucket.
pub const STRONG_SIGNIFICANCE_ALPHA: f64 = 0.01;

/// Sex of the animals a computation is about.
///
/// Sex is part of the identity of every computation; results for the two
/// sexes are never merged inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M", alias = "male", alias = "Male")]
    Male,
    #[serde(rename = "F", alias = "female", alias = "Female")]
    Female,
}

impl Sex {
    /// Single-letter code used in study data.
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    /// Parse a sex code, accepting common spellings.
    pub fn parse(s: &str) -> Option<Sex> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Sex::Male),
            "f" | "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Kind of observation an endpoint records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Group mean and standard deviation (e.g. clinical chemistry).
    Continuous,
    /// Affected count and incidence (e.g. histopathology findings).
    Categorical,
}

impl DataType {
    /// Parse a data type tag.
    pub fn parse(s: &str) -> Option<DataType> {
        match s.trim().to_lowercase().as_str() {
            "continuous" => Some(DataType::Continuous),
            "categorical" | "incidence" => Some(DataType::Categorical),
            _ => None,
        }
    }
}

/// Direction of a response relative to control or to the previous dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

impl Direction {
    /// Direction of a signed difference. Zero and NaN have no direction.
    pub fn of(delta: f64) -> Direction {
        if delta > 0.0 {
            Direction::Up
        } else if delta < 0.0 {
            Direction::Down
        } else {
            Direction::None
        }
    }
}

/// Three-level severity scale shared by statistical and clinical assessment.
///
/// Variant order is the ordinal order: `Normal < Warning < Adverse`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Adverse,
}

impl Severity {
    /// Position on the ordinal scale.
    pub fn ordinal(&self) -> u8 {
        match self {
            Severity::Normal => 0,
            Severity::Warning => 1,
            Severity::Adverse => 2,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Warning => "Warning",
            Severity::Adverse => "Adverse",
        }
    }

    /// Parse a severity label, case-insensitively.
    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "none" => Some(Severity::Normal),
            "warning" => Some(Severity::Warning),
            "adverse" => Some(Severity::Adverse),
            _ => None,
        }
    }
}

/// Reduce severities to the worst one. An empty input is `Normal`.
pub fn max_severity(severities: impl IntoIterator<Item = Severity>) -> Severity {
    severities
        .into_iter()
        .max_by_key(Severity::ordinal)
        .unwrap_or_default()
}

/// Severity tier assigned by a clinical-threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClinicalTier {
    S1,
    S2,
    S3,
    S4,
}

impl ClinicalTier {
    /// Collapse the tier onto the statistical severity scale.
    ///
    /// Both high tiers map to `Adverse`.
    pub fn severity(&self) -> Severity {
        match self {
            ClinicalTier::S1 => Severity::Normal,
            ClinicalTier::S2 => Severity::Warning,
            ClinicalTier::S3 | ClinicalTier::S4 => Severity::Adverse,
        }
    }

    /// Parse a tier code such as `S3`.
    pub fn parse(s: &str) -> Option<ClinicalTier> {
        match s.trim().to_uppercase().as_str() {
            "S1" => Some(ClinicalTier::S1),
            "S2" => Some(ClinicalTier::S2),
            "S3" => Some(ClinicalTier::S3),
            "S4" => Some(ClinicalTier::S4),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Normal < Severity::Warning);
        assert!(Severity::Warning < Severity::Adverse);
        assert_eq!(Severity::Adverse.ordinal(), 2);
    }

    #[test]
    fn test_max_severity() {
        assert_eq!(max_severity([]), Severity::Normal);
        assert_eq!(
            max_severity([Severity::Warning, Severity::Normal]),
            Severity::Warning
        );
        assert_eq!(
            max_severity([Severity::Warning, Severity::Adverse, Severity::Normal]),
            Severity::Adverse
        );
    }

    #[test]
    fn test_tier_collapse() {
        assert_eq!(ClinicalTier::S1.severity(), Severity::Normal);
        assert_eq!(ClinicalTier::S2.severity(), Severity::Warning);
        assert_eq!(ClinicalTier::S3.severity(), Severity::Adverse);
        assert_eq!(ClinicalTier::S4.severity(), Severity::Adverse);
        assert_eq!(ClinicalTier::parse("s4"), Some(ClinicalTier::S4));
        assert_eq!(ClinicalTier::parse("S5"), None);
    }

    #[test]
    fn test_sex_serde() {
        assert_eq!(serde_json::to_string(&Sex::Male).unwrap(), "\"M\"");
        let f: Sex = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(f, Sex::Female);
        assert_eq!(Sex::parse(" F "), Some(Sex::Female));
    }

    #[test]
    fn test_direction_of() {
        assert_eq!(Direction::of(2.0), Direction::Up);
        assert_eq!(Direction::of(-0.1), Direction::Down);
        assert_eq!(Direction::of(0.0), Direction::None);
        assert_eq!(Direction::of(f64::NAN), Direction::None);
    }
}
