//! Human-readable labels for dose levels and NOAEL results.

use crate::model::DoseGroupCatalog;
use crate::noael::{DoseRef, NoaelResult, NoaelStatus};

/// Render a dose reference, preferring the amount recorded on the row, then
/// the study's dose-group metadata, then the bare level.
pub fn format_dose(dose: &DoseRef, catalog: &DoseGroupCatalog) -> String {
    if let Some(value) = &dose.dose {
        return value.to_string();
    }
    match catalog.get(dose.level) {
        Some(group) => match (&group.dose, &group.label) {
            (Some(value), _) => value.to_string(),
            (None, Some(label)) => label.clone(),
            (None, None) => format!("dose level {}", dose.level),
        },
        None => format!("dose level {}", dose.level),
    }
}

/// Render a NOAEL: "40 mg/kg", "< 20 mg/kg", "≥ 80 mg/kg" or "no stats".
pub fn format_noael(result: &NoaelResult, catalog: &DoseGroupCatalog) -> String {
    match (result.status, &result.noael, &result.loael) {
        (NoaelStatus::Established, Some(noael), _) => format_dose(noael, catalog),
        (NoaelStatus::BelowLowest, _, Some(loael)) => format!("< {}", format_dose(loael, catalog)),
        (NoaelStatus::AtOrAboveHighest, Some(noael), _) => {
            format!("≥ {}", format_dose(noael, catalog))
        }
        (NoaelStatus::BelowLowest, _, None) => "< lowest dose".to_string(),
        (NoaelStatus::NoStats, _, _) | (_, None, _) => "no stats".to_string(),
    }
}

/// Render a LOAEL, or "none" when no dose was adverse.
pub fn format_loael(result: &NoaelResult, catalog: &DoseGroupCatalog) -> String {
    match &result.loael {
        Some(loael) => format_dose(loael, catalog),
        None if result.status == NoaelStatus::NoStats => "no stats".to_string(),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DoseGroup, DoseValue};
    use crate::noael::NoaelKey;

    fn catalog() -> DoseGroupCatalog {
        DoseGroupCatalog::new(vec![
            DoseGroup {
                level: 1,
                dose: Some(DoseValue::new(20.0, "mg/kg")),
                label: Some("Low".into()),
            },
            DoseGroup {
                level: 3,
                dose: Some(DoseValue::new(80.0, "mg/kg")),
                label: Some("High".into()),
            },
            DoseGroup {
                level: 2,
                dose: None,
                label: Some("Mid".into()),
            },
        ])
    }

    fn dose(level: u32) -> Option<DoseRef> {
        Some(DoseRef { level, dose: None })
    }

    #[test]
    fn test_established_uses_catalog() {
        let result = NoaelResult {
            status: NoaelStatus::Established,
            noael: dose(1),
            loael: dose(2),
            key: NoaelKey::Level(1),
        };
        assert_eq!(format_noael(&result, &catalog()), "20 mg/kg");
        assert_eq!(format_loael(&result, &catalog()), "Mid");
    }

    #[test]
    fn test_sentinels() {
        let below = NoaelResult {
            status: NoaelStatus::BelowLowest,
            noael: None,
            loael: dose(1),
            key: NoaelKey::BelowLowest,
        };
        assert_eq!(format_noael(&below, &catalog()), "< 20 mg/kg");

        let above = NoaelResult {
            status: NoaelStatus::AtOrAboveHighest,
            noael: dose(3),
            loael: None,
            key: NoaelKey::AboveHighest(3),
        };
        assert_eq!(format_noael(&above, &catalog()), "≥ 80 mg/kg");
        assert_eq!(format_loael(&above, &catalog()), "none");

        let none = NoaelResult::no_stats();
        assert_eq!(format_noael(&none, &catalog()), "no stats");
        assert_eq!(format_loael(&none, &catalog()), "no stats");
    }

    #[test]
    fn test_row_dose_preferred_and_unknown_level() {
        let row_dose = DoseRef {
            level: 1,
            dose: Some(DoseValue::new(25.0, "mg/kg/day")),
        };
        assert_eq!(format_dose(&row_dose, &catalog()), "25 mg/kg/day");
        assert_eq!(
            format_dose(&DoseRef { level: 9, dose: None }, &catalog()),
            "dose level 9"
        );
    }
}
