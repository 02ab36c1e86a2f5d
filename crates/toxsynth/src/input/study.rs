//! Whole-study input document.

use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SynthError};
use crate::model::{DoseGroupCatalog, EndpointKey};
use crate::noael::StudyNoaelTable;
use crate::verdict::{AnnotationStore, ClinicalCatalog};

use super::record::EndpointRecord;
use super::rows::RowLoader;

/// Everything the synthesis engine needs for one study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyInput {
    pub study_id: String,
    #[serde(default)]
    pub dose_groups: DoseGroupCatalog,
    #[serde(default)]
    pub endpoints: Vec<EndpointRecord>,
    /// Clinical rule matches keyed by analyte code.
    #[serde(default)]
    pub clinical: ClinicalCatalog,
    /// Endpoints reviewers marked as not evaluated, keyed by label.
    #[serde(default)]
    pub annotations: AnnotationStore,
    /// Study-level NOAEL table, consulted only when endpoint statistics
    /// cannot establish one.
    #[serde(default)]
    pub study_noael: StudyNoaelTable,
}

impl StudyInput {
    pub fn new(study_id: impl Into<String>) -> Self {
        Self {
            study_id: study_id.into(),
            ..Default::default()
        }
    }

    /// Read and validate a JSON study document.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| SynthError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let input = Self::from_json_str(&contents)?;
        debug!(
            path = %path.display(),
            study = %input.study_id,
            endpoints = input.endpoints.len(),
            "loaded study input"
        );
        Ok(input)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let input: Self = serde_json::from_str(json)?;
        input.validate()?;
        Ok(input)
    }

    /// Build a study from a long-format dose table. The study id is the
    /// file stem.
    pub fn from_table_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let study_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut input = Self::new(study_id);
        input.endpoints = RowLoader::new().load_file(path)?;
        Ok(input)
    }

    /// Load by extension: `.json` as a study document, anything else as a
    /// dose table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_table_file(path)
        }
    }

    /// Each endpoint/sex appears once, and cohort row sets match.
    pub fn validate(&self) -> Result<()> {
        let mut seen: IndexSet<&EndpointKey> = IndexSet::new();
        for record in &self.endpoints {
            record.validate()?;
            if !seen.insert(record.key()) {
                return Err(SynthError::DuplicateEndpoint {
                    endpoint: record.key().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sex;

    const STUDY: &str = r#"{
        "study_id": "TOX-001",
        "dose_groups": [
            {"level": 2, "dose": {"value": 80, "unit": "mg/kg"}},
            {"level": 0, "dose": {"value": 0, "unit": "mg/kg"}, "label": "Control"},
            {"level": 1, "dose": {"value": 20, "unit": "mg/kg"}}
        ],
        "endpoints": [
            {
                "statistics": {
                    "label": "ALT", "sex": "M", "data_type": "continuous",
                    "domain": "LB", "organ": "hepatic", "test_code": "ALT",
                    "rows": [
                        {"dose_level": 0, "n": 10, "mean": 40, "sd": 5},
                        {"dose_level": 1, "n": 10, "mean": 80, "sd": 9, "p_value_adj": 0.002}
                    ]
                },
                "assessment": {"treatment_related": true, "severity": "warning"}
            }
        ],
        "clinical": {
            "ALT": [{"rule_id": "L01", "rule_name": "ALT elevation", "tier": "S3"}]
        },
        "annotations": {"Body weight": {"reason": "gavage error"}},
        "study_noael": {"F": {"noael_level": 1}}
    }"#;

    #[test]
    fn test_parse_study_document() {
        let input = StudyInput::from_json_str(STUDY).unwrap();
        assert_eq!(input.study_id, "TOX-001");
        let levels: Vec<u32> = input.dose_groups.groups().iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
        assert_eq!(input.endpoints.len(), 1);
        assert_eq!(input.clinical.len(), 1);
        assert!(input.annotations.get("Body weight").is_some());
        assert!(input.study_noael.contains_key(&Sex::Female));
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let mut input = StudyInput::from_json_str(STUDY).unwrap();
        input.endpoints.push(input.endpoints[0].clone());
        assert!(matches!(
            input.validate(),
            Err(SynthError::DuplicateEndpoint { .. })
        ));
    }

    #[test]
    fn test_invalid_rows_rejected_on_load() {
        let bad = STUDY.replace(r#""dose_level": 0, "n": 10, "mean": 40, "sd": 5"#, r#""dose_level": 0, "n": 10, "mean": 40, "sd": 5, "p_value": 0.5"#);
        assert!(StudyInput::from_json_str(&bad).is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("study.json");
        fs::write(&json, STUDY).unwrap();
        assert_eq!(StudyInput::load(&json).unwrap().study_id, "TOX-001");

        let table = dir.path().join("rat-28d.csv");
        fs::write(&table, "endpoint,sex,dose_level,n,mean\nALT,M,0,10,1.0\nALT,M,1,10,2.0\n").unwrap();
        let input = StudyInput::load(&table).unwrap();
        assert_eq!(input.study_id, "rat-28d");
        assert_eq!(input.endpoints.len(), 1);
    }
}
