//! Merges statistical severity with clinical-rule overrides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{max_severity, Severity, Sex};

use super::annotations::NotEvaluated;
use super::clinical::ClinicalRuleMatch;

/// Upstream statistical judgement for one endpoint/sex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticalAssessment {
    #[serde(default)]
    pub treatment_related: bool,
    #[serde(default)]
    pub severity: Severity,
}

impl StatisticalAssessment {
    pub fn new(treatment_related: bool, severity: Severity) -> Self {
        Self {
            treatment_related,
            severity,
        }
    }
}

/// The clinical rule that raised severity above the statistical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSource {
    pub rule_id: String,
    pub rule_name: String,
}

/// Icon/label category of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictCategory {
    TreatmentRelatedAdverse,
    TreatmentRelatedWarning,
    TreatmentRelatedNonAdverse,
    ClinicalAdverse,
    ClinicalWarning,
    NotTreatmentRelated,
    NotEvaluated,
}

impl VerdictCategory {
    /// Icon key for the rendering layer.
    pub fn icon(&self) -> &'static str {
        match self {
            VerdictCategory::TreatmentRelatedAdverse => "adverse",
            VerdictCategory::TreatmentRelatedWarning => "warning",
            VerdictCategory::TreatmentRelatedNonAdverse => "treatment-related",
            VerdictCategory::ClinicalAdverse | VerdictCategory::ClinicalWarning => "clinical",
            VerdictCategory::NotTreatmentRelated => "normal",
            VerdictCategory::NotEvaluated => "not-evaluated",
        }
    }
}

/// A verdict computed from statistics and clinical rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub treatment_related: bool,
    pub statistical_severity: Severity,
    pub effective_severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_source: Option<OverrideSource>,
    pub category: VerdictCategory,
    pub label: String,
}

/// Final verdict for one endpoint/sex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Verdict {
    /// Suppressed by a "not evaluated" annotation.
    NotEvaluated {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Evaluated(Assessment),
}

impl Verdict {
    pub fn assessment(&self) -> Option<&Assessment> {
        match self {
            Verdict::Evaluated(a) => Some(a),
            Verdict::NotEvaluated { .. } => None,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.assessment().is_some()
    }

    pub fn effective_severity(&self) -> Option<Severity> {
        self.assessment().map(|a| a.effective_severity)
    }

    pub fn is_treatment_related(&self) -> bool {
        self.assessment().is_some_and(|a| a.treatment_related)
    }

    pub fn is_adverse(&self) -> bool {
        self.effective_severity() == Some(Severity::Adverse)
    }

    pub fn override_source(&self) -> Option<&OverrideSource> {
        self.assessment().and_then(|a| a.override_source.as_ref())
    }

    pub fn category(&self) -> VerdictCategory {
        match self {
            Verdict::Evaluated(a) => a.category,
            Verdict::NotEvaluated { .. } => VerdictCategory::NotEvaluated,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Verdict::Evaluated(a) => &a.label,
            Verdict::NotEvaluated { .. } => "Not evaluated",
        }
    }
}

/// Synthesize a verdict from statistical severity and clinical rule matches.
///
/// `matches` must already be restricted to the endpoint and sex at hand.
/// When several rules reach the same highest severity the first one listed
/// is recorded as the override source.
pub fn synthesize_verdict(
    statistical_severity: Severity,
    treatment_related: bool,
    matches: &[ClinicalRuleMatch],
    not_evaluated: Option<&NotEvaluated>,
) -> Verdict {
    if let Some(annotation) = not_evaluated {
        return Verdict::NotEvaluated {
            reason: annotation.reason.clone(),
        };
    }

    let effective = max_severity(
        std::iter::once(statistical_severity).chain(matches.iter().map(ClinicalRuleMatch::severity)),
    );
    let override_source = if effective > statistical_severity {
        matches
            .iter()
            .find(|rule| rule.severity() == effective)
            .map(|rule| OverrideSource {
                rule_id: rule.rule_id.clone(),
                rule_name: rule.rule_name.clone(),
            })
    } else {
        None
    };

    if let Some(source) = &override_source {
        debug!(
            rule = %source.rule_id,
            from = ?statistical_severity,
            to = ?effective,
            "clinical override applied"
        );
    }

    let (category, label) = describe(treatment_related, effective, override_source.as_ref());
    Verdict::Evaluated(Assessment {
        treatment_related,
        statistical_severity,
        effective_severity: effective,
        override_source,
        category,
        label,
    })
}

fn describe(
    treatment_related: bool,
    effective: Severity,
    override_source: Option<&OverrideSource>,
) -> (VerdictCategory, String) {
    let suffix = override_source
        .map(|s| format!(" (clinical: {})", s.rule_name))
        .unwrap_or_default();

    match (treatment_related, effective, override_source) {
        (true, Severity::Adverse, _) => (
            VerdictCategory::TreatmentRelatedAdverse,
            format!("Treatment-related / Adverse{}", suffix),
        ),
        (true, Severity::Warning, _) => (
            VerdictCategory::TreatmentRelatedWarning,
            format!("Treatment-related / Warning{}", suffix),
        ),
        (true, Severity::Normal, _) => (
            VerdictCategory::TreatmentRelatedNonAdverse,
            "Treatment-related / Non-adverse".to_string(),
        ),
        (false, severity, Some(source)) => {
            let category = if severity == Severity::Adverse {
                VerdictCategory::ClinicalAdverse
            } else {
                VerdictCategory::ClinicalWarning
            };
            (
                category,
                format!(
                    "Clinical: {} / {} (not statistically treatment-related)",
                    source.rule_name,
                    severity.label()
                ),
            )
        }
        (false, Severity::Normal, None) => (
            VerdictCategory::NotTreatmentRelated,
            "Not treatment-related".to_string(),
        ),
        (false, severity, None) => (
            VerdictCategory::NotTreatmentRelated,
            format!("Not treatment-related / {}", severity.label()),
        ),
    }
}

/// Per-sex verdicts for one endpoint, kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SexVerdicts {
    pub verdicts: IndexMap<Sex, Verdict>,
}

/// Sexes disagree on which clinical rule (if any) drove the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SexDivergence {
    /// Override rule id per sex; `None` where no rule raised severity.
    pub override_by_sex: IndexMap<Sex, Option<String>>,
}

impl SexVerdicts {
    pub fn get(&self, sex: Sex) -> Option<&Verdict> {
        self.verdicts.get(&sex)
    }

    /// Report when the evaluated sexes disagree on the override rule.
    pub fn divergence(&self) -> Option<SexDivergence> {
        let override_by_sex: IndexMap<Sex, Option<String>> = self
            .verdicts
            .iter()
            .filter(|(_, v)| v.is_evaluated())
            .map(|(sex, v)| (*sex, v.override_source().map(|s| s.rule_id.clone())))
            .collect();

        let mut values = override_by_sex.values();
        let first = values.next()?;
        if values.all(|v| v == first) {
            None
        } else {
            Some(SexDivergence { override_by_sex })
        }
    }
}

/// Synthesize one verdict per sex.
///
/// A rule match restricted to one sex only applies to that sex; results are
/// never merged across sexes.
pub fn synthesize_verdicts_by_sex(
    statistical: &IndexMap<Sex, StatisticalAssessment>,
    matches: &[ClinicalRuleMatch],
    not_evaluated: Option<&NotEvaluated>,
) -> SexVerdicts {
    let verdicts = statistical
        .iter()
        .map(|(sex, assessment)| {
            let applicable: Vec<ClinicalRuleMatch> = matches
                .iter()
                .filter(|m| m.applies_to(*sex))
                .cloned()
                .collect();
            let verdict = synthesize_verdict(
                assessment.severity,
                assessment.treatment_related,
                &applicable,
                not_evaluated,
            );
            (*sex, verdict)
        })
        .collect();

    SexVerdicts { verdicts }
}
