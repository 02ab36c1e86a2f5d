//! Clinical-threshold rule matches, indexed by canonical analyte code.
//!
//! Endpoint identity is canonicalized once through [`AnalyteResolver`];
//! catalog lookups are exact on the canonical code.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{ClinicalTier, EndpointStatistics, Severity, Sex};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

/// Bracketed unit or qualifier, e.g. "ALT (U/L)" or "Weight [g]".
static QUALIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\(\[][^\)\]]*[\)\]]").unwrap());

/// Bare test codes such as "ALT", "TBILI", "K".
static TEST_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,7}$").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Analyte names mapped to their canonical codes.
static SYNONYMS: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("alanine aminotransferase", "ALT"),
        ("aspartate aminotransferase", "AST"),
        ("alkaline phosphatase", "ALP"),
        ("gamma glutamyltransferase", "GGT"),
        ("gamma-glutamyltransferase", "GGT"),
        ("total bilirubin", "TBILI"),
        ("bilirubin", "TBILI"),
        ("blood urea nitrogen", "BUN"),
        ("urea nitrogen", "BUN"),
        ("creatinine", "CREAT"),
        ("hemoglobin", "HGB"),
        ("haemoglobin", "HGB"),
        ("hematocrit", "HCT"),
        ("erythrocytes", "RBC"),
        ("red blood cells", "RBC"),
        ("leukocytes", "WBC"),
        ("white blood cells", "WBC"),
        ("neutrophils", "NEUT"),
        ("platelets", "PLAT"),
        ("potassium", "K"),
        ("sodium", "SODIUM"),
        ("cholesterol", "CHOL"),
        ("glucose", "GLUC"),
    ])
});

/// Canonical analyte identity (upper-case test code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AnalyteCode(String);

impl AnalyteCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AnalyteCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<AnalyteCode> for String {
    fn from(code: AnalyteCode) -> Self {
        code.0
    }
}

impl fmt::Display for AnalyteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes endpoint identity to an analyte code.
#[derive(Debug, Clone, Default)]
pub struct AnalyteResolver {
    /// Study-specific synonyms, consulted before the built-in table.
    extra: IndexMap<String, AnalyteCode>,
}

impl AnalyteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a study-specific synonym.
    pub fn with_synonym(mut self, name: impl AsRef<str>, code: impl AsRef<str>) -> Self {
        self.extra
            .insert(normalize_name(name.as_ref()), AnalyteCode::new(code));
        self
    }

    /// Resolve an endpoint. An explicit test code always wins over the label.
    pub fn resolve(&self, stats: &EndpointStatistics) -> Option<AnalyteCode> {
        match stats.test_code() {
            Some(code) if !code.trim().is_empty() => Some(AnalyteCode::new(code)),
            _ => self.resolve_label(stats.label()),
        }
    }

    /// Resolve a free-text endpoint label.
    pub fn resolve_label(&self, label: &str) -> Option<AnalyteCode> {
        let stripped = QUALIFIER.replace_all(label, "");
        let name = normalize_name(&stripped);
        if name.is_empty() {
            return None;
        }

        if let Some(code) = self.extra.get(&name) {
            return Some(code.clone());
        }
        if let Some(code) = SYNONYMS.get(name.as_str()) {
            return Some(AnalyteCode::new(code));
        }

        let trimmed = stripped.trim();
        TEST_CODE
            .is_match(trimmed)
            .then(|| AnalyteCode::new(trimmed))
    }
}

fn normalize_name(name: &str) -> String {
    WHITESPACE
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

/// One clinical rule firing for an analyte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRuleMatch {
    pub rule_id: String,
    pub rule_name: String,
    pub tier: ClinicalTier,
    /// Fold change versus control that triggered the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_change: Option<f64>,
    /// Restricts the match to one sex; `None` applies to both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

impl ClinicalRuleMatch {
    pub fn new(rule_id: impl Into<String>, rule_name: impl Into<String>, tier: ClinicalTier) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_name: rule_name.into(),
            tier,
            fold_change: None,
            sex: None,
        }
    }

    pub fn with_fold_change(mut self, fold_change: f64) -> Self {
        self.fold_change = Some(fold_change);
        self
    }

    pub fn for_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    /// Severity the rule's tier maps to.
    pub fn severity(&self) -> Severity {
        self.tier.severity()
    }

    pub fn applies_to(&self, sex: Sex) -> bool {
        self.sex.is_none_or(|s| s == sex)
    }
}

/// Clinical rule matches keyed by canonical analyte code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicalCatalog {
    matches: IndexMap<AnalyteCode, Vec<ClinicalRuleMatch>>,
}

impl ClinicalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match for an analyte.
    pub fn insert(&mut self, analyte: AnalyteCode, rule: ClinicalRuleMatch) {
        self.matches.entry(analyte).or_default().push(rule);
    }

    /// Matches for an analyte that apply to the given sex, in catalog order.
    pub fn matches_for(&self, analyte: &AnalyteCode, sex: Sex) -> Vec<ClinicalRuleMatch> {
        self.matches
            .get(analyte)
            .map(|rules| rules.iter().filter(|r| r.applies_to(sex)).cloned().collect())
            .unwrap_or_default()
    }

    /// All matches for an analyte regardless of sex.
    pub fn all_matches(&self, analyte: &AnalyteCode) -> &[ClinicalRuleMatch] {
        self.matches.get(analyte).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
