//! Study-level facade running every component and assembling the report.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{StructuralKey, SynthesisCache};
use crate::confidence::{decompose_confidence, ConfidenceResult};
use crate::error::{Result, SynthError};
use crate::evidence::{
    aggregate_organ_evidence, rail_stats, rank_organs, EndpointEvidence, OrganEvidenceSummary,
    RailStats, SignalScorer, SignalWeights,
};
use crate::input::{EndpointRecord, StudyInput};
use crate::model::{CohortFilter, EndpointKey, Sex};
use crate::noael::{
    derive_noael, derive_organ_noael, resolve_study_noael, NoaelResult, OrganNoael, StudyNoael,
};
use crate::pattern::{PatternClassifier, PatternConfig, PatternResult};
use crate::verdict::{
    synthesize_verdict, AnalyteCode, AnalyteResolver, AnnotationStore, ClinicalCatalog,
    ClinicalRuleMatch, SexDivergence, SexVerdicts, Verdict,
};

/// Organ name used for endpoints that carry none.
pub const UNASSIGNED_ORGAN: &str = "unassigned";

/// Configuration for a synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub signal: SignalWeights,
    pub cohort: CohortFilter,
    /// See [`PatternConfig::threshold_step_fraction`].
    pub threshold_step_fraction: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            signal: SignalWeights::default(),
            cohort: CohortFilter::default(),
            threshold_step_fraction: PatternConfig::default().threshold_step_fraction,
        }
    }
}

impl SynthesisConfig {
    /// Load overrides from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| SynthError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cohort(mut self, cohort: CohortFilter) -> Self {
        self.cohort = cohort;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.signal.validate()?;
        let fraction = self.threshold_step_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(SynthError::Config(format!(
                "threshold_step_fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        Ok(())
    }

    fn pattern(&self) -> PatternConfig {
        PatternConfig {
            threshold_step_fraction: self.threshold_step_fraction,
        }
    }
}

/// All component outputs for one endpoint/sex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSynthesis {
    pub key: EndpointKey,
    pub organ: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyte: Option<AnalyteCode>,
    pub pattern: PatternResult,
    pub noael: NoaelResult,
    pub verdict: Verdict,
    pub signal_score: f64,
    pub confidence: ConfidenceResult,
}

/// Endpoint whose sexes disagree on the clinical override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDivergence {
    pub label: String,
    #[serde(flatten)]
    pub divergence: SexDivergence,
}

/// Everything produced for one study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub study_id: String,
    pub generated_at: DateTime<Utc>,
    pub cohort: CohortFilter,
    pub endpoints: Vec<EndpointSynthesis>,
    /// Organ summaries per (organ, sex), in rank order.
    pub organs: Vec<OrganEvidenceSummary>,
    pub rail: IndexMap<Sex, RailStats>,
    pub study_noael: IndexMap<Sex, StudyNoael>,
    pub divergences: Vec<EndpointDivergence>,
}

impl StudyReport {
    /// Ranked organ summaries for one sex.
    pub fn organs_for(&self, sex: Sex) -> impl Iterator<Item = &OrganEvidenceSummary> {
        self.organs.iter().filter(move |o| o.sex == sex)
    }

    pub fn endpoint(&self, key: &EndpointKey) -> Option<&EndpointSynthesis> {
        self.endpoints.iter().find(|e| &e.key == key)
    }
}

/// Runs the full synthesis for endpoints and studies.
pub struct Synthesizer {
    config: SynthesisConfig,
    classifier: PatternClassifier,
    scorer: SignalScorer,
    resolver: AnalyteResolver,
}

impl Synthesizer {
    /// Create a synthesizer with default configuration.
    pub fn new() -> Self {
        Self {
            config: SynthesisConfig::default(),
            classifier: PatternClassifier::new(),
            scorer: SignalScorer::new(),
            resolver: AnalyteResolver::new(),
        }
    }

    /// Create with a validated custom configuration.
    pub fn with_config(config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: PatternClassifier::with_config(config.pattern()),
            scorer: SignalScorer::with_weights(config.signal.clone())?,
            resolver: AnalyteResolver::new(),
            config,
        })
    }

    /// Use a resolver with study-specific analyte synonyms.
    pub fn with_resolver(mut self, resolver: AnalyteResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Run all five components for one endpoint under the configured cohort.
    pub fn synthesize_endpoint(
        &self,
        record: &EndpointRecord,
        clinical: &ClinicalCatalog,
        annotations: &AnnotationStore,
    ) -> EndpointSynthesis {
        let inputs = self.endpoint_inputs(record, clinical);
        self.compute(record, &inputs, annotations)
    }

    /// Same as [`synthesize_endpoint`](Self::synthesize_endpoint), reusing a
    /// cached result when every input is structurally unchanged.
    pub fn synthesize_endpoint_cached(
        &self,
        cache: &mut SynthesisCache<EndpointSynthesis>,
        record: &EndpointRecord,
        clinical: &ClinicalCatalog,
        annotations: &AnnotationStore,
    ) -> Result<EndpointSynthesis> {
        let inputs = self.endpoint_inputs(record, clinical);
        let stats = record.select(self.config.cohort);
        let key = StructuralKey::of(&(
            stats,
            self.config.cohort,
            record.assessment_for(self.config.cohort),
            &record.caveats,
            &inputs.analyte,
            &inputs.matches,
            annotations.get(stats.label()),
            &self.config,
        ))?;
        Ok(cache.get_or_compute(key, || self.compute(record, &inputs, annotations)))
    }

    /// Synthesize a whole study.
    pub fn run(&self, input: &StudyInput) -> StudyReport {
        let endpoints = input
            .endpoints
            .iter()
            .map(|record| self.synthesize_endpoint(record, &input.clinical, &input.annotations))
            .collect();
        self.assemble(input, endpoints)
    }

    /// Synthesize a whole study through a caller-owned cache.
    pub fn run_cached(
        &self,
        input: &StudyInput,
        cache: &mut SynthesisCache<EndpointSynthesis>,
    ) -> Result<StudyReport> {
        let endpoints = input
            .endpoints
            .iter()
            .map(|record| {
                self.synthesize_endpoint_cached(cache, record, &input.clinical, &input.annotations)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.assemble(input, endpoints))
    }

    fn endpoint_inputs(&self, record: &EndpointRecord, clinical: &ClinicalCatalog) -> EndpointInputs {
        let stats = record.select(self.config.cohort);
        let analyte = self.resolver.resolve(stats);
        let matches = analyte
            .as_ref()
            .map(|code| clinical.matches_for(code, stats.sex()))
            .unwrap_or_default();
        EndpointInputs { analyte, matches }
    }

    fn compute(
        &self,
        record: &EndpointRecord,
        inputs: &EndpointInputs,
        annotations: &AnnotationStore,
    ) -> EndpointSynthesis {
        let stats = record.select(self.config.cohort);
        let assessment = record.assessment_for(self.config.cohort);

        let pattern = self.classifier.classify(stats);
        let noael = derive_noael(stats);
        let verdict = synthesize_verdict(
            assessment.severity,
            assessment.treatment_related,
            &inputs.matches,
            annotations.get(stats.label()),
        );
        let signal_score = self
            .scorer
            .score_endpoint(stats, verdict.is_treatment_related());
        let confidence = decompose_confidence(stats, &pattern, &verdict, &record.caveats);

        EndpointSynthesis {
            key: stats.key().clone(),
            organ: stats.organ().unwrap_or(UNASSIGNED_ORGAN).to_string(),
            domain: stats.domain().to_string(),
            analyte: inputs.analyte.clone(),
            pattern,
            noael,
            verdict,
            signal_score,
            confidence,
        }
    }

    fn assemble(&self, input: &StudyInput, endpoints: Vec<EndpointSynthesis>) -> StudyReport {
        let cohort = self.config.cohort;

        // Organ groups keyed by (organ, sex); sexes are never merged.
        let mut groups: IndexMap<(&str, Sex), Vec<usize>> = IndexMap::new();
        for (idx, synthesis) in endpoints.iter().enumerate() {
            groups
                .entry((synthesis.organ.as_str(), synthesis.key.sex))
                .or_default()
                .push(idx);
        }

        let mut summaries = Vec::with_capacity(groups.len());
        let mut organ_noaels: IndexMap<Sex, Vec<(&str, OrganNoael)>> = IndexMap::new();
        for ((organ, sex), members) in &groups {
            let evidence: Vec<EndpointEvidence<'_>> = members
                .iter()
                .map(|&idx| EndpointEvidence {
                    statistics: input.endpoints[idx].select(cohort),
                    verdict: &endpoints[idx].verdict,
                    signal_score: endpoints[idx].signal_score,
                })
                .collect();
            summaries.push(aggregate_organ_evidence(organ, *sex, &evidence));
            let organ_noael = derive_organ_noael(evidence.iter().map(|e| e.statistics));
            organ_noaels.entry(*sex).or_default().push((*organ, organ_noael));
        }

        let mut sexes: IndexSet<Sex> = endpoints.iter().map(|e| e.key.sex).collect();
        sexes.extend(input.study_noael.keys().copied());

        let mut rail = IndexMap::new();
        let mut study_noael = IndexMap::new();
        for &sex in &sexes {
            let of_sex: Vec<OrganEvidenceSummary> =
                summaries.iter().filter(|s| s.sex == sex).cloned().collect();
            rail.insert(sex, rail_stats(&of_sex));

            let organs: Vec<(&str, &OrganNoael)> = organ_noaels
                .get(&sex)
                .map(|list| list.iter().map(|(organ, noael)| (*organ, noael)).collect())
                .unwrap_or_default();
            study_noael.insert(sex, resolve_study_noael(sex, organs, &input.study_noael));
        }

        let divergences = divergences(&endpoints);
        let organs: Vec<OrganEvidenceSummary> = rank_organs(&summaries).into_iter().cloned().collect();

        info!(
            study = %input.study_id,
            endpoints = endpoints.len(),
            organs = organs.len(),
            divergences = divergences.len(),
            "study synthesis complete"
        );

        StudyReport {
            study_id: input.study_id.clone(),
            generated_at: Utc::now(),
            cohort,
            endpoints,
            organs,
            rail,
            study_noael,
            divergences,
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

struct EndpointInputs {
    analyte: Option<AnalyteCode>,
    matches: Vec<ClinicalRuleMatch>,
}

fn divergences(endpoints: &[EndpointSynthesis]) -> Vec<EndpointDivergence> {
    let mut by_label: IndexMap<&str, SexVerdicts> = IndexMap::new();
    for synthesis in endpoints {
        by_label
            .entry(synthesis.key.label.as_str())
            .or_insert_with(|| SexVerdicts {
                verdicts: IndexMap::new(),
            })
            .verdicts
            .insert(synthesis.key.sex, synthesis.verdict.clone());
    }
    by_label
        .into_iter()
        .filter_map(|(label, verdicts)| {
            verdicts.divergence().map(|divergence| EndpointDivergence {
                label: label.to_string(),
                divergence,
            })
        })
        .collect()
}
