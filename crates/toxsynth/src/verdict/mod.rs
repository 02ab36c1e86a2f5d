//! Treatment-relatedness and severity verdicts.
//!
//! Statistical severity is merged with clinical-threshold rule matches; the
//! effective severity can only be raised by a rule, never lowered.

mod annotations;
mod clinical;
mod synthesizer;

pub use annotations::{AnnotationStore, NotEvaluated};
pub use clinical::{AnalyteCode, AnalyteResolver, ClinicalCatalog, ClinicalRuleMatch};
pub use synthesizer::{
    synthesize_verdict, synthesize_verdicts_by_sex, Assessment, OverrideSource, SexDivergence,
    SexVerdicts, StatisticalAssessment, Verdict, VerdictCategory,
};
