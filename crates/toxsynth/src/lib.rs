//! toxsynth: evidence synthesis for nonclinical toxicology studies.
//!
//! Turns per-dose-group statistics for each endpoint and sex into the
//! judgements a study report needs: the shape of the dose-response, the
//! NOAEL/LOAEL, a treatment-relatedness and severity verdict with clinical
//! overrides, a normalized signal score rolled up per organ, and a
//! dimension-by-dimension confidence breakdown.
//!
//! # Core Principles
//!
//! - **Pure**: every component is a function of immutable input snapshots
//! - **Conservative**: aggregation keeps the lowest NOAEL and the worst severity
//! - **Per sex**: sex is part of every key; sexes are never merged
//!
//! # Example
//!
//! ```no_run
//! use toxsynth::{StudyInput, Synthesizer};
//!
//! let input = StudyInput::load("study.json").unwrap();
//! let report = Synthesizer::new().run(&input);
//!
//! for organ in &report.organs {
//!     println!("{} ({}): {:.2}", organ.organ, organ.sex, organ.max_signal_score);
//! }
//! ```

pub mod cache;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod format;
pub mod input;
pub mod model;
pub mod noael;
pub mod pattern;
pub mod verdict;

pub use cache::{StructuralKey, SynthesisCache};
pub use confidence::{decompose_confidence, ConfidenceLevel, ConfidenceResult};
pub use engine::{EndpointSynthesis, StudyReport, SynthesisConfig, Synthesizer};
pub use error::{Result, SynthError};
pub use evidence::{aggregate_organ_evidence, compute_signal_score, OrganEvidenceSummary};
pub use format::format_noael;
pub use input::{EndpointRecord, StudyInput};
pub use model::{CohortFilter, DataType, DoseGroupStatRow, EndpointStatistics, Severity, Sex};
pub use noael::{derive_noael, derive_organ_noael, NoaelResult};
pub use pattern::{classify_pattern, Pattern, PatternResult};
pub use verdict::{synthesize_verdict, Verdict};
