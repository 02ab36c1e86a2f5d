//! Multi-dimensional confidence in a verdict.

mod decomposer;

pub use decomposer::{
    decompose_confidence, ConfidenceCaveats, ConfidenceDimension, ConfidenceLevel,
    ConfidenceResult, DimensionAssessment, NormalizationCaveat, NormalizationConfound,
    TrendConcordance,
};
