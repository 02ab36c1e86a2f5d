//! Core data model: dose groups, endpoint statistics, severity scales.

mod dose;
mod endpoint;
mod types;

pub use dose::{DoseGroup, DoseGroupCatalog, DoseValue};
pub use endpoint::{
    CohortFilter, DoseGroupStatRow, EndpointKey, EndpointStatistics, EndpointStatisticsSpec,
};
pub use types::{
    max_severity, ClinicalTier, DataType, Direction, Severity, Sex, SIGNIFICANCE_ALPHA,
    STRONG_SIGNIFICANCE_ALPHA,
};
