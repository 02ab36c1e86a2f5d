//! Signal scores and their organ-level roll-ups.

mod organ;
mod ranking;
mod signal;

pub use organ::{aggregate_organ_evidence, DominantDirection, EndpointEvidence, OrganEvidenceSummary};
pub use ranking::{rail_stats, rank_organs, RailStats};
pub use signal::{
    compute_signal_score, SignalInput, SignalScorer, SignalWeights, LARGE_EFFECT, MODERATE_EFFECT,
};
