//! NOAEL/LOAEL derivation and its organ- and study-level roll-ups.
//!
//! Every level resolves to the most conservative (lowest) ordering key of
//! its members. Endpoints without pairwise statistics are listed but never
//! drive a minimum.

mod deriver;
mod organ;
mod study;

pub use deriver::{derive_noael, DoseRef, NoaelKey, NoaelResult, NoaelStatus, ABOVE_RANGE_OFFSET};
pub use organ::{derive_organ_noael, MemberNoael, OrganNoael};
pub use study::{resolve_study_noael, NoaelSource, StudyNoael, StudyNoaelRow, StudyNoaelTable};
