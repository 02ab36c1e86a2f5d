//! Organ-level NOAEL: the most conservative member endpoint wins.

use serde::{Deserialize, Serialize};

use crate::model::{EndpointKey, EndpointStatistics};

use super::deriver::{derive_noael, NoaelResult};

/// One member endpoint's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberNoael {
    pub endpoint: EndpointKey,
    pub noael: NoaelResult,
}

/// Organ-level NOAEL with the endpoint that determined it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganNoael {
    pub noael: NoaelResult,
    /// Endpoint with the minimum ordering key. `None` when no member has
    /// pairwise statistics.
    pub driving_endpoint: Option<EndpointKey>,
    /// Every member in discovery order, including those without statistics.
    pub members: Vec<MemberNoael>,
}

impl OrganNoael {
    /// Fold already-derived member results.
    ///
    /// Ties on the ordering key go to the first member encountered.
    pub fn from_members(members: Vec<MemberNoael>) -> Self {
        let mut driver: Option<&MemberNoael> = None;
        for member in members.iter().filter(|m| m.noael.key.is_comparable()) {
            match driver {
                Some(current) if current.noael.key <= member.noael.key => {}
                _ => driver = Some(member),
            }
        }

        let (noael, driving_endpoint) = match driver {
            Some(m) => (m.noael.clone(), Some(m.endpoint.clone())),
            None => (NoaelResult::no_stats(), None),
        };

        Self {
            noael,
            driving_endpoint,
            members,
        }
    }
}

/// Derive the NOAEL of an organ from its member endpoints.
pub fn derive_organ_noael<'a>(
    endpoints: impl IntoIterator<Item = &'a EndpointStatistics>,
) -> OrganNoael {
    let members = endpoints
        .into_iter()
        .map(|stats| MemberNoael {
            endpoint: stats.key().clone(),
            noael: derive_noael(stats),
        })
        .collect();
    OrganNoael::from_members(members)
}
