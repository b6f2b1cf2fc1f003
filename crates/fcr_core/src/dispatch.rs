//! Dispatch policies: given a queued incident and the deployable officers,
//! pick who attends.
//!
//! Candidates are presented in ascending collar-number order (see
//! [`crate::fcr::AvailabilityIndex`]); policies must preserve that order as
//! their tie-break so assignment is deterministic.

use bevy_ecs::prelude::{Entity, Resource};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};

use crate::routing::{TravelEstimate, TravelTimeProvider};

/// A deployable officer offered to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchCandidate {
    pub collar: u32,
    pub entity: Entity,
    pub location: CellIndex,
}

/// The policy's pick, with the travel estimate that justified it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub candidate: DispatchCandidate,
    pub estimate: TravelEstimate,
}

pub trait DispatchPolicy: Send + Sync {
    /// Pick an officer for the incident, or `None` when no candidate has a
    /// usable travel estimate. Candidates with failed estimates are skipped,
    /// never fatal.
    fn select(
        &self,
        incident_location: CellIndex,
        candidates: &[DispatchCandidate],
        travel: &dyn TravelTimeProvider,
    ) -> Option<Selection>;

    fn name(&self) -> &'static str;
}

#[derive(Resource)]
pub struct DispatchPolicyResource(pub Box<dyn DispatchPolicy>);

/// Policy selector for scenario parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicyKind {
    #[default]
    NearestAvailable,
    FirstAvailable,
}

pub fn build_dispatch_policy(kind: DispatchPolicyKind) -> Box<dyn DispatchPolicy> {
    match kind {
        DispatchPolicyKind::NearestAvailable => Box::new(NearestAvailable),
        DispatchPolicyKind::FirstAvailable => Box::new(FirstAvailable),
    }
}

/// Minimises estimated travel time; ties go to the lowest collar number by
/// virtue of candidate order and the strict comparison.
pub struct NearestAvailable;

impl DispatchPolicy for NearestAvailable {
    fn select(
        &self,
        incident_location: CellIndex,
        candidates: &[DispatchCandidate],
        travel: &dyn TravelTimeProvider,
    ) -> Option<Selection> {
        let mut best: Option<Selection> = None;
        for &candidate in candidates {
            let estimate = match travel.estimate(candidate.location, incident_location) {
                Ok(estimate) => estimate,
                Err(e) => {
                    tracing::debug!(collar = candidate.collar, error = %e, "skipping candidate without route");
                    continue;
                }
            };
            let better = match best {
                Some(ref current) => estimate.duration_ms < current.estimate.duration_ms,
                None => true,
            };
            if better {
                best = Some(Selection {
                    candidate,
                    estimate,
                });
            }
        }
        best
    }

    fn name(&self) -> &'static str {
        "nearest_available"
    }
}

/// Takes the first candidate with a usable estimate, ignoring distance.
/// Useful as a sweep baseline.
pub struct FirstAvailable;

impl DispatchPolicy for FirstAvailable {
    fn select(
        &self,
        incident_location: CellIndex,
        candidates: &[DispatchCandidate],
        travel: &dyn TravelTimeProvider,
    ) -> Option<Selection> {
        for &candidate in candidates {
            match travel.estimate(candidate.location, incident_location) {
                Ok(estimate) => {
                    return Some(Selection {
                        candidate,
                        estimate,
                    })
                }
                Err(e) => {
                    tracing::debug!(collar = candidate.collar, error = %e, "skipping candidate without route");
                }
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "first_available"
    }
}
