//! Error taxonomy for the dispatch core.
//!
//! Recoverable provider-level failures ([`SamplingError`], [`RoutingError`])
//! are absorbed at the incident-creation / dispatch boundary and logged.
//! Invariant violations ([`TransitionFault`]) are never recovered locally:
//! the runner halts the run with full context, since continuing would produce
//! unverifiable results.

use bevy_ecs::prelude::{Entity, Resource};
use thiserror::Error;

/// Invalid run parameters; fatal at setup, the run does not start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("horizon must be > 0 ms")]
    ZeroHorizon,
    #[error("at least one station is required")]
    NoStations,
    #[error("station roster is empty (officers_per_shift == 0)")]
    EmptyRoster,
    #[error("invalid latitude bounds: [{lat_min}, {lat_max}]")]
    InvalidLatBounds { lat_min: f64, lat_max: f64 },
    #[error("invalid longitude bounds: [{lng_min}, {lng_max}]")]
    InvalidLngBounds { lng_min: f64, lng_max: f64 },
    #[error("incident rate must be >= 0 (got {rate_per_hour})")]
    NegativeRate { rate_per_hour: f64 },
    #[error("incident kind mix weights must be non-negative and sum to > 0")]
    InvalidKindMix,
    #[error("max incident wait must be > 0 ms when configured")]
    ZeroMaxWait,
}

/// Location sampling failed after the configured retry bound. The incident
/// creation for that arrival is dropped; the run continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("rejection sampling exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("no weighted cells configured for incident kind {kind}")]
    NoCells { kind: &'static str },
}

/// Travel-time lookup failed for a candidate assignment. The candidate is
/// skipped and the incident stays queued; not fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("no route data between sampled points {origin} and {destination}")]
    NoRouteData { origin: usize, destination: usize },
    #[error("travel provider has no sampled points")]
    EmptySampleSet,
}

/// Operation requested on an incident already in a terminal state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("incident is already terminal ({status}); it cannot be queued")]
    InvalidIncident { status: &'static str },
}

/// A state machine received an event inconsistent with its current state.
/// Raised by the exhaustive transition tables in [`crate::ecs`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid transition from {from} on {event}")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub event: &'static str,
}

/// An [`InvalidTransition`] with full run context, recorded by systems into
/// the [`SimulationFault`] resource and turned into a halt by the runner.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("simulation invariant violated at t={at_ms}ms for {entity:?}: {cause}")]
pub struct TransitionFault {
    pub at_ms: u64,
    pub entity: Entity,
    pub cause: InvalidTransition,
}

/// Fatal-fault mailbox checked by the runner after every processed event.
/// Systems cannot return errors, so they deposit the fault here instead of
/// coercing state.
#[derive(Debug, Default, Resource)]
pub struct SimulationFault(pub Option<TransitionFault>);

impl SimulationFault {
    pub fn raise(&mut self, fault: TransitionFault) {
        // First fault wins; later ones would be downstream noise.
        if self.0.is_none() {
            self.0 = Some(fault);
        }
    }
}

/// Top-level run failure returned by the runner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    InvariantViolated(#[from] TransitionFault),
}
