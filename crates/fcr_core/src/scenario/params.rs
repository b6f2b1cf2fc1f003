use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::{ONE_DAY_MS, ONE_MIN_MS};
use crate::dispatch::DispatchPolicyKind;
use crate::distributions::ServiceDurations;
use crate::error::ConfigError;
use crate::generator::KindMix;
use crate::routing::TravelTimeKind;
use crate::sampling::BoundingBox;

/// Default epoch: 2023-01-02 00:00 UTC, a Monday, so sim time 0 starts a
/// clean calendar week.
pub const DEFAULT_EPOCH_MS: i64 = 1_672_617_600_000;

/// Simulation horizon in milliseconds. The runner stops processing once the
/// next event would be at or after this timestamp.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationHorizonMs(pub u64);

/// Whether officers go out on patrol after returning from an incident,
/// instead of waiting at the station.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct ReturnToPatrol(pub bool);

/// Maximum time an incident may sit queued before it is cancelled.
/// `None` disables age-out entirely.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct MaxIncidentWait(pub Option<u64>);

/// Parameters for building a simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub seed: u64,
    /// Real-world time corresponding to simulation time 0.
    pub epoch_ms: i64,
    pub horizon_ms: u64,
    pub num_stations: usize,
    /// Officers per station per shift pattern.
    pub officers_per_shift: usize,
    /// All-week mean incident arrival rate.
    pub incidents_per_hour: f64,
    pub bounds: BoundingBox,
    pub max_wait_ms: Option<u64>,
    pub dispatch_policy: DispatchPolicyKind,
    pub travel: TravelTimeKind,
    pub kind_mix: KindMix,
    pub service_durations: ServiceDurations,
    pub return_to_patrol: bool,
    /// Stop creating incidents after this sim time; `None` runs to horizon.
    pub incident_window_ms: Option<u64>,
    pub max_incidents: Option<u64>,
    pub snapshot_interval_ms: u64,
    pub max_snapshots: usize,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            seed: 0,
            epoch_ms: DEFAULT_EPOCH_MS,
            horizon_ms: ONE_DAY_MS,
            num_stations: 4,
            officers_per_shift: 3,
            incidents_per_hour: 6.0,
            bounds: BoundingBox::hertfordshire(),
            max_wait_ms: None,
            dispatch_policy: DispatchPolicyKind::default(),
            travel: TravelTimeKind::default(),
            kind_mix: KindMix::default(),
            service_durations: ServiceDurations::default(),
            return_to_patrol: false,
            incident_window_ms: None,
            max_incidents: None,
            snapshot_interval_ms: 5 * ONE_MIN_MS,
            max_snapshots: 2_000,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_epoch_ms(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    pub fn with_horizon_hours(mut self, hours: u64) -> Self {
        self.horizon_ms = hours * 60 * 60 * 1000;
        self
    }

    pub fn with_stations(mut self, num_stations: usize, officers_per_shift: usize) -> Self {
        self.num_stations = num_stations;
        self.officers_per_shift = officers_per_shift;
        self
    }

    pub fn with_incidents_per_hour(mut self, rate: f64) -> Self {
        self.incidents_per_hour = rate;
        self
    }

    pub fn with_max_wait_minutes(mut self, minutes: u64) -> Self {
        self.max_wait_ms = Some(minutes * ONE_MIN_MS);
        self
    }

    pub fn with_dispatch_policy(mut self, policy: DispatchPolicyKind) -> Self {
        self.dispatch_policy = policy;
        self
    }

    pub fn with_return_to_patrol(mut self, enabled: bool) -> Self {
        self.return_to_patrol = enabled;
        self
    }

    pub fn with_max_incidents(mut self, max_incidents: u64) -> Self {
        self.max_incidents = Some(max_incidents);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_ms == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.num_stations == 0 {
            return Err(ConfigError::NoStations);
        }
        if self.officers_per_shift == 0 {
            return Err(ConfigError::EmptyRoster);
        }
        self.bounds.validate()?;
        if !(self.incidents_per_hour >= 0.0) {
            return Err(ConfigError::NegativeRate {
                rate_per_hour: self.incidents_per_hour,
            });
        }
        if !self.kind_mix.is_valid() {
            return Err(ConfigError::InvalidKindMix);
        }
        if self.max_wait_ms == Some(0) {
            return Err(ConfigError::ZeroMaxWait);
        }
        Ok(())
    }
}
