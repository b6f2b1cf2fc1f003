//! Shared test setup: canonical cells, stub providers, and a minimally
//! provisioned world.

use bevy_ecs::prelude::{Entity, World};
use h3o::CellIndex;
use rand::rngs::StdRng;

use crate::clock::SimulationClock;
use crate::dispatch::{build_dispatch_policy, DispatchPolicyKind, DispatchPolicyResource};
use crate::distributions::ServiceDurations;
use crate::ecs::{IncidentKind, Officer, Position, ShiftKind, Station};
use crate::error::{RoutingError, SamplingError, SimulationFault};
use crate::fcr::{AvailabilityIndex, PendingQueue};
use crate::frequency::{IncidentFrequencyResource, WeeklyRateTable};
use crate::generator::IncidentGenerator;
use crate::profiling::EventMetrics;
use crate::rng::SimRng;
use crate::routing::{TravelEstimate, TravelTimeProvider, TravelTimeResource};
use crate::sampling::{LocationSampler, LocationSamplerResource};
use crate::scenario::{MaxIncidentWait, ReturnToPatrol, SimulationHorizonMs};
use crate::telemetry::{EventLog, FcrTelemetry, SimSnapshotConfig, SimSnapshots};

/// A standard valid H3 cell at resolution 9, shared across test files.
pub const TEST_CELL: u64 = 0x8a1fb46622dffff;

pub fn test_cell() -> CellIndex {
    CellIndex::try_from(TEST_CELL).expect("TEST_CELL should be a valid H3 cell")
}

pub fn test_neighbor_cell() -> CellIndex {
    test_cell()
        .grid_disk::<Vec<_>>(1)
        .into_iter()
        .find(|c| *c != test_cell())
        .expect("test cell should have neighbors")
}

/// A cell at exactly grid distance `k` from the test cell.
pub fn test_cell_at(k: u32) -> CellIndex {
    test_cell()
        .grid_disk::<Vec<_>>(k)
        .into_iter()
        .find(|c| test_cell().grid_distance(*c) == Ok(k as i32))
        .expect("test cell should have cells at the requested ring")
}

/// Travel provider returning the same estimate for every distinct pair.
pub struct FixedTravelTime(pub u64);

impl TravelTimeProvider for FixedTravelTime {
    fn estimate(&self, from: CellIndex, to: CellIndex) -> Result<TravelEstimate, RoutingError> {
        if from == to {
            return Ok(TravelEstimate::ZERO);
        }
        Ok(TravelEstimate {
            duration_ms: self.0,
            distance_m: self.0 as f64,
        })
    }
}

/// Travel provider that never finds a route.
pub struct FailingTravelTime;

impl TravelTimeProvider for FailingTravelTime {
    fn estimate(&self, _: CellIndex, _: CellIndex) -> Result<TravelEstimate, RoutingError> {
        Err(RoutingError::NoRouteData {
            origin: 0,
            destination: 0,
        })
    }
}

/// Sampler returning the same cell for every kind.
pub struct FixedSampler(pub CellIndex);

impl LocationSampler for FixedSampler {
    fn sample(&self, _: IncidentKind, _: &mut StdRng) -> Result<CellIndex, SamplingError> {
        Ok(self.0)
    }
}

/// Sampler that always exhausts its retries.
pub struct FailingSampler;

impl LocationSampler for FailingSampler {
    fn sample(&self, _: IncidentKind, _: &mut StdRng) -> Result<CellIndex, SamplingError> {
        Err(SamplingError::Exhausted { attempts: 1 })
    }
}

/// Create a world with every resource the systems expect: zero travel time,
/// incidents pinned to [`test_cell`], no age-out, and a week-long horizon.
pub fn create_test_world() -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimRng::from_seed(42));
    world.insert_resource(SimulationFault::default());
    world.insert_resource(PendingQueue::default());
    world.insert_resource(AvailabilityIndex::default());
    world.insert_resource(EventLog::default());
    world.insert_resource(FcrTelemetry::default());
    world.insert_resource(EventMetrics::default());
    world.insert_resource(SimSnapshotConfig::default());
    world.insert_resource(SimSnapshots::default());
    world.insert_resource(SimulationHorizonMs(7 * crate::clock::ONE_DAY_MS));
    world.insert_resource(ReturnToPatrol(false));
    world.insert_resource(MaxIncidentWait(None));
    world.insert_resource(DispatchPolicyResource(build_dispatch_policy(
        DispatchPolicyKind::NearestAvailable,
    )));
    world.insert_resource(TravelTimeResource(Box::new(FixedTravelTime(0))));
    world.insert_resource(LocationSamplerResource(Box::new(FixedSampler(test_cell()))));
    world.insert_resource(IncidentFrequencyResource(Box::new(
        WeeklyRateTable::uniform(6.0),
    )));
    world.insert_resource(IncidentGenerator::default());
    world.insert_resource(ServiceDurations::default());
    world
}

/// Spawn a station at `cell`.
pub fn spawn_station(world: &mut World, id: u32, cell: CellIndex) -> Entity {
    world.spawn((Station { id }, Position(cell))).id()
}

/// Spawn an on-duty officer at the station and register them as available.
pub fn spawn_available_officer(
    world: &mut World,
    collar: u32,
    station: Entity,
    cell: CellIndex,
) -> Entity {
    let mut officer = Officer::new(collar, station, cell, ShiftKind::Early);
    officer.sign_on().expect("fresh officer signs on");
    let entity = world.spawn((officer, Position(cell))).id();
    world
        .resource_mut::<AvailabilityIndex>()
        .register(collar, entity);
    entity
}
