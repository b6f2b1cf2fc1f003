use bevy_ecs::prelude::World;
use h3o::{LatLng, Resolution};

use crate::clock::SimulationClock;
use crate::dispatch::{build_dispatch_policy, DispatchPolicyResource};
use crate::ecs::{Officer, Position, ShiftKind, Station};
use crate::error::{ConfigError, SimulationFault};
use crate::fcr::{AvailabilityIndex, PendingQueue};
use crate::frequency::{IncidentFrequencyResource, WeeklyRateTable};
use crate::generator::IncidentGenerator;
use crate::profiling::EventMetrics;
use crate::rng::SimRng;
use crate::routing::{build_travel_provider, TravelTimeResource};
use crate::sampling::{LocationSamplerResource, WeightedCellSampler};
use crate::scenario::params::{
    MaxIncidentWait, ReturnToPatrol, ScenarioParams, SimulationHorizonMs,
};
use crate::telemetry::{EventLog, FcrTelemetry, SimSnapshotConfig, SimSnapshots};

const SHIFT_ROTATION: [ShiftKind; 3] = [ShiftKind::Early, ShiftKind::Late, ShiftKind::Night];

/// First collar number issued; kept well clear of station ids.
const FIRST_COLLAR: u32 = 1_001;

fn station_cell(params: &ScenarioParams, index: usize) -> Result<h3o::CellIndex, ConfigError> {
    let bounds = params.bounds;
    let cols = (params.num_stations as f64).sqrt().ceil() as usize;
    let rows = params.num_stations.div_ceil(cols);
    let row = index / cols;
    let col = index % cols;
    let lat = bounds.lat_min
        + (row as f64 + 0.5) / rows as f64 * (bounds.lat_max - bounds.lat_min);
    let lng = bounds.lng_min
        + (col as f64 + 0.5) / cols as f64 * (bounds.lng_max - bounds.lng_min);
    let latlng = LatLng::new(lat, lng).map_err(|_| ConfigError::InvalidLatBounds {
        lat_min: bounds.lat_min,
        lat_max: bounds.lat_max,
    })?;
    Ok(latlng.to_cell(Resolution::Nine))
}

/// Insert every resource a run needs and spawn the station roster.
///
/// Officers spawn off duty; the `SimulationStarted` event signs on whichever
/// shifts cover the start hour.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<(), ConfigError> {
    params.validate()?;

    let mut clock = SimulationClock::default();
    clock.set_epoch_ms(params.epoch_ms);
    world.insert_resource(clock);

    world.insert_resource(SimRng::from_seed(params.seed));
    world.insert_resource(SimulationFault::default());
    world.insert_resource(PendingQueue::default());
    world.insert_resource(AvailabilityIndex::default());
    world.insert_resource(EventLog::default());
    world.insert_resource(FcrTelemetry::default());
    world.insert_resource(EventMetrics::default());
    world.insert_resource(SimSnapshotConfig {
        interval_ms: params.snapshot_interval_ms,
        max_snapshots: params.max_snapshots,
    });
    world.insert_resource(SimSnapshots::default());

    world.insert_resource(SimulationHorizonMs(params.horizon_ms));
    world.insert_resource(ReturnToPatrol(params.return_to_patrol));
    world.insert_resource(MaxIncidentWait(params.max_wait_ms));

    world.insert_resource(DispatchPolicyResource(build_dispatch_policy(
        params.dispatch_policy,
    )));
    world.insert_resource(TravelTimeResource(build_travel_provider(&params.travel)));
    world.insert_resource(LocationSamplerResource(Box::new(
        WeightedCellSampler::hertfordshire_hotspots().with_bounds(params.bounds),
    )));
    world.insert_resource(IncidentFrequencyResource(Box::new(
        WeeklyRateTable::profiled(params.incidents_per_hour),
    )));
    world.insert_resource(
        IncidentGenerator::new(params.kind_mix)
            .with_window(params.incident_window_ms)
            .with_max_incidents(params.max_incidents),
    );
    world.insert_resource(params.service_durations.clone());

    let mut collar = FIRST_COLLAR;
    for station_index in 0..params.num_stations {
        let cell = station_cell(&params, station_index)?;
        let station = world
            .spawn((
                Station {
                    id: station_index as u32,
                },
                Position(cell),
            ))
            .id();
        for shift in SHIFT_ROTATION {
            for _ in 0..params.officers_per_shift {
                world.spawn((Officer::new(collar, station, cell, shift), Position(cell)));
                collar += 1;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::With;

    #[test]
    fn build_spawns_full_roster() {
        let mut world = World::new();
        let params = ScenarioParams::default().with_stations(3, 2);
        build_scenario(&mut world, params).expect("build");

        let stations = world.query::<&Station>().iter(&world).count();
        assert_eq!(stations, 3);

        let officers: Vec<Officer> = world
            .query::<&Officer>()
            .iter(&world)
            .cloned()
            .collect();
        // 3 stations x 3 shifts x 2 officers.
        assert_eq!(officers.len(), 18);

        let mut collars: Vec<u32> = officers.iter().map(|o| o.collar).collect();
        collars.sort_unstable();
        collars.dedup();
        assert_eq!(collars.len(), 18, "collar numbers must be unique");

        for officer in &officers {
            assert_eq!(officer.status, crate::ecs::OfficerStatus::OffDuty);
        }
    }

    #[test]
    fn stations_sit_inside_the_bounds() {
        let mut world = World::new();
        let params = ScenarioParams::default();
        let bounds = params.bounds;
        build_scenario(&mut world, params).expect("build");

        let positions: Vec<Position> = world
            .query_filtered::<&Position, With<Station>>()
            .iter(&world)
            .copied()
            .collect();
        for Position(cell) in positions {
            assert!(bounds.contains(LatLng::from(cell)));
        }
    }

    #[test]
    fn build_rejects_invalid_params() {
        let mut world = World::new();
        let params = ScenarioParams::default().with_stations(0, 1);
        assert_eq!(
            build_scenario(&mut world, params),
            Err(ConfigError::NoStations)
        );
    }
}
