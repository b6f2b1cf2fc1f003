use bevy_ecs::prelude::World;

use fcr_core::clock::{SimulationClock, ONE_HOUR_MS};
use fcr_core::dispatch::DispatchPolicyKind;
use fcr_core::ecs::{Officer, Position, ShiftKind, Station};
use fcr_core::error::ConfigError;
use fcr_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use fcr_core::sampling::BoundingBox;
use fcr_core::scenario::{build_scenario, ScenarioParams, SimulationHorizonMs};
use fcr_core::telemetry::{FcrTelemetry, SimSnapshots};

const MAX_STEPS: usize = 200_000;

#[test]
fn built_scenario_runs_end_to_end() {
    let mut world = World::new();
    let params = ScenarioParams::default()
        .with_seed(11)
        .with_stations(3, 2)
        .with_incidents_per_hour(6.0)
        .with_max_wait_minutes(240)
        .with_horizon_hours(24);
    build_scenario(&mut world, params).expect("valid params");
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS).expect("run completes");
    assert!(steps > 0);

    let clock = world.resource::<SimulationClock>();
    assert!(clock.now() < 24 * ONE_HOUR_MS);

    let telemetry = world.resource::<FcrTelemetry>();
    assert!(telemetry.incidents_reported > 0);
    assert!(telemetry.incidents_resolved > 0);
    assert!(!telemetry.attended.is_empty());
    // Every attended record belongs to a real collar from the roster.
    assert!(telemetry
        .attended
        .iter()
        .all(|r| (1_001..1_001 + 3 * 3 * 2).contains(&r.officer_collar)));

    // Snapshots accumulated over the day.
    assert!(!world.resource::<SimSnapshots>().snapshots.is_empty());
}

#[test]
fn roster_covers_every_station_and_shift() {
    let mut world = World::new();
    let params = ScenarioParams::default().with_seed(1).with_stations(4, 3);
    build_scenario(&mut world, params).expect("valid params");

    let mut station_query = world.query::<(&Station, &Position)>();
    let stations: Vec<_> = station_query
        .iter(&world)
        .map(|(s, p)| (s.id, p.0))
        .collect();
    assert_eq!(stations.len(), 4);

    let bounds = BoundingBox::hertfordshire();
    for (_, cell) in &stations {
        let latlng = h3o::LatLng::from(*cell);
        assert!(bounds.contains(latlng));
    }

    let mut officer_query = world.query::<&Officer>();
    let mut officers: Vec<(u32, ShiftKind)> = officer_query
        .iter(&world)
        .map(|o| (o.collar, o.shift))
        .collect();
    assert_eq!(officers.len(), 4 * 3 * 3);

    officers.sort_unstable_by_key(|(collar, _)| *collar);
    let collars: Vec<u32> = officers.iter().map(|(c, _)| *c).collect();
    let mut unique = collars.clone();
    unique.dedup();
    assert_eq!(collars, unique, "collar numbers must be unique");

    for shift in [ShiftKind::Early, ShiftKind::Late, ShiftKind::Night] {
        let count = officers.iter().filter(|(_, s)| *s == shift).count();
        assert_eq!(count, 4 * 3);
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let mut world = World::new();
    let params = ScenarioParams::default().with_stations(0, 3);
    match build_scenario(&mut world, params) {
        Err(ConfigError::NoStations) => {}
        other => panic!("expected NoStations, got {other:?}"),
    }

    let mut world = World::new();
    let mut params = ScenarioParams::default();
    params.incidents_per_hour = -1.0;
    assert!(build_scenario(&mut world, params).is_err());
}

#[test]
fn first_available_policy_is_honoured_from_params() {
    let mut world = World::new();
    let params = ScenarioParams::default()
        .with_seed(5)
        .with_stations(2, 2)
        .with_incidents_per_hour(3.0)
        .with_dispatch_policy(DispatchPolicyKind::FirstAvailable)
        .with_horizon_hours(8);
    build_scenario(&mut world, params).expect("valid params");
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, MAX_STEPS).expect("run completes");

    let telemetry = world.resource::<FcrTelemetry>();
    assert!(!telemetry.dispatch_decisions.is_empty());
    assert!(telemetry
        .dispatch_decisions
        .iter()
        .all(|d| d.policy == "first_available"));
}

#[test]
fn horizon_resource_matches_params() {
    let mut world = World::new();
    let params = ScenarioParams::default().with_horizon_hours(6);
    build_scenario(&mut world, params).expect("valid params");
    assert_eq!(world.resource::<SimulationHorizonMs>().0, 6 * ONE_HOUR_MS);

    // A zero horizon can never run.
    let mut world = World::new();
    let mut params = ScenarioParams::default();
    params.horizon_ms = 0;
    match build_scenario(&mut world, params) {
        Err(ConfigError::ZeroHorizon) => {}
        other => panic!("expected ZeroHorizon, got {other:?}"),
    }
}
