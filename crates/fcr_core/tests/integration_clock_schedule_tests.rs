mod support;

use fcr_core::clock::{EventKind, SimulationClock, ONE_HOUR_MS};
use fcr_core::ecs::IncidentKind;
use fcr_core::profiling::EventMetrics;
use fcr_core::runner::{run_next_event, run_until_empty_with_hook, simulation_schedule};
use fcr_core::scenario::SimulationHorizonMs;
use fcr_core::test_helpers::test_neighbor_cell;

use support::{file_incident, run_to_completion, world_with_officers, MAX_STEPS};

#[test]
fn runner_reports_empty_queue() {
    let (mut world, _, _) = world_with_officers(1, 0);
    let mut schedule = simulation_schedule();
    let advanced = run_next_event(&mut world, &mut schedule).expect("empty run");
    assert!(!advanced);
}

#[test]
fn timestamps_never_go_backwards_across_a_full_run() {
    let (mut world, _, _) = world_with_officers(2, 45_000);
    for _ in 0..4 {
        file_incident(&mut world, IncidentKind::Prompt, test_neighbor_cell(), None);
    }

    let mut schedule = simulation_schedule();
    let mut last_ts = 0;
    let steps = run_until_empty_with_hook(&mut world, &mut schedule, MAX_STEPS, |_, event| {
        assert!(event.timestamp >= last_ts, "time went backwards");
        last_ts = event.timestamp;
    })
    .expect("run completes");
    assert!(steps > 0);
}

#[test]
fn horizon_stops_the_run_with_events_still_queued() {
    let (mut world, _, _) = world_with_officers(1, 0);
    world.insert_resource(SimulationHorizonMs(ONE_HOUR_MS));
    world.resource_mut::<SimulationClock>().schedule_at(
        2 * ONE_HOUR_MS,
        EventKind::TryDispatch,
        None,
    );

    run_to_completion(&mut world);

    let clock = world.resource::<SimulationClock>();
    assert!(clock.now() < ONE_HOUR_MS);
    assert!(!clock.is_empty(), "the out-of-horizon event stays queued");
}

#[test]
fn event_metrics_count_each_processed_kind() {
    let (mut world, _, _) = world_with_officers(1, 30_000);
    file_incident(&mut world, IncidentKind::Immediate, test_neighbor_cell(), None);

    let steps = run_to_completion(&mut world);

    let metrics = world.resource::<EventMetrics>();
    assert_eq!(metrics.events_processed, steps as u64);
    // One dispatch for the incident, one re-check when the officer returns.
    assert_eq!(metrics.count_for(EventKind::TryDispatch), 2);
    assert_eq!(metrics.count_for(EventKind::OfficerArrived), 1);
    assert_eq!(metrics.count_for(EventKind::ServiceCompleted), 1);
    assert_eq!(metrics.count_for(EventKind::OfficerReturned), 1);
}
