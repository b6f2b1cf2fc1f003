mod support;

use bevy_ecs::prelude::World;

use fcr_core::clock::{EventKind, SimulationClock, ONE_HOUR_MS};
use fcr_core::ecs::{Incident, IncidentStatus};
use fcr_core::fcr::PendingQueue;
use fcr_core::generator::{IncidentGenerator, KindMix};
use fcr_core::sampling::LocationSamplerResource;
use fcr_core::scenario::SimulationHorizonMs;
use fcr_core::telemetry::{EventLog, FcrTelemetry, LogEvent};
use fcr_core::test_helpers::FailingSampler;

use support::{run_to_completion, world_with_officers};

fn start_arrivals(world: &mut World) {
    world
        .resource_mut::<SimulationClock>()
        .schedule_at(0, EventKind::SpawnIncident, None);
}

#[test]
fn spawner_files_incidents_until_the_cap() {
    let (mut world, _, _) = world_with_officers(0, 0);
    world.insert_resource(IncidentGenerator::default().with_max_incidents(Some(5)));
    start_arrivals(&mut world);

    run_to_completion(&mut world);

    let telemetry = world.resource::<FcrTelemetry>();
    assert_eq!(telemetry.incidents_reported, 5);

    let mut query = world.query::<&Incident>();
    let incidents: Vec<&Incident> = query.iter(&world).collect();
    assert_eq!(incidents.len(), 5);
    for incident in &incidents {
        // YYYYMMDD/HHMM/NNNN
        assert_eq!(incident.isr.len(), 18);
        assert!(incident.isr.starts_with("19700101/"));
    }

    // Serials are unique within the run.
    let mut serials: Vec<&str> = incidents.iter().map(|i| i.isr.as_str()).collect();
    serials.sort_unstable();
    serials.dedup();
    assert_eq!(serials.len(), 5);
}

#[test]
fn serial_counters_follow_report_order() {
    let (mut world, _, _) = world_with_officers(0, 0);
    world.insert_resource(IncidentGenerator::default().with_max_incidents(Some(10)));
    start_arrivals(&mut world);
    run_to_completion(&mut world);

    let mut query = world.query::<&Incident>();
    let mut incidents: Vec<(u64, String)> = query
        .iter(&world)
        .map(|i| (i.reported_at, i.isr.clone()))
        .collect();
    assert_eq!(incidents.len(), 10);

    // Counters cover 0001..0010 and never decrease as report times advance.
    let mut counters: Vec<u32> = incidents
        .iter()
        .map(|(_, isr)| isr[14..].parse().expect("serial counter"))
        .collect();
    counters.sort_unstable();
    assert_eq!(counters, (1..=10).collect::<Vec<u32>>());

    incidents.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    let ordered: Vec<u32> = incidents
        .iter()
        .map(|(_, isr)| isr[14..].parse().expect("serial counter"))
        .collect();
    assert!(ordered.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn failed_location_draws_drop_only_that_creation() {
    let (mut world, _, _) = world_with_officers(0, 0);
    world.insert_resource(LocationSamplerResource(Box::new(FailingSampler)));
    world.insert_resource(SimulationHorizonMs(2 * ONE_HOUR_MS));
    start_arrivals(&mut world);

    run_to_completion(&mut world);

    let telemetry = world.resource::<FcrTelemetry>();
    // Roughly 12 arrivals over two hours at 6/hour, all dropped.
    assert!(telemetry.creations_dropped >= 1);
    assert_eq!(telemetry.incidents_reported, 0);
    assert!(world.resource::<PendingQueue>().is_empty());
}

#[test]
fn no_response_incidents_resolve_without_queueing() {
    let (mut world, _, _) = world_with_officers(1, 0);
    world.insert_resource(
        IncidentGenerator::new(KindMix {
            immediate: 0.0,
            prompt: 0.0,
            scheduled: 0.0,
            appointment: 0.0,
            no_response: 1.0,
        })
        .with_max_incidents(Some(3)),
    );
    start_arrivals(&mut world);

    run_to_completion(&mut world);

    let telemetry = world.resource::<FcrTelemetry>();
    assert_eq!(telemetry.incidents_reported, 3);
    assert_eq!(telemetry.no_response_filed, 3);
    assert!(telemetry.dispatch_decisions.is_empty());
    assert!(world.resource::<PendingQueue>().is_empty());

    let mut query = world.query::<&Incident>();
    for incident in query.iter(&world) {
        assert_eq!(incident.status, IncidentStatus::Resolved);
        assert_eq!(incident.resolved_at, Some(incident.reported_at));
        assert_eq!(incident.assigned_officer, None);
    }

    // Each on-the-spot resolution is a visible state transition in the log.
    let log = world.resource::<EventLog>();
    let resolutions = log
        .records()
        .iter()
        .filter(|r| {
            matches!(
                r.event,
                LogEvent::IncidentTransition {
                    from: "Open",
                    to: "Resolved",
                }
            )
        })
        .count();
    assert_eq!(resolutions, 3);
}

#[test]
fn spawn_window_ends_the_arrival_process() {
    let (mut world, _, _) = world_with_officers(0, 0);
    world.insert_resource(IncidentGenerator::default().with_window(Some(ONE_HOUR_MS)));
    start_arrivals(&mut world);

    run_to_completion(&mut world);

    let mut query = world.query::<&Incident>();
    let reported: Vec<u64> = query.iter(&world).map(|i| i.reported_at).collect();
    assert!(!reported.is_empty());
    assert!(reported.iter().all(|&at| at < ONE_HOUR_MS));
    assert!(world.resource::<SimulationClock>().is_empty());
}
