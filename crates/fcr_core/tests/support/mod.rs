//! Shared fixtures for the system-level tests.
#![allow(dead_code)]

use bevy_ecs::prelude::{Entity, Schedule, World};

use fcr_core::clock::{EventKind, EventSubject, SimulationClock};
use fcr_core::ecs::{Incident, IncidentKind};
use fcr_core::fcr::PendingQueue;
use fcr_core::routing::TravelTimeResource;
use fcr_core::runner::{run_until_empty, simulation_schedule};
use fcr_core::test_helpers::{
    create_test_world, spawn_available_officer, spawn_station, test_cell, FixedTravelTime,
};

pub const MAX_STEPS: usize = 100_000;

/// Test world with one station and `officers` available officers, all using
/// a fixed travel time between distinct cells.
pub fn world_with_officers(officers: u32, travel_ms: u64) -> (World, Entity, Vec<Entity>) {
    let mut world = create_test_world();
    world.insert_resource(TravelTimeResource(Box::new(FixedTravelTime(travel_ms))));
    let station = spawn_station(&mut world, 0, test_cell());
    let entities = (0..officers)
        .map(|i| spawn_available_officer(&mut world, 1_001 + i, station, test_cell()))
        .collect();
    (world, station, entities)
}

/// File an incident directly into the pending queue and schedule the
/// dispatch attempt, mirroring what the spawner system does.
pub fn file_incident(
    world: &mut World,
    kind: IncidentKind,
    location: h3o::CellIndex,
    target_at: Option<u64>,
) -> Entity {
    let now = world.resource::<SimulationClock>().now();
    let mut incident = Incident::new(
        kind,
        location,
        format!("20230102/0000/{:04}", now % 10_000),
        now,
        target_at,
    );
    incident.queue().expect("fresh incident queues");
    let entity = world.spawn(incident.clone()).id();
    world
        .resource_mut::<PendingQueue>()
        .submit(entity, &incident)
        .expect("queue accepts fresh incident");
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(now, EventKind::TryDispatch, None);
    if let Some(target) = target_at {
        clock.schedule_at(target, EventKind::TryDispatch, None);
    }
    entity
}

/// Schedule an expiry timer for the incident, as the spawner does when a
/// maximum wait is configured.
pub fn schedule_expiry(world: &mut World, incident: Entity, at_ms: u64) {
    world.resource_mut::<SimulationClock>().schedule_at(
        at_ms,
        EventKind::IncidentExpired,
        Some(EventSubject::Incident(incident)),
    );
}

/// Drain the event queue with the default schedule.
pub fn run_to_completion(world: &mut World) -> usize {
    let mut schedule = simulation_schedule();
    run_until_empty(world, &mut schedule, MAX_STEPS).expect("run completes without faults")
}

/// Drain the queue, returning the schedule for reuse.
pub fn run_steps(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    run_until_empty(world, schedule, max_steps).expect("run completes without faults")
}
