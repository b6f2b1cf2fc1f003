//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each
//! step pops the next event from [`SimulationClock`], inserts it as
//! [`CurrentEvent`], runs the schedule, then checks the fault mailbox: an
//! invariant violation halts the run instead of corrupting later state.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::error::{SimulationError, SimulationFault};
use crate::profiling::EventMetrics;
use crate::scenario::SimulationHorizonMs;
use crate::systems::{
    dispatch::dispatch_system,
    expiry::expiry_system,
    incident_spawner::incident_spawner_system,
    officer_arrival::officer_arrival_system,
    officer_returned::officer_returned_system,
    service_completed::service_completed_system,
    shift::{shift_ended_system, shift_started_system},
    simulation_started::simulation_started_system,
    telemetry_snapshot::capture_snapshot_system,
};

// Condition functions for each event kind
fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationStarted)
        .unwrap_or(false)
}

fn is_spawn_incident(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SpawnIncident)
        .unwrap_or(false)
}

fn is_try_dispatch(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::TryDispatch)
        .unwrap_or(false)
}

fn is_officer_arrived(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OfficerArrived)
        .unwrap_or(false)
}

fn is_service_completed(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ServiceCompleted)
        .unwrap_or(false)
}

fn is_officer_returned(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OfficerReturned)
        .unwrap_or(false)
}

fn is_shift_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ShiftStarted)
        .unwrap_or(false)
}

fn is_shift_ended(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ShiftEnded)
        .unwrap_or(false)
}

fn is_incident_expired(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::IncidentExpired)
        .unwrap_or(false)
}

/// Condition: telemetry snapshot interval has elapsed.
fn should_capture_snapshot(
    clock: Option<Res<SimulationClock>>,
    config: Option<Res<crate::telemetry::SimSnapshotConfig>>,
    snapshots: Option<Res<crate::telemetry::SimSnapshots>>,
) -> bool {
    let Some(clock) = clock else {
        return false;
    };
    let Some(config) = config else {
        return false;
    };
    let Some(snapshots) = snapshots else {
        return false;
    };
    snapshots.due(clock.now(), config.interval_ms)
}

fn take_fault(world: &mut World) -> Result<(), SimulationError> {
    if let Some(mut fault) = world.get_resource_mut::<SimulationFault>() {
        if let Some(fault) = fault.0.take() {
            return Err(SimulationError::InvariantViolated(fault));
        }
    }
    Ok(())
}

fn horizon_reached(world: &World) -> bool {
    let stop_at = world.get_resource::<SimulationHorizonMs>().map(|h| h.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    matches!((stop_at, next_ts), (Some(end_ms), Some(ts)) if ts >= end_ms)
}

/// Runs one simulation step: pops the next event, inserts it as
/// [`CurrentEvent`], then runs the schedule. Returns `Ok(false)` when the
/// clock is empty or the next event lies at or past [`SimulationHorizonMs`].
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> Result<bool, SimulationError> {
    if horizon_reached(world) {
        return Ok(false);
    }
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return Ok(false),
    };
    world.insert_resource(CurrentEvent(event));

    if let Some(mut metrics) = world.get_resource_mut::<EventMetrics>() {
        metrics.record_event(event.kind);
    }

    schedule.run(world);
    take_fault(world)?;
    Ok(true)
}

/// Runs one simulation step and invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    mut hook: F,
) -> Result<bool, SimulationError>
where
    F: FnMut(&World, &Event),
{
    if horizon_reached(world) {
        return Ok(false);
    }
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return Ok(false),
    };
    world.insert_resource(CurrentEvent(event));

    if let Some(mut metrics) = world.get_resource_mut::<EventMetrics>() {
        metrics.record_event(event.kind);
    }

    schedule.run(world);
    take_fault(world)?;
    hook(world, &event);
    Ok(true)
}

/// Runs steps until the queue drains, the horizon is hit, or `max_steps` is
/// reached. Returns the number of steps executed.
pub fn run_until_empty(
    world: &mut World,
    schedule: &mut Schedule,
    max_steps: usize,
) -> Result<usize, SimulationError> {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule)? {
        steps += 1;
    }
    Ok(steps)
}

/// Runs steps until empty and invokes `hook` after each step.
pub fn run_until_empty_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    max_steps: usize,
    mut hook: F,
) -> Result<usize, SimulationError>
where
    F: FnMut(&World, &Event),
{
    let mut steps = 0;
    while steps < max_steps && run_next_event_with_hook(world, schedule, &mut hook)? {
        steps += 1;
    }
    Ok(steps)
}

/// Builds the default simulation schedule: all event-reacting systems plus
/// [`apply_deferred`] so entities spawned this step are visible to the next.
///
/// Systems are conditionally executed based on event kind to reduce overhead.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        incident_spawner_system.run_if(is_spawn_incident),
        dispatch_system.run_if(is_try_dispatch),
        officer_arrival_system.run_if(is_officer_arrived),
        service_completed_system.run_if(is_service_completed),
        officer_returned_system.run_if(is_officer_returned),
        shift_started_system.run_if(is_shift_started),
        shift_ended_system.run_if(is_shift_ended),
        expiry_system.run_if(is_incident_expired),
        apply_deferred,
    ));

    schedule.add_systems(capture_snapshot_system.run_if(should_capture_snapshot));

    schedule
}

/// Schedules the `SimulationStarted` event at time 0. Call after building
/// the scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(0, EventKind::SimulationStarted, None);
}
