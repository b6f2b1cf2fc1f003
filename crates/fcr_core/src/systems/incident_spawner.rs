use bevy_ecs::prelude::{Commands, Res, ResMut};

use crate::calendar;
use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock, ONE_HOUR_MS};
use crate::ecs::Incident;
use crate::error::{SimulationFault, TransitionFault};
use crate::generator::IncidentGenerator;
use crate::fcr::PendingQueue;
use crate::frequency::IncidentFrequencyResource;
use crate::rng::SimRng;
use crate::sampling::LocationSamplerResource;
use crate::scenario::MaxIncidentWait;
use crate::telemetry::{EventLog, FcrTelemetry, LogEvent};

/// Handles `SpawnIncident`: files one incident and draws the gap to the next
/// arrival. A failed location draw drops only this creation; the arrival
/// process keeps going.
pub fn incident_spawner_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    mut generator: ResMut<IncidentGenerator>,
    mut queue: ResMut<PendingQueue>,
    mut telemetry: ResMut<FcrTelemetry>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    frequency: Res<IncidentFrequencyResource>,
    sampler: Res<LocationSamplerResource>,
    max_wait: Res<MaxIncidentWait>,
) {
    if event.0.kind != EventKind::SpawnIncident {
        return;
    }

    let now = clock.now();
    if !generator.may_spawn(now) {
        return;
    }

    spawn_one(
        &mut commands,
        &mut clock,
        &mut rng,
        &mut generator,
        &mut queue,
        &mut telemetry,
        &mut log,
        &mut fault,
        &sampler,
        max_wait.0,
    );

    // Next arrival from the rate in force right now.
    let (weekday, hour) = calendar::weekday_hour(clock.sim_to_real_ms(now));
    let rate = frequency.0.rate_per_hour(weekday, hour);
    let gap = generator
        .next_interarrival_ms(rate, &mut rng.0)
        .unwrap_or(ONE_HOUR_MS);
    clock.schedule_in(gap, EventKind::SpawnIncident, None);
}

#[allow(clippy::too_many_arguments)]
fn spawn_one(
    commands: &mut Commands,
    clock: &mut SimulationClock,
    rng: &mut SimRng,
    generator: &mut IncidentGenerator,
    queue: &mut PendingQueue,
    telemetry: &mut FcrTelemetry,
    log: &mut EventLog,
    fault: &mut SimulationFault,
    sampler: &LocationSamplerResource,
    max_wait_ms: Option<u64>,
) {
    let now = clock.now();
    let kind = generator.sample_kind(&mut rng.0);

    let location = match sampler.0.sample(kind, &mut rng.0) {
        Ok(cell) => cell,
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), error = %e, "dropping incident creation");
            telemetry.creations_dropped += 1;
            log.record(
                now,
                None,
                LogEvent::IncidentCreationDropped {
                    reason: e.to_string(),
                },
            );
            return;
        }
    };

    let isr = generator.next_isr(clock.sim_to_real_ms(now));
    let target_at = generator.target_time(kind, now, &mut rng.0);
    let mut incident = Incident::new(kind, location, isr.clone(), now, target_at);
    generator.note_created();
    telemetry.incidents_reported += 1;

    if !kind.requires_response() {
        // Filed and closed on the spot; never enters the queue.
        let resolved = incident.resolve(now);
        let entity = commands.spawn(incident).id();
        match resolved {
            Ok(()) => {
                telemetry.no_response_filed += 1;
                log.record(now, Some(entity), LogEvent::IncidentReported { kind, isr });
                log.record(
                    now,
                    Some(entity),
                    LogEvent::IncidentTransition {
                        from: "Open",
                        to: "Resolved",
                    },
                );
            }
            Err(cause) => {
                fault.raise(TransitionFault {
                    at_ms: now,
                    entity,
                    cause,
                });
            }
        }
        return;
    }

    if let Err(e) = incident.queue() {
        // Unreachable for a fresh incident; logged rather than faulted since
        // nothing downstream depends on it yet.
        tracing::warn!(error = %e, "freshly created incident failed to queue");
        return;
    }

    let entity = commands.spawn(incident.clone()).id();
    if let Err(e) = queue.submit(entity, &incident) {
        tracing::warn!(error = %e, "pending queue rejected new incident");
        return;
    }
    log.record(now, Some(entity), LogEvent::IncidentReported { kind, isr });
    log.record(
        now,
        Some(entity),
        LogEvent::IncidentTransition {
            from: "Open",
            to: "Queued",
        },
    );

    clock.schedule_at(now, EventKind::TryDispatch, None);
    if let Some(target) = target_at {
        // Re-attempt once the incident becomes eligible.
        clock.schedule_at(target, EventKind::TryDispatch, None);
    }
    if let Some(wait) = max_wait_ms {
        clock.schedule_at(
            now + wait,
            EventKind::IncidentExpired,
            Some(EventSubject::Incident(entity)),
        );
    }
}
