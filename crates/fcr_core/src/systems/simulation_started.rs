use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::calendar;
use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock, ONE_HOUR_MS};
use crate::ecs::{Officer, OfficerStatus};
use crate::error::{SimulationFault, TransitionFault};
use crate::fcr::AvailabilityIndex;
use crate::frequency::IncidentFrequencyResource;
use crate::generator::IncidentGenerator;
use crate::rng::SimRng;
use crate::telemetry::{EventLog, LogEvent};

/// Brings the world to its opening state: shifts covering the start hour
/// sign on, the others get their first `ShiftStarted`, and the first
/// incident arrival is drawn.
pub fn simulation_started_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    mut availability: ResMut<AvailabilityIndex>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    generator: Res<IncidentGenerator>,
    frequency: Res<IncidentFrequencyResource>,
    mut officers: Query<(Entity, &mut Officer)>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }

    let now = clock.now();
    let epoch_ms = clock.epoch_ms();
    let (_, start_hour) = calendar::weekday_hour(clock.sim_to_real_ms(now));

    for (entity, mut officer) in officers.iter_mut() {
        if officer.shift.covers(start_hour) {
            match officer.sign_on() {
                Ok(()) => {
                    availability.register(officer.collar, entity);
                    log.record(
                        now,
                        Some(entity),
                        LogEvent::OfficerTransition {
                            from: OfficerStatus::OffDuty,
                            to: officer.status,
                        },
                    );
                    let end = calendar::next_sim_time_at_hour(
                        now,
                        epoch_ms,
                        officer.shift.end_hour(),
                    );
                    clock.schedule_at(end, EventKind::ShiftEnded, Some(EventSubject::Officer(entity)));
                }
                Err(cause) => {
                    fault.raise(TransitionFault {
                        at_ms: now,
                        entity,
                        cause,
                    });
                }
            }
        } else {
            let start = calendar::next_sim_time_at_hour(now, epoch_ms, officer.shift.start_hour());
            clock.schedule_at(start, EventKind::ShiftStarted, Some(EventSubject::Officer(entity)));
        }
    }

    // First arrival; at a zero rate, probe again in an hour.
    let (weekday, hour) = calendar::weekday_hour(clock.sim_to_real_ms(now));
    let rate = frequency.0.rate_per_hour(weekday, hour);
    let gap = generator
        .next_interarrival_ms(rate, &mut rng.0)
        .unwrap_or(ONE_HOUR_MS);
    clock.schedule_in(gap, EventKind::SpawnIncident, None);
}
