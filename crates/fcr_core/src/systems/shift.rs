use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::calendar;
use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Officer, OfficerStatus};
use crate::error::{InvalidTransition, SimulationFault, TransitionFault};
use crate::fcr::AvailabilityIndex;
use crate::telemetry::{EventLog, LogEvent};

/// Handles `ShiftStarted`: the officer signs on, joins the availability
/// pool, and their matching `ShiftEnded` is scheduled.
pub fn shift_started_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut availability: ResMut<AvailabilityIndex>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    mut officers: Query<&mut Officer>,
) {
    if event.0.kind != EventKind::ShiftStarted {
        return;
    }
    let Some(EventSubject::Officer(officer_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();
    let epoch_ms = clock.epoch_ms();

    let Ok(mut officer) = officers.get_mut(officer_entity) else {
        return;
    };
    if let Err(cause) = officer.sign_on() {
        fault.raise(TransitionFault {
            at_ms: now,
            entity: officer_entity,
            cause,
        });
        return;
    }
    availability.register(officer.collar, officer_entity);
    log.record(
        now,
        Some(officer_entity),
        LogEvent::OfficerTransition {
            from: OfficerStatus::OffDuty,
            to: OfficerStatus::AtStation,
        },
    );

    let end = calendar::next_sim_time_at_hour(now, epoch_ms, officer.shift.end_hour());
    clock.schedule_at(
        end,
        EventKind::ShiftEnded,
        Some(EventSubject::Officer(officer_entity)),
    );
    // Fresh capacity may unblock the queue.
    clock.schedule_at(now, EventKind::TryDispatch, None);
}

/// Handles `ShiftEnded`. Idle officers sign off on the spot; deployed ones
/// finish their incident first and sign off on return to station.
pub fn shift_ended_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut availability: ResMut<AvailabilityIndex>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    mut officers: Query<&mut Officer>,
) {
    if event.0.kind != EventKind::ShiftEnded {
        return;
    }
    let Some(EventSubject::Officer(officer_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();
    let epoch_ms = clock.epoch_ms();

    let Ok(mut officer) = officers.get_mut(officer_entity) else {
        return;
    };
    match officer.status {
        OfficerStatus::AtStation | OfficerStatus::Patrolling => {
            let from = officer.status;
            availability.deregister(officer.collar);
            if let Err(cause) = officer.sign_off() {
                fault.raise(TransitionFault {
                    at_ms: now,
                    entity: officer_entity,
                    cause,
                });
                return;
            }
            log.record(
                now,
                Some(officer_entity),
                LogEvent::OfficerTransition {
                    from,
                    to: OfficerStatus::OffDuty,
                },
            );
            let start = calendar::next_sim_time_at_hour(now, epoch_ms, officer.shift.start_hour());
            clock.schedule_at(
                start,
                EventKind::ShiftStarted,
                Some(EventSubject::Officer(officer_entity)),
            );
        }
        OfficerStatus::EnRoute | OfficerStatus::OnScene | OfficerStatus::Returning => {
            // Deferred sign-off; the return-leg handler completes it.
            officer.sign_off_pending = true;
        }
        OfficerStatus::OffDuty => {
            fault.raise(TransitionFault {
                at_ms: now,
                entity: officer_entity,
                cause: InvalidTransition {
                    from: "OffDuty",
                    event: "sign_off",
                },
            });
        }
    }
}
