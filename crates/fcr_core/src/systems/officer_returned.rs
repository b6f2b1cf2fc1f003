use bevy_ecs::prelude::{Query, Res, ResMut, Without};

use crate::calendar;
use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Officer, OfficerStatus, Position, Station};
use crate::error::{SimulationFault, TransitionFault};
use crate::fcr::AvailabilityIndex;
use crate::scenario::ReturnToPatrol;
use crate::telemetry::{EventLog, LogEvent};

/// Handles `OfficerReturned`: back at the station the officer either becomes
/// available again, or signs off if their shift ended while deployed.
pub fn officer_returned_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut availability: ResMut<AvailabilityIndex>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    return_to_patrol: Res<ReturnToPatrol>,
    mut officers: Query<(&mut Officer, &mut Position), Without<Station>>,
) {
    if event.0.kind != EventKind::OfficerReturned {
        return;
    }
    let Some(EventSubject::Officer(officer_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();
    let epoch_ms = clock.epoch_ms();

    let Ok((mut officer, mut position)) = officers.get_mut(officer_entity) else {
        return;
    };
    position.0 = officer.home;

    if officer.sign_off_pending {
        // The shift ended mid-deployment; sign off now instead of rejoining
        // the pool.
        let result = officer.return_home(false).and_then(|_| officer.sign_off());
        if let Err(cause) = result {
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
                from: OfficerStatus::Returning,
                to: OfficerStatus::OffDuty,
            },
        );
        let start = calendar::next_sim_time_at_hour(now, epoch_ms, officer.shift.start_hour());
        clock.schedule_at(
            start,
            EventKind::ShiftStarted,
            Some(EventSubject::Officer(officer_entity)),
        );
        return;
    }

    if let Err(cause) = officer.return_home(return_to_patrol.0) {
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
            from: OfficerStatus::Returning,
            to: officer.status,
        },
    );

    // A freed officer may unblock the queue.
    clock.schedule_at(now, EventKind::TryDispatch, None);
}
