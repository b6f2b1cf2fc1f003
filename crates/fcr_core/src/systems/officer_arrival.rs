use bevy_ecs::prelude::{Query, Res, ResMut, Without};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::distributions::ServiceDurations;
use crate::ecs::{Incident, Officer, OfficerStatus, Position, Station};
use crate::error::{InvalidTransition, SimulationFault, TransitionFault};
use crate::rng::SimRng;
use crate::telemetry::{EventLog, LogEvent};

/// Handles `OfficerArrived`: the officer reaches the scene, and time on
/// scene is drawn for the incident's kind.
pub fn officer_arrival_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    durations: Res<ServiceDurations>,
    mut incidents: Query<&mut Incident>,
    mut officers: Query<(&mut Officer, &mut Position), Without<Station>>,
) {
    if event.0.kind != EventKind::OfficerArrived {
        return;
    }
    let Some(EventSubject::Officer(officer_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();

    let Ok((mut officer, mut position)) = officers.get_mut(officer_entity) else {
        return;
    };
    let Some(incident_entity) = officer.current_incident else {
        fault.raise(TransitionFault {
            at_ms: now,
            entity: officer_entity,
            cause: InvalidTransition {
                from: officer.status.as_str(),
                event: "arrive_on_scene",
            },
        });
        return;
    };
    if let Err(cause) = officer.arrive_on_scene() {
        fault.raise(TransitionFault {
            at_ms: now,
            entity: officer_entity,
            cause,
        });
        return;
    }

    let Ok(mut incident) = incidents.get_mut(incident_entity) else {
        return;
    };
    if let Err(cause) = incident.arrive(now) {
        fault.raise(TransitionFault {
            at_ms: now,
            entity: incident_entity,
            cause,
        });
        return;
    }
    position.0 = incident.location;

    log.record(
        now,
        Some(officer_entity),
        LogEvent::OfficerTransition {
            from: OfficerStatus::EnRoute,
            to: OfficerStatus::OnScene,
        },
    );
    log.record(
        now,
        Some(incident_entity),
        LogEvent::IncidentTransition {
            from: "EnRoute",
            to: "OnScene",
        },
    );

    let service_ms = durations.sample(incident.kind, &mut rng.0);
    clock.schedule_in(
        service_ms,
        EventKind::ServiceCompleted,
        Some(EventSubject::Officer(officer_entity)),
    );
}
