use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::dispatch::{DispatchCandidate, DispatchPolicyResource};
use crate::ecs::{Incident, Officer, OfficerStatus, Position};
use crate::error::{SimulationFault, TransitionFault};
use crate::fcr::{AvailabilityIndex, PendingQueue};
use crate::routing::TravelTimeResource;
use crate::telemetry::{DispatchRecord, EventLog, FcrTelemetry, LogEvent};

/// Handles `TryDispatch`: binds at most one officer to the best eligible
/// pending incident. Follow-up work (draining the rest of the queue, retrying
/// after routing failures) is expressed as further scheduled events so every
/// assignment stays an auditable step of its own.
pub fn dispatch_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut queue: ResMut<PendingQueue>,
    mut availability: ResMut<AvailabilityIndex>,
    mut telemetry: ResMut<FcrTelemetry>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    policy: Res<DispatchPolicyResource>,
    travel: Res<TravelTimeResource>,
    mut incidents: Query<&mut Incident>,
    mut officers: Query<(&mut Officer, &Position)>,
) {
    if event.0.kind != EventKind::TryDispatch {
        return;
    }
    if availability.is_empty() {
        return;
    }

    let now = clock.now();
    let Some(incident_entity) = queue.first_eligible(now) else {
        return;
    };
    let Ok(incident) = incidents.get(incident_entity) else {
        queue.remove(incident_entity);
        return;
    };
    let incident_location = incident.location;

    let candidates: Vec<DispatchCandidate> = availability
        .iter()
        .filter_map(|(collar, entity)| {
            officers
                .get(entity)
                .ok()
                .map(|(_, position)| DispatchCandidate {
                    collar,
                    entity,
                    location: position.0,
                })
        })
        .collect();

    let Some(selection) = policy.0.select(incident_location, &candidates, travel.0.as_ref()) else {
        // Nobody routable right now; try again shortly.
        clock.schedule_in_secs(60, EventKind::TryDispatch, None);
        return;
    };
    let officer_entity = selection.candidate.entity;
    let collar = selection.candidate.collar;
    let travel_ms = selection.estimate.duration_ms;

    queue.remove(incident_entity);
    availability.deregister(collar);

    let mut officer_from = OfficerStatus::AtStation;
    if let Ok((mut officer, _)) = officers.get_mut(officer_entity) {
        officer_from = officer.status;
        if let Err(cause) = officer.bind(incident_entity) {
            fault.raise(TransitionFault {
                at_ms: now,
                entity: officer_entity,
                cause,
            });
            return;
        }
    }
    if let Ok(mut incident) = incidents.get_mut(incident_entity) {
        if let Err(cause) = incident.assign(officer_entity, now) {
            fault.raise(TransitionFault {
                at_ms: now,
                entity: incident_entity,
                cause,
            });
            return;
        }
        if let Err(cause) = incident.begin_travel() {
            fault.raise(TransitionFault {
                at_ms: now,
                entity: incident_entity,
                cause,
            });
            return;
        }
    }

    telemetry.dispatch_decisions.push(DispatchRecord {
        at_ms: now,
        incident: incident_entity,
        officer: officer_entity,
        officer_collar: collar,
        travel_ms,
        policy: policy.0.name(),
    });
    log.record(
        now,
        Some(incident_entity),
        LogEvent::DispatchDecision {
            officer: officer_entity,
            travel_ms,
        },
    );
    log.record(
        now,
        Some(incident_entity),
        LogEvent::IncidentTransition {
            from: "Queued",
            to: "Assigned",
        },
    );
    log.record(
        now,
        Some(incident_entity),
        LogEvent::IncidentTransition {
            from: "Assigned",
            to: "EnRoute",
        },
    );
    log.record(
        now,
        Some(officer_entity),
        LogEvent::OfficerTransition {
            from: officer_from,
            to: OfficerStatus::EnRoute,
        },
    );
    tracing::debug!(
        collar,
        travel_ms,
        at_ms = now,
        "officer dispatched to incident"
    );

    clock.schedule_in(
        travel_ms,
        EventKind::OfficerArrived,
        Some(EventSubject::Officer(officer_entity)),
    );

    // Keep draining while both sides of the market remain.
    if !availability.is_empty() && queue.first_eligible(now).is_some() {
        clock.schedule_at(now, EventKind::TryDispatch, None);
    }
}
