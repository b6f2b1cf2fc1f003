use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Incident, Officer, OfficerStatus};
use crate::error::{InvalidTransition, SimulationFault, TransitionFault};
use crate::routing::TravelTimeResource;
use crate::telemetry::{AttendedIncidentRecord, EventLog, FcrTelemetry, LogEvent};

/// Handles `ServiceCompleted`: the incident resolves, its outcome record is
/// written, and the officer starts the return leg to their station.
pub fn service_completed_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut telemetry: ResMut<FcrTelemetry>,
    mut log: ResMut<EventLog>,
    mut fault: ResMut<SimulationFault>,
    travel: Res<TravelTimeResource>,
    mut incidents: Query<&mut Incident>,
    mut officers: Query<&mut Officer>,
) {
    if event.0.kind != EventKind::ServiceCompleted {
        return;
    }
    let Some(EventSubject::Officer(officer_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();

    let Ok(mut officer) = officers.get_mut(officer_entity) else {
        return;
    };
    let Some(incident_entity) = officer.current_incident else {
        fault.raise(TransitionFault {
            at_ms: now,
            entity: officer_entity,
            cause: InvalidTransition {
                from: officer.status.as_str(),
                event: "complete_service",
            },
        });
        return;
    };
    if let Err(cause) = officer.complete_service() {
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
    if let Err(cause) = incident.resolve(now) {
        fault.raise(TransitionFault {
            at_ms: now,
            entity: incident_entity,
            cause,
        });
        return;
    }
    telemetry.incidents_resolved += 1;

    // All four timestamps are set along the attended path.
    let assigned_at = incident.assigned_at.unwrap_or(incident.reported_at);
    let arrived_at = incident.arrived_at.unwrap_or(now);
    telemetry.attended.push(AttendedIncidentRecord {
        isr: incident.isr.clone(),
        kind: incident.kind,
        officer_collar: officer.collar,
        location_cell: incident.location.into(),
        reported_at: incident.reported_at,
        assigned_at,
        arrived_at,
        resolved_at: now,
        travel_ms: arrived_at.saturating_sub(assigned_at),
    });

    log.record(
        now,
        Some(incident_entity),
        LogEvent::IncidentTransition {
            from: "OnScene",
            to: "Resolved",
        },
    );
    log.record(
        now,
        Some(officer_entity),
        LogEvent::OfficerTransition {
            from: OfficerStatus::OnScene,
            to: OfficerStatus::Returning,
        },
    );

    // A missing return route strands nobody: the officer is snapped home.
    let return_ms = match travel.0.estimate(incident.location, officer.home) {
        Ok(estimate) => estimate.duration_ms,
        Err(e) => {
            tracing::warn!(collar = officer.collar, error = %e, "no return route, snapping officer home");
            0
        }
    };
    clock.schedule_in(
        return_ms,
        EventKind::OfficerReturned,
        Some(EventSubject::Officer(officer_entity)),
    );
}
