use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Incident, IncidentStatus};
use crate::fcr::PendingQueue;
use crate::telemetry::{EventLog, FcrTelemetry, LogEvent};

/// Handles `IncidentExpired`: a queued incident past its maximum wait is
/// cancelled and leaves the queue. Timers that fire after the incident was
/// assigned or closed are stale and do nothing.
pub fn expiry_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    mut queue: ResMut<PendingQueue>,
    mut telemetry: ResMut<FcrTelemetry>,
    mut log: ResMut<EventLog>,
    mut incidents: Query<&mut Incident>,
) {
    if event.0.kind != EventKind::IncidentExpired {
        return;
    }
    let Some(EventSubject::Incident(incident_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();

    let Ok(mut incident) = incidents.get_mut(incident_entity) else {
        return;
    };
    if incident.status != IncidentStatus::Queued {
        tracing::debug!(
            isr = %incident.isr,
            status = incident.status.as_str(),
            "stale expiry timer ignored"
        );
        return;
    }
    if incident.cancel(now).is_err() {
        // Queued is the only state cancel accepts, checked above.
        return;
    }
    queue.remove(incident_entity);
    telemetry.incidents_cancelled += 1;

    log.record(now, Some(incident_entity), LogEvent::IncidentExpired);
    log.record(
        now,
        Some(incident_entity),
        LogEvent::IncidentTransition {
            from: "Queued",
            to: "Cancelled",
        },
    );
    tracing::debug!(isr = %incident.isr, at_ms = now, "incident cancelled after maximum wait");
}
