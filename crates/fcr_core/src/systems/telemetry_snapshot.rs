use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{Incident, IncidentStatus, Officer, OfficerStatus};
use crate::telemetry::{SimCounts, SimSnapshot, SimSnapshotConfig, SimSnapshots};

/// Captures a state-count snapshot. Gated by the runner on the snapshot
/// interval, so it runs on a small fraction of events.
pub fn capture_snapshot_system(
    clock: Res<SimulationClock>,
    config: Res<SimSnapshotConfig>,
    mut snapshots: ResMut<SimSnapshots>,
    incidents: Query<&Incident>,
    officers: Query<&Officer>,
) {
    let mut counts = SimCounts::default();
    for incident in incidents.iter() {
        match incident.status {
            IncidentStatus::Open => {}
            IncidentStatus::Queued => counts.incidents_queued += 1,
            IncidentStatus::Assigned => counts.incidents_assigned += 1,
            IncidentStatus::EnRoute => counts.incidents_en_route += 1,
            IncidentStatus::OnScene => counts.incidents_on_scene += 1,
            IncidentStatus::Resolved => counts.incidents_resolved += 1,
            IncidentStatus::Cancelled => counts.incidents_cancelled += 1,
        }
    }
    for officer in officers.iter() {
        match officer.status {
            OfficerStatus::OffDuty => counts.officers_off_duty += 1,
            OfficerStatus::AtStation | OfficerStatus::Patrolling => {
                counts.officers_available += 1
            }
            OfficerStatus::EnRoute | OfficerStatus::OnScene | OfficerStatus::Returning => {
                counts.officers_deployed += 1
            }
        }
    }

    snapshots.push(
        SimSnapshot {
            at_ms: clock.now(),
            counts,
        },
        config.max_snapshots,
    );
}
