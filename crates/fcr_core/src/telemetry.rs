//! Run telemetry: the append-only event log, per-incident outcome records,
//! and periodic state snapshots.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Entity, Resource};
use serde::{Deserialize, Serialize};

use crate::clock::ONE_MIN_MS;
use crate::ecs::{IncidentKind, OfficerStatus};

/// What happened, in domain terms. Stored with enough detail to replay the
/// run's decisions without the world state.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    IncidentReported { kind: IncidentKind, isr: String },
    IncidentTransition { from: &'static str, to: &'static str },
    OfficerTransition { from: OfficerStatus, to: OfficerStatus },
    DispatchDecision { officer: Entity, travel_ms: u64 },
    IncidentCreationDropped { reason: String },
    IncidentExpired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub at_ms: u64,
    pub seq: u64,
    pub entity: Option<Entity>,
    pub event: LogEvent,
}

/// Append-only log of everything the run did, in processing order. Two runs
/// with the same seed and parameters produce equal logs.
#[derive(Debug, Default, Resource)]
pub struct EventLog {
    records: Vec<LogRecord>,
    next_seq: u64,
}

impl EventLog {
    pub fn record(&mut self, at_ms: u64, entity: Option<Entity>, event: LogEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push(LogRecord {
            at_ms,
            seq,
            entity,
            event,
        });
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome record for one attended incident, written at resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendedIncidentRecord {
    pub isr: String,
    pub kind: IncidentKind,
    pub officer_collar: u32,
    pub location_cell: u64,
    pub reported_at: u64,
    pub assigned_at: u64,
    pub arrived_at: u64,
    pub resolved_at: u64,
    pub travel_ms: u64,
}

impl AttendedIncidentRecord {
    /// Report to arrival on scene, the headline KPI.
    pub fn response_time_ms(&self) -> u64 {
        self.arrived_at.saturating_sub(self.reported_at)
    }

    pub fn time_to_assign_ms(&self) -> u64 {
        self.assigned_at.saturating_sub(self.reported_at)
    }

    pub fn time_on_scene_ms(&self) -> u64 {
        self.resolved_at.saturating_sub(self.arrived_at)
    }
}

/// One dispatch decision as the policy made it.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub at_ms: u64,
    pub incident: Entity,
    pub officer: Entity,
    pub officer_collar: u32,
    pub travel_ms: u64,
    pub policy: &'static str,
}

/// Aggregated control-room telemetry for a run.
#[derive(Debug, Default, Resource)]
pub struct FcrTelemetry {
    pub dispatch_decisions: Vec<DispatchRecord>,
    pub attended: Vec<AttendedIncidentRecord>,
    pub incidents_reported: u64,
    pub incidents_resolved: u64,
    pub incidents_cancelled: u64,
    pub creations_dropped: u64,
    pub no_response_filed: u64,
}

impl FcrTelemetry {
    pub fn response_times_ms(&self) -> Vec<u64> {
        self.attended.iter().map(|r| r.response_time_ms()).collect()
    }

    pub fn avg_response_time_ms(&self) -> Option<f64> {
        if self.attended.is_empty() {
            return None;
        }
        let total: u64 = self.attended.iter().map(|r| r.response_time_ms()).sum();
        Some(total as f64 / self.attended.len() as f64)
    }

    pub fn avg_response_time_ms_for(&self, kind: IncidentKind) -> Option<f64> {
        let times: Vec<u64> = self
            .attended
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.response_time_ms())
            .collect();
        if times.is_empty() {
            return None;
        }
        Some(times.iter().sum::<u64>() as f64 / times.len() as f64)
    }
}

/// Entity counts by state at a point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimCounts {
    pub incidents_queued: usize,
    pub incidents_assigned: usize,
    pub incidents_en_route: usize,
    pub incidents_on_scene: usize,
    pub incidents_resolved: usize,
    pub incidents_cancelled: usize,
    pub officers_available: usize,
    pub officers_deployed: usize,
    pub officers_off_duty: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub at_ms: u64,
    pub counts: SimCounts,
}

#[derive(Debug, Clone, Copy, Resource, Serialize, Deserialize)]
pub struct SimSnapshotConfig {
    pub interval_ms: u64,
    pub max_snapshots: usize,
}

impl Default for SimSnapshotConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5 * ONE_MIN_MS,
            max_snapshots: 2_000,
        }
    }
}

/// Ring of periodic snapshots; oldest are evicted past the cap.
#[derive(Debug, Default, Resource)]
pub struct SimSnapshots {
    pub snapshots: VecDeque<SimSnapshot>,
    pub last_snapshot_at: Option<u64>,
}

impl SimSnapshots {
    pub fn push(&mut self, snapshot: SimSnapshot, max_snapshots: usize) {
        if max_snapshots == 0 {
            return;
        }
        while self.snapshots.len() >= max_snapshots {
            self.snapshots.pop_front();
        }
        self.last_snapshot_at = Some(snapshot.at_ms);
        self.snapshots.push_back(snapshot);
    }

    pub fn due(&self, now: u64, interval_ms: u64) -> bool {
        match self.last_snapshot_at {
            Some(last) => now.saturating_sub(last) >= interval_ms,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_assigns_sequential_seqs() {
        let mut log = EventLog::default();
        log.record(0, None, LogEvent::IncidentExpired);
        log.record(5, None, LogEvent::IncidentExpired);
        assert_eq!(log.records()[0].seq, 0);
        assert_eq!(log.records()[1].seq, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn attended_record_kpis() {
        let record = AttendedIncidentRecord {
            isr: "20230101/0900/0001".into(),
            kind: IncidentKind::Immediate,
            officer_collar: 7,
            location_cell: 0,
            reported_at: 1_000,
            assigned_at: 2_000,
            arrived_at: 5_000,
            resolved_at: 9_000,
            travel_ms: 3_000,
        };
        assert_eq!(record.response_time_ms(), 4_000);
        assert_eq!(record.time_to_assign_ms(), 1_000);
        assert_eq!(record.time_on_scene_ms(), 4_000);
    }

    #[test]
    fn avg_response_time_per_kind() {
        let mut telemetry = FcrTelemetry::default();
        for (kind, arrived) in [
            (IncidentKind::Immediate, 2_000),
            (IncidentKind::Immediate, 4_000),
            (IncidentKind::Prompt, 10_000),
        ] {
            telemetry.attended.push(AttendedIncidentRecord {
                isr: "x".into(),
                kind,
                officer_collar: 1,
                location_cell: 0,
                reported_at: 0,
                assigned_at: 500,
                arrived_at: arrived,
                resolved_at: arrived + 100,
                travel_ms: 0,
            });
        }
        assert_eq!(telemetry.avg_response_time_ms_for(IncidentKind::Immediate), Some(3_000.0));
        assert_eq!(telemetry.avg_response_time_ms_for(IncidentKind::Prompt), Some(10_000.0));
        assert_eq!(telemetry.avg_response_time_ms_for(IncidentKind::Scheduled), None);
        assert_eq!(telemetry.avg_response_time_ms(), Some(16_000.0 / 3.0));
    }

    #[test]
    fn snapshots_evict_past_cap() {
        let mut snapshots = SimSnapshots::default();
        for i in 0..5 {
            snapshots.push(
                SimSnapshot {
                    at_ms: i * 100,
                    counts: SimCounts::default(),
                },
                3,
            );
        }
        assert_eq!(snapshots.snapshots.len(), 3);
        assert_eq!(snapshots.snapshots.front().map(|s| s.at_ms), Some(200));
        assert_eq!(snapshots.last_snapshot_at, Some(400));
    }

    #[test]
    fn snapshot_due_respects_interval() {
        let mut snapshots = SimSnapshots::default();
        assert!(snapshots.due(0, 1_000));
        snapshots.push(
            SimSnapshot {
                at_ms: 0,
                counts: SimCounts::default(),
            },
            10,
        );
        assert!(!snapshots.due(999, 1_000));
        assert!(snapshots.due(1_000, 1_000));
    }
}
