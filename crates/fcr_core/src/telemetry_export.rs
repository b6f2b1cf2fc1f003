//! Parquet export of run telemetry for offline analysis.

use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt64Array, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::ecs::IncidentKind;
use crate::telemetry::{EventLog, FcrTelemetry, LogEvent, SimSnapshots};

pub fn write_event_log_parquet<P: AsRef<Path>>(
    path: P,
    log: &EventLog,
) -> Result<(), Box<dyn Error>> {
    let n = log.len();
    let mut at_ms = Vec::with_capacity(n);
    let mut seq = Vec::with_capacity(n);
    let mut entity = Vec::with_capacity(n);
    let mut event = Vec::with_capacity(n);
    let mut detail = Vec::with_capacity(n);

    for record in log.records() {
        at_ms.push(record.at_ms);
        seq.push(record.seq);
        entity.push(record.entity.map(|e| e.to_bits()));
        let (label, info) = log_event_columns(&record.event);
        event.push(label.to_string());
        detail.push(info);
    }

    let schema = Schema::new(vec![
        Field::new("at_ms", DataType::UInt64, false),
        Field::new("seq", DataType::UInt64, false),
        Field::new("entity", DataType::UInt64, true),
        Field::new("event", DataType::Utf8, false),
        Field::new("detail", DataType::Utf8, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(at_ms)),
        Arc::new(UInt64Array::from(seq)),
        Arc::new(UInt64Array::from(entity)),
        Arc::new(StringArray::from(event)),
        Arc::new(StringArray::from(detail)),
    ];

    write_record_batch(path, schema, arrays)
}

fn log_event_columns(event: &LogEvent) -> (&'static str, String) {
    match event {
        LogEvent::IncidentReported { kind, isr } => {
            ("incident_reported", format!("{} {}", kind.as_str(), isr))
        }
        LogEvent::IncidentTransition { from, to } => {
            ("incident_transition", format!("{from}->{to}"))
        }
        LogEvent::OfficerTransition { from, to } => (
            "officer_transition",
            format!(
                "{}->{} storm={}",
                from.as_str(),
                to.as_str(),
                to.storm_code().0
            ),
        ),
        LogEvent::DispatchDecision { officer, travel_ms } => (
            "dispatch_decision",
            format!("officer={officer:?} travel_ms={travel_ms}"),
        ),
        LogEvent::IncidentCreationDropped { reason } => {
            ("incident_creation_dropped", reason.clone())
        }
        LogEvent::IncidentExpired => ("incident_expired", String::new()),
    }
}

pub fn write_attended_incidents_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &FcrTelemetry,
) -> Result<(), Box<dyn Error>> {
    let n = telemetry.attended.len();
    let mut isr = Vec::with_capacity(n);
    let mut kind = Vec::with_capacity(n);
    let mut officer_collar = Vec::with_capacity(n);
    let mut location_cell = Vec::with_capacity(n);
    let mut reported_at = Vec::with_capacity(n);
    let mut assigned_at = Vec::with_capacity(n);
    let mut arrived_at = Vec::with_capacity(n);
    let mut resolved_at = Vec::with_capacity(n);
    let mut travel_ms = Vec::with_capacity(n);
    let mut response_time_ms = Vec::with_capacity(n);

    for record in &telemetry.attended {
        isr.push(record.isr.clone());
        kind.push(incident_kind_code(record.kind));
        officer_collar.push(record.officer_collar as u64);
        location_cell.push(record.location_cell);
        reported_at.push(record.reported_at);
        assigned_at.push(record.assigned_at);
        arrived_at.push(record.arrived_at);
        resolved_at.push(record.resolved_at);
        travel_ms.push(record.travel_ms);
        response_time_ms.push(record.response_time_ms());
    }

    let schema = Schema::new(vec![
        Field::new("isr", DataType::Utf8, false),
        Field::new("kind", DataType::UInt8, false),
        Field::new("officer_collar", DataType::UInt64, false),
        Field::new("location_cell", DataType::UInt64, false),
        Field::new("reported_at", DataType::UInt64, false),
        Field::new("assigned_at", DataType::UInt64, false),
        Field::new("arrived_at", DataType::UInt64, false),
        Field::new("resolved_at", DataType::UInt64, false),
        Field::new("travel_ms", DataType::UInt64, false),
        Field::new("response_time_ms", DataType::UInt64, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(isr)),
        Arc::new(UInt8Array::from(kind)),
        Arc::new(UInt64Array::from(officer_collar)),
        Arc::new(UInt64Array::from(location_cell)),
        Arc::new(UInt64Array::from(reported_at)),
        Arc::new(UInt64Array::from(assigned_at)),
        Arc::new(UInt64Array::from(arrived_at)),
        Arc::new(UInt64Array::from(resolved_at)),
        Arc::new(UInt64Array::from(travel_ms)),
        Arc::new(UInt64Array::from(response_time_ms)),
    ];

    write_record_batch(path, schema, arrays)
}

pub fn write_dispatch_decisions_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &FcrTelemetry,
) -> Result<(), Box<dyn Error>> {
    let n = telemetry.dispatch_decisions.len();
    let mut at_ms = Vec::with_capacity(n);
    let mut incident = Vec::with_capacity(n);
    let mut officer = Vec::with_capacity(n);
    let mut officer_collar = Vec::with_capacity(n);
    let mut travel_ms = Vec::with_capacity(n);
    let mut policy = Vec::with_capacity(n);

    for record in &telemetry.dispatch_decisions {
        at_ms.push(record.at_ms);
        incident.push(record.incident.to_bits());
        officer.push(record.officer.to_bits());
        officer_collar.push(record.officer_collar as u64);
        travel_ms.push(record.travel_ms);
        policy.push(record.policy.to_string());
    }

    let schema = Schema::new(vec![
        Field::new("at_ms", DataType::UInt64, false),
        Field::new("incident", DataType::UInt64, false),
        Field::new("officer", DataType::UInt64, false),
        Field::new("officer_collar", DataType::UInt64, false),
        Field::new("travel_ms", DataType::UInt64, false),
        Field::new("policy", DataType::Utf8, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(at_ms)),
        Arc::new(UInt64Array::from(incident)),
        Arc::new(UInt64Array::from(officer)),
        Arc::new(UInt64Array::from(officer_collar)),
        Arc::new(UInt64Array::from(travel_ms)),
        Arc::new(StringArray::from(policy)),
    ];

    write_record_batch(path, schema, arrays)
}

pub fn write_snapshot_counts_parquet<P: AsRef<Path>>(
    path: P,
    snapshots: &SimSnapshots,
) -> Result<(), Box<dyn Error>> {
    let n = snapshots.snapshots.len();
    let mut timestamp_ms = Vec::with_capacity(n);
    let mut incidents_queued = Vec::with_capacity(n);
    let mut incidents_assigned = Vec::with_capacity(n);
    let mut incidents_en_route = Vec::with_capacity(n);
    let mut incidents_on_scene = Vec::with_capacity(n);
    let mut incidents_resolved = Vec::with_capacity(n);
    let mut incidents_cancelled = Vec::with_capacity(n);
    let mut officers_available = Vec::with_capacity(n);
    let mut officers_deployed = Vec::with_capacity(n);
    let mut officers_off_duty = Vec::with_capacity(n);

    for snapshot in &snapshots.snapshots {
        timestamp_ms.push(snapshot.at_ms);
        incidents_queued.push(snapshot.counts.incidents_queued as u64);
        incidents_assigned.push(snapshot.counts.incidents_assigned as u64);
        incidents_en_route.push(snapshot.counts.incidents_en_route as u64);
        incidents_on_scene.push(snapshot.counts.incidents_on_scene as u64);
        incidents_resolved.push(snapshot.counts.incidents_resolved as u64);
        incidents_cancelled.push(snapshot.counts.incidents_cancelled as u64);
        officers_available.push(snapshot.counts.officers_available as u64);
        officers_deployed.push(snapshot.counts.officers_deployed as u64);
        officers_off_duty.push(snapshot.counts.officers_off_duty as u64);
    }

    let schema = Schema::new(vec![
        Field::new("timestamp_ms", DataType::UInt64, false),
        Field::new("incidents_queued", DataType::UInt64, false),
        Field::new("incidents_assigned", DataType::UInt64, false),
        Field::new("incidents_en_route", DataType::UInt64, false),
        Field::new("incidents_on_scene", DataType::UInt64, false),
        Field::new("incidents_resolved", DataType::UInt64, false),
        Field::new("incidents_cancelled", DataType::UInt64, false),
        Field::new("officers_available", DataType::UInt64, false),
        Field::new("officers_deployed", DataType::UInt64, false),
        Field::new("officers_off_duty", DataType::UInt64, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(timestamp_ms)),
        Arc::new(UInt64Array::from(incidents_queued)),
        Arc::new(UInt64Array::from(incidents_assigned)),
        Arc::new(UInt64Array::from(incidents_en_route)),
        Arc::new(UInt64Array::from(incidents_on_scene)),
        Arc::new(UInt64Array::from(incidents_resolved)),
        Arc::new(UInt64Array::from(incidents_cancelled)),
        Arc::new(UInt64Array::from(officers_available)),
        Arc::new(UInt64Array::from(officers_deployed)),
        Arc::new(UInt64Array::from(officers_off_duty)),
    ];

    write_record_batch(path, schema, arrays)
}

fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn incident_kind_code(kind: IncidentKind) -> u8 {
    match kind {
        IncidentKind::Immediate => 0,
        IncidentKind::Prompt => 1,
        IncidentKind::Scheduled => 2,
        IncidentKind::Appointment => 3,
        IncidentKind::NoResponseRequired => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::OfficerStatus;

    #[test]
    fn officer_transitions_export_with_their_storm_code() {
        let (label, detail) = log_event_columns(&LogEvent::OfficerTransition {
            from: OfficerStatus::AtStation,
            to: OfficerStatus::OnScene,
        });
        assert_eq!(label, "officer_transition");
        assert_eq!(detail, "AtStation->OnScene storm=06");
    }

    #[test]
    fn incident_transitions_export_their_states() {
        let (label, detail) = log_event_columns(&LogEvent::IncidentTransition {
            from: "Open",
            to: "Resolved",
        });
        assert_eq!(label, "incident_transition");
        assert_eq!(detail, "Open->Resolved");
    }
}
