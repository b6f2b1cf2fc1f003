//! Core entities: incidents, officers, stations.
//!
//! State machines are encoded as explicit transition methods; any state+event
//! combination outside the table returns [`InvalidTransition`] rather than
//! silently coercing state. Callers escalate those to [`crate::error::SimulationFault`].

use bevy_ecs::prelude::{Component, Entity};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};

use crate::error::InvalidTransition;

/// Response grading of an incident, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    Immediate,
    Prompt,
    Scheduled,
    Appointment,
    NoResponseRequired,
}

impl IncidentKind {
    /// Priority class for queue ordering; lower sorts first.
    pub fn priority_class(&self) -> u8 {
        match self {
            IncidentKind::Immediate => 0,
            IncidentKind::Prompt => 1,
            IncidentKind::Scheduled => 2,
            IncidentKind::Appointment => 3,
            IncidentKind::NoResponseRequired => 4,
        }
    }

    /// Whether an officer is ever dispatched to this kind.
    pub fn requires_response(&self) -> bool {
        !matches!(self, IncidentKind::NoResponseRequired)
    }

    /// Whether eligibility is gated on a target/appointment time.
    pub fn has_target_time(&self) -> bool {
        matches!(self, IncidentKind::Scheduled | IncidentKind::Appointment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::Immediate => "Immediate",
            IncidentKind::Prompt => "Prompt",
            IncidentKind::Scheduled => "Scheduled",
            IncidentKind::Appointment => "Appointment",
            IncidentKind::NoResponseRequired => "NoResponseRequired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Open,
    Queued,
    Assigned,
    EnRoute,
    OnScene,
    Resolved,
    Cancelled,
}

impl IncidentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "Open",
            IncidentStatus::Queued => "Queued",
            IncidentStatus::Assigned => "Assigned",
            IncidentStatus::EnRoute => "EnRoute",
            IncidentStatus::OnScene => "OnScene",
            IncidentStatus::Resolved => "Resolved",
            IncidentStatus::Cancelled => "Cancelled",
        }
    }
}

/// An incident working its way through the control room.
///
/// The incident holds only a weak reference to its assigned officer; the
/// officer's lifecycle is owned by its station.
#[derive(Debug, Clone, Component)]
pub struct Incident {
    pub kind: IncidentKind,
    pub status: IncidentStatus,
    pub location: CellIndex,
    /// Incident serial reference, `YYYYMMDD/HHMM/NNNN`.
    pub isr: String,
    pub reported_at: u64,
    /// Earliest assignment eligibility for Scheduled/Appointment incidents.
    pub target_at: Option<u64>,
    pub assigned_officer: Option<Entity>,
    pub assigned_at: Option<u64>,
    pub arrived_at: Option<u64>,
    pub resolved_at: Option<u64>,
    pub cancelled_at: Option<u64>,
}

impl Incident {
    pub fn new(
        kind: IncidentKind,
        location: CellIndex,
        isr: String,
        reported_at: u64,
        target_at: Option<u64>,
    ) -> Self {
        Self {
            kind,
            status: IncidentStatus::Open,
            location,
            isr,
            reported_at,
            target_at,
            assigned_officer: None,
            assigned_at: None,
            arrived_at: None,
            resolved_at: None,
            cancelled_at: None,
        }
    }

    /// Time from which the dispatch policy may consider this incident.
    pub fn eligible_at(&self) -> u64 {
        self.target_at.unwrap_or(self.reported_at)
    }

    fn reject(&self, event: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.status.as_str(),
            event,
        }
    }

    /// Open -> Queued, on submission to the control room.
    pub fn queue(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            IncidentStatus::Open => {
                self.status = IncidentStatus::Queued;
                Ok(())
            }
            _ => Err(self.reject("queue")),
        }
    }

    /// Queued -> Assigned, when the dispatch policy binds an officer.
    pub fn assign(&mut self, officer: Entity, now: u64) -> Result<(), InvalidTransition> {
        match self.status {
            IncidentStatus::Queued => {
                self.status = IncidentStatus::Assigned;
                self.assigned_officer = Some(officer);
                self.assigned_at = Some(now);
                Ok(())
            }
            _ => Err(self.reject("assign")),
        }
    }

    /// Assigned -> EnRoute, officer begins travel.
    pub fn begin_travel(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            IncidentStatus::Assigned => {
                self.status = IncidentStatus::EnRoute;
                Ok(())
            }
            _ => Err(self.reject("begin_travel")),
        }
    }

    /// EnRoute -> OnScene on the travel-arrival event; Assigned -> OnScene is
    /// also in the table for the zero-travel case (officer already on site).
    pub fn arrive(&mut self, now: u64) -> Result<(), InvalidTransition> {
        match self.status {
            IncidentStatus::EnRoute | IncidentStatus::Assigned => {
                self.status = IncidentStatus::OnScene;
                self.arrived_at = Some(now);
                Ok(())
            }
            _ => Err(self.reject("arrive")),
        }
    }

    /// OnScene -> Resolved when service completes; Open -> Resolved for
    /// NoResponseRequired incidents, which never queue.
    pub fn resolve(&mut self, now: u64) -> Result<(), InvalidTransition> {
        match self.status {
            IncidentStatus::OnScene => {
                self.status = IncidentStatus::Resolved;
                self.resolved_at = Some(now);
                self.assigned_officer = None;
                Ok(())
            }
            IncidentStatus::Open if !self.kind.requires_response() => {
                self.status = IncidentStatus::Resolved;
                self.resolved_at = Some(now);
                Ok(())
            }
            _ => Err(self.reject("resolve")),
        }
    }

    /// Queued -> Cancelled when the configured maximum wait elapses without
    /// assignment. Resolved/Cancelled never re-enter the queue.
    pub fn cancel(&mut self, now: u64) -> Result<(), InvalidTransition> {
        match self.status {
            IncidentStatus::Queued => {
                self.status = IncidentStatus::Cancelled;
                self.cancelled_at = Some(now);
                Ok(())
            }
            _ => Err(self.reject("cancel")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfficerStatus {
    OffDuty,
    AtStation,
    Patrolling,
    EnRoute,
    OnScene,
    Returning,
}

impl OfficerStatus {
    /// STORM radio status code and description for this state.
    pub fn storm_code(&self) -> (&'static str, &'static str) {
        match self {
            OfficerStatus::OffDuty => ("11", "Off duty"),
            OfficerStatus::AtStation => ("03", "Available at station"),
            OfficerStatus::Patrolling => ("02", "On patrol"),
            OfficerStatus::EnRoute => ("05", "Attending incident"),
            OfficerStatus::OnScene => ("06", "Arrived at scene"),
            OfficerStatus::Returning => ("01", "On duty"),
        }
    }

    /// Officers may only be bound to an incident in these states.
    pub fn is_deployable(&self) -> bool {
        matches!(self, OfficerStatus::AtStation | OfficerStatus::Patrolling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfficerStatus::OffDuty => "OffDuty",
            OfficerStatus::AtStation => "AtStation",
            OfficerStatus::Patrolling => "Patrolling",
            OfficerStatus::EnRoute => "EnRoute",
            OfficerStatus::OnScene => "OnScene",
            OfficerStatus::Returning => "Returning",
        }
    }
}

/// Shift pattern; hours are local wall-clock hours, Night wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftKind {
    Early,
    Late,
    Night,
}

impl ShiftKind {
    pub fn start_hour(&self) -> u32 {
        match self {
            ShiftKind::Early => 7,
            ShiftKind::Late => 15,
            ShiftKind::Night => 22,
        }
    }

    pub fn end_hour(&self) -> u32 {
        match self {
            ShiftKind::Early => 16,
            ShiftKind::Late => 0,
            ShiftKind::Night => 7,
        }
    }

    /// Whether the shift window covers the given hour of day.
    pub fn covers(&self, hour: u32) -> bool {
        let start = self.start_hour();
        let end = self.end_hour();
        if start < end {
            hour >= start && hour < end
        } else {
            // Wraps midnight (Late ends at 24:00, Night at 07:00).
            hour >= start || hour < end
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftKind::Early => "Early",
            ShiftKind::Late => "Late",
            ShiftKind::Night => "Night",
        }
    }
}

/// An officer agent. Lifecycle is owned by its station; the incident
/// reference is weak and at most one at any time.
#[derive(Debug, Clone, Component)]
pub struct Officer {
    /// Collar number; unique, ascending, used as the deterministic tie-break.
    pub collar: u32,
    pub station: Entity,
    /// Home station cell, the anchor for the Returning leg.
    pub home: CellIndex,
    pub status: OfficerStatus,
    pub current_incident: Option<Entity>,
    pub shift: ShiftKind,
    /// Set when a shift-end arrives mid-deployment; the officer signs off on
    /// return to station instead of abandoning the incident.
    pub sign_off_pending: bool,
}

impl Officer {
    pub fn new(collar: u32, station: Entity, home: CellIndex, shift: ShiftKind) -> Self {
        Self {
            collar,
            station,
            home,
            status: OfficerStatus::OffDuty,
            current_incident: None,
            shift,
            sign_off_pending: false,
        }
    }

    fn reject(&self, event: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.status.as_str(),
            event,
        }
    }

    /// OffDuty -> AtStation on shift start.
    pub fn sign_on(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            OfficerStatus::OffDuty => {
                self.status = OfficerStatus::AtStation;
                self.sign_off_pending = false;
                Ok(())
            }
            _ => Err(self.reject("sign_on")),
        }
    }

    /// AtStation/Patrolling -> EnRoute on dispatch binding. Binding in any
    /// other state is an invariant violation.
    pub fn bind(&mut self, incident: Entity) -> Result<(), InvalidTransition> {
        if !self.status.is_deployable() {
            return Err(self.reject("bind"));
        }
        self.status = OfficerStatus::EnRoute;
        self.current_incident = Some(incident);
        Ok(())
    }

    /// EnRoute -> OnScene on the travel-arrival event.
    pub fn arrive_on_scene(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            OfficerStatus::EnRoute => {
                self.status = OfficerStatus::OnScene;
                Ok(())
            }
            _ => Err(self.reject("arrive_on_scene")),
        }
    }

    /// OnScene -> Returning on service completion; detaches from the incident.
    pub fn complete_service(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            OfficerStatus::OnScene => {
                self.status = OfficerStatus::Returning;
                self.current_incident = None;
                Ok(())
            }
            _ => Err(self.reject("complete_service")),
        }
    }

    /// Returning -> AtStation (or Patrolling, per patrol policy).
    pub fn return_home(&mut self, patrol: bool) -> Result<(), InvalidTransition> {
        match self.status {
            OfficerStatus::Returning => {
                self.status = if patrol {
                    OfficerStatus::Patrolling
                } else {
                    OfficerStatus::AtStation
                };
                Ok(())
            }
            _ => Err(self.reject("return_home")),
        }
    }

    /// AtStation/Patrolling -> OffDuty on shift end.
    pub fn sign_off(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            OfficerStatus::AtStation | OfficerStatus::Patrolling => {
                self.status = OfficerStatus::OffDuty;
                self.sign_off_pending = false;
                Ok(())
            }
            _ => Err(self.reject("sign_off")),
        }
    }
}

/// A police station: owns its officer roster and shift schedule, otherwise a
/// passive location anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Station {
    pub id: u32,
}

/// Current cell of a mobile agent (officers) or fixed site (stations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Position(pub CellIndex);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_cell;

    #[test]
    fn incident_happy_path() {
        let officer = Entity::from_raw(7);
        let mut incident =
            Incident::new(IncidentKind::Immediate, test_cell(), "20230101/0900/0001".into(), 0, None);
        incident.queue().expect("queue");
        incident.assign(officer, 10).expect("assign");
        incident.begin_travel().expect("travel");
        incident.arrive(15).expect("arrive");
        incident.resolve(25).expect("resolve");
        assert_eq!(incident.status, IncidentStatus::Resolved);
        assert_eq!(incident.assigned_officer, None);
        assert_eq!(incident.arrived_at, Some(15));
    }

    #[test]
    fn terminal_incident_rejects_further_events() {
        let mut incident =
            Incident::new(IncidentKind::Prompt, test_cell(), "20230101/0900/0002".into(), 0, None);
        incident.queue().expect("queue");
        incident.cancel(100).expect("cancel");
        let err = incident.queue().expect_err("re-queue must fail");
        assert_eq!(err.from, "Cancelled");
        assert!(incident.assign(Entity::from_raw(1), 200).is_err());
    }

    #[test]
    fn no_response_resolves_from_open() {
        let mut incident = Incident::new(
            IncidentKind::NoResponseRequired,
            test_cell(),
            "20230101/0900/0003".into(),
            10,
            None,
        );
        incident.resolve(10).expect("resolve at creation");
        assert_eq!(incident.status, IncidentStatus::Resolved);
    }

    #[test]
    fn officer_cannot_be_bound_unless_deployable() {
        let station = Entity::from_raw(1);
        let mut officer = Officer::new(42, station, test_cell(), ShiftKind::Early);
        let err = officer.bind(Entity::from_raw(9)).expect_err("off duty");
        assert_eq!(err.from, "OffDuty");

        officer.sign_on().expect("sign on");
        officer.bind(Entity::from_raw(9)).expect("bind");
        assert_eq!(officer.status, OfficerStatus::EnRoute);
        // Double binding is an invariant violation.
        assert!(officer.bind(Entity::from_raw(10)).is_err());
    }

    #[test]
    fn officer_round_trip_detaches_incident() {
        let station = Entity::from_raw(1);
        let mut officer = Officer::new(7, station, test_cell(), ShiftKind::Late);
        officer.sign_on().expect("sign on");
        officer.bind(Entity::from_raw(3)).expect("bind");
        officer.arrive_on_scene().expect("arrive");
        officer.complete_service().expect("complete");
        assert_eq!(officer.current_incident, None);
        officer.return_home(false).expect("return");
        assert_eq!(officer.status, OfficerStatus::AtStation);
        officer.sign_off().expect("sign off");
    }

    #[test]
    fn shift_windows_cover_expected_hours() {
        assert!(ShiftKind::Early.covers(7));
        assert!(ShiftKind::Early.covers(15));
        assert!(!ShiftKind::Early.covers(16));
        assert!(ShiftKind::Late.covers(23));
        assert!(!ShiftKind::Late.covers(3));
        assert!(ShiftKind::Night.covers(23));
        assert!(ShiftKind::Night.covers(2));
        assert!(!ShiftKind::Night.covers(12));
    }

    #[test]
    fn storm_codes_match_radio_table() {
        assert_eq!(OfficerStatus::AtStation.storm_code().0, "03");
        assert_eq!(OfficerStatus::EnRoute.storm_code().0, "05");
        assert_eq!(OfficerStatus::OnScene.storm_code().0, "06");
        assert_eq!(OfficerStatus::OffDuty.storm_code().0, "11");
    }
}
