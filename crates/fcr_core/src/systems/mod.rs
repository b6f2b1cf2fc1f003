//! Event-handling systems, one per event kind. The runner pops an event,
//! inserts it as [`crate::clock::CurrentEvent`], and runs the schedule; each
//! system is gated on its event kind.

pub mod dispatch;
pub mod expiry;
pub mod incident_spawner;
pub mod officer_arrival;
pub mod officer_returned;
pub mod service_completed;
pub mod shift;
pub mod simulation_started;
pub mod telemetry_snapshot;
