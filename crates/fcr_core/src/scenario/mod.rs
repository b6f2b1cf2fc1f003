//! Scenario configuration and world construction.

pub mod build;
pub mod params;

pub use build::build_scenario;
pub use params::{MaxIncidentWait, ReturnToPatrol, ScenarioParams, SimulationHorizonMs};
