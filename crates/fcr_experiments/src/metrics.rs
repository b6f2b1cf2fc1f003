//! Metrics extraction from completed simulation runs.
//!
//! Pulls control-room telemetry and the officer roster out of a finished
//! world and aggregates them into a flat result row suitable for export.

use bevy_ecs::prelude::World;
use fcr_core::ecs::{IncidentKind, Officer};
use fcr_core::telemetry::FcrTelemetry;

/// Aggregated metrics from a single simulation run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationResult {
    /// Total incidents reported (including those needing no response).
    pub total_incidents: usize,
    /// Total officers on the roster.
    pub total_officers: usize,
    /// Incidents attended and resolved by an officer.
    pub attended_incidents: usize,
    /// Incidents cancelled after waiting too long in the queue.
    pub cancelled_incidents: usize,
    /// Incidents filed and closed with no deployment.
    pub no_response_incidents: usize,
    /// Incident creations dropped because no location could be sampled.
    pub creations_dropped: usize,
    /// Attended / (attended + cancelled).
    pub attendance_rate: f64,
    /// Average report-to-arrival time in milliseconds.
    pub avg_response_time_ms: f64,
    /// Median report-to-arrival time in milliseconds.
    pub median_response_time_ms: f64,
    /// P90 report-to-arrival time in milliseconds.
    pub p90_response_time_ms: f64,
    /// Average report-to-assignment time in milliseconds.
    pub avg_time_to_assign_ms: f64,
    /// Median report-to-assignment time in milliseconds.
    pub median_time_to_assign_ms: f64,
    /// P90 report-to-assignment time in milliseconds.
    pub p90_time_to_assign_ms: f64,
    /// Average response time for immediate-graded incidents only.
    pub avg_immediate_response_ms: f64,
    /// P90 response time for immediate-graded incidents only.
    pub p90_immediate_response_ms: f64,
    /// Attended incidents per rostered officer.
    pub incidents_per_officer: f64,
}

impl SimulationResult {
    /// Average, median, and P90 of a sample.
    fn calculate_stats(values: &[u64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) as f64 / 2.0
        } else {
            sorted[sorted.len() / 2] as f64
        };
        let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(sorted.len() - 1)] as f64;

        (avg, median, p90)
    }
}

/// Extract metrics from a completed simulation world.
pub fn extract_metrics(world: &mut World) -> SimulationResult {
    let (
        total_incidents,
        cancelled_incidents,
        no_response_incidents,
        creations_dropped,
        response_times,
        assign_times,
        immediate_times,
    ) = {
        let telemetry = world
            .get_resource::<FcrTelemetry>()
            .expect("FcrTelemetry resource not found");

        let response_times: Vec<u64> = telemetry
            .attended
            .iter()
            .map(|r| r.response_time_ms())
            .collect();
        let assign_times: Vec<u64> = telemetry
            .attended
            .iter()
            .map(|r| r.time_to_assign_ms())
            .collect();
        let immediate_times: Vec<u64> = telemetry
            .attended
            .iter()
            .filter(|r| r.kind == IncidentKind::Immediate)
            .map(|r| r.response_time_ms())
            .collect();

        (
            telemetry.incidents_reported as usize,
            telemetry.incidents_cancelled as usize,
            telemetry.no_response_filed as usize,
            telemetry.creations_dropped as usize,
            response_times,
            assign_times,
            immediate_times,
        )
    };

    let mut officers = world.query::<&Officer>();
    let total_officers = officers.iter(world).count();

    let attended_incidents = response_times.len();
    let closed = attended_incidents + cancelled_incidents;
    let attendance_rate = if closed > 0 {
        attended_incidents as f64 / closed as f64
    } else {
        0.0
    };

    let (avg_response, median_response, p90_response) =
        SimulationResult::calculate_stats(&response_times);
    let (avg_assign, median_assign, p90_assign) = SimulationResult::calculate_stats(&assign_times);
    let (avg_immediate, _, p90_immediate) = SimulationResult::calculate_stats(&immediate_times);

    let incidents_per_officer = if total_officers > 0 {
        attended_incidents as f64 / total_officers as f64
    } else {
        0.0
    };

    SimulationResult {
        total_incidents,
        total_officers,
        attended_incidents,
        cancelled_incidents,
        no_response_incidents,
        creations_dropped,
        attendance_rate,
        avg_response_time_ms: avg_response,
        median_response_time_ms: median_response,
        p90_response_time_ms: p90_response,
        avg_time_to_assign_ms: avg_assign,
        median_time_to_assign_ms: median_assign,
        p90_time_to_assign_ms: p90_assign,
        avg_immediate_response_ms: avg_immediate,
        p90_immediate_response_ms: p90_immediate,
        incidents_per_officer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_stats_on_a_sample() {
        let values = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        let (avg, median, p90) = SimulationResult::calculate_stats(&values);
        assert_eq!(avg, 55.0);
        assert_eq!(median, 55.0);
        assert_eq!(p90, 90.0);
    }

    #[test]
    fn calculate_stats_empty() {
        let (avg, median, p90) = SimulationResult::calculate_stats(&[]);
        assert_eq!(avg, 0.0);
        assert_eq!(median, 0.0);
        assert_eq!(p90, 0.0);
    }
}
