//! Force health score calculation.
//!
//! Combines a run's attendance and response-time metrics into a single
//! weighted score so parameter sweeps can be ranked.

use crate::metrics::SimulationResult;

/// Configurable weights for the force health score.
///
/// # Default Weights
///
/// - Attendance rate: 0.35 (higher is better)
/// - Response time: 0.25 (inverted, lower is better)
/// - Immediate response time: 0.20 (inverted, lower is better)
/// - Time to assign: 0.20 (inverted, lower is better)
/// - Cancelled incidents: -0.25 (penalty, lower is better)
#[derive(Debug, Clone, Copy)]
pub struct HealthWeights {
    /// Weight for attendance rate (higher is better).
    pub attendance_weight: f64,
    /// Weight for average response time (inverted).
    pub response_time_weight: f64,
    /// Weight for immediate-grade response time (inverted).
    pub immediate_response_weight: f64,
    /// Weight for time to assignment (inverted).
    pub time_to_assign_weight: f64,
    /// Penalty weight for cancelled incidents (negative).
    pub cancelled_penalty: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            attendance_weight: 0.35,
            response_time_weight: 0.25,
            immediate_response_weight: 0.20,
            time_to_assign_weight: 0.20,
            cancelled_penalty: -0.25,
        }
    }
}

impl HealthWeights {
    pub fn new(
        attendance_weight: f64,
        response_time_weight: f64,
        immediate_response_weight: f64,
        time_to_assign_weight: f64,
        cancelled_penalty: f64,
    ) -> Self {
        Self {
            attendance_weight,
            response_time_weight,
            immediate_response_weight,
            time_to_assign_weight,
            cancelled_penalty,
        }
    }
}

/// Min-max normalize to [0, 1]; a flat metric scores 0.5.
fn normalize_metric(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        0.5
    } else {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }
}

fn min_max(results: &[SimulationResult], metric: impl Fn(&SimulationResult) -> f64) -> (f64, f64) {
    results
        .iter()
        .map(metric)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        })
}

/// Calculate health scores for all simulation results.
///
/// Metrics are normalized across the whole result set, so scores are only
/// comparable within one sweep. Higher is healthier.
pub fn calculate_health_scores(results: &[SimulationResult], weights: &HealthWeights) -> Vec<f64> {
    if results.is_empty() {
        return vec![];
    }

    let (attendance_min, attendance_max) = min_max(results, |r| r.attendance_rate);
    let (response_min, response_max) = min_max(results, |r| r.avg_response_time_ms);
    let (immediate_min, immediate_max) = min_max(results, |r| r.avg_immediate_response_ms);
    let (assign_min, assign_max) = min_max(results, |r| r.avg_time_to_assign_ms);
    let (cancelled_min, cancelled_max) = min_max(results, |r| r.cancelled_incidents as f64);

    results
        .iter()
        .map(|result| {
            let attendance_norm =
                normalize_metric(result.attendance_rate, attendance_min, attendance_max);
            // Timing metrics invert: lower is better.
            let response_norm = 1.0
                - normalize_metric(result.avg_response_time_ms, response_min, response_max);
            let immediate_norm = 1.0
                - normalize_metric(
                    result.avg_immediate_response_ms,
                    immediate_min,
                    immediate_max,
                );
            let assign_norm =
                1.0 - normalize_metric(result.avg_time_to_assign_ms, assign_min, assign_max);
            let cancelled_norm = 1.0
                - normalize_metric(
                    result.cancelled_incidents as f64,
                    cancelled_min,
                    cancelled_max,
                );

            attendance_norm * weights.attendance_weight
                + response_norm * weights.response_time_weight
                + immediate_norm * weights.immediate_response_weight
                + assign_norm * weights.time_to_assign_weight
                + cancelled_norm * weights.cancelled_penalty
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(
        attendance_rate: f64,
        avg_response_time_ms: f64,
        cancelled: usize,
    ) -> SimulationResult {
        SimulationResult {
            total_incidents: 100,
            total_officers: 12,
            attended_incidents: 80,
            cancelled_incidents: cancelled,
            no_response_incidents: 10,
            creations_dropped: 0,
            attendance_rate,
            avg_response_time_ms,
            median_response_time_ms: avg_response_time_ms,
            p90_response_time_ms: avg_response_time_ms * 2.0,
            avg_time_to_assign_ms: avg_response_time_ms / 3.0,
            median_time_to_assign_ms: avg_response_time_ms / 3.0,
            p90_time_to_assign_ms: avg_response_time_ms,
            avg_immediate_response_ms: avg_response_time_ms * 0.8,
            p90_immediate_response_ms: avg_response_time_ms * 1.5,
            incidents_per_officer: 6.7,
        }
    }

    #[test]
    fn normalize_metric_clamps_and_handles_flat_ranges() {
        assert_eq!(normalize_metric(50.0, 0.0, 100.0), 0.5);
        assert_eq!(normalize_metric(0.0, 0.0, 100.0), 0.0);
        assert_eq!(normalize_metric(100.0, 0.0, 100.0), 1.0);
        assert_eq!(normalize_metric(50.0, 50.0, 50.0), 0.5);
    }

    #[test]
    fn faster_better_attended_run_scores_higher() {
        let results = vec![
            result(0.95, 400_000.0, 2),
            result(0.70, 900_000.0, 20),
        ];
        let scores = calculate_health_scores(&results, &HealthWeights::default());
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn empty_results_give_no_scores() {
        let scores = calculate_health_scores(&[], &HealthWeights::default());
        assert!(scores.is_empty());
    }
}
