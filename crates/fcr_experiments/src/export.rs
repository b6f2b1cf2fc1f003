//! Result export and analysis utilities.
//!
//! Exports sweep results to CSV/Parquet/JSON and finds the best parameter
//! combination by health score.

use std::path::Path;

use crate::health::HealthWeights;
use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/ranking.rs"]
mod ranking;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export simulation results to Parquet format.
///
/// Creates a Parquet file with columns for all metrics in
/// [`SimulationResult`].
pub fn export_to_parquet(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

/// Export simulation results to JSON format.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export simulation results with their parameters to CSV format.
///
/// Parameters and results are paired by index (`results[i]` corresponds to
/// `parameter_sets[i]`).
pub fn export_to_csv(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, parameter_sets, file)
}

/// Find the parameter set with the highest health score.
pub fn find_best_parameters<'a>(
    results: &'a [SimulationResult],
    parameter_sets: &'a [ParameterSet],
    weights: &'a HealthWeights,
) -> Option<&'a ParameterSet> {
    ranking::find_best_parameters_impl(results, parameter_sets, weights)
}

/// Find the index of the best result by health score.
pub fn find_best_result_index(
    results: &[SimulationResult],
    weights: &HealthWeights,
) -> Option<usize> {
    ranking::find_best_index_by_health(results, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn result(attendance_rate: f64, avg_response_time_ms: f64) -> SimulationResult {
        SimulationResult {
            total_incidents: 120,
            total_officers: 18,
            attended_incidents: 100,
            cancelled_incidents: 8,
            no_response_incidents: 12,
            creations_dropped: 0,
            attendance_rate,
            avg_response_time_ms,
            median_response_time_ms: avg_response_time_ms,
            p90_response_time_ms: avg_response_time_ms * 2.0,
            avg_time_to_assign_ms: 60_000.0,
            median_time_to_assign_ms: 45_000.0,
            p90_time_to_assign_ms: 180_000.0,
            avg_immediate_response_ms: avg_response_time_ms * 0.8,
            p90_immediate_response_ms: avg_response_time_ms * 1.6,
            incidents_per_officer: 5.6,
        }
    }

    #[test]
    fn json_export_contains_metric_names() {
        let results = vec![result(0.9, 500_000.0)];
        let file = NamedTempFile::new().unwrap();
        export_to_json(&results, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("attendance_rate"));
        assert!(contents.contains("avg_response_time_ms"));
    }

    #[test]
    fn parquet_export_rejects_empty_results() {
        let file = NamedTempFile::new().unwrap();
        assert!(export_to_parquet(&[], file.path()).is_err());
    }

    #[test]
    fn csv_export_writes_params_and_metrics() {
        use crate::parameters::ParameterSpace;

        let sets = ParameterSpace::grid()
            .officers_per_shift(vec![2, 4])
            .generate();
        let results = vec![result(0.9, 500_000.0), result(0.8, 700_000.0)];

        let file = NamedTempFile::new().unwrap();
        export_to_csv(&results, &sets, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("experiment_id"));
        assert!(contents.contains("officers_per_shift"));
        assert!(contents.contains("exp_0"));
        assert!(contents.contains("exp_1"));
    }

    #[test]
    fn csv_export_rejects_mismatched_lengths() {
        use crate::parameters::ParameterSpace;

        let sets = ParameterSpace::grid().officers_per_shift(vec![2]).generate();
        let results = vec![result(0.9, 500_000.0), result(0.8, 700_000.0)];
        let file = NamedTempFile::new().unwrap();
        assert!(export_to_csv(&results, &sets, file.path()).is_err());
    }

    #[test]
    fn best_result_index_prefers_the_healthier_run() {
        let results = vec![result(0.7, 900_000.0), result(0.95, 400_000.0)];
        let weights = HealthWeights::default();
        let best_idx = find_best_result_index(&results, &weights).unwrap();
        assert_eq!(best_idx, 1);
    }
}
