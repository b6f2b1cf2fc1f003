use fcr_core::dispatch::DispatchPolicyKind;

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

pub(crate) fn export_to_csv_impl(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.len() != parameter_sets.len() {
        return Err(format!(
            "Results length ({}) doesn't match parameter_sets length ({})",
            results.len(),
            parameter_sets.len()
        )
        .into());
    }

    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "seed",
        "num_stations",
        "officers_per_shift",
        "incidents_per_hour",
        "dispatch_policy",
        "max_wait_ms",
        "return_to_patrol",
        "horizon_ms",
        "epoch_ms",
        "total_incidents",
        "total_officers",
        "attended_incidents",
        "cancelled_incidents",
        "no_response_incidents",
        "creations_dropped",
        "attendance_rate",
        "avg_response_time_ms",
        "median_response_time_ms",
        "p90_response_time_ms",
        "avg_time_to_assign_ms",
        "median_time_to_assign_ms",
        "p90_time_to_assign_ms",
        "avg_immediate_response_ms",
        "p90_immediate_response_ms",
        "incidents_per_officer",
    ])?;

    for (result, param_set) in results.iter().zip(parameter_sets.iter()) {
        let policy = match param_set.params.dispatch_policy {
            DispatchPolicyKind::NearestAvailable => "nearest_available",
            DispatchPolicyKind::FirstAvailable => "first_available",
        };

        wtr.write_record([
            &param_set.experiment_id,
            &param_set.run_id.to_string(),
            &param_set.seed.to_string(),
            &param_set.params.num_stations.to_string(),
            &param_set.params.officers_per_shift.to_string(),
            &param_set.params.incidents_per_hour.to_string(),
            &policy.to_string(),
            &param_set
                .params
                .max_wait_ms
                .map(|w| w.to_string())
                .unwrap_or_default(),
            &param_set.params.return_to_patrol.to_string(),
            &param_set.params.horizon_ms.to_string(),
            &param_set.params.epoch_ms.to_string(),
            &result.total_incidents.to_string(),
            &result.total_officers.to_string(),
            &result.attended_incidents.to_string(),
            &result.cancelled_incidents.to_string(),
            &result.no_response_incidents.to_string(),
            &result.creations_dropped.to_string(),
            &result.attendance_rate.to_string(),
            &result.avg_response_time_ms.to_string(),
            &result.median_response_time_ms.to_string(),
            &result.p90_response_time_ms.to_string(),
            &result.avg_time_to_assign_ms.to_string(),
            &result.median_time_to_assign_ms.to_string(),
            &result.p90_time_to_assign_ms.to_string(),
            &result.avg_immediate_response_ms.to_string(),
            &result.p90_immediate_response_ms.to_string(),
            &result.incidents_per_officer.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
