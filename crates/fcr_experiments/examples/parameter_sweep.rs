//! Example: Parameter sweep over staffing, demand, and dispatch policy.
//!
//! This example demonstrates how to:
//! 1. Select a pre-defined parameter space
//! 2. Run multiple simulations in parallel
//! 3. Calculate health scores
//! 4. Find optimal parameter combinations
//! 5. Export results to CSV
//!
//! To use a different parameter space, change the function call in main().

use fcr_core::dispatch::DispatchPolicyKind;
use fcr_experiments::{
    export_to_csv, find_best_parameters, find_best_result_index, run_parallel_experiments,
    HealthWeights,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Starting parameter sweep experiment...");

    // Select which parameter space to use:
    // - comprehensive_space(): Full exploration of all dimensions
    // - staffing_space(): Officer headcount analysis with fixed demand
    // - demand_space(): Demand stress analysis with fixed staffing
    // - policy_space(): Dispatch policy comparison
    // - minimal_space(): Quick testing
    let space = fcr_experiments::parameter_spaces::policy_space();

    println!("Generating parameter sets...");
    let parameter_sets = space.generate();
    println!("Generated {} parameter combinations", parameter_sets.len());

    // Run experiments in parallel (uses all available CPU cores by default)
    println!("Running simulations in parallel...");
    let results = run_parallel_experiments(parameter_sets.clone(), None);
    println!("Completed {} simulations", results.len());

    println!("Calculating health scores...");
    let weights = HealthWeights::default();
    let best_idx = find_best_result_index(&results, &weights).expect("No results to analyze");

    println!("\n=== Best Configuration ===");
    let best_result = &results[best_idx];
    println!(
        "Attendance rate: {:.2}%",
        best_result.attendance_rate * 100.0
    );
    println!("Attended incidents: {}", best_result.attended_incidents);
    println!("Cancelled incidents: {}", best_result.cancelled_incidents);
    println!(
        "Avg response time: {:.1} min",
        best_result.avg_response_time_ms / 60_000.0
    );
    println!(
        "P90 response time: {:.1} min",
        best_result.p90_response_time_ms / 60_000.0
    );
    println!(
        "Avg time to assign: {:.1} min",
        best_result.avg_time_to_assign_ms / 60_000.0
    );
    println!(
        "Incidents per officer: {:.2}",
        best_result.incidents_per_officer
    );

    if let Some(best_params) = find_best_parameters(&results, &parameter_sets, &weights) {
        println!("\n=== Best Parameters ===");
        println!("Stations: {}", best_params.params.num_stations);
        println!(
            "Officers per shift: {}",
            best_params.params.officers_per_shift
        );
        println!(
            "Incidents per hour: {:.1}",
            best_params.params.incidents_per_hour
        );
        let policy_name = match best_params.params.dispatch_policy {
            DispatchPolicyKind::NearestAvailable => "nearest available",
            DispatchPolicyKind::FirstAvailable => "first available",
        };
        println!("Dispatch policy: {}", policy_name);
        match best_params.params.max_wait_ms {
            Some(ms) => println!("Max queued wait: {} min", ms / 60_000),
            None => println!("Max queued wait: unlimited"),
        }
        println!("Return to patrol: {}", best_params.params.return_to_patrol);
    }

    println!("\nExporting results...");
    export_to_csv(&results, &parameter_sets, "experiment_results.csv")?;
    println!("Exported to experiment_results.csv");

    println!("\nExperiment complete!");

    Ok(())
}
