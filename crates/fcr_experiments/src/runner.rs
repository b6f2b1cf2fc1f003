//! Parallel simulation execution using rayon.
//!
//! Runs single parameter sets to completion and executes whole sweeps
//! concurrently across CPU cores.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy_ecs::prelude::World;
use fcr_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use fcr_core::scenario::build_scenario;
use fcr_core::telemetry::{FcrTelemetry, SimSnapshots};
use fcr_core::telemetry_export::{write_attended_incidents_parquet, write_snapshot_counts_parquet};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::metrics::{extract_metrics, SimulationResult};
use crate::parameters::ParameterSet;

const MAX_SIMULATION_STEPS: usize = 2_000_000;

#[derive(Debug, Clone)]
pub struct SimulationArtifacts {
    pub metrics: SimulationResult,
    pub attended_incidents_parquet: Vec<u8>,
    pub snapshot_counts_parquet: Vec<u8>,
}

/// Run one parameter set to completion and return metrics plus exported
/// telemetry parquet payloads.
pub fn run_single_simulation_with_artifacts(
    param_set: &ParameterSet,
) -> Result<SimulationArtifacts, String> {
    let mut world = World::new();
    let params = param_set.scenario_params();

    build_scenario(&mut world, params)
        .map_err(|error| format!("scenario rejected: {error}"))?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, MAX_SIMULATION_STEPS)
        .map_err(|error| format!("simulation halted: {error}"))?;

    let metrics = extract_metrics(&mut world);
    let telemetry = world
        .get_resource::<FcrTelemetry>()
        .ok_or_else(|| "FcrTelemetry resource not found".to_string())?;
    let snapshots = world
        .get_resource::<SimSnapshots>()
        .ok_or_else(|| "SimSnapshots resource not found".to_string())?;

    let attended_incidents_parquet = serialize_to_parquet_bytes(
        |path| write_attended_incidents_parquet(path, telemetry),
        &param_set.experiment_id,
        param_set.run_id,
        "attended-incidents",
    )?;
    let snapshot_counts_parquet = serialize_to_parquet_bytes(
        |path| write_snapshot_counts_parquet(path, snapshots),
        &param_set.experiment_id,
        param_set.run_id,
        "snapshot-counts",
    )?;

    Ok(SimulationArtifacts {
        metrics,
        attended_incidents_parquet,
        snapshot_counts_parquet,
    })
}

/// Run a single simulation with the given parameter set.
///
/// Creates a new world, builds the scenario, runs the simulation to
/// completion, and extracts metrics from the results.
pub fn run_single_simulation(param_set: &ParameterSet) -> SimulationResult {
    run_single_simulation_with_artifacts(param_set)
        .expect("single simulation should execute and export telemetry")
        .metrics
}

fn serialize_to_parquet_bytes<F>(
    write_fn: F,
    id: &str,
    index: usize,
    suffix: &str,
) -> Result<Vec<u8>, String>
where
    F: FnOnce(&std::path::Path) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut temp_path = std::env::temp_dir();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|error| format!("Failed to read clock for parquet export: {error}"))?
        .as_nanos();
    temp_path.push(format!(
        "fcr-experiment-{id}-{index}-{suffix}-{timestamp}.parquet"
    ));

    write_fn(&temp_path).map_err(|error| format!("Parquet export failed: {error}"))?;
    let bytes = fs::read(&temp_path)
        .map_err(|error| format!("Failed to read exported parquet file: {error}"))?;
    let _ = fs::remove_file(&temp_path);
    Ok(bytes)
}

/// Run multiple simulations in parallel.
///
/// Uses rayon to execute simulations concurrently across available CPU
/// cores. Results come back in the same order as the input parameter sets.
pub fn run_parallel_experiments(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> Vec<SimulationResult> {
    run_parallel_experiments_with_progress(parameter_sets, num_threads, true)
}

/// Run multiple simulations in parallel with an optional progress bar.
pub fn run_parallel_experiments_with_progress(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Vec<SimulationResult> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let pool = if let Some(threads) = num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("Failed to create thread pool")
    } else {
        rayon::ThreadPoolBuilder::new()
            .build()
            .expect("Failed to create thread pool")
    };

    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation(param_set);
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    results
}
