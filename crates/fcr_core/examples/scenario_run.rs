//! Run a 24-hour force-area scenario and print attended incidents.
//!
//! Run with: cargo run -p fcr_core --example scenario_run

use bevy_ecs::prelude::World;
use fcr_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use fcr_core::scenario::{build_scenario, ScenarioParams};

fn main() {
    const STATIONS: usize = 4;
    const OFFICERS_PER_SHIFT: usize = 3;
    const SIMULATION_HOURS: u64 = 24;

    let mut world = World::new();
    let params = ScenarioParams::default()
        .with_seed(123)
        .with_stations(STATIONS, OFFICERS_PER_SHIFT)
        .with_incidents_per_hour(8.0)
        .with_max_wait_minutes(120)
        .with_horizon_hours(SIMULATION_HOURS);
    if let Err(e) = build_scenario(&mut world, params) {
        eprintln!("scenario rejected: {e}");
        std::process::exit(1);
    }
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let max_steps = 2_000_000;
    let steps = match run_until_empty(&mut world, &mut schedule, max_steps) {
        Ok(steps) => steps,
        Err(e) => {
            eprintln!("run halted: {e}");
            std::process::exit(1);
        }
    };

    let telemetry = world.resource::<fcr_core::telemetry::FcrTelemetry>();
    let clock = world.resource::<fcr_core::clock::SimulationClock>();
    let sim_time_secs = clock.now() / 1000;

    println!(
        "--- Scenario run ({STATIONS} stations, {OFFICERS_PER_SHIFT} officers/shift, {SIMULATION_HOURS}h horizon, seed 123) ---"
    );
    println!("Steps executed: {steps}");
    println!(
        "Simulation time: {} s ({:.1} h)",
        sim_time_secs,
        sim_time_secs as f64 / 3600.0
    );
    println!("Incidents reported: {}", telemetry.incidents_reported);
    println!("Incidents resolved: {}", telemetry.incidents_resolved);
    println!("Incidents cancelled: {}", telemetry.incidents_cancelled);
    println!("Creations dropped: {}", telemetry.creations_dropped);
    if let Some(avg) = telemetry.avg_response_time_ms() {
        println!("Average response time: {:.1} min", avg / 60_000.0);
    }

    const SAMPLE: usize = 50;
    if !telemetry.attended.is_empty() {
        println!("\nSample attended incidents (first {SAMPLE}):");
        for (i, r) in telemetry.attended.iter().take(SAMPLE).enumerate() {
            println!(
                "  {}  isr={} kind={:?} collar={}  response={} s  on_scene={} s",
                i + 1,
                r.isr,
                r.kind,
                r.officer_collar,
                r.response_time_ms() / 1000,
                r.time_on_scene_ms() / 1000,
            );
        }
        if telemetry.attended.len() > SAMPLE {
            println!("  ... and {} more", telemetry.attended.len() - SAMPLE);
        }
    }
}
