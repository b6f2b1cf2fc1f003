//! Parallel experimentation framework for police dispatch parameter sweeps.
//!
//! This crate runs many simulations in parallel with varying parameters,
//! extracts response-time and attendance metrics, and scores configurations
//! to analyze how staffing, demand, and dispatch policy affect outcomes.
//!
//! # Quick Start
//!
//! ```no_run
//! use fcr_experiments::{ParameterSpace, run_parallel_experiments, HealthWeights, find_best_result_index};
//!
//! // Define parameter space (grid search)
//! let space = ParameterSpace::grid()
//!     .officers_per_shift(vec![2, 4, 6])
//!     .incidents_per_hour(vec![4.0, 8.0, 12.0]);
//!
//! // Generate parameter sets
//! let parameter_sets = space.generate();
//!
//! // Run experiments in parallel
//! let results = run_parallel_experiments(parameter_sets, None);
//!
//! // Score and find the best configuration
//! let weights = HealthWeights::default();
//! let best_idx = find_best_result_index(&results, &weights).unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: Parameter variation framework (grid search, random sampling)
//! - [`runner`]: Parallel simulation execution using rayon
//! - [`metrics`]: Metrics extraction from completed runs
//! - [`health`]: Force health score calculation
//! - [`export`]: Result export to CSV/Parquet/JSON

pub mod export;
pub mod health;
pub mod metrics;
pub mod parameter_spaces;
pub mod parameters;
pub mod runner;

pub use export::{
    export_to_csv, export_to_json, export_to_parquet, find_best_parameters,
    find_best_result_index,
};
pub use health::{calculate_health_scores, HealthWeights};
pub use metrics::SimulationResult;
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::run_parallel_experiments;
