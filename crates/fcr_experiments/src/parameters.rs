//! Parameter variation framework for exploring the scenario parameter space.
//!
//! Supports grid search (Cartesian product over the specified dimensions)
//! and random sampling. Dimensions left unspecified fall back to the base
//! scenario's value.

use std::collections::HashSet;

use fcr_core::clock::ONE_MIN_MS;
use fcr_core::dispatch::DispatchPolicyKind;
use fcr_core::scenario::ScenarioParams;

/// A single parameter configuration for a simulation run.
///
/// Wraps `ScenarioParams` with experiment metadata for tracking and
/// reproducibility.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Base scenario parameters.
    pub params: ScenarioParams,
    /// Unique experiment ID for this parameter configuration.
    pub experiment_id: String,
    /// Run ID within the experiment (for multiple runs with same params).
    pub run_id: usize,
    /// Seed used for this run.
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(params: ScenarioParams, experiment_id: String, run_id: usize, seed: u64) -> Self {
        Self {
            params,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// Get the scenario params with this run's seed applied.
    pub fn scenario_params(&self) -> ScenarioParams {
        let mut params = self.params.clone();
        params.seed = self.seed;
        params
    }
}

/// Defines a parameter space for exploration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    /// Base parameters (defaults for unspecified dimensions).
    base: ScenarioParams,
    num_stations: Vec<usize>,
    officers_per_shift: Vec<usize>,
    incidents_per_hour: Vec<f64>,
    dispatch_policies: Vec<DispatchPolicyKind>,
    max_wait_minutes: Vec<Option<u64>>,
    return_to_patrol: Vec<bool>,
    horizon_hours: Vec<u64>,
    epoch_ms: Vec<i64>,
}

fn values_or<T: Clone>(values: &[T], default: T) -> Vec<T> {
    if values.is_empty() {
        vec![default]
    } else {
        values.to_vec()
    }
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            base: ScenarioParams::default(),
            num_stations: vec![],
            officers_per_shift: vec![],
            incidents_per_hour: vec![],
            dispatch_policies: vec![],
            max_wait_minutes: vec![],
            return_to_patrol: vec![],
            horizon_hours: vec![],
            epoch_ms: vec![],
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn num_stations(mut self, counts: Vec<usize>) -> Self {
        self.num_stations = counts;
        self
    }

    pub fn officers_per_shift(mut self, counts: Vec<usize>) -> Self {
        self.officers_per_shift = counts;
        self
    }

    pub fn incidents_per_hour(mut self, rates: Vec<f64>) -> Self {
        self.incidents_per_hour = rates;
        self
    }

    pub fn dispatch_policy(mut self, policies: Vec<DispatchPolicyKind>) -> Self {
        self.dispatch_policies = policies;
        self
    }

    /// Maximum queued wait before cancellation; `None` disables age-out.
    pub fn max_wait_minutes(mut self, minutes: Vec<Option<u64>>) -> Self {
        self.max_wait_minutes = minutes;
        self
    }

    pub fn return_to_patrol(mut self, values: Vec<bool>) -> Self {
        self.return_to_patrol = values;
        self
    }

    pub fn horizon_hours(mut self, hours: Vec<u64>) -> Self {
        self.horizon_hours = hours;
        self
    }

    /// Epoch (start datetime) values to explore.
    pub fn epoch_ms(mut self, epochs: Vec<i64>) -> Self {
        self.epoch_ms = epochs;
        self
    }

    /// Set base parameters (used as defaults).
    pub fn with_base(mut self, base: ScenarioParams) -> Self {
        self.base = base;
        self
    }

    fn apply(
        &self,
        num_stations: usize,
        officers_per_shift: usize,
        incidents_per_hour: f64,
        policy: DispatchPolicyKind,
        max_wait_minutes: Option<u64>,
        return_to_patrol: bool,
        horizon_hours: u64,
        epoch_ms: i64,
    ) -> ScenarioParams {
        let mut params = self.base.clone();
        params.num_stations = num_stations;
        params.officers_per_shift = officers_per_shift;
        params.incidents_per_hour = incidents_per_hour;
        params.dispatch_policy = policy;
        params.max_wait_ms = max_wait_minutes.map(|m| m * ONE_MIN_MS);
        params.return_to_patrol = return_to_patrol;
        params.horizon_ms = horizon_hours * 60 * 60 * 1000;
        params.epoch_ms = epoch_ms;
        params
    }

    /// Generate all parameter sets using grid search (Cartesian product).
    ///
    /// Dimensions not specified use the base configuration's value.
    pub fn generate(&self) -> Vec<ParameterSet> {
        let num_stations = values_or(&self.num_stations, self.base.num_stations);
        let officers_per_shift = values_or(&self.officers_per_shift, self.base.officers_per_shift);
        let incidents_per_hour = values_or(&self.incidents_per_hour, self.base.incidents_per_hour);
        let policies = values_or(&self.dispatch_policies, self.base.dispatch_policy);
        let max_waits = values_or(&self.max_wait_minutes, self.base.max_wait_ms.map(|ms| ms / ONE_MIN_MS));
        let patrol = values_or(&self.return_to_patrol, self.base.return_to_patrol);
        let horizons = values_or(&self.horizon_hours, self.base.horizon_ms / (60 * 60 * 1000));
        let epochs = values_or(&self.epoch_ms, self.base.epoch_ms);

        let mut sets = Vec::new();
        for &stations in &num_stations {
            for &officers in &officers_per_shift {
                for &rate in &incidents_per_hour {
                    for &policy in &policies {
                        for &max_wait in &max_waits {
                            for &rtp in &patrol {
                                for &hours in &horizons {
                                    for &epoch in &epochs {
                                        let params = self.apply(
                                            stations, officers, rate, policy, max_wait, rtp,
                                            hours, epoch,
                                        );
                                        let experiment_id = sets.len();
                                        let seed = (experiment_id as u64).wrapping_mul(0x9e3779b9);
                                        sets.push(ParameterSet::new(
                                            params,
                                            format!("exp_{experiment_id}"),
                                            0,
                                            seed,
                                        ));
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        sets
    }

    /// Generate random parameter sets (Monte Carlo sampling).
    ///
    /// Samples `count` unique parameter sets from the defined space; stops
    /// early if the space is too small to yield that many unique sets.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        use rand::rngs::StdRng;
        use rand::Rng;
        use rand::SeedableRng;

        fn pick<'a, T>(rng: &mut StdRng, values: &'a [T]) -> &'a T {
            &values[rng.gen_range(0..values.len())]
        }

        let num_stations = values_or(&self.num_stations, self.base.num_stations);
        let officers_per_shift = values_or(&self.officers_per_shift, self.base.officers_per_shift);
        let incidents_per_hour = values_or(&self.incidents_per_hour, self.base.incidents_per_hour);
        let policies = values_or(&self.dispatch_policies, self.base.dispatch_policy);
        let max_waits = values_or(&self.max_wait_minutes, self.base.max_wait_ms.map(|ms| ms / ONE_MIN_MS));
        let patrol = values_or(&self.return_to_patrol, self.base.return_to_patrol);
        let horizons = values_or(&self.horizon_hours, self.base.horizon_ms / (60 * 60 * 1000));
        let epochs = values_or(&self.epoch_ms, self.base.epoch_ms);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut parameter_sets = Vec::new();
        let mut seen = HashSet::new();
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 10_000;

        while parameter_sets.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;
            let params = self.apply(
                *pick(&mut rng, &num_stations),
                *pick(&mut rng, &officers_per_shift),
                *pick(&mut rng, &incidents_per_hour),
                *pick(&mut rng, &policies),
                *pick(&mut rng, &max_waits),
                *pick(&mut rng, &patrol),
                *pick(&mut rng, &horizons),
                *pick(&mut rng, &epochs),
            );

            let param_hash = format!("{params:?}");
            if !seen.insert(param_hash) {
                continue;
            }

            let seed_value = seed
                .wrapping_add(parameter_sets.len() as u64)
                .wrapping_mul(0x9e3779b9);
            parameter_sets.push(ParameterSet::new(
                params,
                format!("random_{}", parameter_sets.len()),
                0,
                seed_value,
            ));
        }

        parameter_sets
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}
