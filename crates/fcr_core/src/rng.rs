//! Single injected random source.
//!
//! All stochastic draws (arrivals, locations, kinds, service durations) pull
//! from this one seeded stream, so a run is fully reproducible from its seed
//! and events consume randomness in deterministic processing order.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}
