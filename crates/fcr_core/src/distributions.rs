//! Service-duration distributions, sampled per incident kind on arrival at
//! the scene.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::ONE_MIN_MS;
use crate::ecs::IncidentKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DurationDistribution {
    Fixed { ms: u64 },
    Uniform { min_ms: u64, max_ms: u64 },
    Exponential { mean_ms: u64 },
}

impl DurationDistribution {
    pub fn sample(&self, rng: &mut StdRng) -> u64 {
        match *self {
            DurationDistribution::Fixed { ms } => ms,
            DurationDistribution::Uniform { min_ms, max_ms } => {
                if min_ms >= max_ms {
                    min_ms
                } else {
                    rng.gen_range(min_ms..=max_ms)
                }
            }
            DurationDistribution::Exponential { mean_ms } => {
                // Inverse-CDF draw; 1 - U keeps the argument strictly positive.
                let u: f64 = rng.gen();
                (-(1.0 - u).ln() * mean_ms as f64).round() as u64
            }
        }
    }
}

/// Per-kind time-on-scene distributions.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct ServiceDurations {
    pub immediate: DurationDistribution,
    pub prompt: DurationDistribution,
    pub scheduled: DurationDistribution,
    pub appointment: DurationDistribution,
}

impl ServiceDurations {
    pub fn for_kind(&self, kind: IncidentKind) -> DurationDistribution {
        match kind {
            IncidentKind::Immediate => self.immediate,
            IncidentKind::Prompt => self.prompt,
            IncidentKind::Scheduled => self.scheduled,
            IncidentKind::Appointment => self.appointment,
            // Never dispatched, never sampled; zero keeps the table total.
            IncidentKind::NoResponseRequired => DurationDistribution::Fixed { ms: 0 },
        }
    }

    pub fn sample(&self, kind: IncidentKind, rng: &mut StdRng) -> u64 {
        self.for_kind(kind).sample(rng)
    }
}

impl Default for ServiceDurations {
    fn default() -> Self {
        Self {
            immediate: DurationDistribution::Uniform {
                min_ms: 30 * ONE_MIN_MS,
                max_ms: 90 * ONE_MIN_MS,
            },
            prompt: DurationDistribution::Uniform {
                min_ms: 20 * ONE_MIN_MS,
                max_ms: 60 * ONE_MIN_MS,
            },
            scheduled: DurationDistribution::Fixed { ms: 45 * ONE_MIN_MS },
            appointment: DurationDistribution::Fixed { ms: 30 * ONE_MIN_MS },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn fixed_is_constant() {
        let mut rng = StdRng::seed_from_u64(1);
        let d = DurationDistribution::Fixed { ms: 500 };
        assert_eq!(d.sample(&mut rng), 500);
        assert_eq!(d.sample(&mut rng), 500);
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = DurationDistribution::Uniform { min_ms: 100, max_ms: 200 };
        for _ in 0..100 {
            let s = d.sample(&mut rng);
            assert!((100..=200).contains(&s));
        }
    }

    #[test]
    fn exponential_mean_is_roughly_right() {
        let mut rng = StdRng::seed_from_u64(11);
        let d = DurationDistribution::Exponential { mean_ms: 10_000 };
        let n = 2_000;
        let total: u64 = (0..n).map(|_| d.sample(&mut rng)).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 10_000.0).abs() < 1_000.0, "mean was {mean}");
    }

    #[test]
    fn no_response_samples_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let durations = ServiceDurations::default();
        assert_eq!(durations.sample(IncidentKind::NoResponseRequired, &mut rng), 0);
    }
}
