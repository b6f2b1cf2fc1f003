//! Incident location sampling.
//!
//! Locations are drawn from weighted H3 cells (a discrete stand-in for the
//! density surface estimated from historical incident data), with an optional
//! bounding box enforced by bounded rejection sampling.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use h3o::{CellIndex, LatLng, Resolution};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ecs::IncidentKind;
use crate::error::{ConfigError, SamplingError};

pub trait LocationSampler: Send + Sync {
    fn sample(&self, kind: IncidentKind, rng: &mut StdRng) -> Result<CellIndex, SamplingError>;
}

#[derive(Resource)]
pub struct LocationSamplerResource(pub Box<dyn LocationSampler>);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lat_min < self.lat_max && (-90.0..=90.0).contains(&self.lat_min) && (-90.0..=90.0).contains(&self.lat_max)) {
            return Err(ConfigError::InvalidLatBounds {
                lat_min: self.lat_min,
                lat_max: self.lat_max,
            });
        }
        if !(self.lng_min < self.lng_max && (-180.0..=180.0).contains(&self.lng_min) && (-180.0..=180.0).contains(&self.lng_max)) {
            return Err(ConfigError::InvalidLngBounds {
                lng_min: self.lng_min,
                lng_max: self.lng_max,
            });
        }
        Ok(())
    }

    pub fn contains(&self, point: LatLng) -> bool {
        let lat = point.lat();
        let lng = point.lng();
        lat >= self.lat_min && lat <= self.lat_max && lng >= self.lng_min && lng <= self.lng_max
    }

    /// Rough Hertfordshire force area.
    pub fn hertfordshire() -> Self {
        Self {
            lat_min: 51.6,
            lat_max: 52.1,
            lng_min: -0.75,
            lng_max: 0.25,
        }
    }
}

/// Cells with cumulative weights; lookup by binary search on a uniform draw.
#[derive(Debug, Clone, Default)]
struct WeightedCells {
    cells: Vec<CellIndex>,
    cumulative: Vec<f64>,
    total: f64,
}

impl WeightedCells {
    fn from_weighted(cells: &[(CellIndex, f64)]) -> Self {
        let mut out = Self::default();
        for &(cell, weight) in cells {
            if weight <= 0.0 {
                continue;
            }
            out.total += weight;
            out.cells.push(cell);
            out.cumulative.push(out.total);
        }
        out
    }

    fn draw(&self, rng: &mut StdRng) -> Option<CellIndex> {
        if self.cells.is_empty() {
            return None;
        }
        let u: f64 = rng.gen_range(0.0..self.total);
        let idx = self.cumulative.partition_point(|&c| c <= u);
        Some(self.cells[idx.min(self.cells.len() - 1)])
    }
}

const MAX_SAMPLE_ATTEMPTS: u32 = 64;

/// Weighted-cell sampler with a shared default surface and optional per-kind
/// overrides (e.g. appointments clustered around town centres).
pub struct WeightedCellSampler {
    default_cells: WeightedCells,
    overrides: HashMap<IncidentKind, WeightedCells>,
    bounds: Option<BoundingBox>,
    max_attempts: u32,
}

impl WeightedCellSampler {
    pub fn new(cells: &[(CellIndex, f64)]) -> Self {
        Self {
            default_cells: WeightedCells::from_weighted(cells),
            overrides: HashMap::new(),
            bounds: None,
            max_attempts: MAX_SAMPLE_ATTEMPTS,
        }
    }

    pub fn with_override(mut self, kind: IncidentKind, cells: &[(CellIndex, f64)]) -> Self {
        self.overrides.insert(kind, WeightedCells::from_weighted(cells));
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Hotspot surface over the Hertfordshire towns, heaviest around the
    /// Watford / St Albans corridor.
    pub fn hertfordshire_hotspots() -> Self {
        let hotspots: [(f64, f64, f64); 6] = [
            (51.655, -0.396, 3.0), // Watford
            (51.752, -0.336, 2.5), // St Albans
            (51.750, -0.236, 2.0), // Hatfield
            (51.903, -0.196, 2.0), // Stevenage
            (51.813, -0.224, 1.5), // Welwyn Garden City
            (51.870, 0.160, 1.0),  // Bishop's Stortford fringe
        ];
        let cells: Vec<(CellIndex, f64)> = hotspots
            .iter()
            .filter_map(|&(lat, lng, w)| {
                LatLng::new(lat, lng)
                    .ok()
                    .map(|ll| (ll.to_cell(Resolution::Nine), w))
            })
            .collect();
        Self::new(&cells).with_bounds(BoundingBox::hertfordshire())
    }

    fn cells_for(&self, kind: IncidentKind) -> &WeightedCells {
        self.overrides.get(&kind).unwrap_or(&self.default_cells)
    }
}

impl LocationSampler for WeightedCellSampler {
    fn sample(&self, kind: IncidentKind, rng: &mut StdRng) -> Result<CellIndex, SamplingError> {
        let cells = self.cells_for(kind);
        if cells.cells.is_empty() {
            return Err(SamplingError::NoCells { kind: kind.as_str() });
        }
        for _ in 0..self.max_attempts {
            let Some(cell) = cells.draw(rng) else {
                return Err(SamplingError::NoCells { kind: kind.as_str() });
            };
            match self.bounds {
                Some(bounds) if !bounds.contains(LatLng::from(cell)) => continue,
                _ => return Ok(cell),
            }
        }
        Err(SamplingError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use crate::test_helpers::{test_cell, test_neighbor_cell};

    #[test]
    fn bounding_box_validation() {
        assert!(BoundingBox::hertfordshire().validate().is_ok());
        let bad = BoundingBox {
            lat_min: 52.0,
            lat_max: 51.0,
            lng_min: -1.0,
            lng_max: 0.0,
        };
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidLatBounds { .. })));
    }

    #[test]
    fn weighted_draws_favor_heavier_cells() {
        let heavy = test_cell();
        let light = test_neighbor_cell();
        let sampler = WeightedCellSampler::new(&[(heavy, 9.0), (light, 1.0)]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut heavy_count = 0;
        for _ in 0..1_000 {
            if sampler.sample(IncidentKind::Immediate, &mut rng).expect("sample") == heavy {
                heavy_count += 1;
            }
        }
        assert!(heavy_count > 800, "heavy drawn {heavy_count}/1000");
    }

    #[test]
    fn per_kind_override_takes_precedence() {
        let sampler = WeightedCellSampler::new(&[(test_cell(), 1.0)])
            .with_override(IncidentKind::Appointment, &[(test_neighbor_cell(), 1.0)]);
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(
            sampler.sample(IncidentKind::Appointment, &mut rng).expect("sample"),
            test_neighbor_cell()
        );
        assert_eq!(
            sampler.sample(IncidentKind::Prompt, &mut rng).expect("sample"),
            test_cell()
        );
    }

    #[test]
    fn empty_surface_reports_no_cells() {
        let sampler = WeightedCellSampler::new(&[]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            sampler.sample(IncidentKind::Immediate, &mut rng),
            Err(SamplingError::NoCells { .. })
        ));
    }

    #[test]
    fn out_of_bounds_surface_exhausts_retries() {
        // Test cell sits nowhere near Hertfordshire, so every draw is rejected.
        let sampler = WeightedCellSampler::new(&[(test_cell(), 1.0)])
            .with_bounds(BoundingBox::hertfordshire())
            .with_max_attempts(8);
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(
            sampler.sample(IncidentKind::Immediate, &mut rng),
            Err(SamplingError::Exhausted { attempts: 8 })
        );
    }

    #[test]
    fn hertfordshire_hotspots_sample_inside_bounds() {
        let sampler = WeightedCellSampler::hertfordshire_hotspots();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let cell = sampler.sample(IncidentKind::Immediate, &mut rng).expect("sample");
            assert!(BoundingBox::hertfordshire().contains(LatLng::from(cell)));
        }
    }
}
