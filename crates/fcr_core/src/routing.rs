//! Pluggable travel-time providers.
//!
//! Two implementations, selectable via [`TravelTimeKind`]:
//!
//! - **[`GridSpeedProvider`]**: Haversine distance between cell centres at a
//!   fixed average speed. Zero dependencies, always succeeds.
//! - **[`SampledPointProvider`]**: nearest-sampled-point lookup into a
//!   pre-measured pair table, the shape real road-network exports come in.
//!   Undirected: a missing pair is retried with the operands reversed.
//!
//! The provider is stored as a `Box<dyn TravelTimeProvider>` ECS resource,
//! constructed from `TravelTimeKind` during scenario building.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use h3o::{CellIndex, LatLng};
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

/// Result of a travel-time query between two H3 cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    pub duration_ms: u64,
    pub distance_m: f64,
}

impl TravelEstimate {
    pub const ZERO: TravelEstimate = TravelEstimate {
        duration_ms: 0,
        distance_m: 0.0,
    };
}

/// Trait for travel-time backends. Implementations must be `Send + Sync` so
/// the provider can be stored as a shared ECS resource.
pub trait TravelTimeProvider: Send + Sync {
    fn estimate(&self, from: CellIndex, to: CellIndex) -> Result<TravelEstimate, RoutingError>;
}

/// ECS resource wrapping a boxed travel-time provider.
#[derive(Resource)]
pub struct TravelTimeResource(pub Box<dyn TravelTimeProvider>);

/// Which travel backend to use. Stored in scenario parameters so it
/// serializes into sweep parameter sets.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TravelTimeKind {
    /// Straight-line distance at a fixed average speed.
    GridSpeed { speed_kmh: f64 },
    /// Pre-measured pair table loaded from a binary file at startup.
    #[cfg(feature = "precomputed")]
    Precomputed { path: String },
}

impl Default for TravelTimeKind {
    fn default() -> Self {
        TravelTimeKind::GridSpeed { speed_kmh: 40.0 }
    }
}

/// Great-circle distance between two points, metres.
fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let (lat1, lat2) = (a.lat().to_radians(), b.lat().to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng() - a.lng()).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

// ---------------------------------------------------------------------------
// Grid-speed provider (always available)
// ---------------------------------------------------------------------------

/// Haversine distance between cell centres at a fixed average speed.
pub struct GridSpeedProvider {
    pub speed_kmh: f64,
}

impl GridSpeedProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self {
            speed_kmh: if speed_kmh > 0.0 { speed_kmh } else { 40.0 },
        }
    }
}

impl TravelTimeProvider for GridSpeedProvider {
    fn estimate(&self, from: CellIndex, to: CellIndex) -> Result<TravelEstimate, RoutingError> {
        if from == to {
            return Ok(TravelEstimate::ZERO);
        }
        let distance_m = haversine_m(LatLng::from(from), LatLng::from(to));
        let duration_ms = (distance_m / 1000.0 / self.speed_kmh * 3_600_000.0).round() as u64;
        Ok(TravelEstimate {
            duration_ms,
            distance_m,
        })
    }
}

// ---------------------------------------------------------------------------
// Sampled-point provider
// ---------------------------------------------------------------------------

/// Travel matrix over a fixed set of sampled points.
///
/// Queries snap each endpoint to its nearest sampled point (squared lat/lng
/// distance, smallest index on ties) and look the pair up in the table,
/// trying the reversed pair before reporting
/// [`RoutingError::NoRouteData`].
pub struct SampledPointProvider {
    points: Vec<(f64, f64)>,
    pairs: HashMap<(usize, usize), u64>,
}

impl SampledPointProvider {
    pub fn new(points: Vec<(f64, f64)>, pairs: HashMap<(usize, usize), u64>) -> Self {
        Self { points, pairs }
    }

    fn nearest(&self, point: LatLng) -> Result<usize, RoutingError> {
        if self.points.is_empty() {
            return Err(RoutingError::EmptySampleSet);
        }
        let (lat, lng) = (point.lat(), point.lng());
        let mut best = 0;
        let mut best_d2 = f64::INFINITY;
        for (i, &(p_lat, p_lng)) in self.points.iter().enumerate() {
            let d2 = (lat - p_lat).powi(2) + (lng - p_lng).powi(2);
            // Strict comparison keeps the smallest index on exact ties.
            if d2 < best_d2 {
                best_d2 = d2;
                best = i;
            }
        }
        Ok(best)
    }

    fn pair_duration_ms(&self, origin: usize, destination: usize) -> Result<u64, RoutingError> {
        if origin == destination {
            return Ok(0);
        }
        self.pairs
            .get(&(origin, destination))
            .or_else(|| self.pairs.get(&(destination, origin)))
            .copied()
            .ok_or(RoutingError::NoRouteData {
                origin,
                destination,
            })
    }
}

impl TravelTimeProvider for SampledPointProvider {
    fn estimate(&self, from: CellIndex, to: CellIndex) -> Result<TravelEstimate, RoutingError> {
        if from == to {
            return Ok(TravelEstimate::ZERO);
        }
        let origin = self.nearest(LatLng::from(from))?;
        let destination = self.nearest(LatLng::from(to))?;
        let duration_ms = self.pair_duration_ms(origin, destination)?;
        let distance_m = haversine_m(LatLng::from(from), LatLng::from(to));
        Ok(TravelEstimate {
            duration_ms,
            distance_m,
        })
    }
}

#[cfg(feature = "precomputed")]
pub mod precomputed {
    use super::*;
    use std::fs;

    /// On-disk form of a sampled-point travel matrix.
    #[derive(Serialize, Deserialize)]
    pub struct TravelMatrix {
        pub points: Vec<(f64, f64)>,
        pub pairs: Vec<((usize, usize), u64)>,
    }

    impl TravelMatrix {
        pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
            let data = bincode::serialize(self)?;
            fs::write(path, data)?;
            Ok(())
        }
    }

    /// Load a [`SampledPointProvider`] from a bincode-serialized matrix.
    pub fn load_provider(path: &str) -> Result<SampledPointProvider, Box<dyn std::error::Error>> {
        let data = fs::read(path)?;
        let matrix: TravelMatrix = bincode::deserialize(&data)?;
        Ok(SampledPointProvider::new(
            matrix.points,
            matrix.pairs.into_iter().collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// LRU-cached wrapper around any [`TravelTimeProvider`].
///
/// Cache key is `(from_cell_u64, to_cell_u64)` (directional). Only
/// successful estimates are cached; errors are re-queried so a provider
/// reloaded with better data is picked up.
pub struct CachedTravelTime {
    inner: Box<dyn TravelTimeProvider>,
    cache: Mutex<LruCache<(u64, u64), TravelEstimate>>,
}

impl CachedTravelTime {
    pub fn new(inner: Box<dyn TravelTimeProvider>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("cache capacity must be > 0"),
            )),
        }
    }
}

impl TravelTimeProvider for CachedTravelTime {
    fn estimate(&self, from: CellIndex, to: CellIndex) -> Result<TravelEstimate, RoutingError> {
        let key = (u64::from(from), u64::from(to));
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(&hit) = cache.get(&key) {
                return Ok(hit);
            }
        }
        let estimate = self.inner.estimate(from, to)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, estimate);
        }
        Ok(estimate)
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

const DEFAULT_TRAVEL_CACHE_CAPACITY: usize = 20_000;

/// Construct a boxed [`TravelTimeProvider`] from a [`TravelTimeKind`].
///
/// Table-backed providers are wrapped in a [`CachedTravelTime`]; the
/// grid-speed provider is cheap enough to query directly.
pub fn build_travel_provider(kind: &TravelTimeKind) -> Box<dyn TravelTimeProvider> {
    match kind {
        TravelTimeKind::GridSpeed { speed_kmh } => Box::new(GridSpeedProvider::new(*speed_kmh)),

        #[cfg(feature = "precomputed")]
        TravelTimeKind::Precomputed { path } => match precomputed::load_provider(path) {
            Ok(provider) => Box::new(CachedTravelTime::new(
                Box::new(provider),
                DEFAULT_TRAVEL_CACHE_CAPACITY,
            )),
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to load travel matrix, using grid-speed fallback");
                Box::new(GridSpeedProvider::new(40.0))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_cell, test_neighbor_cell};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn grid_speed_zero_for_same_cell() {
        let provider = GridSpeedProvider::new(40.0);
        assert_eq!(
            provider.estimate(test_cell(), test_cell()).expect("estimate"),
            TravelEstimate::ZERO
        );
    }

    #[test]
    fn grid_speed_scales_with_speed() {
        let slow = GridSpeedProvider::new(20.0);
        let fast = GridSpeedProvider::new(60.0);
        let a = test_cell();
        let b = test_neighbor_cell();
        let slow_est = slow.estimate(a, b).expect("estimate");
        let fast_est = fast.estimate(a, b).expect("estimate");
        assert!(slow_est.duration_ms > fast_est.duration_ms);
        assert_eq!(slow_est.distance_m, fast_est.distance_m);
    }

    fn two_point_provider() -> SampledPointProvider {
        let a: LatLng = test_cell().into();
        let b: LatLng = test_neighbor_cell().into();
        let points = vec![(a.lat(), a.lng()), (b.lat(), b.lng())];
        let mut pairs = HashMap::new();
        pairs.insert((0, 1), 300_000);
        SampledPointProvider::new(points, pairs)
    }

    #[test]
    fn sampled_points_look_up_pair_and_reverse() {
        let provider = two_point_provider();
        let forward = provider
            .estimate(test_cell(), test_neighbor_cell())
            .expect("forward");
        assert_eq!(forward.duration_ms, 300_000);
        // Only (0, 1) is stored; the reverse query hits the flipped key.
        let reverse = provider
            .estimate(test_neighbor_cell(), test_cell())
            .expect("reverse");
        assert_eq!(reverse.duration_ms, 300_000);
    }

    #[test]
    fn empty_sample_set_is_an_error() {
        let provider = SampledPointProvider::new(Vec::new(), HashMap::new());
        assert_eq!(
            provider.estimate(test_cell(), test_neighbor_cell()),
            Err(RoutingError::EmptySampleSet)
        );
    }

    #[test]
    fn missing_pair_is_no_route_data() {
        let a: LatLng = test_cell().into();
        let b: LatLng = test_neighbor_cell().into();
        let provider = SampledPointProvider::new(
            vec![(a.lat(), a.lng()), (b.lat(), b.lng())],
            HashMap::new(),
        );
        assert_eq!(
            provider.estimate(test_cell(), test_neighbor_cell()),
            Err(RoutingError::NoRouteData {
                origin: 0,
                destination: 1
            })
        );
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl TravelTimeProvider for CountingProvider {
        fn estimate(&self, _: CellIndex, _: CellIndex) -> Result<TravelEstimate, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TravelEstimate {
                duration_ms: 1_000,
                distance_m: 100.0,
            })
        }
    }

    #[test]
    fn cache_serves_repeat_queries() {
        let cached = CachedTravelTime::new(
            Box::new(CountingProvider {
                calls: AtomicUsize::new(0),
            }),
            16,
        );
        let a = test_cell();
        let b = test_neighbor_cell();
        let first = cached.estimate(a, b).expect("first");
        let second = cached.estimate(a, b).expect("second");
        assert_eq!(first, second);
    }
}
