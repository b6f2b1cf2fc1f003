pub mod calendar;
pub mod clock;
pub mod dispatch;
pub mod distributions;
pub mod ecs;
pub mod error;
pub mod fcr;
pub mod frequency;
pub mod generator;
pub mod profiling;
pub mod rng;
pub mod routing;
pub mod runner;
pub mod sampling;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
