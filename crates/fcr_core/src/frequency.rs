//! Incident arrival rates by weekday and hour.

use bevy_ecs::prelude::Resource;

/// Expected incident arrivals per hour at a given weekday (0 = Monday) and
/// hour of day. Drives the exponential inter-arrival draws in the generator.
pub trait IncidentFrequencyProvider: Send + Sync {
    fn rate_per_hour(&self, weekday: u32, hour: u32) -> f64;
}

/// Boxed provider so scenarios can swap profiles at build time.
#[derive(Resource)]
pub struct IncidentFrequencyResource(pub Box<dyn IncidentFrequencyProvider>);

/// Dense weekday-by-hour rate table.
#[derive(Debug, Clone)]
pub struct WeeklyRateTable {
    rates: [[f64; 24]; 7],
}

/// Hourly demand shape: quiet small hours, a morning rise, and an evening
/// peak. Scaled by weekday below.
const HOURLY_SHAPE: [f64; 24] = [
    0.5, 0.4, 0.3, 0.3, 0.3, 0.4, // 00-05
    0.6, 0.8, 1.0, 1.0, 1.0, 1.1, // 06-11
    1.1, 1.1, 1.2, 1.3, 1.4, 1.5, // 12-17
    1.6, 1.7, 1.6, 1.4, 1.1, 0.8, // 18-23
];

const WEEKDAY_SCALE: [f64; 7] = [1.0, 0.95, 0.95, 1.0, 1.25, 1.4, 1.1];

impl WeeklyRateTable {
    pub fn new(rates: [[f64; 24]; 7]) -> Self {
        Self { rates }
    }

    pub fn uniform(rate_per_hour: f64) -> Self {
        Self {
            rates: [[rate_per_hour; 24]; 7],
        }
    }

    /// Demand profile shaped by hour of day and weekday, normalised so the
    /// all-week mean equals `mean_per_hour`.
    pub fn profiled(mean_per_hour: f64) -> Self {
        let mut rates = [[0.0; 24]; 7];
        let mut total = 0.0;
        for (wd, day) in rates.iter_mut().enumerate() {
            for (h, cell) in day.iter_mut().enumerate() {
                *cell = HOURLY_SHAPE[h] * WEEKDAY_SCALE[wd];
                total += *cell;
            }
        }
        let scale = mean_per_hour * (24.0 * 7.0) / total;
        for day in rates.iter_mut() {
            for cell in day.iter_mut() {
                *cell *= scale;
            }
        }
        Self { rates }
    }
}

impl IncidentFrequencyProvider for WeeklyRateTable {
    fn rate_per_hour(&self, weekday: u32, hour: u32) -> f64 {
        let wd = (weekday % 7) as usize;
        let h = (hour % 24) as usize;
        self.rates[wd][h]
    }
}
