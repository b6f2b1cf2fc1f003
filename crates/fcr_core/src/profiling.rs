//! Event-rate metrics for benchmarking and sweep throughput reporting.

use std::collections::HashMap;
use std::time::Instant;

use bevy_ecs::prelude::Resource;

use crate::clock::EventKind;

/// Event processing rate metrics, recorded by the runner per popped event.
#[derive(Debug, Default, Resource)]
pub struct EventMetrics {
    pub events_processed: u64,
    /// Wall-clock start, set on the first recorded event.
    pub start_time: Option<Instant>,
    pub events_by_kind: HashMap<EventKind, u64>,
}

impl EventMetrics {
    pub fn record_event(&mut self, kind: EventKind) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.events_processed += 1;
        *self.events_by_kind.entry(kind).or_insert(0) += 1;
    }

    /// Wall-clock events per second since the first event.
    pub fn events_per_second(&self) -> f64 {
        match self.start_time {
            Some(start) => {
                let elapsed = start.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.events_processed as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    pub fn count_for(&self, kind: EventKind) -> u64 {
        self.events_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_counts_per_kind() {
        let mut metrics = EventMetrics::default();
        metrics.record_event(EventKind::SpawnIncident);
        metrics.record_event(EventKind::SpawnIncident);
        metrics.record_event(EventKind::TryDispatch);
        assert_eq!(metrics.events_processed, 3);
        assert_eq!(metrics.count_for(EventKind::SpawnIncident), 2);
        assert_eq!(metrics.count_for(EventKind::ShiftEnded), 0);
        assert!(metrics.start_time.is_some());
    }
}
