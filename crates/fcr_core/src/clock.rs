//! Simulation clock: a min-priority queue of events keyed by `(timestamp, seq)`.
//!
//! `seq` is a monotonically increasing counter assigned at insertion time, so
//! events scheduled for identical timestamps pop in the order they were
//! scheduled (FIFO), never by heap iteration order. Time advance is purely a
//! jump to the next event's timestamp; no wall-clock waiting occurs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

pub const ONE_SEC_MS: u64 = 1_000;
pub const ONE_MIN_MS: u64 = 60 * ONE_SEC_MS;
pub const ONE_HOUR_MS: u64 = 60 * ONE_MIN_MS;
pub const ONE_DAY_MS: u64 = 24 * ONE_HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    SpawnIncident,
    TryDispatch,
    OfficerArrived,
    ServiceCompleted,
    OfficerReturned,
    ShiftStarted,
    ShiftEnded,
    IncidentExpired,
}

/// Which entity an event is addressed to. Events without a subject (e.g.
/// `TryDispatch`) are handled by the control room against its own queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Incident(Entity),
    Officer(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub seq: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap; seq breaks ties
        // deterministically (earlier-scheduled first).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed, inserted by the runner before the
/// schedule runs so systems can match on its kind and subject.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    next_seq: u64,
    /// Real-world epoch (unix ms) corresponding to simulation time 0.
    epoch_ms: i64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn with_epoch(epoch_ms: i64) -> Self {
        Self {
            epoch_ms,
            ..Default::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    pub fn set_epoch_ms(&mut self, epoch_ms: i64) {
        self.epoch_ms = epoch_ms;
    }

    /// Convert simulation time to real-world unix ms.
    pub fn sim_to_real_ms(&self, sim_ms: u64) -> i64 {
        self.epoch_ms.saturating_add(sim_ms as i64)
    }

    /// Convert real-world unix ms to simulation time. Returns `None` for
    /// times before the epoch.
    pub fn real_to_sim_ms(&self, real_ms: i64) -> Option<u64> {
        let delta = real_ms.checked_sub(self.epoch_ms)?;
        u64::try_from(delta).ok()
    }

    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind, subject: Option<EventSubject>) {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp: timestamp.max(self.now),
            seq,
            kind,
            subject,
        });
    }

    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now.saturating_add(delay_ms), kind, subject);
    }

    pub fn schedule_in_secs(&mut self, delay_secs: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_in(delay_secs * ONE_SEC_MS, kind, subject);
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|e| e.timestamp)
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10, EventKind::SpawnIncident, None);
        clock.schedule_at(5, EventKind::SpawnIncident, None);
        clock.schedule_at(20, EventKind::TryDispatch, None);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);

        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);
        assert_eq!(clock.now(), 20);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn equal_timestamps_pop_in_insertion_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(7, EventKind::ShiftEnded, None);
        clock.schedule_at(7, EventKind::SpawnIncident, None);
        clock.schedule_at(7, EventKind::TryDispatch, None);

        let kinds: Vec<EventKind> = std::iter::from_fn(|| clock.pop_next())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ShiftEnded,
                EventKind::SpawnIncident,
                EventKind::TryDispatch
            ]
        );
    }

    #[test]
    fn epoch_conversion_round_trips() {
        let mut clock = SimulationClock::with_epoch(1_700_000_000_000);
        clock.schedule_in_secs(1, EventKind::SpawnIncident, None);
        let e = clock.pop_next().expect("event");
        assert_eq!(e.timestamp, ONE_SEC_MS);
        assert_eq!(clock.sim_to_real_ms(1000), 1_700_000_001_000);
        assert_eq!(clock.real_to_sim_ms(1_700_000_001_000), Some(1000));
        assert_eq!(clock.real_to_sim_ms(1_699_999_999_000), None);
    }
}
