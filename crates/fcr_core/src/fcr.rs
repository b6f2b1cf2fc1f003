//! Force control room bookkeeping: the pending-incident queue and the
//! availability index of deployable officers.

use std::collections::BTreeMap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::ecs::Incident;
use crate::error::SubmitError;

/// Queue entry ordering key, best-first:
/// priority class, then eligibility time, then report time, then submission
/// order. Every component is deterministic, so two runs drain identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingIncident {
    pub entity: Entity,
    pub priority: u8,
    pub eligible_at: u64,
    pub reported_at: u64,
    pub seq: u64,
}

impl PendingIncident {
    fn key(&self) -> (u8, u64, u64, u64) {
        (self.priority, self.eligible_at, self.reported_at, self.seq)
    }
}

/// Pending incidents awaiting assignment, kept sorted best-first.
#[derive(Debug, Default, Resource)]
pub struct PendingQueue {
    entries: Vec<PendingIncident>,
    next_seq: u64,
}

impl PendingQueue {
    /// Queue an incident for dispatch. Terminal incidents are rejected, they
    /// must never re-enter the queue.
    pub fn submit(&mut self, entity: Entity, incident: &Incident) -> Result<(), SubmitError> {
        if incident.status.is_terminal() {
            return Err(SubmitError::InvalidIncident {
                status: incident.status.as_str(),
            });
        }
        let entry = PendingIncident {
            entity,
            priority: incident.kind.priority_class(),
            eligible_at: incident.eligible_at(),
            reported_at: incident.reported_at,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let at = self
            .entries
            .partition_point(|existing| existing.key() <= entry.key());
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Best pending incident whose eligibility time has been reached.
    /// Later-priority entries are considered when higher ones are not yet
    /// eligible (an appointment booked for tomorrow never blocks today's
    /// queue).
    pub fn first_eligible(&self, now: u64) -> Option<Entity> {
        self.entries
            .iter()
            .find(|e| e.eligible_at <= now)
            .map(|e| e.entity)
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.entity != entity);
        self.entries.len() != before
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.iter().any(|e| e.entity == entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PendingIncident] {
        &self.entries
    }
}

/// Deployable officers, keyed by collar number. BTreeMap iteration gives the
/// ascending-collar candidate order the dispatch tie-break relies on.
#[derive(Debug, Default, Resource)]
pub struct AvailabilityIndex {
    officers: BTreeMap<u32, Entity>,
}

impl AvailabilityIndex {
    pub fn register(&mut self, collar: u32, entity: Entity) {
        self.officers.insert(collar, entity);
    }

    pub fn deregister(&mut self, collar: u32) -> Option<Entity> {
        self.officers.remove(&collar)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Entity)> + '_ {
        self.officers.iter().map(|(&collar, &entity)| (collar, entity))
    }

    pub fn contains(&self, collar: u32) -> bool {
        self.officers.contains_key(&collar)
    }

    pub fn len(&self) -> usize {
        self.officers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.officers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::IncidentKind;
    use crate::test_helpers::test_cell;

    fn incident(kind: IncidentKind, reported_at: u64, target_at: Option<u64>) -> Incident {
        Incident::new(kind, test_cell(), "20230101/0000/0001".into(), reported_at, target_at)
    }

    #[test]
    fn queue_orders_by_priority_then_times() {
        let mut queue = PendingQueue::default();
        let prompt = Entity::from_raw(1);
        let immediate = Entity::from_raw(2);
        let earlier_immediate = Entity::from_raw(3);

        queue
            .submit(prompt, &incident(IncidentKind::Prompt, 10, None))
            .expect("submit");
        queue
            .submit(immediate, &incident(IncidentKind::Immediate, 20, None))
            .expect("submit");
        queue
            .submit(earlier_immediate, &incident(IncidentKind::Immediate, 5, None))
            .expect("submit");

        let order: Vec<Entity> = queue.entries().iter().map(|e| e.entity).collect();
        assert_eq!(order, vec![earlier_immediate, immediate, prompt]);
    }

    #[test]
    fn equal_keys_fall_back_to_submission_order() {
        let mut queue = PendingQueue::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        queue
            .submit(a, &incident(IncidentKind::Prompt, 10, None))
            .expect("submit");
        queue
            .submit(b, &incident(IncidentKind::Prompt, 10, None))
            .expect("submit");
        assert_eq!(queue.first_eligible(10), Some(a));
    }

    #[test]
    fn future_appointments_do_not_block_lower_priorities() {
        let mut queue = PendingQueue::default();
        let appointment = Entity::from_raw(1);
        let prompt = Entity::from_raw(2);
        // Immediate-class eligibility far in the future via a scheduled target.
        queue
            .submit(
                appointment,
                &incident(IncidentKind::Immediate, 0, Some(5_000)),
            )
            .expect("submit");
        queue
            .submit(prompt, &incident(IncidentKind::Prompt, 0, None))
            .expect("submit");

        assert_eq!(queue.first_eligible(100), Some(prompt));
        assert_eq!(queue.first_eligible(5_000), Some(appointment));
    }

    #[test]
    fn terminal_incidents_are_rejected() {
        let mut queue = PendingQueue::default();
        let mut cancelled = incident(IncidentKind::Prompt, 0, None);
        cancelled.queue().expect("queue");
        cancelled.cancel(50).expect("cancel");
        let err = queue
            .submit(Entity::from_raw(1), &cancelled)
            .expect_err("terminal");
        assert_eq!(
            err,
            SubmitError::InvalidIncident {
                status: "Cancelled"
            }
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn availability_iterates_in_collar_order() {
        let mut index = AvailabilityIndex::default();
        index.register(30, Entity::from_raw(3));
        index.register(10, Entity::from_raw(1));
        index.register(20, Entity::from_raw(2));
        let collars: Vec<u32> = index.iter().map(|(c, _)| c).collect();
        assert_eq!(collars, vec![10, 20, 30]);

        index.deregister(20);
        assert!(!index.contains(20));
        assert_eq!(index.len(), 2);
    }
}
