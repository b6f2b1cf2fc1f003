//! Incident generation: arrival process, kind mix, target times, and serial
//! numbers.
//!
//! Arrivals follow a non-homogeneous Poisson process: the next inter-arrival
//! gap is drawn from an exponential with the rate the frequency table gives
//! for the current weekday and hour.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::Rng;

use crate::calendar;
use crate::clock::{ONE_HOUR_MS, ONE_MIN_MS};
use crate::ecs::IncidentKind;

const KIND_TABLE: [IncidentKind; 5] = [
    IncidentKind::Immediate,
    IncidentKind::Prompt,
    IncidentKind::Scheduled,
    IncidentKind::Appointment,
    IncidentKind::NoResponseRequired,
];

/// Grading mix as weights over [`KIND_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KindMix {
    pub immediate: f64,
    pub prompt: f64,
    pub scheduled: f64,
    pub appointment: f64,
    pub no_response: f64,
}

impl KindMix {
    pub fn weights(&self) -> [f64; 5] {
        [
            self.immediate,
            self.prompt,
            self.scheduled,
            self.appointment,
            self.no_response,
        ]
    }

    pub fn is_valid(&self) -> bool {
        let weights = self.weights();
        weights.iter().all(|w| w.is_finite() && *w >= 0.0) && weights.iter().sum::<f64>() > 0.0
    }
}

impl Default for KindMix {
    fn default() -> Self {
        // Roughly the grading split seen in force control-room data.
        Self {
            immediate: 0.25,
            prompt: 0.35,
            scheduled: 0.15,
            appointment: 0.15,
            no_response: 0.10,
        }
    }
}

#[derive(Debug, Resource)]
pub struct IncidentGenerator {
    cumulative_weights: [f64; 5],
    total_weight: f64,
    scheduled_lead_ms: (u64, u64),
    appointment_lead_ms: (u64, u64),
    /// Stop creating new incidents after this sim time, when set.
    pub window_ms: Option<u64>,
    pub max_incidents: Option<u64>,
    created: u64,
    isr_day: Option<(i32, u32, u32)>,
    isr_counter: u32,
}

impl IncidentGenerator {
    pub fn new(mix: KindMix) -> Self {
        let weights = mix.weights();
        let mut cumulative = [0.0; 5];
        let mut total = 0.0;
        for (i, w) in weights.iter().enumerate() {
            total += w.max(0.0);
            cumulative[i] = total;
        }
        Self {
            cumulative_weights: cumulative,
            total_weight: total,
            scheduled_lead_ms: (30 * ONE_MIN_MS, 4 * ONE_HOUR_MS),
            appointment_lead_ms: (2 * ONE_HOUR_MS, 24 * ONE_HOUR_MS),
            window_ms: None,
            max_incidents: None,
            created: 0,
            isr_day: None,
            isr_counter: 0,
        }
    }

    pub fn with_window(mut self, window_ms: Option<u64>) -> Self {
        self.window_ms = window_ms;
        self
    }

    pub fn with_max_incidents(mut self, max_incidents: Option<u64>) -> Self {
        self.max_incidents = max_incidents;
        self
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn note_created(&mut self) {
        self.created += 1;
    }

    /// Whether the caps still allow creating an incident at `now`.
    pub fn may_spawn(&self, now: u64) -> bool {
        if let Some(window) = self.window_ms {
            if now >= window {
                return false;
            }
        }
        if let Some(max) = self.max_incidents {
            if self.created >= max {
                return false;
            }
        }
        true
    }

    pub fn sample_kind(&self, rng: &mut StdRng) -> IncidentKind {
        let u: f64 = rng.gen_range(0.0..self.total_weight);
        let idx = self.cumulative_weights.partition_point(|&c| c <= u);
        KIND_TABLE[idx.min(KIND_TABLE.len() - 1)]
    }

    /// Exponential gap to the next arrival at the given hourly rate, or
    /// `None` when the rate is zero (caller probes again later).
    pub fn next_interarrival_ms(&self, rate_per_hour: f64, rng: &mut StdRng) -> Option<u64> {
        if rate_per_hour <= 0.0 {
            return None;
        }
        let u: f64 = rng.gen();
        let gap_hours = -(1.0 - u).ln() / rate_per_hour;
        Some((gap_hours * ONE_HOUR_MS as f64).round() as u64)
    }

    /// Target (earliest-attendance) time for kinds that carry one.
    pub fn target_time(&self, kind: IncidentKind, now: u64, rng: &mut StdRng) -> Option<u64> {
        let (min, max) = match kind {
            IncidentKind::Scheduled => self.scheduled_lead_ms,
            IncidentKind::Appointment => self.appointment_lead_ms,
            _ => return None,
        };
        Some(now + rng.gen_range(min..=max))
    }

    /// Next incident serial, `YYYYMMDD/HHMM/NNNN`. The counter resets at
    /// each civil-day boundary.
    pub fn next_isr(&mut self, real_ms: i64) -> String {
        let date = calendar::civil_date(real_ms);
        if self.isr_day != Some(date) {
            self.isr_day = Some(date);
            self.isr_counter = 0;
        }
        self.isr_counter += 1;
        let (year, month, day) = date;
        let (hour, minute) = calendar::hour_minute(real_ms);
        format!(
            "{year:04}{month:02}{day:02}/{hour:02}{minute:02}/{:04}",
            self.isr_counter
        )
    }
}

impl Default for IncidentGenerator {
    fn default() -> Self {
        Self::new(KindMix::default())
    }
}
