//! Civil-calendar math over unix milliseconds.
//!
//! The incident rate table and shift schedule both key on local weekday and
//! hour; incident serials embed the civil date. All functions here take real
//! unix ms (see [`crate::clock::SimulationClock::sim_to_real_ms`]).

use crate::clock::{ONE_DAY_MS, ONE_HOUR_MS, ONE_MIN_MS};

/// Weekday (0 = Monday .. 6 = Sunday) and hour of day for a unix timestamp.
pub fn weekday_hour(real_ms: i64) -> (u32, u32) {
    let days = real_ms.div_euclid(ONE_DAY_MS as i64);
    // 1970-01-01 was a Thursday, weekday 3 with Monday = 0.
    let weekday = (days + 3).rem_euclid(7) as u32;
    let hour = (real_ms.rem_euclid(ONE_DAY_MS as i64) / ONE_HOUR_MS as i64) as u32;
    (weekday, hour)
}

pub fn hour_of_day(real_ms: i64) -> u32 {
    weekday_hour(real_ms).1
}

/// Hour and minute of day for a unix timestamp.
pub fn hour_minute(real_ms: i64) -> (u32, u32) {
    let ms_of_day = real_ms.rem_euclid(ONE_DAY_MS as i64) as u64;
    ((ms_of_day / ONE_HOUR_MS) as u32, ((ms_of_day % ONE_HOUR_MS) / ONE_MIN_MS) as u32)
}

/// Civil (year, month, day) for a unix timestamp, proleptic Gregorian.
pub fn civil_date(real_ms: i64) -> (i32, u32, u32) {
    let z = real_ms.div_euclid(ONE_DAY_MS as i64) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

/// Simulation time of the next wall-clock instant at `hour:00`, strictly
/// after `now_sim`. Used to schedule shift boundaries.
pub fn next_sim_time_at_hour(now_sim: u64, epoch_ms: i64, hour: u32) -> u64 {
    let real_now = epoch_ms.saturating_add(now_sim as i64);
    let day_start = real_now.div_euclid(ONE_DAY_MS as i64) * ONE_DAY_MS as i64;
    let mut candidate = day_start + (hour as i64) * ONE_HOUR_MS as i64;
    if candidate <= real_now {
        candidate += ONE_DAY_MS as i64;
    }
    (candidate - epoch_ms) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-01-02 00:00:00 UTC, a Monday.
    const MONDAY_MS: i64 = 1_672_617_600_000;

    #[test]
    fn weekday_and_hour_from_known_timestamp() {
        assert_eq!(weekday_hour(MONDAY_MS), (0, 0));
        assert_eq!(weekday_hour(MONDAY_MS + 9 * ONE_HOUR_MS as i64), (0, 9));
        assert_eq!(
            weekday_hour(MONDAY_MS + 3 * ONE_DAY_MS as i64 + 23 * ONE_HOUR_MS as i64),
            (3, 23)
        );
        assert_eq!(weekday_hour(MONDAY_MS + 6 * ONE_DAY_MS as i64), (6, 0));
    }

    #[test]
    fn civil_date_from_known_timestamp() {
        assert_eq!(civil_date(MONDAY_MS), (2023, 1, 2));
        assert_eq!(civil_date(MONDAY_MS + 30 * ONE_DAY_MS as i64), (2023, 2, 1));
        assert_eq!(civil_date(0), (1970, 1, 1));
    }

    #[test]
    fn hour_minute_splits_day_offset() {
        assert_eq!(hour_minute(MONDAY_MS + 9 * ONE_HOUR_MS as i64 + 42 * ONE_MIN_MS as i64), (9, 42));
    }

    #[test]
    fn next_hour_boundary_is_strictly_in_the_future() {
        // Sim starts at Monday 00:00; next 07:00 is the same day.
        let at_seven = next_sim_time_at_hour(0, MONDAY_MS, 7);
        assert_eq!(at_seven, 7 * ONE_HOUR_MS);
        // At exactly 07:00, the next 07:00 is tomorrow.
        let tomorrow = next_sim_time_at_hour(at_seven, MONDAY_MS, 7);
        assert_eq!(tomorrow, 31 * ONE_HOUR_MS);
        // 22:00 from 09:00 the same day.
        let at_ten_pm = next_sim_time_at_hour(9 * ONE_HOUR_MS, MONDAY_MS, 22);
        assert_eq!(at_ten_pm, 22 * ONE_HOUR_MS);
    }
}
