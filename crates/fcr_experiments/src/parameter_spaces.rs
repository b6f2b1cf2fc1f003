//! Pre-defined parameter space configurations for experimentation.
//!
//! Ready-to-use spaces for the common questions: how much does staffing
//! matter, how does demand stress the queue, and which dispatch policy
//! holds up best.

use crate::ParameterSpace;
use fcr_core::dispatch::DispatchPolicyKind;

/// Convert a calendar date/time to Unix epoch milliseconds (UTC).
///
/// Days-since-epoch algorithm from
/// https://howardhinnant.github.io/date_algorithms.html
fn datetime_to_unix_ms(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    let y = year as i64;
    let m = month as i64;
    let d = day as i64;

    let adjusted_m = if m <= 2 { m + 12 } else { m };
    let adjusted_y = if m <= 2 { y - 1 } else { y };

    let era = (if adjusted_y >= 0 {
        adjusted_y
    } else {
        adjusted_y - 399
    }) / 400;
    let yoe = adjusted_y - era * 400;
    let doy = (153 * (adjusted_m - 3) + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146097 + doe - 719468;

    let total_secs = days * 86400 + hour as i64 * 3600 + minute as i64 * 60;
    total_secs * 1000
}

pub fn comprehensive_space() -> ParameterSpace {
    ParameterSpace::grid()
        .num_stations(vec![2, 4, 6, 8])
        .officers_per_shift(vec![2, 4, 6])
        .incidents_per_hour(vec![4.0, 8.0, 12.0, 20.0])
        .dispatch_policy(vec![
            DispatchPolicyKind::NearestAvailable,
            DispatchPolicyKind::FirstAvailable,
        ])
        .max_wait_minutes(vec![None, Some(60), Some(240)])
        .return_to_patrol(vec![false, true])
        .horizon_hours(vec![24, 72])
        .epoch_ms(vec![
            // Monday morning vs Friday evening start.
            datetime_to_unix_ms(2023, 1, 2, 0, 0),
            datetime_to_unix_ms(2023, 1, 6, 18, 0),
        ])
}

pub fn staffing_space() -> ParameterSpace {
    ParameterSpace::grid()
        .num_stations(vec![2, 4, 6])
        .officers_per_shift(vec![1, 2, 4, 6, 8])
        .incidents_per_hour(vec![8.0])
        .dispatch_policy(vec![DispatchPolicyKind::NearestAvailable])
        .max_wait_minutes(vec![Some(240)])
        .horizon_hours(vec![48])
}

pub fn demand_space() -> ParameterSpace {
    ParameterSpace::grid()
        .num_stations(vec![4])
        .officers_per_shift(vec![4])
        .incidents_per_hour(vec![2.0, 4.0, 8.0, 16.0, 32.0])
        .max_wait_minutes(vec![Some(60), Some(240)])
        .horizon_hours(vec![48])
}

pub fn policy_space() -> ParameterSpace {
    ParameterSpace::grid()
        .num_stations(vec![4])
        .officers_per_shift(vec![2, 4])
        .incidents_per_hour(vec![8.0, 16.0])
        .dispatch_policy(vec![
            DispatchPolicyKind::NearestAvailable,
            DispatchPolicyKind::FirstAvailable,
        ])
        .return_to_patrol(vec![false, true])
        .horizon_hours(vec![48])
}

pub fn minimal_space() -> ParameterSpace {
    ParameterSpace::grid()
        .officers_per_shift(vec![2, 4])
        .incidents_per_hour(vec![8.0])
        .horizon_hours(vec![12])
}
