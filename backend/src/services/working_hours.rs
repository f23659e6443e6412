//! Worked and break-deducted hours of a single attendance interval.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::attendance::AttendanceInterval;
use crate::utils::time::Clock;

/// Shifts longer than this get the first mandatory break.
pub const FIRST_BREAK_THRESHOLD_HOURS: f64 = 6.0;
pub const FIRST_BREAK_HOURS: f64 = 0.5;
/// Worked time above this (after the first break) gets the second break.
pub const SECOND_BREAK_THRESHOLD_HOURS: f64 = 9.0;
pub const SECOND_BREAK_HOURS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WorkingHours {
    pub worked: f64,
    pub deducted: f64,
}

impl WorkingHours {
    pub fn raw(&self) -> f64 {
        self.worked + self.deducted
    }
}

/// Splits an interval into worked and deducted hours. Open intervals run
/// until `clock.now()`.
pub fn calculate_working_hours(interval: &AttendanceInterval, clock: &dyn Clock) -> WorkingHours {
    let end = interval.end_or(clock.now());
    working_hours_between(interval.start, end)
}

pub fn working_hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> WorkingHours {
    let raw = ((end - start).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    working_hours_for(raw)
}

/// Applies the break rules to a raw duration in hours.
///
/// The second break is checked against the worked value left after the first
/// one, and each deduction stops at its own threshold.
pub fn working_hours_for(raw: f64) -> WorkingHours {
    let raw = raw.max(0.0);
    let mut worked = raw;

    if raw > FIRST_BREAK_THRESHOLD_HOURS {
        worked = (worked - FIRST_BREAK_HOURS).max(FIRST_BREAK_THRESHOLD_HOURS);
    }

    if worked > SECOND_BREAK_THRESHOLD_HOURS {
        worked = (worked - SECOND_BREAK_HOURS).max(SECOND_BREAK_THRESHOLD_HOURS);
    }

    WorkingHours {
        worked,
        deducted: raw - worked,
    }
}
