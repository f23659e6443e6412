use crate::types::{AttendanceCorrectionId, AttendanceId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One check-in/check-out pair. `end` stays `None` while the shift is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceInterval {
    pub id: AttendanceId,
    pub user_id: UserId,
    #[sqlx(rename = "started_at")]
    pub start: DateTime<Utc>,
    #[sqlx(rename = "ended_at")]
    pub end: Option<DateTime<Utc>>,
    pub homeoffice_start: bool,
    pub homeoffice_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of an interval taken right before a correction overwrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceCorrection {
    pub id: AttendanceCorrectionId,
    pub attendance_id: AttendanceId,
    pub change_reason: String,
    #[sqlx(rename = "old_started_at")]
    pub old_start: DateTime<Utc>,
    #[sqlx(rename = "old_ended_at")]
    pub old_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A (user, year, month) key that has attendance data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserYearMonth {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
}

impl AttendanceInterval {
    pub fn check_in(
        user_id: UserId,
        start: DateTime<Utc>,
        homeoffice: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttendanceId::new(),
            user_id,
            start,
            end: None,
            homeoffice_start: homeoffice,
            homeoffice_end: homeoffice,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn check_out(&mut self, end: DateTime<Utc>, homeoffice: bool, now: DateTime<Utc>) {
        self.end = Some(end);
        self.homeoffice_end = homeoffice;
        self.updated_at = now;
    }

    pub fn is_complete(&self) -> bool {
        self.end.is_some()
    }

    /// The check-in flag classifies the interval; the check-out flag is only
    /// recorded.
    pub fn is_homeoffice(&self) -> bool {
        self.homeoffice_start
    }

    /// End of the interval, or `now` for a shift that is still running.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end.unwrap_or(now)
    }

    /// Overwrites start and end, returning the snapshot of the previous values.
    pub fn apply_correction(
        &mut self,
        change_reason: String,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AttendanceCorrection {
        let snapshot = AttendanceCorrection {
            id: AttendanceCorrectionId::new(),
            attendance_id: self.id,
            change_reason,
            old_start: self.start,
            old_end: self.end,
            created_at: now,
        };

        self.start = new_start;
        self.end = Some(new_end);
        self.updated_at = now;

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap()
    }

    #[test]
    fn check_in_creates_open_interval() {
        let interval = AttendanceInterval::check_in(UserId::new(), at(8), true, at(8));
        assert!(!interval.is_complete());
        assert!(interval.is_homeoffice());
        assert_eq!(interval.end_or(at(10)), at(10));
    }

    #[test]
    fn check_out_flag_does_not_reclassify_interval() {
        let mut interval = AttendanceInterval::check_in(UserId::new(), at(8), true, at(8));
        interval.check_out(at(16), false, at(16));
        assert!(interval.is_complete());
        assert!(!interval.homeoffice_end);
        assert!(interval.is_homeoffice());

        let mut office = AttendanceInterval::check_in(UserId::new(), at(8), false, at(8));
        office.check_out(at(16), true, at(16));
        assert!(!office.is_homeoffice());
        assert_eq!(interval.end_or(at(20)), at(16));
    }

    #[test]
    fn correction_snapshots_previous_values() {
        let mut interval = AttendanceInterval::check_in(UserId::new(), at(8), false, at(8));
        interval.check_out(at(16), false, at(16));

        let correction =
            interval.apply_correction("forgot to check out earlier".into(), at(7), at(15), at(18));

        assert_eq!(correction.attendance_id, interval.id);
        assert_eq!(correction.old_start, at(8));
        assert_eq!(correction.old_end, Some(at(16)));
        assert_eq!(interval.start, at(7));
        assert_eq!(interval.end, Some(at(15)));
        assert_eq!(interval.updated_at, at(18));
    }
}
