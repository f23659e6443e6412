//! Check-in/check-out lifecycle, corrections and missing-day detection.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::models::attendance::{AttendanceCorrection, AttendanceInterval};
use crate::repositories::{
    AbsenceRepositoryTrait, AttendanceRepositoryTrait, ExternalWorkRepositoryTrait,
    UserRepositoryTrait,
};
use crate::services::calendar::{is_weekend, CalendarService};
use crate::types::{AttendanceId, UserId};
use crate::utils::time::{day_of, month_bounds, month_days, year_month, Clock};

pub const DEFAULT_CORRECTION_REASON_MIN_LENGTH: usize = 20;

#[derive(Clone)]
pub struct AttendanceService {
    attendance: Arc<dyn AttendanceRepositoryTrait>,
    absences: Arc<dyn AbsenceRepositoryTrait>,
    external_works: Arc<dyn ExternalWorkRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    calendar: CalendarService,
    clock: Arc<dyn Clock>,
    correction_reason_min_length: usize,
}

impl AttendanceService {
    pub fn new(
        attendance: Arc<dyn AttendanceRepositoryTrait>,
        absences: Arc<dyn AbsenceRepositoryTrait>,
        external_works: Arc<dyn ExternalWorkRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        calendar: CalendarService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            attendance,
            absences,
            external_works,
            users,
            calendar,
            clock,
            correction_reason_min_length: DEFAULT_CORRECTION_REASON_MIN_LENGTH,
        }
    }

    pub fn with_correction_reason_min_length(mut self, min_length: usize) -> Self {
        self.correction_reason_min_length = min_length;
        self
    }

    pub async fn check_in(
        &self,
        user_id: UserId,
        homeoffice: bool,
    ) -> Result<AttendanceInterval, AppError> {
        if self.attendance.find_open_by_user(user_id).await?.is_some() {
            return Err(AppError::Conflict("Already checked in".into()));
        }

        let now = self.clock.now();
        let interval = AttendanceInterval::check_in(user_id, now, homeoffice, now);
        let created = self.attendance.create(&interval).await?;
        tracing::info!(%user_id, attendance_id = %created.id, homeoffice, "Checked in");
        Ok(created)
    }

    pub async fn check_out(
        &self,
        user_id: UserId,
        homeoffice: bool,
    ) -> Result<AttendanceInterval, AppError> {
        let mut interval = self
            .attendance
            .find_open_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No open attendance to check out".into()))?;

        let now = self.clock.now();
        interval.check_out(now, homeoffice, now);
        let updated = self.attendance.update(&interval).await?;
        tracing::info!(%user_id, attendance_id = %updated.id, homeoffice, "Checked out");
        Ok(updated)
    }

    /// Overwrites start and end of an interval, keeping the previous values in
    /// the correction trail.
    pub async fn correct(
        &self,
        id: AttendanceId,
        change_reason: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<(AttendanceInterval, AttendanceCorrection), AppError> {
        let reason = change_reason.trim();
        if reason.chars().count() < self.correction_reason_min_length {
            return Err(AppError::BadRequest(format!(
                "Change reason must be at least {} characters",
                self.correction_reason_min_length
            )));
        }
        if new_end < new_start {
            return Err(AppError::BadRequest("End must not be before start".into()));
        }

        let mut interval = self.attendance.find_by_id(id).await?;
        let correction =
            interval.apply_correction(reason.to_string(), new_start, new_end, self.clock.now());
        self.attendance
            .apply_correction(&interval, &correction)
            .await?;

        tracing::info!(
            attendance_id = %id,
            correction_id = %correction.id,
            "Corrected attendance"
        );
        Ok((interval, correction))
    }

    pub async fn corrections(
        &self,
        id: AttendanceId,
    ) -> Result<Vec<AttendanceCorrection>, AppError> {
        self.attendance.find_corrections(id).await
    }

    /// Weekdays up to today without attendance, holiday, absence or external
    /// work.
    pub async fn missing_days_in_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<NaiveDate>, AppError> {
        let (first, last) = month_days(year, month)?;
        let (from, till) = month_bounds(year, month)?;
        let today = self.clock.today();

        let calendar = self.calendar.calendar_for_range(first, last).await?;
        let absences = self
            .absences
            .find_by_user_and_range(user_id, first, last)
            .await?;
        let works = self
            .external_works
            .find_by_user_and_range(user_id, first, last)
            .await?;
        let attended: HashSet<NaiveDate> = self
            .attendance
            .find_by_user_and_range(user_id, from, till)
            .await?
            .iter()
            .map(|interval| day_of(interval.start))
            .collect();

        Ok(first
            .iter_days()
            .take_while(|date| *date <= last && *date <= today)
            .filter(|date| !is_weekend(*date))
            .filter(|date| !calendar.is_holiday(*date))
            .filter(|date| !absences.iter().any(|absence| absence.contains_date(*date)))
            .filter(|date| !works.iter().any(|work| work.contains_date(*date)))
            .filter(|date| !attended.contains(date))
            .collect())
    }

    /// Missing days across the user's whole history, from the day the user was
    /// created up to today.
    pub async fn missing_days(&self, user_id: UserId) -> Result<Vec<NaiveDate>, AppError> {
        let user = self.users.find_by_id(user_id).await?;
        let since = day_of(user.created_at);
        let (mut year, mut month) = year_month(since);
        let until = year_month(self.clock.today());

        let mut missing = Vec::new();
        while (year, month) <= until {
            let days = self.missing_days_in_month(user_id, year, month).await?;
            missing.extend(days.into_iter().filter(|date| *date >= since));
            (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        }

        tracing::debug!(%user_id, count = missing.len(), "Collected missing days");
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        MockAbsenceRepositoryTrait, MockAttendanceRepositoryTrait,
        MockExternalWorkRepositoryTrait, MockHolidayRepositoryTrait, MockUserRepositoryTrait,
    };
    use crate::utils::time::FixedClock;

    fn service(attendance: MockAttendanceRepositoryTrait) -> AttendanceService {
        AttendanceService::new(
            Arc::new(attendance),
            Arc::new(MockAbsenceRepositoryTrait::new()),
            Arc::new(MockExternalWorkRepositoryTrait::new()),
            Arc::new(MockUserRepositoryTrait::new()),
            CalendarService::new(Arc::new(MockHolidayRepositoryTrait::new())),
            Arc::new(FixedClock::at(2024, 4, 8, 9, 0)),
        )
    }

    #[tokio::test]
    async fn check_in_conflicts_with_open_interval() {
        let clock = FixedClock::at(2024, 4, 8, 8, 0);
        let mut attendance = MockAttendanceRepositoryTrait::new();
        attendance.expect_find_open_by_user().returning(move |user_id| {
            Ok(Some(AttendanceInterval::check_in(
                user_id,
                clock.0,
                false,
                clock.0,
            )))
        });
        attendance.expect_create().never();

        let err = service(attendance)
            .check_in(UserId::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn check_out_without_open_interval_is_not_found() {
        let mut attendance = MockAttendanceRepositoryTrait::new();
        attendance.expect_find_open_by_user().returning(|_| Ok(None));

        let err = service(attendance)
            .check_out(UserId::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn correction_requires_long_enough_reason() {
        let mut attendance = MockAttendanceRepositoryTrait::new();
        attendance.expect_find_by_id().never();
        let start = FixedClock::at(2024, 4, 8, 8, 0).0;
        let end = FixedClock::at(2024, 4, 8, 16, 0).0;

        let err = service(attendance)
            .correct(AttendanceId::new(), "typo", start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn correction_rejects_end_before_start() {
        let attendance = MockAttendanceRepositoryTrait::new();
        let start = FixedClock::at(2024, 4, 8, 16, 0).0;
        let end = FixedClock::at(2024, 4, 8, 8, 0).0;

        let err = service(attendance)
            .with_correction_reason_min_length(3)
            .correct(AttendanceId::new(), "swapped times", start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
