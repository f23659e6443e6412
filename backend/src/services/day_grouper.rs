//! Folds attendance intervals into per-day aggregates.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppError;
use crate::models::attendance::AttendanceInterval;
use crate::repositories::AttendanceRepositoryTrait;
use crate::services::calendar::{CalendarService, HolidayCalendar, WorkWeekPolicy};
use crate::services::working_hours::calculate_working_hours;
use crate::types::UserId;
use crate::utils::time::{day_of, month_bounds, month_days, Clock};

/// Attendance totals of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAggregate {
    pub date: NaiveDate,
    /// True only when every interval of the day was booked from home.
    pub homeoffice: bool,
    pub worked_hours: f64,
    pub deducted_hours: f64,
    pub expected_hours: f64,
    pub overtime_hours: f64,
}

impl DayAggregate {
    fn empty(date: NaiveDate, expected_hours: f64) -> Self {
        Self {
            date,
            homeoffice: true,
            worked_hours: 0.0,
            deducted_hours: 0.0,
            expected_hours,
            overtime_hours: -expected_hours,
        }
    }
}

/// Groups `intervals` by the UTC date of their start, keeping only dates in
/// `first..=last`. The result is sorted by date; days without intervals are
/// not produced.
pub fn group_intervals(
    intervals: &[AttendanceInterval],
    first: NaiveDate,
    last: NaiveDate,
    calendar: &HolidayCalendar,
    policy: &WorkWeekPolicy,
    clock: &dyn Clock,
) -> Vec<DayAggregate> {
    let mut days: BTreeMap<NaiveDate, DayAggregate> = BTreeMap::new();

    for interval in intervals {
        let date = day_of(interval.start);
        if date < first || date > last {
            continue;
        }

        let hours = calculate_working_hours(interval, clock);
        let day = days
            .entry(date)
            .or_insert_with(|| DayAggregate::empty(date, calendar.expected_hours(date, policy)));

        if !interval.is_homeoffice() {
            day.homeoffice = false;
        }
        day.worked_hours += hours.worked;
        day.deducted_hours += hours.deducted;
        day.overtime_hours = day.worked_hours - day.expected_hours;
    }

    days.into_values().collect()
}

/// Loads a user's month of attendance and groups it into days.
#[derive(Clone)]
pub struct DayGrouper {
    attendance: Arc<dyn AttendanceRepositoryTrait>,
    calendar: CalendarService,
    policy: WorkWeekPolicy,
    clock: Arc<dyn Clock>,
}

impl DayGrouper {
    pub fn new(
        attendance: Arc<dyn AttendanceRepositoryTrait>,
        calendar: CalendarService,
        policy: WorkWeekPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            attendance,
            calendar,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &WorkWeekPolicy {
        &self.policy
    }

    pub fn calendar_service(&self) -> &CalendarService {
        &self.calendar
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Day aggregates plus the month's holiday calendar, so callers needing
    /// both load holidays once.
    pub async fn group_month_with_calendar(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<(Vec<DayAggregate>, HolidayCalendar), AppError> {
        let (first, last) = month_days(year, month)?;
        let (from, till) = month_bounds(year, month)?;

        let intervals = self
            .attendance
            .find_by_user_and_range(user_id, from, till)
            .await?;
        let calendar = self.calendar.calendar_for_range(first, last).await?;

        let days = group_intervals(
            &intervals,
            first,
            last,
            &calendar,
            &self.policy,
            self.clock.as_ref(),
        );
        tracing::debug!(
            %user_id,
            year,
            month,
            intervals = intervals.len(),
            days = days.len(),
            "Grouped attendance by day"
        );
        Ok((days, calendar))
    }

    pub async fn group_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<DayAggregate>, AppError> {
        let (days, _) = self.group_month_with_calendar(user_id, year, month).await?;
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::holiday::{CalendarDay, HolidaySource};
    use crate::repositories::{MockAttendanceRepositoryTrait, MockHolidayRepositoryTrait};
    use crate::utils::time::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn interval(user_id: UserId, day: u32, from: u32, till: u32, home: bool) -> AttendanceInterval {
        let mut interval = AttendanceInterval::check_in(user_id, at(day, from), home, at(day, from));
        interval.check_out(at(day, till), home, at(day, till));
        interval
    }

    #[test]
    fn mixed_homeoffice_day_is_not_homeoffice() {
        let user_id = UserId::new();
        let intervals = vec![
            interval(user_id, 8, 8, 12, true),
            interval(user_id, 8, 13, 17, false),
            interval(user_id, 9, 8, 12, true),
        ];

        let days = group_intervals(
            &intervals,
            date(1),
            date(30),
            &HolidayCalendar::default(),
            &WorkWeekPolicy::default(),
            &FixedClock(at(30, 12)),
        );

        assert_eq!(days.len(), 2);
        assert!(!days[0].homeoffice);
        assert_eq!(days[0].worked_hours, 8.0);
        assert_eq!(days[0].overtime_hours, 0.0);
        assert!(days[1].homeoffice);
        assert_eq!(days[1].overtime_hours, -4.0);
    }

    #[test]
    fn output_is_sorted_by_date() {
        let user_id = UserId::new();
        let intervals = vec![
            interval(user_id, 12, 8, 10, false),
            interval(user_id, 3, 8, 10, false),
            interval(user_id, 7, 8, 10, false),
        ];

        let days = group_intervals(
            &intervals,
            date(1),
            date(30),
            &HolidayCalendar::default(),
            &WorkWeekPolicy::default(),
            &FixedClock(at(30, 12)),
        );

        let dates: Vec<_> = days.iter().map(|day| day.date).collect();
        assert_eq!(dates, vec![date(3), date(7), date(12)]);
    }

    #[test]
    fn holiday_work_counts_fully_as_overtime() {
        let user_id = UserId::new();
        let calendar = HolidayCalendar::new([CalendarDay {
            date: date(1),
            name: "Easter Monday".into(),
            source: HolidaySource::Imported,
            employee_day_subtraction: 0,
        }]);

        let days = group_intervals(
            &[interval(user_id, 1, 9, 12, false)],
            date(1),
            date(30),
            &calendar,
            &WorkWeekPolicy::default(),
            &FixedClock(at(30, 12)),
        );

        assert_eq!(days[0].expected_hours, 0.0);
        assert_eq!(days[0].overtime_hours, 3.0);
    }

    #[test]
    fn intervals_outside_range_are_skipped() {
        let user_id = UserId::new();
        let days = group_intervals(
            &[interval(user_id, 8, 8, 10, false)],
            date(9),
            date(30),
            &HolidayCalendar::default(),
            &WorkWeekPolicy::default(),
            &FixedClock(at(30, 12)),
        );
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn group_month_propagates_attendance_failures() {
        let mut attendance = MockAttendanceRepositoryTrait::new();
        attendance
            .expect_find_by_user_and_range()
            .returning(|_, _, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let holidays = MockHolidayRepositoryTrait::new();

        let grouper = DayGrouper::new(
            Arc::new(attendance),
            CalendarService::new(Arc::new(holidays)),
            WorkWeekPolicy::default(),
            Arc::new(FixedClock(at(30, 12))),
        );

        let err = grouper.group_month(UserId::new(), 2024, 4).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
