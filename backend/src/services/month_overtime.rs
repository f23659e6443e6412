//! Monthly attendance overtime and the per-user subtraction buffer.

use serde::Serialize;

use crate::error::AppError;
use crate::models::overtime::SubtractionConfig;
use crate::services::calendar::{HolidayCalendar, WorkWeekPolicy};
use crate::services::day_grouper::{DayAggregate, DayGrouper};
use crate::types::UserId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOvertimeResult {
    pub days: Vec<DayAggregate>,
    pub total_overtime: f64,
    pub subtracted: f64,
    pub expected_month_hours: f64,
}

impl MonthOvertimeResult {
    /// Overtime left after the buffer.
    pub fn net_overtime(&self) -> f64 {
        self.total_overtime - self.subtracted
    }
}

/// Reduces day aggregates to the month result.
pub fn summarize_month(
    days: Vec<DayAggregate>,
    calendar: &HolidayCalendar,
    policy: &WorkWeekPolicy,
    year: i32,
    month: u32,
    subtraction: &SubtractionConfig,
) -> Result<MonthOvertimeResult, AppError> {
    let total_overtime: f64 = days.iter().map(|day| day.overtime_hours).sum();
    let expected_month_hours = calendar.needed_hours_for_month(policy, year, month)?;
    let subtracted = subtraction.subtracted(total_overtime, expected_month_hours);

    Ok(MonthOvertimeResult {
        days,
        total_overtime,
        subtracted,
        expected_month_hours,
    })
}

/// Month overtime calculation on top of [`DayGrouper`].
#[derive(Clone)]
pub struct MonthOvertimeCalculator {
    grouper: DayGrouper,
}

impl MonthOvertimeCalculator {
    pub fn new(grouper: DayGrouper) -> Self {
        Self { grouper }
    }

    pub fn grouper(&self) -> &DayGrouper {
        &self.grouper
    }

    pub async fn calculate_month_overtime(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
        subtraction: &SubtractionConfig,
    ) -> Result<MonthOvertimeResult, AppError> {
        let (days, calendar) = self
            .grouper
            .group_month_with_calendar(user_id, year, month)
            .await?;
        summarize_month(days, &calendar, self.grouper.policy(), year, month, subtraction)
    }
}
