//! Holiday lookup and the expected-hours-per-weekday policy.
//!
//! Lookups are keyed by [`NaiveDate`]; callers normalize instants with
//! [`crate::utils::time::day_of`] (UTC) before asking.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
    sync::Arc,
};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::holiday::CalendarDay;
use crate::repositories::HolidayRepositoryTrait;
use crate::utils::time::month_days;

pub const DEFAULT_HOURS_PER_WEEKDAY: f64 = 8.0;

/// Expected working hours per weekday: one default plus per-weekday overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkWeekPolicy {
    pub default_hours: f64,
    pub overrides: HashMap<Weekday, f64>,
}

impl Default for WorkWeekPolicy {
    fn default() -> Self {
        Self {
            default_hours: DEFAULT_HOURS_PER_WEEKDAY,
            overrides: HashMap::from([
                (Weekday::Fri, 6.0),
                (Weekday::Sat, 0.0),
                (Weekday::Sun, 0.0),
            ]),
        }
    }
}

impl WorkWeekPolicy {
    pub fn new(default_hours: f64) -> Self {
        Self {
            default_hours,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, weekday: Weekday, hours: f64) -> Self {
        self.overrides.insert(weekday, hours);
        self
    }

    /// Hours for `weekday`, ignoring holidays.
    pub fn hours_for(&self, weekday: Weekday) -> f64 {
        self.overrides
            .get(&weekday)
            .copied()
            .unwrap_or(self.default_hours)
    }

    /// Parses `fri=6,sat=0,sun=0` style override lists.
    pub fn parse_overrides(raw: &str) -> Result<HashMap<Weekday, f64>, AppError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (day, hours) = part.split_once('=').ok_or_else(|| {
                    AppError::BadRequest(format!("invalid weekday override: {}", part))
                })?;
                let weekday = Weekday::from_str(day.trim())
                    .map_err(|_| AppError::BadRequest(format!("invalid weekday: {}", day)))?;
                let hours: f64 = hours.trim().parse().map_err(|_| {
                    AppError::BadRequest(format!("invalid hours for {}: {}", day, hours))
                })?;
                Ok((weekday, hours))
            })
            .collect()
    }
}

/// Holidays of a window, at most one per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, CalendarDay>,
}

impl HolidayCalendar {
    /// Builds the calendar; the first entry seen for a date wins.
    pub fn new(days: impl IntoIterator<Item = CalendarDay>) -> Self {
        let mut calendar = Self::default();
        for day in days {
            calendar.days.entry(day.date).or_insert(day);
        }
        calendar
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn holiday(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.get(&date)
    }

    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Expected hours for `date`: 0 on holidays, else the policy's weekday value.
    pub fn expected_hours(&self, date: NaiveDate, policy: &WorkWeekPolicy) -> f64 {
        if self.is_holiday(date) {
            0.0
        } else {
            policy.hours_for(date.weekday())
        }
    }

    /// Expected hours of a month, counting only Monday to Friday.
    pub fn needed_hours_for_month(
        &self,
        policy: &WorkWeekPolicy,
        year: i32,
        month: u32,
    ) -> Result<f64, AppError> {
        let (first, last) = month_days(year, month)?;
        Ok(first
            .iter_days()
            .take_while(|date| *date <= last)
            .filter(|date| !is_weekend(*date))
            .map(|date| self.expected_hours(date, policy))
            .sum())
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Loads holiday calendars from the holiday collaborator.
#[derive(Clone)]
pub struct CalendarService {
    holidays: Arc<dyn HolidayRepositoryTrait>,
}

impl CalendarService {
    pub fn new(holidays: Arc<dyn HolidayRepositoryTrait>) -> Self {
        Self { holidays }
    }

    /// Imported and custom holidays of `from..=till`, imported first.
    pub async fn calendar_for_range(
        &self,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<HolidayCalendar, AppError> {
        if from > till {
            return Ok(HolidayCalendar::default());
        }

        let imported = self.holidays.find_by_range(from, till).await?;
        let custom = self.holidays.find_custom_all().await?;

        let imported_days = imported.iter().map(CalendarDay::from);
        let custom_days = custom.iter().flat_map(|holiday| {
            holiday
                .occurrences(from, till)
                .into_iter()
                .map(move |date| CalendarDay::custom(holiday, date))
        });

        let calendar = HolidayCalendar::new(imported_days.chain(custom_days));
        tracing::debug!(%from, %till, holidays = calendar.len(), "Loaded holiday calendar");
        Ok(calendar)
    }

    pub async fn calendar_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<HolidayCalendar, AppError> {
        let (first, last) = month_days(year, month)?;
        self.calendar_for_range(first, last).await
    }
}
