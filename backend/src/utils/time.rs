use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::AppError;

/// Source of "now" for every calculation that has to close an open interval or
/// decide which days already lie in the past.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock, reporting "today" in the configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    time_zone: Tz,
}

impl SystemClock {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        now_utc(&self.time_zone)
    }

    fn today(&self) -> NaiveDate {
        today_local(&self.time_zone)
    }
}

/// Clock frozen at a single instant.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(any(test, feature = "test-utils"))]
impl FixedClock {
    /// Panics on an instant that does not exist.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        use chrono::TimeZone;

        let instant = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("FixedClock::at requires a valid UTC instant");
        Self(instant)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns the current UTC time, aligned with the configured timezone.
pub fn now_utc(tz: &Tz) -> DateTime<Utc> {
    now_in_timezone(tz).with_timezone(&Utc)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Normalizes an instant to its calendar day. All holiday and grouping lookups
/// go through UTC so local and UTC source instants land on the same key.
pub fn day_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Midnight UTC of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First and last calendar day of a month.
pub fn month_days(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::BadRequest(format!("invalid year/month: {}/{}", year, month)))?;
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| AppError::BadRequest("date overflow".into()))?;
    let last = next
        .pred_opt()
        .ok_or_else(|| AppError::BadRequest("date overflow".into()))?;
    Ok((first, last))
}

/// Half-open UTC window `[first 00:00, first of next month 00:00)`.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let (first, last) = month_days(year, month)?;
    let next = last
        .succ_opt()
        .ok_or_else(|| AppError::BadRequest("date overflow".into()))?;
    Ok((start_of_day(first), start_of_day(next)))
}

/// (year, month) of the given date.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}
