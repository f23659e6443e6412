use crate::types::{CustomHolidayId, HolidayId};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HolidaySource {
    Imported,
    Custom,
}

impl HolidaySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidaySource::Imported => "imported",
            HolidaySource::Custom => "custom",
        }
    }
}

impl FromStr for HolidaySource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "imported" => Ok(HolidaySource::Imported),
            "custom" => Ok(HolidaySource::Custom),
            _ => Err(()),
        }
    }
}

/// Dated public holiday imported from a regional feed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub id: HolidayId,
    pub holiday_date: NaiveDate,
    pub name: String,
    pub state: Option<String>,
    pub employee_day_subtraction: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holiday {
    pub fn new(holiday_date: NaiveDate, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: HolidayId::new(),
            holiday_date,
            name,
            state: None,
            employee_day_subtraction: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Company-defined holiday. Either pinned to one `date`, or a `month`/`day`
/// pair repeating every year when `yearly` is set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomHoliday {
    pub id: CustomHolidayId,
    pub name: String,
    #[sqlx(rename = "holiday_date")]
    pub date: Option<NaiveDate>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub yearly: bool,
    pub employee_day_subtraction: i32,
}

impl CustomHoliday {
    pub fn fixed(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: CustomHolidayId::new(),
            name: name.into(),
            date: Some(date),
            month: None,
            day: None,
            yearly: false,
            employee_day_subtraction: 0,
        }
    }

    pub fn yearly(name: impl Into<String>, month: u32, day: u32) -> Self {
        Self {
            id: CustomHolidayId::new(),
            name: name.into(),
            date: None,
            month: Some(month as i32),
            day: Some(day as i32),
            yearly: true,
            employee_day_subtraction: 0,
        }
    }

    /// Dates this holiday falls on within `from..=till`.
    pub fn occurrences(&self, from: NaiveDate, till: NaiveDate) -> Vec<NaiveDate> {
        if from > till {
            return Vec::new();
        }

        if !self.yearly {
            return self
                .date
                .filter(|date| *date >= from && *date <= till)
                .into_iter()
                .collect();
        }

        let month_day = match (self.month, self.day, self.date) {
            (Some(month), Some(day), _) => Some((month, day)),
            (_, _, Some(date)) => Some((date.month() as i32, date.day() as i32)),
            _ => None,
        };
        let Some((month, day)) = month_day else {
            return Vec::new();
        };
        let (Ok(month), Ok(day)) = (u32::try_from(month), u32::try_from(day)) else {
            return Vec::new();
        };

        (from.year()..=till.year())
            .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
            .filter(|date| *date >= from && *date <= till)
            .collect()
    }
}

/// A date classified as holiday, regardless of where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub name: String,
    pub source: HolidaySource,
    pub employee_day_subtraction: i32,
}

impl From<&Holiday> for CalendarDay {
    fn from(value: &Holiday) -> Self {
        Self {
            date: value.holiday_date,
            name: value.name.clone(),
            source: HolidaySource::Imported,
            employee_day_subtraction: value.employee_day_subtraction,
        }
    }
}

impl CalendarDay {
    pub fn custom(holiday: &CustomHoliday, date: NaiveDate) -> Self {
        Self {
            date,
            name: holiday.name.clone(),
            source: HolidaySource::Custom,
            employee_day_subtraction: holiday.employee_day_subtraction,
        }
    }
}
