use crate::services::calendar::{HolidayCalendar, WorkWeekPolicy};
use crate::types::{
    ExternalWorkCompensationId, ExternalWorkExpenseId, ExternalWorkId, UserId,
};
use crate::utils::time::start_of_day;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourSlot {
    pub hours: f64,
    pub compensation: f64,
}

/// Country-specific allowance table used to price one day away.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalWorkCompensation {
    pub id: ExternalWorkCompensationId,
    pub iso_country_code: String,
    pub with_social_insurance_slots: Vec<HourSlot>,
    pub without_social_insurance_slots: Vec<HourSlot>,
    pub additional_options: BTreeMap<String, f64>,
    pub private_car_km_compensation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExternalWorkStatus {
    Planned,
    MissingInfo,
    InReview,
    Accepted,
    Declined,
    Invoiced,
}

impl Default for ExternalWorkStatus {
    fn default() -> Self {
        ExternalWorkStatus::Planned
    }
}

/// One day of an external assignment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalWorkExpense {
    pub id: ExternalWorkExpenseId,
    pub date: NaiveDate,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub travel_duration_hours: f64,
    pub pause_duration_hours: f64,
    pub rest_duration_hours: f64,
    pub on_site_from: Option<DateTime<Utc>>,
    pub on_site_till: Option<DateTime<Utc>>,
    pub place: String,
    pub travel_with_private_car_km: f64,
    pub additional_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalWork {
    pub id: ExternalWorkId,
    pub user_id: UserId,
    pub description: String,
    pub from: NaiveDate,
    pub till: NaiveDate,
    pub status: ExternalWorkStatus,
    pub compensation: ExternalWorkCompensation,
    pub expenses: Vec<ExternalWorkExpense>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalWorkExpenseCalculated {
    pub expense_id: ExternalWorkExpenseId,
    pub date: NaiveDate,
    pub total_operation_hours: f64,
    pub total_working_hours: f64,
    pub total_overtime_hours: f64,
    pub total_away_hours: f64,
    pub expenses_with_social_insurance: f64,
    pub expenses_without_social_insurance: f64,
    pub additional_options_used: BTreeMap<String, f64>,
    pub travel_private_km_costs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalWorkCalculated {
    pub external_work_id: ExternalWorkId,
    pub total_overtime_hours: f64,
    pub total_expenses_with_social_insurance: f64,
    pub total_expenses_without_social_insurance: f64,
    pub total_options: BTreeMap<String, f64>,
    pub total_private_km_costs: f64,
    pub is_locked: bool,
    pub expenses: Vec<ExternalWorkExpenseCalculated>,
}

impl ExternalWork {
    pub fn is_editable(&self) -> bool {
        matches!(
            self.status,
            ExternalWorkStatus::Planned | ExternalWorkStatus::MissingInfo
        )
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.till
    }

    pub fn calculate(
        &self,
        calendar: &HolidayCalendar,
        policy: &WorkWeekPolicy,
    ) -> ExternalWorkCalculated {
        let mut result = ExternalWorkCalculated {
            external_work_id: self.id,
            total_overtime_hours: 0.0,
            total_expenses_with_social_insurance: 0.0,
            total_expenses_without_social_insurance: 0.0,
            total_options: BTreeMap::new(),
            total_private_km_costs: 0.0,
            is_locked: !self.is_editable(),
            expenses: Vec::with_capacity(self.expenses.len()),
        };

        for expense in &self.expenses {
            let calculated = expense.calculate(&self.compensation, calendar, policy);

            result.total_overtime_hours += calculated.total_overtime_hours;
            result.total_expenses_with_social_insurance +=
                calculated.expenses_with_social_insurance;
            result.total_expenses_without_social_insurance +=
                calculated.expenses_without_social_insurance;
            result.total_private_km_costs += calculated.travel_private_km_costs;
            for (key, value) in &calculated.additional_options_used {
                *result.total_options.entry(key.clone()).or_insert(0.0) += value;
            }

            result.expenses.push(calculated);
        }

        result
    }
}

impl ExternalWorkExpense {
    pub fn calculate(
        &self,
        compensation: &ExternalWorkCompensation,
        calendar: &HolidayCalendar,
        policy: &WorkWeekPolicy,
    ) -> ExternalWorkExpenseCalculated {
        let needed_hours = calendar.expected_hours(self.date, policy);
        let total_away_hours = self.away_hours();
        let total_working_hours = match (self.on_site_from, self.on_site_till) {
            (Some(from), Some(till)) => hours_between(from, till),
            _ => 0.0,
        };
        let total_operation_hours =
            self.travel_duration_hours + self.rest_duration_hours + total_working_hours;

        let additional_options_used = compensation
            .additional_options
            .iter()
            .map(|(key, value)| {
                let used = if self.additional_options.contains(key) {
                    *value
                } else {
                    0.0
                };
                (key.clone(), used)
            })
            .collect();

        ExternalWorkExpenseCalculated {
            expense_id: self.id,
            date: self.date,
            total_operation_hours,
            total_working_hours,
            total_overtime_hours: total_operation_hours - needed_hours,
            total_away_hours,
            expenses_with_social_insurance: slot_compensation(
                &compensation.with_social_insurance_slots,
                total_away_hours,
            ),
            expenses_without_social_insurance: slot_compensation(
                &compensation.without_social_insurance_slots,
                total_away_hours,
            ),
            additional_options_used,
            travel_private_km_costs: self.travel_with_private_car_km
                * compensation.private_car_km_compensation,
        }
    }

    fn away_hours(&self) -> f64 {
        let day_start = start_of_day(self.date);
        let day_end = day_start + Duration::days(1);

        match (self.departure_time, self.arrival_time) {
            (Some(departure), Some(arrival)) => hours_between(departure, arrival),
            (Some(departure), None) => hours_between(departure, day_end),
            (None, Some(arrival)) => hours_between(day_start, arrival),
            (None, None) => 24.0,
        }
    }
}

/// Compensation of the highest slot whose threshold the away time reaches.
fn slot_compensation(slots: &[HourSlot], away_hours: f64) -> f64 {
    slots
        .iter()
        .filter(|slot| away_hours >= slot.hours)
        .last()
        .map(|slot| slot.compensation)
        .unwrap_or(0.0)
}

fn hours_between(from: DateTime<Utc>, till: DateTime<Utc>) -> f64 {
    (till - from).num_seconds() as f64 / 3600.0
}
