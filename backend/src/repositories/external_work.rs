//! External work repository.
//!
//! An external work row is read together with its compensation table (JSONB
//! slot lists) and its per-day expenses.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::external_work::{
    ExternalWork, ExternalWorkCompensation, ExternalWorkExpense, ExternalWorkStatus, HourSlot,
};
use crate::types::{ExternalWorkCompensationId, ExternalWorkExpenseId, ExternalWorkId, UserId};

const SELECT_JOINED: &str = "SELECT w.id, w.user_id, w.description, w.date_from, w.date_till, \
     w.status, c.id AS compensation_id, c.iso_country_code, c.with_social_insurance_slots, \
     c.without_social_insurance_slots, c.additional_options, c.private_car_km_compensation \
     FROM external_works w \
     INNER JOIN external_work_compensations c ON c.id = w.compensation_id";
const EXPENSE_COLUMNS: &str = "id, external_work_id, expense_date, departure_time, arrival_time, \
     travel_duration_hours, pause_duration_hours, rest_duration_hours, on_site_from, \
     on_site_till, place, travel_with_private_car_km, additional_options";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalWorkRepositoryTrait: Send + Sync {
    /// External works of a user whose last day lies within `first..=last`
    async fn find_by_user_and_end_between(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError>;

    /// External works of a user overlapping `first..=last`
    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError>;
}

#[derive(Debug, FromRow)]
struct ExternalWorkRow {
    id: ExternalWorkId,
    user_id: UserId,
    description: String,
    date_from: NaiveDate,
    date_till: NaiveDate,
    status: ExternalWorkStatus,
    compensation_id: ExternalWorkCompensationId,
    iso_country_code: String,
    with_social_insurance_slots: Json<Vec<HourSlot>>,
    without_social_insurance_slots: Json<Vec<HourSlot>>,
    additional_options: Json<BTreeMap<String, f64>>,
    private_car_km_compensation: f64,
}

impl ExternalWorkRow {
    fn into_model(self, expenses: Vec<ExternalWorkExpense>) -> ExternalWork {
        ExternalWork {
            id: self.id,
            user_id: self.user_id,
            description: self.description,
            from: self.date_from,
            till: self.date_till,
            status: self.status,
            compensation: ExternalWorkCompensation {
                id: self.compensation_id,
                iso_country_code: self.iso_country_code,
                with_social_insurance_slots: self.with_social_insurance_slots.0,
                without_social_insurance_slots: self.without_social_insurance_slots.0,
                additional_options: self.additional_options.0,
                private_car_km_compensation: self.private_car_km_compensation,
            },
            expenses,
        }
    }
}

#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: ExternalWorkExpenseId,
    external_work_id: ExternalWorkId,
    expense_date: NaiveDate,
    departure_time: Option<DateTime<Utc>>,
    arrival_time: Option<DateTime<Utc>>,
    travel_duration_hours: f64,
    pause_duration_hours: f64,
    rest_duration_hours: f64,
    on_site_from: Option<DateTime<Utc>>,
    on_site_till: Option<DateTime<Utc>>,
    place: String,
    travel_with_private_car_km: f64,
    additional_options: Json<Vec<String>>,
}

impl From<ExpenseRow> for ExternalWorkExpense {
    fn from(row: ExpenseRow) -> Self {
        Self {
            id: row.id,
            date: row.expense_date,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            travel_duration_hours: row.travel_duration_hours,
            pause_duration_hours: row.pause_duration_hours,
            rest_duration_hours: row.rest_duration_hours,
            on_site_from: row.on_site_from,
            on_site_till: row.on_site_till,
            place: row.place,
            travel_with_private_car_km: row.travel_with_private_car_km,
            additional_options: row.additional_options.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExternalWorkRepository {
    pool: DbPool,
}

impl ExternalWorkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_with_expenses(
        &self,
        query: &str,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError> {
        let works = sqlx::query_as::<_, ExternalWorkRow>(query)
            .bind(user_id)
            .bind(first)
            .bind(last)
            .fetch_all(self.pool.as_ref())
            .await?;
        if works.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = works.iter().map(|work| work.id.to_string()).collect();
        let query = format!(
            "SELECT {} FROM external_work_expenses WHERE external_work_id = ANY($1) \
             ORDER BY expense_date ASC",
            EXPENSE_COLUMNS
        );
        let expense_rows = sqlx::query_as::<_, ExpenseRow>(&query)
            .bind(&ids)
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut expenses: HashMap<ExternalWorkId, Vec<ExternalWorkExpense>> = HashMap::new();
        for row in expense_rows {
            expenses
                .entry(row.external_work_id)
                .or_default()
                .push(ExternalWorkExpense::from(row));
        }

        Ok(works
            .into_iter()
            .map(|work| {
                let days = expenses.remove(&work.id).unwrap_or_default();
                work.into_model(days)
            })
            .collect())
    }
}

#[async_trait]
impl ExternalWorkRepositoryTrait for ExternalWorkRepository {
    async fn find_by_user_and_end_between(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError> {
        let query = format!(
            "{} WHERE w.user_id = $1 AND w.date_till BETWEEN $2 AND $3 ORDER BY w.date_from",
            SELECT_JOINED
        );
        self.fetch_with_expenses(&query, user_id, first, last).await
    }

    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError> {
        let query = format!(
            "{} WHERE w.user_id = $1 AND w.date_from <= $3 AND w.date_till >= $2 \
             ORDER BY w.date_from",
            SELECT_JOINED
        );
        self.fetch_with_expenses(&query, user_id, first, last).await
    }
}
