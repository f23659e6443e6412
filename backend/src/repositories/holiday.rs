//! Holiday repository.
//!
//! Reads imported public holidays and company-defined custom holidays.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::holiday::{CustomHoliday, Holiday};

const TABLE_NAME: &str = "holidays";
const SELECT_COLUMNS: &str =
    "id, holiday_date, name, state, employee_day_subtraction, created_at, updated_at";
const CUSTOM_TABLE_NAME: &str = "custom_holidays";
const CUSTOM_SELECT_COLUMNS: &str =
    "id, name, holiday_date, month, day, yearly, employee_day_subtraction";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HolidayRepositoryTrait: Send + Sync {
    /// Imported holidays dated within `from..=till`
    async fn find_by_range(
        &self,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<Vec<Holiday>, AppError>;

    /// Every custom holiday; recurrence is resolved by the caller
    async fn find_custom_all(&self) -> Result<Vec<CustomHoliday>, AppError>;
}

#[derive(Debug, Clone)]
pub struct HolidayRepository {
    pool: DbPool,
}

impl HolidayRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HolidayRepositoryTrait for HolidayRepository {
    async fn find_by_range(
        &self,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<Vec<Holiday>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE holiday_date BETWEEN $1 AND $2 ORDER BY holiday_date ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Holiday>(&query)
            .bind(from)
            .bind(till)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows)
    }

    async fn find_custom_all(&self) -> Result<Vec<CustomHoliday>, AppError> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY name ASC",
            CUSTOM_SELECT_COLUMNS, CUSTOM_TABLE_NAME
        );
        let rows = sqlx::query_as::<_, CustomHoliday>(&query)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows)
    }
}
