//! Monthly overtime quota repository.
//!
//! Rows are unique per (user, year, month). The summary entries live in a
//! JSONB column next to the computed hours.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::overtime::{OvertimeMonthQuota, OvertimeSummaryEntry};
use crate::types::{OvertimeQuotaId, UserId};

const TABLE_NAME: &str = "overtime_month_quotas";
const SELECT_COLUMNS: &str = "id, user_id, year, month, hours, entries, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OvertimeQuotaRepositoryTrait: Send + Sync {
    async fn find_by_user_year_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Option<OvertimeMonthQuota>, AppError>;

    /// Quotas of a user, oldest month first
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OvertimeMonthQuota>, AppError>;

    async fn find_all(&self) -> Result<Vec<OvertimeMonthQuota>, AppError>;

    /// Inserts the quota, or replaces hours and entries of the row that already
    /// exists for its (user, year, month). Returns the stored row and whether
    /// it was newly created.
    async fn upsert(
        &self,
        quota: &OvertimeMonthQuota,
    ) -> Result<(OvertimeMonthQuota, bool), AppError>;
}

#[derive(Debug, FromRow)]
struct QuotaRow {
    id: OvertimeQuotaId,
    user_id: UserId,
    year: i32,
    month: i32,
    hours: f64,
    entries: Json<Vec<OvertimeSummaryEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuotaRow> for OvertimeMonthQuota {
    type Error = AppError;

    fn try_from(row: QuotaRow) -> Result<Self, Self::Error> {
        let month = u32::try_from(row.month).map_err(|_| {
            AppError::InternalServerError(anyhow::anyhow!("invalid quota month {}", row.month))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            year: row.year,
            month,
            hours: row.hours,
            entries: row.entries.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    quota: QuotaRow,
    inserted: bool,
}

fn month_param(month: u32) -> Result<i32, AppError> {
    i32::try_from(month).map_err(|_| AppError::BadRequest(format!("invalid month {}", month)))
}

#[derive(Debug, Clone)]
pub struct OvertimeQuotaRepository {
    pool: DbPool,
}

impl OvertimeQuotaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn base_select_query() -> String {
        format!("SELECT {} FROM {}", SELECT_COLUMNS, TABLE_NAME)
    }
}

#[async_trait]
impl OvertimeQuotaRepositoryTrait for OvertimeQuotaRepository {
    async fn find_by_user_year_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Option<OvertimeMonthQuota>, AppError> {
        let query = format!(
            "{} WHERE user_id = $1 AND year = $2 AND month = $3",
            Self::base_select_query()
        );
        sqlx::query_as::<_, QuotaRow>(&query)
            .bind(user_id)
            .bind(year)
            .bind(month_param(month)?)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(OvertimeMonthQuota::try_from)
            .transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OvertimeMonthQuota>, AppError> {
        let query = format!(
            "{} WHERE user_id = $1 ORDER BY year ASC, month ASC",
            Self::base_select_query()
        );
        sqlx::query_as::<_, QuotaRow>(&query)
            .bind(user_id)
            .fetch_all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(OvertimeMonthQuota::try_from)
            .collect()
    }

    async fn find_all(&self) -> Result<Vec<OvertimeMonthQuota>, AppError> {
        let query = format!(
            "{} ORDER BY user_id, year ASC, month ASC",
            Self::base_select_query()
        );
        sqlx::query_as::<_, QuotaRow>(&query)
            .fetch_all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(OvertimeMonthQuota::try_from)
            .collect()
    }

    async fn upsert(
        &self,
        quota: &OvertimeMonthQuota,
    ) -> Result<(OvertimeMonthQuota, bool), AppError> {
        // xmax is 0 only for rows written by a plain insert.
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id, year, month) \
             DO UPDATE SET hours = EXCLUDED.hours, entries = EXCLUDED.entries, \
             updated_at = EXCLUDED.updated_at \
             RETURNING {}, (xmax = 0) AS inserted",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, UpsertRow>(&query)
            .bind(quota.id)
            .bind(quota.user_id)
            .bind(quota.year)
            .bind(month_param(quota.month)?)
            .bind(quota.hours)
            .bind(Json(&quota.entries))
            .bind(quota.created_at)
            .bind(quota.updated_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        let inserted = row.inserted;
        Ok((OvertimeMonthQuota::try_from(row.quota)?, inserted))
    }
}
