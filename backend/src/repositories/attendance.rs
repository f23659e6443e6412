//! Attendance repository trait for dependency injection and testing.
//!
//! Loads check-in/check-out intervals and stores the append-only correction
//! trail. Mockable with mockall in unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row as _;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::attendance::{AttendanceCorrection, AttendanceInterval, UserYearMonth};
use crate::repositories::transaction::{begin_transaction, commit_transaction};
use crate::types::{AttendanceId, UserId};

const TABLE_NAME: &str = "attendance_intervals";
const SELECT_COLUMNS: &str = "id, user_id, started_at, ended_at, homeoffice_start, \
                              homeoffice_end, created_at, updated_at";
const CORRECTION_COLUMNS: &str =
    "id, attendance_id, change_reason, old_started_at, old_ended_at, created_at";

/// Repository trait for attendance intervals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepositoryTrait: Send + Sync {
    /// Find an interval by ID
    async fn find_by_id(&self, id: AttendanceId) -> Result<AttendanceInterval, AppError>;

    /// Intervals of a user whose start lies in `[from, till)`, oldest first
    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<AttendanceInterval>, AppError>;

    /// The interval the user is currently checked in with, if any
    async fn find_open_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<AttendanceInterval>, AppError>;

    /// Create a new interval
    async fn create(&self, item: &AttendanceInterval) -> Result<AttendanceInterval, AppError>;

    /// Update an existing interval
    async fn update(&self, item: &AttendanceInterval) -> Result<AttendanceInterval, AppError>;

    /// Store the correction snapshot and the overwritten interval atomically
    async fn apply_correction(
        &self,
        item: &AttendanceInterval,
        correction: &AttendanceCorrection,
    ) -> Result<(), AppError>;

    /// Correction trail of an interval, oldest first
    async fn find_corrections(
        &self,
        attendance_id: AttendanceId,
    ) -> Result<Vec<AttendanceCorrection>, AppError>;

    /// Every (user, year, month) with at least one interval
    async fn find_year_months(&self) -> Result<Vec<UserYearMonth>, AppError>;
}

/// Postgres implementation of [`AttendanceRepositoryTrait`]
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: DbPool,
}

impl AttendanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn base_select_query() -> String {
        format!("SELECT {} FROM {}", SELECT_COLUMNS, TABLE_NAME)
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for AttendanceRepository {
    async fn find_by_id(&self, id: AttendanceId) -> Result<AttendanceInterval, AppError> {
        let query = format!("{} WHERE id = $1", Self::base_select_query());
        sqlx::query_as::<_, AttendanceInterval>(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
    }

    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<AttendanceInterval>, AppError> {
        let query = format!(
            "{} WHERE user_id = $1 AND started_at >= $2 AND started_at < $3 ORDER BY started_at",
            Self::base_select_query()
        );
        let rows = sqlx::query_as::<_, AttendanceInterval>(&query)
            .bind(user_id)
            .bind(from)
            .bind(till)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows)
    }

    async fn find_open_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<AttendanceInterval>, AppError> {
        let query = format!(
            "{} WHERE user_id = $1 AND ended_at IS NULL ORDER BY started_at DESC LIMIT 1",
            Self::base_select_query()
        );
        let row = sqlx::query_as::<_, AttendanceInterval>(&query)
            .bind(user_id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row)
    }

    async fn create(&self, item: &AttendanceInterval) -> Result<AttendanceInterval, AppError> {
        let query = format!(
            "INSERT INTO {} (id, user_id, started_at, ended_at, homeoffice_start, homeoffice_end, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceInterval>(&query)
            .bind(item.id)
            .bind(item.user_id)
            .bind(item.start)
            .bind(item.end)
            .bind(item.homeoffice_start)
            .bind(item.homeoffice_end)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(row)
    }

    async fn update(&self, item: &AttendanceInterval) -> Result<AttendanceInterval, AppError> {
        let query = format!(
            "UPDATE {} SET started_at = $2, ended_at = $3, homeoffice_start = $4, \
             homeoffice_end = $5, updated_at = $6 WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceInterval>(&query)
            .bind(item.id)
            .bind(item.start)
            .bind(item.end)
            .bind(item.homeoffice_start)
            .bind(item.homeoffice_end)
            .bind(item.updated_at)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(row)
    }

    async fn apply_correction(
        &self,
        item: &AttendanceInterval,
        correction: &AttendanceCorrection,
    ) -> Result<(), AppError> {
        let mut tx = begin_transaction(self.pool.as_ref()).await?;

        sqlx::query(
            "INSERT INTO attendance_corrections \
             (id, attendance_id, change_reason, old_started_at, old_ended_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(correction.id)
        .bind(correction.attendance_id)
        .bind(&correction.change_reason)
        .bind(correction.old_start)
        .bind(correction.old_end)
        .bind(correction.created_at)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE {} SET started_at = $2, ended_at = $3, updated_at = $4 WHERE id = $1",
            TABLE_NAME
        );
        sqlx::query(&query)
            .bind(item.id)
            .bind(item.start)
            .bind(item.end)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await?;

        commit_transaction(tx).await
    }

    async fn find_corrections(
        &self,
        attendance_id: AttendanceId,
    ) -> Result<Vec<AttendanceCorrection>, AppError> {
        let query = format!(
            "SELECT {} FROM attendance_corrections WHERE attendance_id = $1 ORDER BY created_at",
            CORRECTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceCorrection>(&query)
            .bind(attendance_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows)
    }

    async fn find_year_months(&self) -> Result<Vec<UserYearMonth>, AppError> {
        let query = format!(
            "SELECT DISTINCT user_id, \
             EXTRACT(YEAR FROM started_at AT TIME ZONE 'UTC')::INT AS year, \
             EXTRACT(MONTH FROM started_at AT TIME ZONE 'UTC')::INT AS month \
             FROM {} ORDER BY user_id, year, month",
            TABLE_NAME
        );
        let rows = sqlx::query(&query).fetch_all(self.pool.as_ref()).await?;

        rows.into_iter()
            .map(|row| -> Result<UserYearMonth, AppError> {
                let month: i32 = row.try_get("month")?;
                Ok(UserYearMonth {
                    user_id: row.try_get("user_id")?,
                    year: row.try_get("year")?,
                    month: u32::try_from(month).map_err(|_| {
                        AppError::InternalServerError(anyhow::anyhow!("invalid month {}", month))
                    })?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_columns_avoid_reserved_words() {
        assert!(SELECT_COLUMNS.contains("started_at"));
        assert!(SELECT_COLUMNS.contains("ended_at"));
        assert!(!SELECT_COLUMNS.split(", ").any(|column| column.trim() == "end"));
    }

    #[test]
    fn mock_attendance_repository_trait_bounds() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockAttendanceRepositoryTrait>();
    }
}
