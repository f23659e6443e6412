//! Absence repository.
//!
//! Absences are stored with a reference to their reason; reads join both so
//! callers always get the full [`Absence`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::absence::{Absence, AbsenceReason, OvertimeImpact};
use crate::types::{AbsenceId, AbsenceReasonId, UserId};

const SELECT_JOINED: &str = "SELECT a.id, a.user_id, a.date_from, a.date_till, a.net_days, \
     a.created_at, r.id AS reason_id, r.description AS reason_description, \
     r.overtime_impact, r.impact_hours, r.impact_days, r.needs_approval \
     FROM absences a INNER JOIN absence_reasons r ON r.id = a.reason_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AbsenceRepositoryTrait: Send + Sync {
    /// Absences of a user overlapping `first..=last`
    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<Absence>, AppError>;

    async fn find_all(&self) -> Result<Vec<Absence>, AppError>;

    async fn update_net_days(&self, id: AbsenceId, net_days: i32) -> Result<(), AppError>;
}

#[derive(Debug, FromRow)]
struct AbsenceRow {
    id: AbsenceId,
    user_id: UserId,
    date_from: NaiveDate,
    date_till: NaiveDate,
    net_days: Option<i32>,
    created_at: DateTime<Utc>,
    reason_id: AbsenceReasonId,
    reason_description: String,
    overtime_impact: OvertimeImpact,
    impact_hours: f64,
    impact_days: f64,
    needs_approval: bool,
}

impl From<AbsenceRow> for Absence {
    fn from(row: AbsenceRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            from: row.date_from,
            till: row.date_till,
            reason: AbsenceReason {
                id: row.reason_id,
                description: row.reason_description,
                overtime_impact: row.overtime_impact,
                impact_hours: row.impact_hours,
                impact_days: row.impact_days,
                needs_approval: row.needs_approval,
            },
            net_days: row.net_days,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbsenceRepository {
    pool: DbPool,
}

impl AbsenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AbsenceRepositoryTrait for AbsenceRepository {
    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<Absence>, AppError> {
        let query = format!(
            "{} WHERE a.user_id = $1 AND a.date_from <= $3 AND a.date_till >= $2 \
             ORDER BY a.date_from ASC",
            SELECT_JOINED
        );
        let rows = sqlx::query_as::<_, AbsenceRow>(&query)
            .bind(user_id)
            .bind(first)
            .bind(last)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(Absence::from).collect())
    }

    async fn find_all(&self) -> Result<Vec<Absence>, AppError> {
        let query = format!("{} ORDER BY a.user_id, a.date_from ASC", SELECT_JOINED);
        let rows = sqlx::query_as::<_, AbsenceRow>(&query)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(Absence::from).collect())
    }

    async fn update_net_days(&self, id: AbsenceId, net_days: i32) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE absences SET net_days = $2 WHERE id = $1")
            .bind(id)
            .bind(net_days)
            .execute(self.pool.as_ref())
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Absence not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_select_aliases_reason_columns() {
        assert!(SELECT_JOINED.contains("r.id AS reason_id"));
        assert!(SELECT_JOINED.contains("r.description AS reason_description"));
    }
}
