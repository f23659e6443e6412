//! Monthly overtime ledger.
//!
//! Combines attendance overtime, external work and absence impact into one
//! [`OvertimeMonthQuota`] per (user, year, month) and persists it with
//! upsert semantics, so recomputing a month never creates a second row.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::error::AppError;
use crate::models::absence::OvertimeImpact;
use crate::models::overtime::{AttendancePart, OvertimeMonthQuota, OvertimeSource};
use crate::repositories::{
    AbsenceRepositoryTrait, AttendanceRepositoryTrait, ExternalWorkRepositoryTrait,
    OvertimeQuotaRepositoryTrait, UserRepositoryTrait,
};
use crate::services::month_overtime::MonthOvertimeCalculator;
use crate::types::UserId;
use crate::utils::time::month_days;

/// Entries counted into the quota total carry this factor.
const COUNTED: f64 = 1.0;
/// Informational entries, kept for auditing only.
const INFORMATIONAL: f64 = 0.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub computed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct OvertimeLedgerService {
    calculator: MonthOvertimeCalculator,
    users: Arc<dyn UserRepositoryTrait>,
    attendance: Arc<dyn AttendanceRepositoryTrait>,
    external_works: Arc<dyn ExternalWorkRepositoryTrait>,
    absences: Arc<dyn AbsenceRepositoryTrait>,
    quotas: Arc<dyn OvertimeQuotaRepositoryTrait>,
}

impl OvertimeLedgerService {
    pub fn new(
        calculator: MonthOvertimeCalculator,
        users: Arc<dyn UserRepositoryTrait>,
        attendance: Arc<dyn AttendanceRepositoryTrait>,
        external_works: Arc<dyn ExternalWorkRepositoryTrait>,
        absences: Arc<dyn AbsenceRepositoryTrait>,
        quotas: Arc<dyn OvertimeQuotaRepositoryTrait>,
    ) -> Self {
        Self {
            calculator,
            users,
            attendance,
            external_works,
            absences,
            quotas,
        }
    }

    /// Builds the quota of a month without persisting it.
    pub async fn build_month_quota(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<OvertimeMonthQuota, AppError> {
        let (first, last) = month_days(year, month)?;
        let user = self.users.find_by_id(user_id).await?;
        let grouper = self.calculator.grouper();
        let now = grouper.clock().now();

        let attendance = self
            .calculator
            .calculate_month_overtime(user_id, year, month, &user.subtraction_config())
            .await?;

        let mut quota = OvertimeMonthQuota::new(user_id, year, month, now);
        quota.insert_entry(
            OvertimeSource::Attendance {
                part: AttendancePart::Raw,
            },
            attendance.total_overtime,
            COUNTED,
        );
        quota.insert_entry(
            OvertimeSource::Attendance {
                part: AttendancePart::Subtracted,
            },
            -attendance.subtracted,
            COUNTED,
        );
        quota.insert_entry(
            OvertimeSource::Attendance {
                part: AttendancePart::Final,
            },
            attendance.net_overtime(),
            INFORMATIONAL,
        );

        // Attributed to the month the assignment ends in.
        let works = self
            .external_works
            .find_by_user_and_end_between(user_id, first, last)
            .await?;
        for work in works {
            let calendar = grouper
                .calendar_service()
                .calendar_for_range(work.from, work.till)
                .await?;
            let calculated = work.calculate(&calendar, grouper.policy());
            quota.insert_entry(
                OvertimeSource::ExternalWork {
                    external_work_id: work.id,
                },
                calculated.total_overtime_hours,
                COUNTED,
            );
        }

        let absences = self
            .absences
            .find_by_user_and_range(user_id, first, last)
            .await?;
        for absence in absences
            .iter()
            .filter(|absence| absence.reason.overtime_impact == OvertimeImpact::Duration)
        {
            quota.insert_entry(
                OvertimeSource::Absence {
                    absence_id: absence.id,
                },
                absence.span_hours(),
                COUNTED,
            );
        }

        quota.calculate();
        Ok(quota)
    }

    /// Recomputes and stores the quota of a month. Returns the stored quota and
    /// whether a new row was created.
    pub async fn calculate_and_persist_month_quota(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<(OvertimeMonthQuota, bool), AppError> {
        let mut quota = self.build_month_quota(user_id, year, month).await?;

        if let Some(existing) = self
            .quotas
            .find_by_user_year_month(user_id, year, month)
            .await?
        {
            quota.id = existing.id;
            quota.created_at = existing.created_at;
        }

        let (stored, created) = self.quotas.upsert(&quota).await?;
        tracing::info!(
            %user_id,
            year,
            month,
            hours = stored.hours,
            created,
            "Stored overtime month quota"
        );
        Ok((stored, created))
    }

    /// Computes every (user, year, month) that has attendance but no quota yet.
    /// Failures are logged and skipped.
    pub async fn calculate_missing_months(&self) -> Result<SweepReport, AppError> {
        let months = self.attendance.find_year_months().await?;
        let existing: HashSet<(UserId, i32, u32)> = self
            .quotas
            .find_all()
            .await?
            .into_iter()
            .map(|quota| (quota.user_id, quota.year, quota.month))
            .collect();

        let mut report = SweepReport::default();
        for key in months
            .into_iter()
            .filter(|key| !existing.contains(&(key.user_id, key.year, key.month)))
        {
            match self
                .calculate_and_persist_month_quota(key.user_id, key.year, key.month)
                .await
            {
                Ok(_) => report.computed += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        user_id = %key.user_id,
                        year = key.year,
                        month = key.month,
                        error = %err,
                        "Failed to calculate missing overtime month"
                    );
                }
            }
        }

        tracing::info!(
            computed = report.computed,
            failed = report.failed,
            "Missing overtime months swept"
        );
        Ok(report)
    }

    pub async fn list_quotas(&self, user_id: UserId) -> Result<Vec<OvertimeMonthQuota>, AppError> {
        let mut quotas = self.quotas.find_by_user(user_id).await?;
        quotas.sort_by_key(|quota| (quota.year, quota.month));
        Ok(quotas)
    }

    /// Sum of all stored monthly quotas of a user.
    pub async fn total_overtime(&self, user_id: UserId) -> Result<f64, AppError> {
        let quotas = self.quotas.find_by_user(user_id).await?;
        Ok(quotas.iter().map(|quota| quota.hours).sum())
    }
}
