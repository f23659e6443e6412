//! In-process store implementing every repository trait, used by tests.
//! All collections sit behind one mutex, so upserts are atomic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::AppError;
use crate::models::absence::Absence;
use crate::models::attendance::{AttendanceCorrection, AttendanceInterval, UserYearMonth};
use crate::models::external_work::ExternalWork;
use crate::models::holiday::{CustomHoliday, Holiday};
use crate::models::overtime::OvertimeMonthQuota;
use crate::models::user::User;
use crate::repositories::{
    AbsenceRepositoryTrait, AttendanceRepositoryTrait, ExternalWorkRepositoryTrait,
    HolidayRepositoryTrait, OvertimeQuotaRepositoryTrait, UserRepositoryTrait,
};
use crate::types::{AbsenceId, AttendanceId, UserId};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    attendance: Vec<AttendanceInterval>,
    corrections: Vec<AttendanceCorrection>,
    holidays: Vec<Holiday>,
    custom_holidays: Vec<CustomHoliday>,
    absences: Vec<Absence>,
    external_works: Vec<ExternalWork>,
    quotas: BTreeMap<(UserId, i32, u32), OvertimeMonthQuota>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("store lock poisoned")))
    }

    pub fn seed_user(&self, user: User) -> Result<(), AppError> {
        self.lock()?.users.push(user);
        Ok(())
    }

    pub fn seed_attendance(&self, interval: AttendanceInterval) -> Result<(), AppError> {
        self.lock()?.attendance.push(interval);
        Ok(())
    }

    pub fn seed_holiday(&self, holiday: Holiday) -> Result<(), AppError> {
        self.lock()?.holidays.push(holiday);
        Ok(())
    }

    pub fn seed_custom_holiday(&self, holiday: CustomHoliday) -> Result<(), AppError> {
        self.lock()?.custom_holidays.push(holiday);
        Ok(())
    }

    pub fn seed_absence(&self, absence: Absence) -> Result<(), AppError> {
        self.lock()?.absences.push(absence);
        Ok(())
    }

    pub fn seed_external_work(&self, work: ExternalWork) -> Result<(), AppError> {
        self.lock()?.external_works.push(work);
        Ok(())
    }

    pub fn quota_count(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.quotas.len())
    }

    pub fn absence(&self, id: AbsenceId) -> Result<Option<Absence>, AppError> {
        Ok(self
            .lock()?
            .absences
            .iter()
            .find(|absence| absence.id == id)
            .cloned())
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for InMemoryStore {
    async fn find_by_id(&self, id: AttendanceId) -> Result<AttendanceInterval, AppError> {
        self.lock()?
            .attendance
            .iter()
            .find(|interval| interval.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
    }

    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Result<Vec<AttendanceInterval>, AppError> {
        let mut rows: Vec<AttendanceInterval> = self
            .lock()?
            .attendance
            .iter()
            .filter(|interval| {
                interval.user_id == user_id && interval.start >= from && interval.start < till
            })
            .cloned()
            .collect();
        rows.sort_by_key(|interval| interval.start);
        Ok(rows)
    }

    async fn find_open_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<AttendanceInterval>, AppError> {
        Ok(self
            .lock()?
            .attendance
            .iter()
            .filter(|interval| interval.user_id == user_id && interval.end.is_none())
            .max_by_key(|interval| interval.start)
            .cloned())
    }

    async fn create(&self, item: &AttendanceInterval) -> Result<AttendanceInterval, AppError> {
        self.lock()?.attendance.push(item.clone());
        Ok(item.clone())
    }

    async fn update(&self, item: &AttendanceInterval) -> Result<AttendanceInterval, AppError> {
        let mut tables = self.lock()?;
        let stored = tables
            .attendance
            .iter_mut()
            .find(|interval| interval.id == item.id)
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;
        *stored = item.clone();
        Ok(item.clone())
    }

    async fn apply_correction(
        &self,
        item: &AttendanceInterval,
        correction: &AttendanceCorrection,
    ) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        let stored = tables
            .attendance
            .iter_mut()
            .find(|interval| interval.id == item.id)
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;
        *stored = item.clone();
        tables.corrections.push(correction.clone());
        Ok(())
    }

    async fn find_corrections(
        &self,
        attendance_id: AttendanceId,
    ) -> Result<Vec<AttendanceCorrection>, AppError> {
        Ok(self
            .lock()?
            .corrections
            .iter()
            .filter(|correction| correction.attendance_id == attendance_id)
            .cloned()
            .collect())
    }

    async fn find_year_months(&self) -> Result<Vec<UserYearMonth>, AppError> {
        let mut keys: Vec<UserYearMonth> = self
            .lock()?
            .attendance
            .iter()
            .map(|interval| UserYearMonth {
                user_id: interval.user_id,
                year: interval.start.year(),
                month: interval.start.month(),
            })
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl HolidayRepositoryTrait for InMemoryStore {
    async fn find_by_range(
        &self,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<Vec<Holiday>, AppError> {
        let mut rows: Vec<Holiday> = self
            .lock()?
            .holidays
            .iter()
            .filter(|holiday| holiday.holiday_date >= from && holiday.holiday_date <= till)
            .cloned()
            .collect();
        rows.sort_by_key(|holiday| holiday.holiday_date);
        Ok(rows)
    }

    async fn find_custom_all(&self) -> Result<Vec<CustomHoliday>, AppError> {
        Ok(self.lock()?.custom_holidays.clone())
    }
}

#[async_trait]
impl AbsenceRepositoryTrait for InMemoryStore {
    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<Absence>, AppError> {
        Ok(self
            .lock()?
            .absences
            .iter()
            .filter(|absence| absence.user_id == user_id && absence.overlaps(first, last))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Absence>, AppError> {
        Ok(self.lock()?.absences.clone())
    }

    async fn update_net_days(&self, id: AbsenceId, net_days: i32) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        let absence = tables
            .absences
            .iter_mut()
            .find(|absence| absence.id == id)
            .ok_or_else(|| AppError::NotFound("Absence not found".into()))?;
        absence.net_days = Some(net_days);
        Ok(())
    }
}

#[async_trait]
impl ExternalWorkRepositoryTrait for InMemoryStore {
    async fn find_by_user_and_end_between(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError> {
        Ok(self
            .lock()?
            .external_works
            .iter()
            .filter(|work| work.user_id == user_id && work.till >= first && work.till <= last)
            .cloned()
            .collect())
    }

    async fn find_by_user_and_range(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ExternalWork>, AppError> {
        Ok(self
            .lock()?
            .external_works
            .iter()
            .filter(|work| work.user_id == user_id && work.from <= last && work.till >= first)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OvertimeQuotaRepositoryTrait for InMemoryStore {
    async fn find_by_user_year_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Option<OvertimeMonthQuota>, AppError> {
        Ok(self.lock()?.quotas.get(&(user_id, year, month)).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OvertimeMonthQuota>, AppError> {
        Ok(self
            .lock()?
            .quotas
            .values()
            .filter(|quota| quota.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<OvertimeMonthQuota>, AppError> {
        Ok(self.lock()?.quotas.values().cloned().collect())
    }

    async fn upsert(
        &self,
        quota: &OvertimeMonthQuota,
    ) -> Result<(OvertimeMonthQuota, bool), AppError> {
        let mut tables = self.lock()?;
        let key = (quota.user_id, quota.year, quota.month);
        match tables.quotas.get_mut(&key) {
            Some(stored) => {
                stored.hours = quota.hours;
                stored.entries = quota.entries.clone();
                stored.updated_at = quota.updated_at;
                Ok((stored.clone(), false))
            }
            None => {
                tables.quotas.insert(key, quota.clone());
                Ok((quota.clone(), true))
            }
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<User, AppError> {
        self.lock()?
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
