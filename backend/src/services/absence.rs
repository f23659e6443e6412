//! Net workday counting for absences.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::repositories::AbsenceRepositoryTrait;
use crate::services::calendar::{is_weekend, CalendarService, HolidayCalendar};

/// Dates in `from..=till` that are neither weekend nor holiday. Every such
/// date counts as one whole day.
pub fn count_workdays(from: NaiveDate, till: NaiveDate, calendar: &HolidayCalendar) -> i32 {
    if from > till {
        return 0;
    }

    from.iter_days()
        .take_while(|date| *date <= till)
        .filter(|date| !is_weekend(*date) && !calendar.is_holiday(*date))
        .count() as i32
}

#[derive(Clone)]
pub struct AbsenceService {
    absences: Arc<dyn AbsenceRepositoryTrait>,
    calendar: CalendarService,
}

impl AbsenceService {
    pub fn new(absences: Arc<dyn AbsenceRepositoryTrait>, calendar: CalendarService) -> Self {
        Self { absences, calendar }
    }

    pub async fn count_absence_workdays(
        &self,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<i32, AppError> {
        let calendar = self.calendar.calendar_for_range(from, till).await?;
        Ok(count_workdays(from, till, &calendar))
    }

    /// Fills in `net_days` for absences stored without it or with zero.
    /// Rows whose stored value already matches the recount are left alone, so
    /// repeated runs report 0. Returns how many absences were updated.
    pub async fn backfill_net_days(&self) -> Result<usize, AppError> {
        let absences = self.absences.find_all().await?;
        let mut updated = 0;

        for absence in absences
            .iter()
            .filter(|absence| absence.net_days.unwrap_or(0) == 0)
        {
            let net_days = self
                .count_absence_workdays(absence.from, absence.till)
                .await?;
            if absence.net_days == Some(net_days) {
                continue;
            }
            self.absences.update_net_days(absence.id, net_days).await?;
            tracing::debug!(absence_id = %absence.id, net_days, "Backfilled absence net days");
            updated += 1;
        }

        tracing::info!(updated, "Absence net days backfilled");
        Ok(updated)
    }
}
