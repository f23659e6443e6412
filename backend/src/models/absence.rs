use crate::types::{AbsenceId, AbsenceReasonId, UserId};
use crate::utils::time::start_of_day;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How an absence reason feeds into the overtime ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OvertimeImpact {
    None,
    Duration,
    Hours,
    Days,
}

impl Default for OvertimeImpact {
    fn default() -> Self {
        OvertimeImpact::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceReason {
    pub id: AbsenceReasonId,
    pub description: String,
    pub overtime_impact: OvertimeImpact,
    pub impact_hours: f64,
    pub impact_days: f64,
    pub needs_approval: bool,
}

impl AbsenceReason {
    pub fn new(description: impl Into<String>, overtime_impact: OvertimeImpact) -> Self {
        Self {
            id: AbsenceReasonId::new(),
            description: description.into(),
            overtime_impact,
            impact_hours: 0.0,
            impact_days: 0.0,
            needs_approval: true,
        }
    }
}

/// Booked absence covering `from..=till`, in whole days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    pub id: AbsenceId,
    pub user_id: UserId,
    pub from: NaiveDate,
    pub till: NaiveDate,
    pub reason: AbsenceReason,
    pub net_days: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Absence {
    pub fn new(
        user_id: UserId,
        from: NaiveDate,
        till: NaiveDate,
        reason: AbsenceReason,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AbsenceId::new(),
            user_id,
            from,
            till,
            reason,
            net_days: None,
            created_at: now,
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.till
    }

    pub fn overlaps(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.from <= last && self.till >= first
    }

    /// Length of the booked span (`till - from`) in hours.
    pub fn span_hours(&self) -> f64 {
        (self.till - self.from).num_days() as f64 * 24.0
    }

    /// Users may delete absences that have not started yet, or that they booked
    /// within the last day.
    pub fn is_deletable_by_user(&self, now: DateTime<Utc>) -> bool {
        start_of_day(self.from) > now || now - self.created_at <= Duration::hours(24)
    }
}
