use crate::types::{AbsenceId, ExternalWorkId, OvertimeQuotaId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user buffer applied to positive monthly attendance overtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubtractionModel {
    None,
    Hours,
    Percentage,
}

impl Default for SubtractionModel {
    fn default() -> Self {
        SubtractionModel::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubtractionConfig {
    pub model: SubtractionModel,
    pub amount: f64,
}

impl SubtractionConfig {
    pub fn hours(amount: f64) -> Self {
        Self {
            model: SubtractionModel::Hours,
            amount,
        }
    }

    pub fn percentage(amount: f64) -> Self {
        Self {
            model: SubtractionModel::Percentage,
            amount,
        }
    }

    /// Hours taken off `total_overtime`, never more than the overtime itself.
    pub fn subtracted(&self, total_overtime: f64, expected_month_hours: f64) -> f64 {
        if total_overtime <= 0.0 {
            return 0.0;
        }

        let buffer = match self.model {
            SubtractionModel::None => 0.0,
            SubtractionModel::Hours => self.amount,
            SubtractionModel::Percentage => expected_month_hours * self.amount / 100.0,
        };

        buffer.min(total_overtime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendancePart {
    Raw,
    Subtracted,
    Final,
}

/// Where a ledger entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OvertimeSource {
    Attendance { part: AttendancePart },
    ExternalWork { external_work_id: ExternalWorkId },
    Absence { absence_id: AbsenceId },
}

impl OvertimeSource {
    pub fn label(&self) -> &'static str {
        match self {
            OvertimeSource::Attendance {
                part: AttendancePart::Raw,
            } => "timestamp_raw",
            OvertimeSource::Attendance {
                part: AttendancePart::Subtracted,
            } => "timestamp_subtracted",
            OvertimeSource::Attendance {
                part: AttendancePart::Final,
            } => "timestamp_final",
            OvertimeSource::ExternalWork { .. } => "external_work",
            OvertimeSource::Absence { .. } => "absence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OvertimeSummaryEntry {
    #[serde(flatten)]
    pub source: OvertimeSource,
    pub value: f64,
    /// Weight of `value` in the quota total. Informational entries carry 0.
    pub factor: f64,
}

impl OvertimeSummaryEntry {
    pub fn contribution(&self) -> f64 {
        self.value * self.factor
    }
}

/// Persisted monthly overtime ledger row, unique per (user, year, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeMonthQuota {
    pub id: OvertimeQuotaId,
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub hours: f64,
    pub entries: Vec<OvertimeSummaryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OvertimeMonthQuota {
    pub fn new(user_id: UserId, year: i32, month: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: OvertimeQuotaId::new(),
            user_id,
            year,
            month,
            hours: 0.0,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn insert_entry(&mut self, source: OvertimeSource, value: f64, factor: f64) {
        self.entries.push(OvertimeSummaryEntry {
            source,
            value,
            factor,
        });
    }

    /// Recomputes `hours` from the entries.
    pub fn calculate(&mut self) {
        self.hours = self.entries.iter().map(OvertimeSummaryEntry::contribution).sum();
    }

    pub fn is_same_month(&self, user_id: UserId, year: i32, month: u32) -> bool {
        self.user_id == user_id && self.year == year && self.month == month
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_model_caps_at_overtime() {
        let config = SubtractionConfig::hours(2.0);
        assert_eq!(config.subtracted(5.0, 160.0), 2.0);
        assert_eq!(config.subtracted(1.0, 160.0), 1.0);
    }

    #[test]
    fn percentage_model_uses_expected_month_hours() {
        let config = SubtractionConfig::percentage(5.0);
        assert_eq!(config.subtracted(20.0, 160.0), 8.0);
        assert_eq!(config.subtracted(3.0, 160.0), 3.0);
    }

    #[test]
    fn nothing_is_subtracted_from_negative_or_zero_overtime() {
        assert_eq!(SubtractionConfig::hours(2.0).subtracted(-4.0, 160.0), 0.0);
        assert_eq!(SubtractionConfig::percentage(10.0).subtracted(0.0, 160.0), 0.0);
        assert_eq!(SubtractionConfig::default().subtracted(7.0, 160.0), 0.0);
    }

    #[test]
    fn calculate_weights_entries_by_factor() {
        let mut quota = OvertimeMonthQuota::new(UserId::new(), 2024, 4, Utc::now());
        quota.insert_entry(
            OvertimeSource::Attendance {
                part: AttendancePart::Raw,
            },
            5.0,
            1.0,
        );
        quota.insert_entry(
            OvertimeSource::Attendance {
                part: AttendancePart::Subtracted,
            },
            -2.0,
            1.0,
        );
        quota.insert_entry(
            OvertimeSource::Attendance {
                part: AttendancePart::Final,
            },
            3.0,
            0.0,
        );
        quota.calculate();
        assert_eq!(quota.hours, 3.0);
    }

    #[test]
    fn entry_serializes_with_flat_source_tag() {
        let id = ExternalWorkId::new();
        let entry = OvertimeSummaryEntry {
            source: OvertimeSource::ExternalWork {
                external_work_id: id,
            },
            value: 1.5,
            factor: 1.0,
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["source"], "external_work");
        assert_eq!(json["external_work_id"], id.to_string());
        assert_eq!(json["value"], 1.5);

        let back: OvertimeSummaryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn source_labels_match_stored_names() {
        assert_eq!(
            OvertimeSource::Attendance {
                part: AttendancePart::Final
            }
            .label(),
            "timestamp_final"
        );
        assert_eq!(
            OvertimeSource::Absence {
                absence_id: AbsenceId::new()
            }
            .label(),
            "absence"
        );
    }
}
