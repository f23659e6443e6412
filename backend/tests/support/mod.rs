#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use timeclock_backend::{
    config::Config,
    models::{
        absence::{Absence, AbsenceReason, OvertimeImpact},
        attendance::AttendanceInterval,
        holiday::Holiday,
        overtime::SubtractionModel,
        user::User,
    },
    repositories::InMemoryStore,
    services::WorkWeekPolicy,
    state::{AppState, Repositories},
    types::UserId,
    utils::time::FixedClock,
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}

pub fn test_config() -> Config {
    let policy = WorkWeekPolicy::default();
    Config {
        database_url: "postgres://localhost/timeclock_test".into(),
        database_max_connections: 1,
        time_zone: chrono_tz::UTC,
        workweek_default_hours: policy.default_hours,
        workweek_overrides: policy.overrides,
        correction_reason_min_length: 20,
        overtime_sweep_on_start: false,
    }
}

/// Config with a flat eight-hour week, no Friday override.
pub fn flat_week_config() -> Config {
    Config {
        workweek_overrides: HashMap::new(),
        ..test_config()
    }
}

pub fn state_with(store: &Arc<InMemoryStore>, config: Config, clock: FixedClock) -> AppState {
    AppState::new(config, Repositories::shared(store.clone()), Arc::new(clock))
}

pub fn seed_user(store: &InMemoryStore, model: SubtractionModel, amount: f64) -> UserId {
    let user = User::new("employee", at(2024, 1, 1, 0, 0)).with_subtraction(model, amount);
    let id = user.id;
    store.seed_user(user).expect("seed user");
    id
}

pub fn closed_interval(
    user_id: UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    homeoffice: bool,
) -> AttendanceInterval {
    let mut interval = AttendanceInterval::check_in(user_id, start, homeoffice, start);
    interval.check_out(end, homeoffice, end);
    interval
}

pub fn seed_shift(
    store: &InMemoryStore,
    user_id: UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AttendanceInterval {
    let interval = closed_interval(user_id, start, end, false);
    store
        .seed_attendance(interval.clone())
        .expect("seed attendance");
    interval
}

pub fn seed_holiday(store: &InMemoryStore, day: NaiveDate, name: &str) {
    store
        .seed_holiday(Holiday::new(day, name.to_string(), at(2024, 1, 1, 0, 0)))
        .expect("seed holiday");
}

pub fn absence(
    user_id: UserId,
    from: NaiveDate,
    till: NaiveDate,
    impact: OvertimeImpact,
) -> Absence {
    Absence::new(
        user_id,
        from,
        till,
        AbsenceReason::new("Absence", impact),
        at(2024, 1, 1, 0, 0),
    )
}
