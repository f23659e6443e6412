use anyhow::anyhow;
use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

use crate::services::attendance::DEFAULT_CORRECTION_REASON_MIN_LENGTH;
use crate::services::calendar::{WorkWeekPolicy, DEFAULT_HOURS_PER_WEEKDAY};

const DEFAULT_WORKWEEK_OVERRIDES: &str = "fri=6,sat=0,sun=0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub time_zone: Tz,
    pub workweek_default_hours: f64,
    pub workweek_overrides: HashMap<Weekday, f64>,
    pub correction_reason_min_length: usize,
    pub overtime_sweep_on_start: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/timeclock".to_string());

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5u32)?;

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let workweek_default_hours =
            parse_var("WORKWEEK_DEFAULT_HOURS", DEFAULT_HOURS_PER_WEEKDAY)?;

        let overrides_raw = env::var("WORKWEEK_OVERRIDES")
            .unwrap_or_else(|_| DEFAULT_WORKWEEK_OVERRIDES.to_string());
        let workweek_overrides = WorkWeekPolicy::parse_overrides(&overrides_raw)
            .map_err(|e| anyhow!("Invalid WORKWEEK_OVERRIDES value: {}", e))?;

        let correction_reason_min_length = parse_var(
            "CORRECTION_REASON_MIN_LENGTH",
            DEFAULT_CORRECTION_REASON_MIN_LENGTH,
        )?;

        let overtime_sweep_on_start = parse_var("OVERTIME_SWEEP_ON_START", true)?;

        Ok(Config {
            database_url,
            database_max_connections,
            time_zone,
            workweek_default_hours,
            workweek_overrides,
            correction_reason_min_length,
            overtime_sweep_on_start,
        })
    }

    pub fn work_week_policy(&self) -> WorkWeekPolicy {
        WorkWeekPolicy {
            default_hours: self.workweek_default_hours,
            overrides: self.workweek_overrides.clone(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_week_policy_uses_configured_values() {
        let config = Config {
            database_url: "postgres://localhost/timeclock".into(),
            database_max_connections: 5,
            time_zone: chrono_tz::UTC,
            workweek_default_hours: 7.5,
            workweek_overrides: HashMap::from([(Weekday::Fri, 5.0)]),
            correction_reason_min_length: 20,
            overtime_sweep_on_start: false,
        };

        let policy = config.work_week_policy();
        assert_eq!(policy.hours_for(Weekday::Mon), 7.5);
        assert_eq!(policy.hours_for(Weekday::Fri), 5.0);
    }

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let value: u32 = parse_var("TIMECLOCK_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
