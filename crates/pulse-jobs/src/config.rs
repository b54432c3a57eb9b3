use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:mrktpulse.db?mode=rwc";
pub const DEFAULT_SCHEDULE_TZ: &str = "US/Pacific";
pub const DEFAULT_SCHEDULE_AT: &str = "20:10";

/// Settings shared by every job, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub polygon_api_key: Option<String>,
    pub polygon_rate_limit: Option<usize>,
    pub stocknews_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub database_url: String,
    pub scan_max_workers: usize,
    pub schedule_tz: Tz,
    pub schedule_at: NaiveTime,
}

impl JobsConfig {
    pub fn from_env() -> Result<Self> {
        let polygon_rate_limit = match non_empty("POLYGON_RATE_LIMIT") {
            Some(raw) => Some(raw.parse().context("POLYGON_RATE_LIMIT must be a number")?),
            None => None,
        };

        let scan_max_workers = non_empty("SCAN_MAX_WORKERS")
            .unwrap_or_else(|| strategy_engine::DEFAULT_MAX_WORKERS.to_string())
            .parse()
            .context("SCAN_MAX_WORKERS must be a number")?;

        let schedule_tz = parse_tz(&non_empty("SCHEDULE_TZ").unwrap_or_else(|| DEFAULT_SCHEDULE_TZ.to_string()))?;
        let schedule_at = parse_time(&non_empty("SCHEDULE_AT").unwrap_or_else(|| DEFAULT_SCHEDULE_AT.to_string()))?;

        Ok(Self {
            polygon_api_key: non_empty("POLYGON_API_KEY"),
            polygon_rate_limit,
            stocknews_api_key: non_empty("STOCKNEWSAPI_KEY"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: non_empty("OPENAI_MODEL"),
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            scan_max_workers,
            schedule_tz,
            schedule_at,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_tz(raw: &str) -> Result<Tz> {
    raw.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Unknown time zone {:?}: {}", raw, e))
}

/// `HH:MM` wall-clock time.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").with_context(|| format!("Expected HH:MM, got {:?}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_schedule_settings() {
        assert_eq!(parse_tz("US/Pacific").unwrap(), chrono_tz::US::Pacific);
        assert!(parse_tz("Mars/Olympus").is_err());

        let at = parse_time("20:10").unwrap();
        assert_eq!((at.hour(), at.minute()), (20, 10));
        assert!(parse_time("8pm").is_err());
    }
}
