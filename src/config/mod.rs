use std::time::Duration;

use crate::errors::{FeederError, FeederResult};

/// Widest accepted age window, in days
pub const MAX_AGE_DAYS_LIMIT: i64 = 36_500;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "feedrank/",
    env!("CARGO_PKG_VERSION"),
    " Feed Fetcher [RSS/Atom/JSON Feed]"
);

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// Upper bound (exclusive) of the per-feed start delay
    pub max_wait: Duration,
    pub poll_interval: Duration,
    pub idle_backoff: Duration,
    pub max_age_days: i64,
    pub max_entries: usize,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeederResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("FEEDRANK_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("feedrank.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./feedrank.db".to_string())
        });

        let user_agent = std::env::var("FEEDRANK_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            db_path,
            user_agent,
            fetch_timeout: Duration::from_secs(env_number("FEEDRANK_FETCH_TIMEOUT_SECS", 15)?),
            max_wait: Duration::from_secs(env_number("FEEDRANK_MAX_WAIT_SECS", 25 * 60)?),
            poll_interval: Duration::from_secs(env_number(
                "FEEDRANK_INTERVAL_SECS",
                2 * 60 * 60,
            )?),
            idle_backoff: Duration::from_secs(env_number("FEEDRANK_IDLE_BACKOFF_SECS", 10)?),
            max_age_days: max_age_days(std::env::var("FEEDRANK_MAX_AGE_DAYS").ok())?,
            max_entries: env_number("FEEDRANK_MAX_ENTRIES", 10_000)?,
        })
    }
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> FeederResult<T> {
    parse_number(name, std::env::var(name).ok(), default)
}

fn parse_number<T: std::str::FromStr>(
    name: &str,
    raw: Option<String>,
    default: T,
) -> FeederResult<T> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            FeederError::Config(format!("{} must be a number, got '{}'", name, value))
        }),
    }
}

fn max_age_days(raw: Option<String>) -> FeederResult<i64> {
    let days = parse_number("FEEDRANK_MAX_AGE_DAYS", raw, 90)?;

    if !(1..=MAX_AGE_DAYS_LIMIT).contains(&days) {
        return Err(FeederError::Config(format!(
            "FEEDRANK_MAX_AGE_DAYS must be between 1 and {}, got {}",
            MAX_AGE_DAYS_LIMIT, days
        )));
    }

    Ok(days)
}
