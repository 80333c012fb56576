use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_POLL_API_URL: &str = "https://api.real.vg/polls/270619";

/// Longest accepted collection interval (one week)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Collection window as configured, before it is resolved against a year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Poll endpoint fetched each cycle
    pub poll_api_url: String,

    /// Directory holding the snapshot history
    pub output_dir: PathBuf,

    /// History file name inside `output_dir`
    pub history_file: String,

    /// Minutes between collections
    pub collection_interval_minutes: u64,

    /// HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// IANA timezone the schedule window is expressed in
    pub schedule_timezone: String,

    /// Collection window; `None` means collect continuously
    pub schedule: Option<ScheduleConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let collection_interval_minutes: u64 = var("COLLECTION_INTERVAL_MINUTES", "30")
            .parse()
            .context("COLLECTION_INTERVAL_MINUTES must be a valid number")?;
        if collection_interval_minutes == 0 {
            bail!("COLLECTION_INTERVAL_MINUTES must be greater than zero");
        }
        if collection_interval_minutes > MAX_INTERVAL_MINUTES {
            bail!(
                "COLLECTION_INTERVAL_MINUTES must be at most {} (one week)",
                MAX_INTERVAL_MINUTES
            );
        }

        Ok(Config {
            poll_api_url: var("POLL_API_URL", DEFAULT_POLL_API_URL),

            output_dir: PathBuf::from(var("OUTPUT_DIR", "dotd_data")),

            history_file: var("HISTORY_FILE", "dotd_all_snapshots.json"),

            collection_interval_minutes,

            request_timeout_secs: var("REQUEST_TIMEOUT_SECS", "30")
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a valid number")?,

            schedule_timezone: var("SCHEDULE_TIMEZONE", "US/Eastern"),

            schedule: Self::schedule_from_lookup(&lookup)?,
        })
    }

    /// All four schedule variables, or none of them
    fn schedule_from_lookup<F>(lookup: &F) -> Result<Option<ScheduleConfig>>
    where
        F: Fn(&str) -> Option<String>,
    {
        const KEYS: [&str; 4] = [
            "SCHEDULE_START_DATE",
            "SCHEDULE_START_TIME",
            "SCHEDULE_END_DATE",
            "SCHEDULE_END_TIME",
        ];

        let values: Vec<Option<String>> = KEYS
            .iter()
            .map(|key| lookup(*key).filter(|v| !v.trim().is_empty()))
            .collect();

        match values.as_slice() {
            [Some(start_date), Some(start_time), Some(end_date), Some(end_time)] => {
                Ok(Some(ScheduleConfig {
                    start_date: start_date.clone(),
                    start_time: start_time.clone(),
                    end_date: end_date.clone(),
                    end_time: end_time.clone(),
                }))
            }
            [None, None, None, None] => Ok(None),
            _ => {
                let missing: Vec<&str> = KEYS
                    .iter()
                    .zip(&values)
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| *k)
                    .collect();
                bail!("Incomplete schedule configuration, missing: {}", missing.join(", "))
            }
        }
    }

    /// Full path of the history file
    pub fn history_path(&self) -> PathBuf {
        self.output_dir.join(&self.history_file)
    }
}
