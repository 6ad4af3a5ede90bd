use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use super::credentials::{load_token, BearerToken};
use super::probe_list::{load_probes, parse_list};
use crate::domain::fetch::paged_fetcher::{FetchSettings, DEFAULT_PAGE_CAP};
use crate::domain::query::model::api_dialect::{PaginationProtocol, ProgramFieldSelection};
use crate::domain::query::model::operator_zone::OperatorZone;
use crate::domain::query::model::query_spec::KNOWN_PROGRAMS;

pub const DEFAULT_API_URL: &str = "https://medux-ids.caseonit.com/api/results";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_REALTIME_HOURS: u32 = 8;

/// Process-wide settings, read once at startup from `MEDUX_*` variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub token: BearerToken,
    pub probes: Vec<String>,
    pub programs: Vec<String>,
    pub program_field: ProgramFieldSelection,
    pub pagination: PaginationProtocol,
    pub page_size: Option<u32>,
    pub page_cap: usize,
    pub page_delay: Duration,
    pub http_timeout: Duration,
    /// Zone the operator enters local date-times in.
    pub timezone: OperatorZone,
    pub realtime_hours: u32,
    /// `None` disables the background refresh task.
    pub refresh_interval: Option<Duration>,
    pub server_addr: String,
    pub log_dir: PathBuf,
    pub debug_mode: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token_file = get("MEDUX_TOKEN_FILE").map(PathBuf::from);
        let token = load_token(get("MEDUX_TOKEN").as_deref(), token_file.as_deref())?;

        let probes_file = get("MEDUX_PROBES_FILE").map(PathBuf::from);
        let probes = load_probes(get("MEDUX_PROBES").as_deref(), probes_file.as_deref())?;

        let programs = match get("MEDUX_PROGRAMS") {
            Some(raw) => parse_list(&raw),
            None => default_programs(),
        };

        let program_field = get("MEDUX_PROGRAM_FIELD")
            .unwrap_or_default()
            .parse::<ProgramFieldSelection>()
            .map_err(|e| anyhow!("MEDUX_PROGRAM_FIELD: {}", e))?;

        let pagination = get("MEDUX_PAGINATION")
            .unwrap_or_default()
            .parse::<PaginationProtocol>()
            .map_err(|e| anyhow!("MEDUX_PAGINATION: {}", e))?;

        let page_size = parse_opt::<u32>(&get, "MEDUX_PAGE_SIZE")?.filter(|s| *s > 0);
        let page_cap = parse_opt::<usize>(&get, "MEDUX_PAGE_CAP")?.unwrap_or(DEFAULT_PAGE_CAP);
        if page_cap == 0 {
            return Err(anyhow!("MEDUX_PAGE_CAP must be at least 1"));
        }

        let page_delay_ms = parse_opt::<u64>(&get, "MEDUX_PAGE_DELAY_MS")?.unwrap_or(300);
        let timeout_secs = parse_opt::<u64>(&get, "MEDUX_HTTP_TIMEOUT_SECS")?.unwrap_or(60);

        // MEDUX_UTC_OFFSET is the older spelling
        let timezone = match get("MEDUX_TIMEZONE").or_else(|| get("MEDUX_UTC_OFFSET")) {
            Some(raw) => raw.parse::<OperatorZone>().context("MEDUX_TIMEZONE")?,
            None => OperatorZone::default(),
        };

        let realtime_hours =
            parse_opt::<u32>(&get, "MEDUX_REALTIME_HOURS")?.unwrap_or(DEFAULT_REALTIME_HOURS);
        if realtime_hours == 0 {
            return Err(anyhow!("MEDUX_REALTIME_HOURS must be at least 1"));
        }

        let refresh_interval = parse_opt::<u64>(&get, "MEDUX_REFRESH_SECS")?
            .filter(|s| *s > 0)
            .map(Duration::from_secs);

        Ok(Self {
            api_url: get("MEDUX_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token,
            probes,
            programs,
            program_field,
            pagination,
            page_size,
            page_cap,
            page_delay: Duration::from_millis(page_delay_ms),
            http_timeout: Duration::from_secs(timeout_secs),
            timezone,
            realtime_hours,
            refresh_interval,
            server_addr: get("MEDUX_SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            log_dir: get("MEDUX_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            debug_mode: get("MEDUX_DEBUG_MODE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
        })
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            page_cap: self.page_cap,
            page_delay: self.page_delay,
        }
    }
}

/// Every known program except the bare `network` feed.
pub fn default_programs() -> Vec<String> {
    KNOWN_PROGRAMS
        .iter()
        .filter(|p| **p != "network")
        .map(|p| p.to_string())
        .collect()
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(None),
    }
}
