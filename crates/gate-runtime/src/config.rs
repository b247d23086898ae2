//! Runtime configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use suppression_gate::{GateConfig, GateConfigBuilder};

pub const DEFAULT_LISTS_PATH: &str = "data/suppression_lists.json";
pub const DEFAULT_BANNERS_PATH: &str = "config/banners.json";
pub const DEFAULT_VERIFY_INTERVAL_SECS: u64 = 300;

/// Configuration for the gate runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Suppression lists seed file (JSON array).
    pub lists_path: PathBuf,
    /// Banner configuration file (`{"banners": [...]}`).
    pub banners_path: PathBuf,
    pub gate: GateConfig,
    /// Interval between index verifications. `None` disables the task.
    pub verify_interval: Option<Duration>,
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lists_path: PathBuf::from(DEFAULT_LISTS_PATH),
            banners_path: PathBuf::from(DEFAULT_BANNERS_PATH),
            gate: GateConfig::default(),
            verify_interval: Some(Duration::from_secs(DEFAULT_VERIFY_INTERVAL_SECS)),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SG_SUPPRESSION_LISTS_PATH` (default: data/suppression_lists.json)
    /// - `SG_BANNER_CONFIG_PATH` (default: config/banners.json)
    /// - `SG_CACHE_ENABLED`, `SG_CACHE_CAPACITY`, `SG_CACHE_TTL_SECS`
    /// - `SG_AUDIT_ENABLED`, `SG_AUDIT_CAPACITY`
    /// - `SG_VERIFY_INTERVAL_SECS`: 0 disables verification (default: 300)
    /// - `SG_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
    /// - `SG_JSON_LOGS`: JSON formatted logs (default: false)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut builder = GateConfigBuilder::new();
        if let Some(enabled) = parse_flag(&lookup, "SG_CACHE_ENABLED") {
            builder = builder.cache(enabled);
        }
        if let Some(capacity) = parse_number(&lookup, "SG_CACHE_CAPACITY")? {
            builder = builder.cache_capacity(capacity);
        }
        if let Some(ttl) = parse_number(&lookup, "SG_CACHE_TTL_SECS")? {
            builder = builder.cache_ttl_secs(ttl);
        }
        if let Some(enabled) = parse_flag(&lookup, "SG_AUDIT_ENABLED") {
            builder = builder.audit(enabled);
        }
        if let Some(capacity) = parse_number(&lookup, "SG_AUDIT_CAPACITY")? {
            builder = builder.audit_capacity(capacity);
        }
        let gate = builder.build().context("Invalid suppression gate configuration")?;

        let verify_interval = match parse_number::<u64, _>(&lookup, "SG_VERIFY_INTERVAL_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.verify_interval,
        };

        Ok(Self {
            lists_path: lookup("SG_SUPPRESSION_LISTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.lists_path),
            banners_path: lookup("SG_BANNER_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.banners_path),
            gate,
            verify_interval,
            log_level: lookup("SG_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: parse_flag(&lookup, "SG_JSON_LOGS").unwrap_or(defaults.json_logs),
        })
    }
}

fn parse_flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| {
        let v = v.trim().to_lowercase();
        v == "true" || v == "1" || v == "yes"
    })
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a non-negative integer, got {:?}", key, v))
        })
        .transpose()
}
