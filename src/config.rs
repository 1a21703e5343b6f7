/// Service configuration.
///
/// Loaded from a TOML file (`auromon.toml` by default). Everything has a
/// default so a missing file or a partial file still produces a runnable
/// configuration; the database connection string is deliberately NOT here —
/// it comes from the `DATABASE_URL` environment variable (via `.env`) so
/// credentials stay out of checked-in config.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;

use crate::ingest::ovation::OVATION_LATEST_URL;

/// Default path for the service configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./auromon.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub geocode: GeocodeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// OVATION grid endpoint.
    pub url: String,
    /// Hard timeout for one feed request, in seconds. A hung fetch must not
    /// stall the evaluation timer past its own period.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Period of the evaluation cycle, in seconds.
    pub evaluation_interval_secs: u64,
    /// Period of the history prune, in seconds. Coarser than evaluation;
    /// pruning is cheap but there is no point running it per cycle.
    pub prune_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: "debug", "info", "warn" or "error".
    pub min_level: String,
    /// Optional file to append log lines to, alongside console output.
    pub log_file: Option<String>,
    /// Include timestamps in console output (off for interactive use).
    pub console_timestamps: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// How long a resolved place label stays fresh in the in-process cache,
    /// in seconds. Labels for fixed coordinates change rarely.
    pub label_cache_ttl_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: OVATION_LATEST_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: 300,
            prune_interval_secs: 3600,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            min_level: "info".to_string(),
            log_file: None,
            console_timestamps: true,
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            label_cache_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file does not exist. A file that exists but fails to parse or
    /// validate is an error — a half-read config is worse than none.
    pub fn load(path: &str) -> Result<Config, Box<dyn Error>> {
        if !Path::new(path).exists() {
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would make a timer degenerate.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.feed.url.is_empty() {
            return Err("feed.url must not be empty".into());
        }
        if self.feed.timeout_secs == 0 {
            return Err("feed.timeout_secs must be positive".into());
        }
        if self.scheduler.evaluation_interval_secs == 0 {
            return Err("scheduler.evaluation_interval_secs must be positive".into());
        }
        if self.scheduler.prune_interval_secs == 0 {
            return Err("scheduler.prune_interval_secs must be positive".into());
        }
        match self.logging.min_level.as_str() {
            "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(format!("unknown logging.min_level '{}'", other).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
