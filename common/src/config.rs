use config::{Config, ConfigError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::{Error, Result};

/// Environment variables understood by the older collector scripts. They are
/// applied as defaults, so the config file and `FLIGHTS__*` variables win.
const LEGACY_ENV_FALLBACKS: [(&str, &str); 3] = [
    ("MARKER", "api.token"),
    ("GH_TOKEN", "publisher.token"),
    ("GH_REPO", "publisher.repo"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub cities: Cities,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Cities {
    pub codes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_market")]
    pub market: String,
    #[serde(default = "default_period_type")]
    pub period_type: String,
    /// Only sent when set, e.g. `2025-01-01` together with `period_type = "month"`.
    #[serde(default)]
    pub beginning_of_period: Option<String>,
    #[serde(default = "default_true")]
    pub one_way: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            currency: default_currency(),
            market: default_market(),
            period_type: default_period_type(),
            beginning_of_period: None,
            one_way: true,
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublisherConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Repository slug on GitHub, e.g. `someone/flight-data`.
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Overrides the GitHub URL built from `repo` and `token`.
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo: None,
            token: None,
            remote_url: None,
            work_dir: default_work_dir(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

impl PublisherConfig {
    /// Logical destination handed to the publisher: the repo slug, or the
    /// explicit remote when no slug is configured.
    pub fn destination(&self) -> Option<&str> {
        self.repo
            .as_deref()
            .or(self.remote_url.as_deref())
            .filter(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.travelpayouts.com/aviasales/v3/get_latest_prices".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_market() -> String {
    "us".to_string()
}

fn default_period_type() -> String {
    "year".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_request_delay_ms() -> u64 {
    700
}

fn default_horizon_days() -> u32 {
    100
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "flight_prices".to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("temp_flight_data")
}

fn default_author_name() -> String {
    "flight-snapshot-bot".to_string()
}

fn default_author_email() -> String {
    "flight-snapshot-bot@users.noreply.github.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new(path: &str) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for (var, key) in LEGACY_ENV_FALLBACKS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let builder = builder
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("FLIGHTS")
                    .prefix_separator("__")
                    .separator("__"),
            );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            cities = settings.cities.codes.len(),
            horizon_days = settings.collector.horizon_days,
            publisher_enabled = settings.publisher.enabled,
            "Loaded settings"
        );

        Ok(settings)
    }

    /// Checks the values without which a run must not start. Called once at
    /// process entry, before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.api_token().is_none() {
            return Err(Error::MissingSetting("api.token"));
        }

        if self.cities.codes.is_empty() {
            return Err(Error::MissingSetting("cities.codes"));
        }

        if self.api.base_url.trim().is_empty() {
            return Err(Error::MissingSetting("api.base_url"));
        }

        if self.publisher.enabled && self.publisher.destination().is_none() {
            return Err(Error::MissingSetting("publisher.repo"));
        }

        Ok(())
    }

    /// Trimmed API token, `None` when absent or blank.
    pub fn api_token(&self) -> Option<&str> {
        self.api
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
