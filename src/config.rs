//! Startup configuration
//!
//! Everything is read once from the environment (optionally seeded from a
//! `.env` file) and handed to component constructors.
//!
//! Required:
//! - INFLUXDB_BASE_URL, INFLUXDB_ORG, INFLUXDB_TOKEN
//! - INFLUXDB_BUCKET_POWER: bucket the sensor writes readings into
//! - INFLUXDB_BUCKET_TWEET: bucket the notification log lives in
//! - API_KEY, API_SECRET, ACCESS_TOKEN, ACCESS_SECRET (not needed in dry-run mode)
//!
//! Optional:
//! - POWERWATCH_POLL_INTERVAL_MS (default: 1000)
//! - POWERWATCH_HTTP_TIMEOUT_SECS (default: 5)
//! - POWERWATCH_TIMEZONE (default: Asia/Kolkata)
//! - POWERWATCH_SENSOR_MEASUREMENT (default: lab)
//! - POWERWATCH_SENSOR_WINDOW_SECS (default: 2)
//! - POWERWATCH_DRY_RUN (default: false)

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

/// InfluxDB connection and layout
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub base_url: String,
    pub org: String,
    pub token: String,
    /// Bucket holding sensor readings
    pub bucket_power: String,
    /// Bucket holding the notification log
    pub bucket_events: String,
    /// Measurement the sensor writes its `status` field to
    pub sensor_measurement: String,
    /// How far back a sensor reading still counts as current
    pub sensor_window: Duration,
    /// Measurement of the notification log
    pub event_measurement: String,
    /// Tag (key, value) identifying this monitor's records
    pub event_tag: (String, String),
}

/// OAuth 1.0a user-context credentials
#[derive(Clone)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("access_token", &"***")
            .field("access_secret", &"***")
            .finish()
    }
}

/// Full monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub influx: InfluxConfig,
    /// `None` only in dry-run mode
    pub twitter: Option<TwitterCredentials>,
    pub poll_interval: Duration,
    /// Upper bound for every store and transport call
    pub call_timeout: Duration,
    pub timezone: Tz,
    pub dry_run: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    MissingEnv(String),

    #[error("invalid value in env var {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl MonitorConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dry_run = read_bool(&lookup, "POWERWATCH_DRY_RUN")?.unwrap_or(false);

        let influx = InfluxConfig {
            base_url: read_required(&lookup, "INFLUXDB_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            org: read_required(&lookup, "INFLUXDB_ORG")?,
            token: read_required(&lookup, "INFLUXDB_TOKEN")?,
            bucket_power: read_required(&lookup, "INFLUXDB_BUCKET_POWER")?,
            bucket_events: read_required(&lookup, "INFLUXDB_BUCKET_TWEET")?,
            sensor_measurement: lookup("POWERWATCH_SENSOR_MEASUREMENT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "lab".to_string()),
            sensor_window: Duration::from_secs(
                read_u64(&lookup, "POWERWATCH_SENSOR_WINDOW_SECS")?.unwrap_or(2),
            ),
            event_measurement: "twitter".to_string(),
            event_tag: ("tweet".to_string(), "monitor".to_string()),
        };

        let twitter = if dry_run {
            None
        } else {
            Some(TwitterCredentials {
                api_key: read_required(&lookup, "API_KEY")?,
                api_secret: read_required(&lookup, "API_SECRET")?,
                access_token: read_required(&lookup, "ACCESS_TOKEN")?,
                access_secret: read_required(&lookup, "ACCESS_SECRET")?,
            })
        };

        let poll_ms = read_u64(&lookup, "POWERWATCH_POLL_INTERVAL_MS")?.unwrap_or(1000);
        if poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "POWERWATCH_POLL_INTERVAL_MS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let timeout_secs = read_u64(&lookup, "POWERWATCH_HTTP_TIMEOUT_SECS")?.unwrap_or(5);

        let timezone = match lookup("POWERWATCH_TIMEZONE") {
            Some(name) if !name.trim().is_empty() => {
                name.trim()
                    .parse::<Tz>()
                    .map_err(|e| ConfigError::InvalidValue {
                        name: "POWERWATCH_TIMEZONE".to_string(),
                        reason: e.to_string(),
                    })?
            }
            _ => chrono_tz::Asia::Kolkata,
        };

        Ok(Self {
            influx,
            twitter,
            poll_interval: Duration::from_millis(poll_ms),
            call_timeout: Duration::from_secs(timeout_secs.max(1)),
            timezone,
            dry_run,
        })
    }
}

/// What happened when looking for a `.env` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvStatus {
    Loaded,
    NotFound,
    /// The file exists but could not be read or parsed
    Invalid(String),
}

/// Load a `.env` file into the process environment.
///
/// Logging is left to the caller.
pub fn load_dotenv(path: Option<&Path>) -> DotenvStatus {
    let result = match path {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };

    match result {
        Ok(()) => DotenvStatus::Loaded,
        Err(e) if e.not_found() => DotenvStatus::NotFound,
        Err(e) => DotenvStatus::Invalid(e.to_string()),
    }
}

fn read_required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
}

fn read_u64<F>(lookup: &F, name: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn read_bool<F>(lookup: &F, name: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("1") | Some("true") | Some("yes") => Ok(Some(true)),
        Some("0") | Some("false") | Some("no") => Ok(Some(false)),
        Some(other) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected a boolean, got {:?}", other),
        }),
    }
}
