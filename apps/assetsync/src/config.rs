//! Process configuration from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use assetsync_client::client::DEFAULT_API_PREFIX;
use assetsync_client::ApiCredentials;

/// Output format of the stderr log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected text or json, got {other:?}")),
        }
    }
}

/// Configuration of one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: ApiCredentials,
    /// Scheme and authority of the asset API.
    pub base_url: String,
    pub api_prefix: String,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Append-only log file.
    pub log_file: PathBuf,
    pub log_format: LogFormat,
    pub request_timeout_secs: u64,
    /// Pause between processed records, used unless a rate is set.
    pub pace_ms: u64,
    /// Token bucket rate replacing the fixed pause.
    pub rate_per_minute: Option<u64>,
    pub max_retries: u32,
    pub retry_base_delay_secs: u64,
    pub dry_run: bool,
    pub archive: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Tests supply variables this way without touching the process
    /// environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, AppConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let required = |key: &str| {
            reader(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppConfigError::MissingVar(key.into()))
        };

        let api_key = required("API_KEY")?;
        let api_secret = required("API_SECRET")?;
        let base_url = required("API_BASE_URL")?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppConfigError::InvalidValue(
                "API_BASE_URL".into(),
                "must start with http:// or https://".into(),
            ));
        }

        let or_default = |key: &str, default: &str| reader(key).unwrap_or_else(|_| default.to_string());

        let rate_per_minute = match reader("ASSETSYNC_RATE_PER_MINUTE") {
            Ok(value) if !value.trim().is_empty() => {
                let rate = parse::<u64>(&reader, "ASSETSYNC_RATE_PER_MINUTE", "0")?;
                if rate == 0 {
                    return Err(AppConfigError::InvalidValue(
                        "ASSETSYNC_RATE_PER_MINUTE".into(),
                        format!("must be positive, got {value}"),
                    ));
                }
                Some(rate)
            }
            _ => None,
        };

        Ok(Self {
            credentials: ApiCredentials::new(api_key, api_secret),
            base_url,
            api_prefix: or_default("ASSETSYNC_API_PREFIX", DEFAULT_API_PREFIX),
            config_dir: PathBuf::from(or_default("ASSETSYNC_CONFIG_DIR", "config")),
            data_dir: PathBuf::from(or_default("ASSETSYNC_DATA_DIR", "data")),
            log_file: PathBuf::from(or_default("ASSETSYNC_LOG_FILE", "logs/sync.log")),
            log_format: parse(&reader, "ASSETSYNC_LOG_FORMAT", "text")?,
            request_timeout_secs: parse(&reader, "ASSETSYNC_REQUEST_TIMEOUT_SECS", "30")?,
            pace_ms: parse(&reader, "ASSETSYNC_PACE_MS", "1000")?,
            rate_per_minute,
            max_retries: parse(&reader, "ASSETSYNC_MAX_RETRIES", "2")?,
            retry_base_delay_secs: parse(&reader, "ASSETSYNC_RETRY_BASE_DELAY_SECS", "1")?,
            dry_run: parse(&reader, "ASSETSYNC_DRY_RUN", "false")?,
            archive: parse(&reader, "ASSETSYNC_ARCHIVE", "true")?,
        })
    }
}

fn parse<T>(
    reader: &impl Fn(&str) -> Result<String, std::env::VarError>,
    key: &str,
    default: &str,
) -> Result<T, AppConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    reader(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| AppConfigError::InvalidValue(key.into(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
