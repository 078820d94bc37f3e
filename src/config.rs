use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// How long to wait between status checks while a remote file is processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            multiplier: 1.5,
            max_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    /// Interval to sleep before the `attempt`-th refresh (zero-based).
    pub fn interval(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let secs = self.initial_interval.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_interval.as_secs_f64()))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent key is allowed; backend calls fail when they are made.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub http_timeout: Duration,
    pub poll: PollPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: Duration::from_secs(300),
            poll: PollPolicy::default(),
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        config.api_key = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        if let Some(base) = get("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("VIDEO_ASSISTANT_MODEL") {
            config.model = model;
        }
        if let Some(raw) = get("VIDEO_ASSISTANT_MAX_WAIT_SECS") {
            config.poll.max_wait = Duration::from_secs(parse_secs("VIDEO_ASSISTANT_MAX_WAIT_SECS", raw)?);
        }
        if let Some(raw) = get("VIDEO_ASSISTANT_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse_secs("VIDEO_ASSISTANT_HTTP_TIMEOUT_SECS", raw)?);
        }
        Ok(config)
    }
}

fn parse_secs(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid { key, value })
}
