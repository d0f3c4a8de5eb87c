//! Platform configuration, built in code or parsed from environment variables.

use std::time::Duration;

use crate::error::PlatformError;

pub const DEFAULT_BASE_URL: &str = "https://www.bungie.net/Platform";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Sent in the `X-API-Key` header on every call.
    pub api_key: String,
    /// Prefix for every endpoint path.
    pub base_url: String,
    /// Locale used when the session expresses none.
    pub locale: String,
    /// Max frames in flight. `None` means unlimited.
    pub max_concurrent: Option<usize>,
    /// Max frames held (waiting + active). `None` means unbounded.
    pub max_queued: Option<usize>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Send session credentials (`X-CSRF`) and honor the session locale.
    pub user_context: bool,
}

impl PlatformConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            max_concurrent: None,
            max_queued: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            user_context: false,
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `PLATFORM_API_KEY`
    ///
    /// Optional:
    /// - `PLATFORM_BASE_URL`: default `https://www.bungie.net/Platform`
    /// - `PLATFORM_LOCALE`: default `en`
    /// - `PLATFORM_MAX_CONCURRENT`: `-1` (default) for unlimited
    /// - `PLATFORM_MAX_QUEUED`: `-1` (default) for unbounded
    /// - `PLATFORM_TIMEOUT_MS`: default 5000
    /// - `PLATFORM_CONNECT_TIMEOUT_MS`: default 10000
    /// - `PLATFORM_USER_CONTEXT`: `true`/`false` (default)
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Config`] if the key is missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, PlatformError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`PlatformConfig::from_env`], reading through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`PlatformConfig::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PlatformError> {
        let api_key = lookup("PLATFORM_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PlatformError::Config("missing API key: env var PLATFORM_API_KEY not set".into()))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("PLATFORM_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(locale) = lookup("PLATFORM_LOCALE") {
            config.locale = locale;
        }
        if let Some(raw) = lookup("PLATFORM_MAX_CONCURRENT") {
            config.max_concurrent = parse_limit("PLATFORM_MAX_CONCURRENT", &raw)?;
        }
        if let Some(raw) = lookup("PLATFORM_MAX_QUEUED") {
            config.max_queued = parse_limit("PLATFORM_MAX_QUEUED", &raw)?;
        }
        if let Some(raw) = lookup("PLATFORM_TIMEOUT_MS") {
            config.timeout = Duration::from_millis(parse_u64("PLATFORM_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("PLATFORM_CONNECT_TIMEOUT_MS") {
            config.connect_timeout = Duration::from_millis(parse_u64("PLATFORM_CONNECT_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("PLATFORM_USER_CONTEXT") {
            config.user_context = parse_bool("PLATFORM_USER_CONTEXT", &raw)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    #[must_use]
    pub fn with_max_queued(mut self, max_queued: Option<usize>) -> Self {
        self.max_queued = max_queued;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_context(mut self, user_context: bool) -> Self {
        self.user_context = user_context;
        self
    }
}

/// Convert the `-1 = unlimited` convention into `Option<usize>`.
#[must_use]
pub fn limit_from_i64(raw: i64) -> Option<usize> {
    usize::try_from(raw).ok()
}

fn parse_limit(key: &str, raw: &str) -> Result<Option<usize>, PlatformError> {
    raw.trim()
        .parse::<i64>()
        .map(limit_from_i64)
        .map_err(|_| PlatformError::Config(format!("{key}: expected an integer, got '{raw}'")))
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, PlatformError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| PlatformError::Config(format!("{key}: expected a non-negative integer, got '{raw}'")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, PlatformError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PlatformError::Config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
