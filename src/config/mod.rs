//! Configuration management for bookcovers
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::utils::parse_http_url;

/// Default cover service location
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5050";

/// Number of cover slots probed per book
pub const DEFAULT_COVER_SLOTS: usize = 5;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cover service configuration
    pub cover_service: CoverServiceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Cover service and fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverServiceConfig {
    /// Base URL of the remote cover service
    pub base_url: String,

    /// Number of cover slots fetched per book
    pub cover_slots: usize,

    /// Maximum number of cover fetches in flight for one request
    pub max_concurrent_fetches: usize,

    /// Rate limit (requests per second)
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = std::env::var("BOOKCOVERS_BASE_URL")
            .unwrap_or(defaults.cover_service.base_url);

        let cover_slots = std::env::var("BOOKCOVERS_COVER_SLOTS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.cover_service.cover_slots);

        let max_concurrent_fetches = std::env::var("BOOKCOVERS_MAX_CONCURRENT_FETCHES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.cover_service.max_concurrent_fetches);

        let requests_per_second = std::env::var("BOOKCOVERS_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.cover_service.requests_per_second);

        let request_timeout_secs = std::env::var("BOOKCOVERS_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.cover_service.request_timeout_secs);

        let user_agent = std::env::var("BOOKCOVERS_USER_AGENT")
            .unwrap_or(defaults.cover_service.user_agent);

        let level = std::env::var("BOOKCOVERS_LOG_LEVEL").unwrap_or(defaults.logging.level);

        let format = std::env::var("BOOKCOVERS_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            cover_service: CoverServiceConfig {
                base_url,
                cover_slots,
                max_concurrent_fetches,
                requests_per_second,
                request_timeout_secs,
                user_agent,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.cover_service.validate()?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }
}

impl CoverServiceConfig {
    /// Validate cover service values
    pub fn validate(&self) -> Result<()> {
        parse_http_url(&self.base_url).context("Invalid cover service base_url")?;

        if self.cover_slots == 0 {
            anyhow::bail!("cover_slots must be greater than 0");
        }

        if self.max_concurrent_fetches == 0 {
            anyhow::bail!("max_concurrent_fetches must be greater than 0");
        }

        if self.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Point the configuration at another cover service
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CoverServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            cover_slots: DEFAULT_COVER_SLOTS,
            max_concurrent_fetches: DEFAULT_COVER_SLOTS,
            requests_per_second: 50,
            request_timeout_secs: 30,
            user_agent: format!("bookcovers/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cover_service: CoverServiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
