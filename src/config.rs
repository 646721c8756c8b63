//! Configuration module for the news batcher.

use serde::Deserialize;
use std::path::Path;

use crate::{BatcherError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/news.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/news-batcher.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// URL of the RSS/Atom feed to ingest.
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_feed_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_feed_max_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum snippet length in characters handed to the summarizer.
    #[serde(default = "default_feed_max_snippet")]
    pub max_snippet_length: usize,
}

fn default_feed_url() -> String {
    "https://news.google.com/rss/topics/CAAqIggKIhxDQkFTRDgwZ0hzQlJCelZnV25Oc2JXd3FCSG9A?hl=ko&gl=KR&ceid=KR%3Ako".to_string()
}

fn default_feed_timeout() -> u64 {
    10
}

fn default_feed_max_redirects() -> usize {
    5
}

fn default_feed_max_size() -> u64 {
    crate::feed::MAX_FEED_SIZE
}

fn default_feed_max_snippet() -> usize {
    4000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_secs: default_feed_timeout(),
            max_redirects: default_feed_max_redirects(),
            max_feed_size_bytes: default_feed_max_size(),
            max_snippet_length: default_feed_max_snippet(),
        }
    }
}

/// Summarizer (generation API) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// API key. Summarization is disabled when empty.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the generation API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Fixed model name. Model discovery runs when unset.
    #[serde(default)]
    pub model: Option<String>,
    /// Language the summary is written in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Target summary length in lines.
    #[serde(default = "default_summary_lines")]
    pub summary_lines: u32,
    /// Per-request deadline in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_language() -> String {
    "Korean".to_string()
}

fn default_summary_lines() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: None,
            language: default_language(),
            summary_lines: default_summary_lines(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SummarizerConfig {
    /// Whether an API key is configured.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Batch schedule configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Whether the daily job is registered.
    #[serde(default = "default_schedule_enabled")]
    pub enabled: bool,
    /// Hour of day (0-23) the job fires.
    #[serde(default = "default_schedule_hour")]
    pub hour: u32,
    /// Minute (0-59) the job fires.
    #[serde(default)]
    pub minute: u32,
    /// IANA timezone the schedule is evaluated in.
    #[serde(default = "default_schedule_timezone")]
    pub timezone: String,
    /// Item limit for scheduled runs.
    #[serde(default = "default_run_limit")]
    pub limit: usize,
    /// Default item limit for manually triggered runs.
    #[serde(default = "default_run_limit")]
    pub manual_limit: usize,
}

fn default_schedule_enabled() -> bool {
    true
}

fn default_schedule_hour() -> u32 {
    9
}

fn default_schedule_timezone() -> String {
    "Asia/Seoul".to_string()
}

fn default_run_limit() -> usize {
    10
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_schedule_enabled(),
            hour: default_schedule_hour(),
            minute: 0,
            timezone: default_schedule_timezone(),
            limit: default_run_limit(),
            manual_limit: default_run_limit(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Summarizer configuration.
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    /// Schedule configuration.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BatcherError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BatcherError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GEMINI_API_KEY`: generation API key
    /// - `RSS_FEED_URL`: feed URL
    /// - `DATABASE_PATH`: SQLite database path
    /// - `BATCH_SCHEDULE_HOUR` / `BATCH_SCHEDULE_MINUTE`: daily run time
    /// - `NEWS_BATCHER_PORT`: HTTP port
    /// - `NEWS_BATCHER_LOG_LEVEL`: log level
    ///
    /// Unparseable numeric values are ignored and leave the configured value in place.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = get("GEMINI_API_KEY") {
            self.summarizer.api_key = api_key;
        }
        if let Some(url) = get("RSS_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(hour) = get("BATCH_SCHEDULE_HOUR").and_then(|v| v.trim().parse().ok()) {
            self.schedule.hour = hour;
        }
        if let Some(minute) = get("BATCH_SCHEDULE_MINUTE").and_then(|v| v.trim().parse().ok()) {
            self.schedule.minute = minute;
        }
        if let Some(port) = get("NEWS_BATCHER_PORT").and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(level) = get("NEWS_BATCHER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.hour > 23 {
            return Err(BatcherError::Config(format!(
                "schedule.hour must be 0-23, got {}",
                self.schedule.hour
            )));
        }
        if self.schedule.minute > 59 {
            return Err(BatcherError::Config(format!(
                "schedule.minute must be 0-59, got {}",
                self.schedule.minute
            )));
        }
        if self.schedule.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(BatcherError::Config(format!(
                "unknown schedule.timezone: {}",
                self.schedule.timezone
            )));
        }
        if self.schedule.limit == 0 || self.schedule.manual_limit == 0 {
            return Err(BatcherError::Config(
                "schedule.limit and schedule.manual_limit must be at least 1".to_string(),
            ));
        }
        if self.summarizer.summary_lines == 0 {
            return Err(BatcherError::Config(
                "summarizer.summary_lines must be at least 1".to_string(),
            ));
        }
        if self.feed.timeout_secs == 0 || self.summarizer.request_timeout_secs == 0 {
            return Err(BatcherError::Config(
                "feed.timeout_secs and summarizer.request_timeout_secs must be at least 1"
                    .to_string(),
            ));
        }

        let feed_url = url::Url::parse(&self.feed.url)
            .map_err(|e| BatcherError::Config(format!("invalid feed.url: {e}")))?;
        match feed_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(BatcherError::Config(format!(
                    "unsupported feed.url scheme: {scheme}"
                )));
            }
        }

        Ok(())
    }
}
