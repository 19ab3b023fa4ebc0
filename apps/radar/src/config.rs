use std::num::NonZeroU16;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Settings shared by every service, loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound for a single collaborator call. Unset means no bound.
    pub collaborator_timeout: Option<Duration>,
    pub bus_reconnect_delay: Duration,
}

impl Config {
    pub fn from_env(default_port: u16) -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: require_env("REDIS_URL")?,
            port: parse_env("PORT")?.unwrap_or(default_port),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            collaborator_timeout: parse_positive_env("COLLABORATOR_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            bus_reconnect_delay: Duration::from_millis(
                parse_positive_env("BUS_RECONNECT_DELAY_MS")?.unwrap_or(1000),
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct JobFetcherConfig {
    pub rapidapi_key: String,
    pub embedding_api_url: Option<String>,
    /// Fixed re-trigger interval. Unset means fetch only on request.
    pub fetch_interval: Option<Duration>,
    pub search_keywords: String,
    pub search_location_id: String,
}

impl JobFetcherConfig {
    pub fn from_env() -> Result<Self> {
        Ok(JobFetcherConfig {
            rapidapi_key: require_env("RAPIDAPI_KEY")?,
            embedding_api_url: optional_env("EMBEDDING_API_URL"),
            fetch_interval: parse_positive_env("JOB_FETCH_INTERVAL_SECS")?
                .map(Duration::from_secs),
            search_keywords: optional_env("JOB_SEARCH_KEYWORDS")
                .unwrap_or_else(|| "Fullstack developer".to_string()),
            search_location_id: optional_env("JOB_SEARCH_LOCATION_ID")
                .unwrap_or_else(|| "101282230".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResumeAnalyzerConfig {
    /// Without a key the analyzer falls back to regex-only extraction.
    pub anthropic_api_key: Option<String>,
    pub embedding_api_url: Option<String>,
}

impl ResumeAnalyzerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(ResumeAnalyzerConfig {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            embedding_api_url: optional_env("EMBEDDING_API_URL"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub anthropic_api_key: String,
    pub requeue_unmatched: bool,
}

impl MatcherConfig {
    pub fn from_env() -> Result<Self> {
        Ok(MatcherConfig {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            requeue_unmatched: optional_env("MATCH_REQUEUE_UNMATCHED")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("MATCH_REQUEUE_UNMATCHED must be true or false")?
                .unwrap_or(false),
        })
    }
}

/// maildev's SMTP port.
pub const DEFAULT_SMTP_PORT: u16 = 1025;

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// SMTP server for delivery. Takes precedence over `mail_relay_url`.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    /// HTTP mail relay. Without SMTP or a relay, notifications are logged.
    pub mail_relay_url: Option<String>,
    pub email_from: String,
    pub email_to: String,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self> {
        Ok(NotifierConfig {
            smtp_host: optional_env("SMTP_HOST"),
            smtp_port: parse_env::<NonZeroU16>("SMTP_PORT")?
                .map(NonZeroU16::get)
                .unwrap_or(DEFAULT_SMTP_PORT),
            mail_relay_url: optional_env("MAIL_RELAY_URL"),
            email_from: optional_env("EMAIL_FROM")
                .unwrap_or_else(|| "notifications@resume-radar.local".to_string()),
            email_to: require_env("NOTIFY_EMAIL_TO")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_env(key)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Environment variable '{key}' has an invalid value"))
}

/// Like `parse_env`, but zero is an error.
fn parse_positive_env(key: &str) -> Result<Option<u64>> {
    require_positive(key, parse_env(key)?)
}

fn require_positive(key: &str, value: Option<u64>) -> Result<Option<u64>> {
    match value {
        Some(0) => anyhow::bail!("Environment variable '{key}' must be greater than zero"),
        other => Ok(other),
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {other}"),
    }
}
