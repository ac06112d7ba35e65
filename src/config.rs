//! Configuration management for Travel Scout.
//!
//! Configuration is set via environment variables:
//! - `OPENROUTER_API_KEY` - Optional. Without it, AI text falls back to canned templates.
//! - `OPENROUTER_MODEL` - Optional. Defaults to `anthropic/claude-3.5-sonnet`.
//! - `OPENROUTER_BASE_URL` - Optional. Defaults to `https://openrouter.ai/api/v1`.
//! - `WEATHERAPI_KEY` - Optional. WeatherAPI.com key for forecasts.
//! - `PREDICTHQ_API_KEY` - Optional. PredictHQ key for event search.
//! - `TRAVEL_ADVISORY_URL` - Optional. Defaults to `https://www.travel-advisory.info/api`.
//! - `TRAVEL_SCOUT_DATA_DIR` - Optional. Where trips, history and digests live. Defaults to `data`.
//! - `TRAVEL_SCOUT_MAX_CONCURRENCY` - Optional. Concurrent leaf executions. Defaults to `8`.
//! - `TRAVEL_SCOUT_OFFLINE` - Optional. Use fallbacks for every data source.
//! - `TRAVEL_SCOUT_RETRY_ATTEMPTS` - Optional. Retries for transient HTTP failures. Defaults to `2`.
//! - `TRAVEL_SCOUT_REQUIRE_AI` - Optional. Fail at startup when no OpenRouter key is set.

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::OPENROUTER_API_URL;
use crate::sources::TRAVEL_ADVISORY_URL;
use crate::util::{non_empty, parse_bool};

pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub openrouter_api_key: Option<String>,

    /// Model identifier (OpenRouter format)
    pub model: String,

    pub openrouter_base_url: String,

    pub weatherapi_key: Option<String>,

    pub predicthq_api_key: Option<String>,

    pub advisory_url: String,

    /// Directory for trips, history and saved digests
    pub data_dir: PathBuf,

    /// Maximum concurrent leaf executions per traversal
    pub max_concurrency: usize,

    /// Force every data source to its fallback
    pub offline: bool,

    /// Retries for transient HTTP failures
    pub retry_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `TRAVEL_SCOUT_REQUIRE_AI` is
    /// set but `OPENROUTER_API_KEY` is not, and `ConfigError::InvalidValue`
    /// for unparseable numbers, flags or URLs.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));

        let openrouter_api_key = var("OPENROUTER_API_KEY");
        if flag(&var, "TRAVEL_SCOUT_REQUIRE_AI")? && openrouter_api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()));
        }

        let openrouter_base_url = var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|| OPENROUTER_API_URL.to_string());
        validate_url("OPENROUTER_BASE_URL", &openrouter_base_url)?;

        let advisory_url = var("TRAVEL_ADVISORY_URL").unwrap_or_else(|| TRAVEL_ADVISORY_URL.to_string());
        validate_url("TRAVEL_ADVISORY_URL", &advisory_url)?;

        let max_concurrency: usize = number(&var, "TRAVEL_SCOUT_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "TRAVEL_SCOUT_MAX_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            openrouter_api_key,
            model: var("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openrouter_base_url,
            weatherapi_key: var("WEATHERAPI_KEY"),
            predicthq_api_key: var("PREDICTHQ_API_KEY"),
            advisory_url,
            data_dir: var("TRAVEL_SCOUT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            max_concurrency,
            offline: flag(&var, "TRAVEL_SCOUT_OFFLINE")?,
            retry_attempts: number(&var, "TRAVEL_SCOUT_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
        })
    }

    /// Offline config rooted at `data_dir` (useful for testing).
    pub fn offline(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            openrouter_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            openrouter_base_url: OPENROUTER_API_URL.to_string(),
            weatherapi_key: None,
            predicthq_api_key: None,
            advisory_url: TRAVEL_ADVISORY_URL.to_string(),
            data_dir: data_dir.into(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            offline: true,
            retry_attempts: 0,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.openrouter_api_key.is_some()
    }
}

fn flag(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<bool, ConfigError> {
    match var(name) {
        None => Ok(false),
        Some(value) => parse_bool(&value)
            .ok_or_else(|| ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a boolean", value))),
    }
}

fn number<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
    }
}

fn validate_url(name: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}
