//! Upstream provider settings: endpoints, timeout, cache lifetime and language.

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_PROVIDER_NAME: &str = "OpenMeteo";
pub const DEFAULT_FORECAST_BASE_URL: &str = "https://api.open-meteo.com/";
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com/";

/// Inclusive bounds for the per-attempt timeout
pub const MIN_TIMEOUT_SECONDS: u64 = 1;
pub const MAX_TIMEOUT_SECONDS: u64 = 30;

/// Errors raised while validating configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not an absolute URL: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} must use https: {value}")]
    InsecureUrl { name: &'static str, value: String },

    #[error("Timeout must be between 1 and 30 seconds, got {0}")]
    TimeoutOutOfRange(u64),

    #[error("Cache TTL must be greater than zero minutes")]
    InvalidCacheTtl,

    #[error("Provider name cannot be empty")]
    EmptyProviderName,

    #[error("Default language cannot be empty")]
    EmptyLanguage,

    #[error("Invalid weather code mapping '{0}'")]
    InvalidWeatherCodes(String),
}

/// Provider settings loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub provider_name: String,
    pub forecast_base_url: String,
    pub geocoding_base_url: String,
    pub timeout_seconds: u64,
    pub cache_ttl_minutes: u64,
    pub default_language: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            forecast_base_url: DEFAULT_FORECAST_BASE_URL.to_string(),
            geocoding_base_url: DEFAULT_GEOCODING_BASE_URL.to_string(),
            timeout_seconds: 5,
            cache_ttl_minutes: 2,
            default_language: "en".to_string(),
        }
    }
}

impl ProviderSettings {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// Values are not checked here; call [`ProviderSettings::validate`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let provider_name = env::var("SKYCAST_PROVIDER_NAME").unwrap_or(defaults.provider_name);

        let forecast_base_url =
            env::var("SKYCAST_FORECAST_BASE_URL").unwrap_or(defaults.forecast_base_url);

        let geocoding_base_url =
            env::var("SKYCAST_GEOCODING_BASE_URL").unwrap_or(defaults.geocoding_base_url);

        let timeout_seconds = env::var("SKYCAST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_seconds);

        let cache_ttl_minutes = env::var("SKYCAST_CACHE_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cache_ttl_minutes);

        let default_language =
            env::var("SKYCAST_DEFAULT_LANGUAGE").unwrap_or(defaults.default_language);

        Self {
            provider_name,
            forecast_base_url,
            geocoding_base_url,
            timeout_seconds,
            cache_ttl_minutes,
            default_language,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_name.trim().is_empty() {
            return Err(ConfigError::EmptyProviderName);
        }
        self.forecast_url()?;
        self.geocoding_url()?;
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&self.timeout_seconds) {
            return Err(ConfigError::TimeoutOutOfRange(self.timeout_seconds));
        }
        if self.cache_ttl_minutes == 0 {
            return Err(ConfigError::InvalidCacheTtl);
        }
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        Ok(())
    }

    pub fn forecast_url(&self) -> Result<Url, ConfigError> {
        https_url("SKYCAST_FORECAST_BASE_URL", &self.forecast_base_url)
    }

    pub fn geocoding_url(&self) -> Result<Url, ConfigError> {
        https_url("SKYCAST_GEOCODING_BASE_URL", &self.geocoding_base_url)
    }
}

fn https_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|_| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        });
    }
    if url.scheme() != "https" {
        return Err(ConfigError::InsecureUrl {
            name,
            value: value.to_string(),
        });
    }
    Ok(url)
}
