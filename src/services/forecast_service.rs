//! City-level forecast use cases.
//!
//! [`ForecastService`] validates the request, picks a geocoding language,
//! resolves the city, reads the forecast through the cache and renders the
//! fetch instant in the location's own time zone.

use chrono::{DateTime, FixedOffset, Months, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigError, ProviderSettings, WeatherCodeMappings};
use crate::models::{
    AppErrorKind, FetchError, Location, ProviderContext, ProviderError, WeatherCondition,
};
use crate::services::cached_forecast_provider::CachedForecastProvider;
use crate::services::forecast_cache::{CacheError, MemoryForecastCache};
use crate::services::forecast_client::OpenMeteoForecastClient;
use crate::services::forecast_provider::{ForecastProvider, OpenMeteoForecastProvider};
use crate::services::geocoding::{
    GeocodingProvider, OpenMeteoGeocodingClient, OpenMeteoGeocodingProvider,
};
use crate::services::language::LanguageResolver;
use crate::services::metrics::AppMetrics;
use crate::services::resilient_client::{ResilientClient, ResilientClientConfig};
use crate::services::timezone::TimeZoneResolver;
use crate::services::weather_codes::WeatherCodeTranslator;
use crate::utils::Clock;

pub const FORECAST_SERVICE_NAME: &str = "ForecastService";

/// How far ahead a daily forecast may be requested
pub const MAX_FORECAST_HORIZON_MONTHS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastReport {
    pub city: String,
    pub date: NaiveDate,
    pub condition: WeatherCondition,
    pub temperature_mean: f64,
    pub fetched_at_local: DateTime<FixedOffset>,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub condition: WeatherCondition,
    pub temperature_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyForecastReport {
    pub city: String,
    pub days: Vec<ForecastDay>,
    pub fetched_at_local: DateTime<FixedOffset>,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentForecastReport {
    pub city: String,
    pub condition: WeatherCondition,
    pub temperature: f64,
    pub observed_at_local: DateTime<FixedOffset>,
}

/// Failure to assemble the service from configuration
#[derive(Debug, thiserror::Error)]
pub enum ServiceBuildError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid cache settings: {0}")]
    Cache(#[from] CacheError),
}

pub struct ForecastService {
    geocoding: Arc<dyn GeocodingProvider>,
    forecasts: Arc<CachedForecastProvider>,
    timezones: Arc<TimeZoneResolver>,
    languages: LanguageResolver,
    clock: Arc<dyn Clock>,
}

impl ForecastService {
    pub fn new(
        geocoding: Arc<dyn GeocodingProvider>,
        forecasts: Arc<CachedForecastProvider>,
        timezones: Arc<TimeZoneResolver>,
        languages: LanguageResolver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            geocoding,
            forecasts,
            timezones,
            languages,
            clock,
        }
    }

    /// Wire the Open-Meteo stack from validated settings.
    ///
    /// The per-attempt HTTP timeout is capped by `settings.timeout_seconds`.
    pub fn from_settings(
        settings: &ProviderSettings,
        mut http_config: ResilientClientConfig,
        weather_codes: &WeatherCodeMappings,
        clock: Arc<dyn Clock>,
        metrics: Option<&AppMetrics>,
    ) -> Result<Self, ServiceBuildError> {
        settings.validate()?;

        let timeout_ms = settings.timeout_seconds.saturating_mul(1000);
        http_config.request_timeout_ms = http_config.request_timeout_ms.min(timeout_ms);

        let http = Arc::new(ResilientClient::new(
            http_config,
            metrics.map(|m| m.http.clone()),
        )?);

        let forecast_client = OpenMeteoForecastClient::new(
            http.clone(),
            &settings.provider_name,
            settings.forecast_url()?,
        );
        let geocoding_client = OpenMeteoGeocodingClient::new(
            http,
            &settings.provider_name,
            settings.geocoding_url()?,
        );

        let translator = Arc::new(WeatherCodeTranslator::new(weather_codes));
        let provider: Arc<dyn ForecastProvider> = Arc::new(OpenMeteoForecastProvider::new(
            forecast_client,
            translator,
            clock.clone(),
        ));
        let cache = Arc::new(MemoryForecastCache::new(
            settings.cache_ttl_minutes,
            clock.clone(),
        )?);

        let mut cached =
            CachedForecastProvider::new(provider, cache, settings.provider_name.as_str(), clock.clone());
        if let Some(metrics) = metrics {
            cached = cached.with_recorder(Arc::new(metrics.cache.clone()));
        }

        info!(
            provider = %settings.provider_name,
            cache_ttl_minutes = settings.cache_ttl_minutes,
            "Forecast service ready"
        );

        Ok(Self::new(
            Arc::new(OpenMeteoGeocodingProvider::new(geocoding_client)),
            Arc::new(cached),
            Arc::new(TimeZoneResolver::new()),
            LanguageResolver::new(settings.default_language.as_str()),
            clock,
        ))
    }

    /// Mean forecast for `city` on `date`
    pub async fn daily_forecast(
        &self,
        city: &str,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<DailyForecastReport, FetchError> {
        check_city(city)?;

        let today = self.clock.today_utc();
        let last_date = today
            .checked_add_months(Months::new(MAX_FORECAST_HORIZON_MONTHS))
            .unwrap_or(NaiveDate::MAX);
        if date > last_date {
            return Err(service_error(
                AppErrorKind::DateOutOfRange,
                "DateOutOfRange",
                format!("Date must not be later than {}", last_date.format("%Y-%m-%d")),
            )
            .into());
        }

        let location = self.locate(city, cancel).await?;
        let forecast = self.forecasts.fetch_daily(&location, date, cancel).await?;
        let fetched_at_local = self.to_local(forecast.value.fetched_at_utc, &location)?;

        Ok(DailyForecastReport {
            city: location.name().to_string(),
            date,
            condition: forecast.value.condition,
            temperature_mean: forecast.value.temperature_mean,
            fetched_at_local,
            cache_hit: forecast.hit,
        })
    }

    /// Up to seven days of mean forecasts starting today
    pub async fn weekly_forecast(
        &self,
        city: &str,
        cancel: &CancellationToken,
    ) -> Result<WeeklyForecastReport, FetchError> {
        check_city(city)?;

        let location = self.locate(city, cancel).await?;
        let forecast = self.forecasts.fetch_weekly(&location, cancel).await?;
        let fetched_at_local = self.to_local(forecast.value.fetched_at_utc(), &location)?;

        let days = forecast
            .value
            .days()
            .iter()
            .map(|day| ForecastDay {
                date: day.date,
                condition: day.condition,
                temperature_mean: day.temperature_mean,
            })
            .collect();

        Ok(WeeklyForecastReport {
            city: location.name().to_string(),
            days,
            fetched_at_local,
            cache_hit: forecast.hit,
        })
    }

    /// Current conditions; never cached
    pub async fn current_forecast(
        &self,
        city: &str,
        cancel: &CancellationToken,
    ) -> Result<CurrentForecastReport, FetchError> {
        check_city(city)?;

        let location = self.locate(city, cancel).await?;
        let current = self.forecasts.get_current(&location, cancel).await?;
        let observed_at_local = self.to_local(current.observed_at_utc, &location)?;

        Ok(CurrentForecastReport {
            city: location.name().to_string(),
            condition: current.condition,
            temperature: current.temperature,
            observed_at_local,
        })
    }

    async fn locate(&self, city: &str, cancel: &CancellationToken) -> Result<Location, FetchError> {
        let language = self.languages.resolve(city);
        self.geocoding.resolve(city, language, cancel).await
    }

    fn to_local(
        &self,
        at: DateTime<Utc>,
        location: &Location,
    ) -> Result<DateTime<FixedOffset>, FetchError> {
        let tz = self.timezones.resolve(location.timezone()).map_err(|e| {
            warn!(timezone = %location.timezone(), error = %e, "Failed to resolve time zone");
            service_error(AppErrorKind::Unknown, "InvalidTimeZone", e.to_string())
        })?;
        Ok(at.with_timezone(&tz).fixed_offset())
    }
}

fn check_city(city: &str) -> Result<(), FetchError> {
    if city.trim().is_empty() {
        return Err(service_error(
            AppErrorKind::EmptyCity,
            "EmptyCity",
            "City cannot be empty",
        )
        .into());
    }
    Ok(())
}

/// Errors raised by the service itself, before or after provider calls
fn service_error(kind: AppErrorKind, suffix: &str, message: impl Into<String>) -> ProviderError {
    let context = ProviderContext {
        name: FORECAST_SERVICE_NAME.to_string(),
        service: FORECAST_SERVICE_NAME.to_string(),
        raw_service: FORECAST_SERVICE_NAME.to_string(),
        ..ProviderContext::default()
    };
    ProviderError::new(
        kind,
        format!("{FORECAST_SERVICE_NAME}.{suffix}"),
        message,
        context,
    )
}
