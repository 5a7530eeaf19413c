//! Skycast - a resilient Open-Meteo weather and geocoding integration layer
//!
//! Skycast turns a free-text city name into a daily, weekly or current
//! forecast while shielding callers from upstream misbehaviour:
//! - Per-attempt timeouts, bounded retries and per-destination circuit breakers
//! - Strict validation of forecast payloads (lengths, dates, units, ranges)
//! - A provider-agnostic error taxonomy with `"<Service>.<Code>"` codes
//! - Time-bounded caching keyed by the provider's stable location id
//! - Structured tracing and Prometheus metrics
//!
//! ## Architecture
//!
//! The codebase is organized into focused modules:
//! - `models/` - Domain values, error taxonomy and upstream wire shapes
//! - `services/` - HTTP resilience, provider clients, caching and the forecast service
//! - `config/` - Configuration structures and environment loading
//! - `utils/` - Clock abstraction
//! - `telemetry` - Tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use skycast::{
//!     ForecastService, ProviderSettings, ResilientClientConfig, SystemClock, WeatherCodeMappings,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ForecastService::from_settings(
//!         &ProviderSettings::from_env(),
//!         ResilientClientConfig::from_env(),
//!         &WeatherCodeMappings::default(),
//!         Arc::new(SystemClock),
//!         None,
//!     )?;
//!     let report = service.weekly_forecast("Moscow", &CancellationToken::new()).await?;
//!     println!("{}: {} days", report.city, report.days.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use config::{ConfigError, ProviderSettings, WeatherCodeMappings};
pub use models::{
    AppErrorKind, Coordinates, CurrentForecast, DailyForecastMean, DomainError,
    ExternalLocationId, FetchError, Location, ProviderContext, ProviderError, WeatherCondition,
    WeeklyForecastMean,
};
pub use services::{
    AppMetrics, CacheMetrics, CachedForecastProvider, CurrentForecastReport, DailyForecastReport,
    ForecastCache, ForecastProvider, ForecastService, GeocodingProvider, MemoryForecastCache,
    ResilientClient, ResilientClientConfig, ResilientClientError, ResilientClientMetrics,
    ServiceBuildError, WeeklyForecastReport,
};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use utils::{Clock, ManualClock, SystemClock};
