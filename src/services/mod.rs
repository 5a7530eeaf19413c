//! Provider clients, decorators and the forecast service.
//!
//! Layering, bottom to top: [`resilient_client`] (timeouts, retries, circuit
//! breaking), [`provider_client`] (status and payload classification), the
//! Open-Meteo forecast and geocoding clients, the caching decorator and
//! finally [`forecast_service`].

pub mod cached_forecast_provider;
pub mod forecast_cache;
pub mod forecast_client;
pub mod forecast_provider;
pub mod forecast_service;
pub mod geocoding;
pub mod language;
pub mod metrics;
pub mod provider_client;
pub mod resilient_client;
pub mod timezone;
pub mod validator;
pub mod weather_codes;

pub use cached_forecast_provider::*;
pub use forecast_cache::*;
pub use forecast_client::*;
pub use forecast_provider::*;
pub use forecast_service::*;
pub use geocoding::*;
pub use language::*;
pub use metrics::*;
pub use resilient_client::{
    BufferedResponse, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerState, ResilientClient,
    ResilientClientConfig, ResilientClientError, ResilientClientMetrics, RetryConfig,
};
pub use timezone::*;
pub use weather_codes::*;
