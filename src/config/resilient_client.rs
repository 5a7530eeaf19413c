//! Configuration for resilient HTTP client
//!
//! Provides environment-based configuration for the resilient HTTP client
//! with defaults matching the provider resilience policy.

use crate::services::resilient_client::{CircuitBreakerConfig, ResilientClientConfig, RetryConfig};
use std::env;

impl ResilientClientConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let request_timeout_ms = env::var("SKYCAST_HTTP_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5_000);

        let connect_timeout_seconds = env::var("SKYCAST_HTTP_CONNECT_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let enable_detailed_logging = env::var("SKYCAST_HTTP_DETAILED_LOGGING")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        Self {
            request_timeout_ms,
            connect_timeout_seconds,
            retry: RetryConfig::from_env(),
            circuit_breaker: CircuitBreakerConfig::from_env(),
            enable_detailed_logging,
        }
    }
}

impl RetryConfig {
    /// Load retry configuration from environment variables
    pub fn from_env() -> Self {
        let max_retries = env::var("SKYCAST_HTTP_RETRY_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let delay_ms = env::var("SKYCAST_HTTP_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200);

        Self { max_retries, delay_ms }
    }
}

impl CircuitBreakerConfig {
    /// Load circuit breaker configuration from environment variables
    pub fn from_env() -> Self {
        let failure_ratio = env::var("SKYCAST_HTTP_CB_FAILURE_RATIO")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|ratio| *ratio > 0.0 && *ratio <= 1.0)
            .unwrap_or(0.5);

        let minimum_throughput = env::var("SKYCAST_HTTP_CB_MINIMUM_THROUGHPUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        let sampling_window_ms = env::var("SKYCAST_HTTP_CB_SAMPLING_WINDOW_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000);

        let break_duration_ms = env::var("SKYCAST_HTTP_CB_BREAK_DURATION_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15_000);

        Self {
            failure_ratio,
            minimum_throughput,
            sampling_window_ms,
            break_duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;
    use std::env;

    const VARS: [&str; 9] = [
        "SKYCAST_HTTP_REQUEST_TIMEOUT_MS",
        "SKYCAST_HTTP_CONNECT_TIMEOUT",
        "SKYCAST_HTTP_DETAILED_LOGGING",
        "SKYCAST_HTTP_RETRY_MAX_RETRIES",
        "SKYCAST_HTTP_RETRY_DELAY_MS",
        "SKYCAST_HTTP_CB_FAILURE_RATIO",
        "SKYCAST_HTTP_CB_MINIMUM_THROUGHPUT",
        "SKYCAST_HTTP_CB_SAMPLING_WINDOW_MS",
        "SKYCAST_HTTP_CB_BREAK_DURATION_MS",
    ];

    fn clear() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_resilient_client_config_defaults() {
        let _lock = ENV_MUTEX.lock();
        clear();

        let config = ResilientClientConfig::from_env();
        assert_eq!(config.request_timeout_ms, 5_000);
        assert_eq!(config.connect_timeout_seconds, 3);
        assert!(config.enable_detailed_logging);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay_ms, 200);
        assert_eq!(config.circuit_breaker.failure_ratio, 0.5);
        assert_eq!(config.circuit_breaker.minimum_throughput, 8);
        assert_eq!(config.circuit_breaker.sampling_window_ms, 30_000);
        assert_eq!(config.circuit_breaker.break_duration_ms, 15_000);
    }

    #[test]
    fn test_resilient_client_config_from_env() {
        let _lock = ENV_MUTEX.lock();
        clear();

        unsafe {
            env::set_var("SKYCAST_HTTP_REQUEST_TIMEOUT_MS", "750");
            env::set_var("SKYCAST_HTTP_DETAILED_LOGGING", "false");
            env::set_var("SKYCAST_HTTP_RETRY_MAX_RETRIES", "5");
            env::set_var("SKYCAST_HTTP_CB_MINIMUM_THROUGHPUT", "20");
        }

        let config = ResilientClientConfig::from_env();
        assert_eq!(config.request_timeout_ms, 750);
        assert!(!config.enable_detailed_logging);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.circuit_breaker.minimum_throughput, 20);

        clear();
    }

    #[test]
    fn test_failure_ratio_out_of_range_falls_back() {
        let _lock = ENV_MUTEX.lock();
        clear();

        unsafe {
            env::set_var("SKYCAST_HTTP_CB_FAILURE_RATIO", "1.5");
        }
        assert_eq!(CircuitBreakerConfig::from_env().failure_ratio, 0.5);

        unsafe {
            env::set_var("SKYCAST_HTTP_CB_FAILURE_RATIO", "0.25");
        }
        assert_eq!(CircuitBreakerConfig::from_env().failure_ratio, 0.25);

        clear();
    }
}
