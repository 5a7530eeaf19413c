//! Metrics collection and Prometheus integration service.

use prometheus::{CounterVec, Opts, Registry, TextEncoder};

use crate::services::cached_forecast_provider::{CacheHitRecorder, CacheKind};
use crate::services::resilient_client::ResilientClientMetrics;

/// Forecast cache lookups by kind and outcome
#[derive(Clone)]
pub struct CacheMetrics {
    pub requests_total: CounterVec,
}

impl CacheMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests_total = CounterVec::new(
            Opts::new(
                "forecast_cache_requests_total",
                "Forecast cache lookups by kind and outcome",
            ),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        Ok(Self { requests_total })
    }

    pub fn count(&self, kind: CacheKind, hit: bool) -> u64 {
        self.requests_total
            .with_label_values(&[kind.as_str(), outcome(hit)])
            .get() as u64
    }
}

impl CacheHitRecorder for CacheMetrics {
    fn record(&self, kind: CacheKind, hit: bool) {
        self.requests_total
            .with_label_values(&[kind.as_str(), outcome(hit)])
            .inc();
    }
}

fn outcome(hit: bool) -> &'static str {
    if hit { "hit" } else { "miss" }
}

/// Application metrics collector for Prometheus integration
#[derive(Clone)]
pub struct AppMetrics {
    pub registry: Registry,
    pub http: ResilientClientMetrics,
    pub cache: CacheMetrics,
    pub app_info: CounterVec,
}

impl AppMetrics {
    /// Create a registry with the HTTP client and cache collectors registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http = ResilientClientMetrics::new(&registry)?;
        let cache = CacheMetrics::new(&registry)?;

        let app_info = CounterVec::new(
            Opts::new("app_info", "Application information"),
            &["name", "version"],
        )?;
        registry.register(Box::new(app_info.clone()))?;
        app_info
            .with_label_values(&[env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")])
            .inc();

        Ok(Self {
            registry,
            http,
            cache,
            app_info,
        })
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}
