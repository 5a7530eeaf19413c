//! Resilient HTTP client service with retries, timeouts, and circuit breakers.
//!
//! Every GET runs through the same pipeline:
//! - a per-attempt timeout covering both the headers and the body
//! - a fixed-interval retry on 5xx, 429, transport failures and timeouts
//! - a rolling-window circuit breaker shared by all callers of a destination
//!
//! Cancellation aborts the pipeline at any point, including between retries,
//! and is never retried or counted against the breaker.

use parking_lot::Mutex;
use prometheus::{CounterVec, GaugeVec, HistogramVec, Opts, Registry};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio_retry::{RetryIf, strategy::FixedInterval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

/// Configuration for resilient HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilientClientConfig {
    /// Timeout for a single attempt (in milliseconds)
    pub request_timeout_ms: u64,

    /// Connection timeout (in seconds)
    pub connect_timeout_seconds: u64,

    /// Retry configuration
    pub retry: RetryConfig,

    /// Circuit breaker configuration
    pub circuit_breaker: CircuitBreakerConfig,

    /// Enable detailed logging
    pub enable_detailed_logging: bool,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts made after the first one
    pub max_retries: usize,

    /// Fixed delay between attempts in milliseconds
    pub delay_ms: u64,
}

/// Rolling-window circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Share of failed samples that opens the circuit
    pub failure_ratio: f64,

    /// Samples required in the window before the ratio is considered
    pub minimum_throughput: usize,

    /// Width of the sampling window in milliseconds
    pub sampling_window_ms: u64,

    /// How long the circuit stays open before a trial call (in milliseconds)
    pub break_duration_ms: u64,
}

impl Default for ResilientClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            connect_timeout_seconds: 3,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            enable_detailed_logging: true,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 200,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_ratio: 0.5,
            minimum_throughput: 8,
            sampling_window_ms: 30_000,
            break_duration_ms: 15_000,
        }
    }
}

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitBreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitBreakerState {
    fn gauge_value(&self) -> f64 {
        match self {
            CircuitBreakerState::Closed => 0.0,
            CircuitBreakerState::Open => 1.0,
            CircuitBreakerState::HalfOpen => 2.0,
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitBreakerState,
    /// (when, failed)
    samples: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Circuit breaker over a rolling sampling window.
///
/// Closed: outcomes are sampled; once the window holds at least
/// `minimum_throughput` samples and the failure share reaches `failure_ratio`
/// the circuit opens. Open: calls are rejected until `break_duration` elapses.
/// HalfOpen: exactly one trial call is let through; its outcome closes or
/// re-opens the circuit.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitBreakerState::Closed,
                samples: VecDeque::new(),
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn state(&self) -> CircuitBreakerState {
        self.inner.lock().state
    }

    /// Ask permission for one call; `None` while the circuit rejects calls
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Option<Permit<'_>> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitBreakerState::Closed => Some(Permit::new(self, false)),
            CircuitBreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened| now.saturating_duration_since(opened))
                    .unwrap_or_default();
                if elapsed >= Duration::from_millis(self.config.break_duration_ms) {
                    inner.state = CircuitBreakerState::HalfOpen;
                    inner.trial_in_flight = true;
                    Some(Permit::new(self, true))
                } else {
                    None
                }
            }
            CircuitBreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    None
                } else {
                    inner.trial_in_flight = true;
                    Some(Permit::new(self, true))
                }
            }
        }
    }

    fn record(&self, trial: bool, failed: bool, now: Instant) {
        let mut inner = self.inner.lock();

        if trial {
            inner.trial_in_flight = false;
            inner.samples.clear();
            if failed {
                inner.state = CircuitBreakerState::Open;
                inner.opened_at = Some(now);
            } else {
                inner.state = CircuitBreakerState::Closed;
                inner.opened_at = None;
            }
            return;
        }

        // Late outcomes of calls admitted before the circuit opened are ignored
        if inner.state != CircuitBreakerState::Closed {
            return;
        }

        let window = Duration::from_millis(self.config.sampling_window_ms);
        inner.samples.push_back((now, failed));
        while inner
            .samples
            .front()
            .is_some_and(|(at, _)| now.saturating_duration_since(*at) > window)
        {
            inner.samples.pop_front();
        }

        let total = inner.samples.len();
        if total < self.config.minimum_throughput {
            return;
        }
        let failures = inner.samples.iter().filter(|(_, failed)| *failed).count();
        if failures as f64 / total as f64 >= self.config.failure_ratio {
            inner.state = CircuitBreakerState::Open;
            inner.opened_at = Some(now);
            inner.samples.clear();
        }
    }

    fn release_trial(&self) {
        self.inner.lock().trial_in_flight = false;
    }
}

/// Admission to make one call through the breaker.
///
/// Resolve it with [`Permit::succeed`] or [`Permit::fail`]. A trial permit
/// dropped unresolved (the call was cancelled) frees the half-open slot
/// without recording an outcome.
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    resolved: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            resolved: false,
        }
    }

    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn succeed(mut self) {
        self.resolved = true;
        self.breaker.record(self.trial, false, Instant::now());
    }

    pub fn fail(mut self) {
        self.resolved = true;
        self.breaker.record(self.trial, true, Instant::now());
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.resolved {
            self.breaker.release_trial();
        }
    }
}

/// Metrics for resilient HTTP client operations
#[derive(Clone)]
pub struct ResilientClientMetrics {
    /// HTTP requests by destination, method, and outcome
    pub http_requests_total: CounterVec,

    /// HTTP request duration by destination and method
    pub http_request_duration_seconds: HistogramVec,

    /// Retry attempts by destination and reason
    pub retry_attempts_total: CounterVec,

    /// Circuit breaker state by destination
    pub circuit_breaker_state: GaugeVec,

    /// Timeout occurrences by destination
    pub timeouts_total: CounterVec,
}

impl ResilientClientMetrics {
    /// Create new metrics collector
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let http_requests_total = CounterVec::new(
            Opts::new(
                "resilient_http_requests_total",
                "Total resilient HTTP requests by destination, method, and outcome",
            ),
            &["destination", "method", "outcome"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "resilient_http_request_duration_seconds",
                "Duration of resilient HTTP requests including retries",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["destination", "method"],
        )?;

        let retry_attempts_total = CounterVec::new(
            Opts::new(
                "resilient_http_retry_attempts_total",
                "Total retry attempts by destination and reason",
            ),
            &["destination", "reason"],
        )?;

        let circuit_breaker_state = GaugeVec::new(
            Opts::new(
                "resilient_http_circuit_breaker_state",
                "Circuit breaker state (0=closed, 1=open, 2=half-open)",
            ),
            &["destination"],
        )?;

        let timeouts_total = CounterVec::new(
            Opts::new("resilient_http_timeouts_total", "Total attempt timeouts by destination"),
            &["destination"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(retry_attempts_total.clone()))?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;
        registry.register(Box::new(timeouts_total.clone()))?;

        Ok(Self {
            http_requests_total,
            http_request_duration_seconds,
            retry_attempts_total,
            circuit_breaker_state,
            timeouts_total,
        })
    }
}

/// Request context for logging and metrics
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub destination: String,
    pub method: &'static str,
    pub url: String,
    pub start_time: Instant,
}

/// Status and fully buffered body of a completed exchange
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Outcome of a single attempt, before retry exhaustion is resolved
#[derive(Debug)]
enum AttemptError {
    Status(BufferedResponse),
    Network(reqwest::Error),
    Timeout,
    CircuitOpen,
    Cancelled,
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            AttemptError::Status(_) | AttemptError::Network(_) | AttemptError::Timeout
        )
    }

    fn reason(&self) -> &'static str {
        match self {
            AttemptError::Status(_) => "http_status",
            AttemptError::Network(_) => "network_error",
            AttemptError::Timeout => "timeout",
            AttemptError::CircuitOpen => "circuit_open",
            AttemptError::Cancelled => "cancelled",
        }
    }
}

/// 5xx and 429 are worth another attempt
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Resilient HTTP client with retries, timeouts, and circuit breakers
pub struct ResilientClient {
    client: Client,
    config: ResilientClientConfig,
    metrics: Option<ResilientClientMetrics>,
    circuit_breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl ResilientClient {
    /// Create a new resilient HTTP client
    pub fn new(
        config: ResilientClientConfig,
        metrics: Option<ResilientClientMetrics>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            metrics,
            circuit_breakers: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ResilientClientConfig {
        &self.config
    }

    /// Current breaker state for the destination of `url`
    pub fn circuit_state(&self, url: &Url) -> CircuitBreakerState {
        self.circuit_breaker(&extract_destination(url)).state()
    }

    /// Execute an HTTP GET request with resilience patterns.
    ///
    /// Non-success statuses are returned as responses once retries are
    /// exhausted (or immediately when not transient); classifying them is the
    /// caller's job.
    pub async fn get(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<BufferedResponse, ResilientClientError> {
        let context = RequestContext {
            destination: extract_destination(url),
            method: "GET",
            url: url.to_string(),
            start_time: Instant::now(),
        };
        let breaker = self.circuit_breaker(&context.destination);

        let strategy = FixedInterval::from_millis(self.config.retry.delay_ms)
            .take(self.config.retry.max_retries);

        // A retry is counted when the next attempt starts
        let attempts = AtomicUsize::new(0);
        let last_reason = Mutex::new("unknown");

        let run = RetryIf::start(
            strategy,
            || {
                if attempts.fetch_add(1, Ordering::Relaxed) > 0 {
                    self.record_retry_attempt(&context, *last_reason.lock());
                }
                self.attempt(url, &context, &breaker, cancel)
            },
            |err: &AttemptError| {
                *last_reason.lock() = err.reason();
                err.is_transient()
            },
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AttemptError::Cancelled),
            result = run => result,
        };

        let duration = context.start_time.elapsed();
        self.record_circuit_breaker_state(&context.destination, breaker.state());

        match result {
            Ok(response) => {
                self.record_request_metrics(&context, "success", duration);
                Ok(response)
            }
            Err(AttemptError::Status(response)) => {
                self.record_request_metrics(&context, "retry_exhausted", duration);
                Ok(response)
            }
            Err(AttemptError::Network(e)) => {
                self.record_request_metrics(&context, "network_error", duration);
                Err(ResilientClientError::NetworkError(e))
            }
            Err(AttemptError::Timeout) => {
                self.record_request_metrics(&context, "timeout", duration);
                Err(ResilientClientError::Timeout)
            }
            Err(AttemptError::CircuitOpen) => {
                self.record_request_metrics(&context, "circuit_open", duration);
                Err(ResilientClientError::CircuitBreakerOpen)
            }
            Err(AttemptError::Cancelled) => {
                if self.config.enable_detailed_logging {
                    info!(
                        destination = %context.destination,
                        url = %context.url,
                        duration_ms = duration.as_millis(),
                        "Request cancelled by caller"
                    );
                }
                self.record_request_metrics(&context, "cancelled", duration);
                Err(ResilientClientError::Cancelled)
            }
        }
    }

    /// One pass through breaker, timeout and transport
    async fn attempt(
        &self,
        url: &Url,
        context: &RequestContext,
        breaker: &CircuitBreaker,
        cancel: &CancellationToken,
    ) -> Result<BufferedResponse, AttemptError> {
        let Some(permit) = breaker.try_acquire() else {
            self.record_circuit_breaker_state(&context.destination, CircuitBreakerState::Open);
            warn!(
                destination = %context.destination,
                url = %context.url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(AttemptError::CircuitOpen);
        };

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AttemptError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.exchange(url)) => outcome,
        };
        let duration = start.elapsed();

        match outcome {
            Ok(Ok(response)) => {
                let status = response.status();
                if is_transient_status(status) {
                    permit.fail();
                    if self.config.enable_detailed_logging {
                        warn!(
                            destination = %context.destination,
                            method = context.method,
                            url = %context.url,
                            status = status.as_u16(),
                            duration_ms = duration.as_millis(),
                            "Request failed with retryable status"
                        );
                    }
                    Err(AttemptError::Status(response))
                } else {
                    permit.succeed();
                    if self.config.enable_detailed_logging {
                        info!(
                            destination = %context.destination,
                            method = context.method,
                            url = %context.url,
                            status = status.as_u16(),
                            duration_ms = duration.as_millis(),
                            "Request completed"
                        );
                    }
                    Ok(response)
                }
            }
            Ok(Err(e)) => {
                permit.fail();
                if self.config.enable_detailed_logging {
                    error!(
                        destination = %context.destination,
                        method = context.method,
                        url = %context.url,
                        error = %e,
                        duration_ms = duration.as_millis(),
                        "Request failed with network error"
                    );
                }
                Err(AttemptError::Network(e))
            }
            Err(_) => {
                permit.fail();
                self.record_timeout(context);
                if self.config.enable_detailed_logging {
                    warn!(
                        destination = %context.destination,
                        method = context.method,
                        url = %context.url,
                        timeout_ms = timeout.as_millis(),
                        "Request timed out"
                    );
                }
                Err(AttemptError::Timeout)
            }
        }
    }

    /// Send the request and buffer the whole body
    async fn exchange(&self, url: &Url) -> Result<BufferedResponse, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(BufferedResponse { status, body })
    }

    /// Get or create the breaker shared by every call to `destination`
    fn circuit_breaker(&self, destination: &str) -> Arc<CircuitBreaker> {
        self.circuit_breakers
            .lock()
            .entry(destination.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.config.circuit_breaker.clone())))
            .clone()
    }

    fn record_request_metrics(&self, context: &RequestContext, outcome: &str, duration: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics
                .http_requests_total
                .with_label_values(&[context.destination.as_str(), context.method, outcome])
                .inc();

            metrics
                .http_request_duration_seconds
                .with_label_values(&[context.destination.as_str(), context.method])
                .observe(duration.as_secs_f64());
        }
    }

    fn record_retry_attempt(&self, context: &RequestContext, reason: &str) {
        if let Some(metrics) = &self.metrics {
            metrics
                .retry_attempts_total
                .with_label_values(&[context.destination.as_str(), reason])
                .inc();
        }
    }

    fn record_timeout(&self, context: &RequestContext) {
        if let Some(metrics) = &self.metrics {
            metrics
                .timeouts_total
                .with_label_values(&[context.destination.as_str()])
                .inc();
        }
    }

    fn record_circuit_breaker_state(&self, destination: &str, state: CircuitBreakerState) {
        if let Some(metrics) = &self.metrics {
            metrics
                .circuit_breaker_state
                .with_label_values(&[destination])
                .set(state.gauge_value());
        }
    }
}

/// Extract destination (host and port) from URL for metrics and circuit breaker grouping
fn extract_destination(url: &Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Errors that can occur with the resilient client
#[derive(Debug, thiserror::Error)]
pub enum ResilientClientError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Circuit breaker is open")]
    CircuitBreakerOpen,

    #[error("Request was cancelled")]
    Cancelled,
}

impl ResilientClientError {
    /// Get a user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            ResilientClientError::NetworkError(_) => {
                "Service temporarily unavailable due to network issues".to_string()
            }
            ResilientClientError::Timeout => {
                "Service temporarily unavailable due to timeout".to_string()
            }
            ResilientClientError::CircuitBreakerOpen => {
                "Service temporarily unavailable, please try again later".to_string()
            }
            ResilientClientError::Cancelled => "Request was cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig::default())
    }

    #[test]
    fn test_config_defaults() {
        let config = ResilientClientConfig::default();
        assert_eq!(config.request_timeout_ms, 5_000);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay_ms, 200);
        assert_eq!(config.circuit_breaker.minimum_throughput, 8);
        assert!(config.enable_detailed_logging);
    }

    #[test]
    fn test_metrics_creation() {
        let registry = Registry::new();
        let metrics = ResilientClientMetrics::new(&registry);
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_extract_destination() {
        let url = Url::parse("https://api.open-meteo.com/v1/forecast").unwrap();
        assert_eq!(extract_destination(&url), "api.open-meteo.com:443");

        let local = Url::parse("http://127.0.0.1:8080/v1/search").unwrap();
        assert_eq!(extract_destination(&local), "127.0.0.1:8080");
    }

    #[test]
    fn test_error_user_messages() {
        assert!(ResilientClientError::Timeout.user_message().contains("timeout"));
        assert!(ResilientClientError::CircuitBreakerOpen
            .user_message()
            .contains("try again later"));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::OK));
    }

    #[test]
    fn test_breaker_needs_minimum_throughput() {
        let cb = breaker();
        let now = Instant::now();
        for _ in 0..7 {
            cb.record(false, true, now);
        }
        assert_eq!(cb.state(), CircuitBreakerState::Closed);

        cb.record(false, true, now);
        assert_eq!(cb.state(), CircuitBreakerState::Open);
        assert!(cb.try_acquire_at(now).is_none());
    }

    #[test]
    fn test_breaker_ratio_below_threshold_stays_closed() {
        let cb = breaker();
        let now = Instant::now();
        for i in 0..9 {
            // 4 failures out of 9
            cb.record(false, i % 2 == 1, now);
        }
        assert_eq!(cb.state(), CircuitBreakerState::Closed);
    }

    #[test]
    fn test_breaker_forgets_samples_outside_window() {
        let cb = breaker();
        let start = Instant::now();
        for _ in 0..7 {
            cb.record(false, true, start);
        }
        let later = start + Duration::from_secs(31);
        cb.record(false, true, later);
        assert_eq!(cb.state(), CircuitBreakerState::Closed);
    }

    #[test]
    fn test_half_open_allows_single_trial() {
        let cb = breaker();
        let now = Instant::now();
        for _ in 0..8 {
            cb.record(false, true, now);
        }

        let after_break = now + Duration::from_secs(15);
        let trial = cb.try_acquire_at(after_break).unwrap();
        assert!(trial.is_trial());
        assert_eq!(cb.state(), CircuitBreakerState::HalfOpen);
        assert!(cb.try_acquire_at(after_break).is_none());

        trial.succeed();
        assert_eq!(cb.state(), CircuitBreakerState::Closed);
        assert!(cb.try_acquire_at(after_break).is_some());
    }

    #[test]
    fn test_failed_trial_reopens() {
        let cb = breaker();
        let now = Instant::now();
        for _ in 0..8 {
            cb.record(false, true, now);
        }

        let trial = cb.try_acquire_at(now + Duration::from_secs(16)).unwrap();
        trial.fail();
        assert_eq!(cb.state(), CircuitBreakerState::Open);
    }

    #[test]
    fn test_dropped_trial_frees_slot() {
        let cb = breaker();
        let now = Instant::now();
        for _ in 0..8 {
            cb.record(false, true, now);
        }

        let after_break = now + Duration::from_secs(15);
        let trial = cb.try_acquire_at(after_break).unwrap();
        drop(trial);
        assert_eq!(cb.state(), CircuitBreakerState::HalfOpen);
        assert!(cb.try_acquire_at(after_break).is_some());
    }
}
