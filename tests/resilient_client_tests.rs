//! Integration tests for the resilient HTTP client
//!
//! Exercises retries, per-attempt timeouts, cancellation and the circuit
//! breaker against a mock HTTP server.

use prometheus::Registry;
use skycast::services::resilient_client::{CircuitBreakerState, RetryConfig};
use skycast::{ResilientClient, ResilientClientConfig, ResilientClientError, ResilientClientMetrics};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> ResilientClientConfig {
    ResilientClientConfig {
        request_timeout_ms: 200,
        retry: RetryConfig {
            max_retries: 3,
            delay_ms: 10,
        },
        ..ResilientClientConfig::default()
    }
}

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/v1/forecast", server.uri())).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

fn destination(url: &Url) -> String {
    format!("{}:{}", url.host_str().unwrap(), url.port().unwrap())
}

/// Serves response headers and part of the body on every connection, then stalls
async fn spawn_stalling_server() -> (Url, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let connections = Arc::new(AtomicUsize::new(0));

    let accepted = connections.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 200\r\n\r\n{\"daily\":")
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(10)).await;
            });
        }
    });

    let url = Url::parse(&format!("http://127.0.0.1:{port}/v1/forecast")).unwrap();
    (url, connections)
}

#[tokio::test]
async fn test_resilient_client_creation() {
    let registry = Registry::new();
    let metrics = ResilientClientMetrics::new(&registry).expect("Failed to create metrics");

    let client = ResilientClient::new(ResilientClientConfig::default(), Some(metrics));
    assert!(client.is_ok(), "Failed to create resilient client");
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = ResilientClient::new(fast_config(), None).unwrap();
    let response = client
        .get(&endpoint(&server), &CancellationToken::new())
        .await
        .expect("Request should succeed after retries");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_persistent_server_error_returned_after_all_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let registry = Registry::new();
    let metrics = ResilientClientMetrics::new(&registry).unwrap();
    let client = ResilientClient::new(fast_config(), Some(metrics.clone())).unwrap();
    let url = endpoint(&server);
    let response = client
        .get(&url, &CancellationToken::new())
        .await
        .expect("Exhausted retries hand back the last response");

    assert_eq!(response.status().as_u16(), 503);
    assert_eq!(request_count(&server).await, 4);

    let retries = metrics
        .retry_attempts_total
        .with_label_values(&[destination(&url).as_str(), "http_status"])
        .get();
    assert_eq!(retries as u64, 3);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ResilientClient::new(fast_config(), None).unwrap();
    let response = client
        .get(&endpoint(&server), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_too_many_requests_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = ResilientClient::new(fast_config(), None).unwrap();
    let response = client
        .get(&endpoint(&server), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_cancelled_before_call_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let client = ResilientClient::new(fast_config(), None).unwrap();
    let err = client.get(&endpoint(&server), &cancel).await.unwrap_err();

    assert!(matches!(err, ResilientClientError::Cancelled));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_cancel_in_flight_is_not_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ResilientClientConfig {
        request_timeout_ms: 5_000,
        ..fast_config()
    };
    let client = ResilientClient::new(config, None).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client.get(&endpoint(&server), &cancel).await.unwrap_err();

    assert!(matches!(err, ResilientClientError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_slow_upstream_times_out_and_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(1)))
        .mount(&server)
        .await;

    let registry = Registry::new();
    let metrics = ResilientClientMetrics::new(&registry).unwrap();
    let client = ResilientClient::new(fast_config(), Some(metrics.clone())).unwrap();
    let url = endpoint(&server);

    let err = client
        .get(&url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResilientClientError::Timeout));

    let destination = destination(&url);
    let retries = metrics
        .retry_attempts_total
        .with_label_values(&[destination.as_str(), "timeout"])
        .get();
    let timeouts = metrics
        .timeouts_total
        .with_label_values(&[destination.as_str()])
        .get();
    assert_eq!(retries as u64, 3);
    assert_eq!(timeouts as u64, 4);
}

#[tokio::test]
async fn test_stalled_body_times_out_and_is_retried() {
    let (url, connections) = spawn_stalling_server().await;

    let registry = Registry::new();
    let metrics = ResilientClientMetrics::new(&registry).unwrap();
    let client = ResilientClient::new(fast_config(), Some(metrics.clone())).unwrap();
    let cancel = CancellationToken::new();

    let started = std::time::Instant::now();
    let err = client.get(&url, &cancel).await.unwrap_err();

    assert!(matches!(err, ResilientClientError::Timeout));
    assert_eq!(connections.load(Ordering::SeqCst), 4);
    // Each attempt is bounded by one timeout, headers and body together
    assert!(started.elapsed() < Duration::from_secs(2));

    let timeouts = metrics
        .timeouts_total
        .with_label_values(&[destination(&url).as_str()])
        .get();
    assert_eq!(timeouts as u64, 4);

    // Stalled bodies count against the breaker like any other timeout
    let err = client.get(&url, &cancel).await.unwrap_err();
    assert!(matches!(err, ResilientClientError::Timeout));
    assert_eq!(client.circuit_state(&url), CircuitBreakerState::Open);
}

#[tokio::test]
async fn test_circuit_opens_after_sustained_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ResilientClient::new(fast_config(), None).unwrap();
    let url = endpoint(&server);
    let cancel = CancellationToken::new();

    // Two calls of four attempts fill the eight-sample minimum with failures
    for _ in 0..2 {
        let response = client.get(&url, &cancel).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
    }
    assert_eq!(client.circuit_state(&url), CircuitBreakerState::Open);
    assert_eq!(request_count(&server).await, 8);

    let err = client.get(&url, &cancel).await.unwrap_err();
    assert!(matches!(err, ResilientClientError::CircuitBreakerOpen));
    assert_eq!(request_count(&server).await, 8);
}

#[tokio::test]
async fn test_circuit_recovers_after_break() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(8)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut config = fast_config();
    config.circuit_breaker.break_duration_ms = 100;
    let client = ResilientClient::new(config, None).unwrap();
    let url = endpoint(&server);
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        client.get(&url, &cancel).await.unwrap();
    }
    assert_eq!(client.circuit_state(&url), CircuitBreakerState::Open);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let response = client.get(&url, &cancel).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(client.circuit_state(&url), CircuitBreakerState::Closed);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Reserve a free port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = Url::parse(&format!("http://127.0.0.1:{port}/v1/forecast")).unwrap();

    let client = ResilientClient::new(fast_config(), None).unwrap();
    let err = client
        .get(&url, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ResilientClientError::NetworkError(_)));
}
