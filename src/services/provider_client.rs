//! Shared plumbing for typed upstream clients.
//!
//! [`ProviderClient`] sends a GET through the [`ResilientClient`], classifies
//! the buffered outcome into the error taxonomy and decodes the body. Typed
//! clients only build URIs and interpret payloads.

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

use crate::models::{
    AppErrorKind, ErrorCodes, FetchError, ParseDiagnostic, ProviderContext, ProviderError,
    ProviderInfo, ServiceKind,
};
use crate::services::resilient_client::{ResilientClient, ResilientClientError};
use crate::services::validator::{ValidationCode, ValidationFailure};

/// Error body Open-Meteo returns alongside 4xx statuses
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    reason: Option<String>,
}

pub struct ProviderClient {
    http: Arc<ResilientClient>,
    info: ProviderInfo,
    codes: ErrorCodes,
}

impl ProviderClient {
    pub fn new(http: Arc<ResilientClient>, info: ProviderInfo, kind: ServiceKind) -> Self {
        let codes = ErrorCodes::new(info.service.clone(), kind);
        Self { http, info, codes }
    }

    pub fn info(&self) -> &ProviderInfo {
        &self.info
    }

    pub fn codes(&self) -> &ErrorCodes {
        &self.codes
    }

    /// Resolve `path` under the base URL and append `query`
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ProviderError> {
        let mut url = self.info.base_url.join(path).map_err(|e| {
            self.error(
                AppErrorKind::Unknown,
                self.codes.internal_error(),
                format!("Cannot build request URI for '{path}': {e}"),
                None,
            )
        })?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    pub fn context(&self, uri: Option<&Url>) -> ProviderContext {
        ProviderContext {
            name: self.info.name.clone(),
            service: self.info.service.clone(),
            raw_service: self.info.raw_service.clone(),
            uri: uri.map(Url::to_string),
            ..Default::default()
        }
    }

    pub fn error(
        &self,
        kind: AppErrorKind,
        code: String,
        message: impl Into<String>,
        uri: Option<&Url>,
    ) -> ProviderError {
        ProviderError::new(kind, code, message, self.context(uri))
    }

    /// Map a validator failure onto this service's codes
    pub fn validation_error(&self, failure: ValidationFailure, uri: &Url) -> ProviderError {
        let code = match failure.code {
            ValidationCode::MalformedResponse => self.codes.malformed_daily_mean(),
            ValidationCode::UnitsMismatch => self.codes.units_mismatch(),
        };
        let mut err = self.error(
            AppErrorKind::ProviderBadResponse,
            code,
            "Provider response failed validation",
            Some(uri),
        );
        err.context.provider_message = Some(failure.message);
        err
    }

    /// GET `url`, classify failures and decode the body as `T`
    pub async fn send_and_deserialize<T: DeserializeOwned>(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url, cancel)
            .await
            .map_err(|e| self.transport_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status, response.body(), url).into());
        }

        self.decode(response.body(), url).map_err(FetchError::from)
    }

    fn transport_error(&self, err: ResilientClientError, url: &Url) -> FetchError {
        let (kind, code, message) = match &err {
            ResilientClientError::Cancelled => return FetchError::Cancelled,
            ResilientClientError::Timeout => (
                AppErrorKind::Timeout,
                self.codes.timeout(),
                "Timeout while calling external provider",
            ),
            ResilientClientError::NetworkError(_) => (
                AppErrorKind::ExternalServerError,
                self.codes.network_error(),
                "Network error while calling external provider",
            ),
            ResilientClientError::CircuitBreakerOpen => (
                AppErrorKind::ExternalServerError,
                self.codes.circuit_open(),
                "External provider is temporarily unavailable (circuit open)",
            ),
        };

        let mut provider_err = self.error(kind, code, message, Some(url));
        provider_err.context.provider_message = Some(err.to_string());
        FetchError::Provider(provider_err)
    }

    fn status_error(&self, status: StatusCode, body: &[u8], url: &Url) -> ProviderError {
        let (kind, code) = if status == StatusCode::TOO_MANY_REQUESTS {
            (AppErrorKind::TooManyRequests, self.codes.too_many_requests())
        } else if status.is_server_error() {
            (AppErrorKind::ExternalServerError, self.codes.internal_error())
        } else if status.is_client_error() {
            (AppErrorKind::ExternalClientError, self.codes.external_client_error())
        } else {
            (AppErrorKind::Unknown, self.codes.internal_error())
        };

        let reason = status.canonical_reason().map(str::to_string);
        let upstream_reason = serde_json::from_slice::<UpstreamErrorBody>(body)
            .ok()
            .and_then(|b| b.reason);

        warn!(
            provider = %self.info.name,
            service = %self.info.service,
            url = %url,
            status = status.as_u16(),
            code = %code,
            "External provider returned non-success status code"
        );

        let mut err = self.error(
            kind,
            code,
            "External provider returned non-success status code",
            Some(url),
        );
        err.context.status = Some(status.as_u16());
        err.context.provider_message = upstream_reason.or_else(|| reason.clone());
        err.context.reason = reason;
        err
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8], url: &Url) -> Result<T, ProviderError> {
        let null_error = || {
            self.error(
                AppErrorKind::ProviderBadResponse,
                self.codes.deserialization_null(),
                "Failed to deserialize response from external provider",
                Some(url),
            )
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(null_error());
        }

        match serde_json::from_slice::<Option<T>>(body) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(null_error()),
            Err(e) => {
                warn!(
                    provider = %self.info.name,
                    service = %self.info.service,
                    url = %url,
                    line = e.line(),
                    column = e.column(),
                    error = %e,
                    "Failed to deserialize provider response"
                );
                Err(self
                    .error(
                        AppErrorKind::ProviderBadResponse,
                        self.codes.deserialization_exception(),
                        "Failed to deserialize response from external provider",
                        Some(url),
                    )
                    .with_diagnostic(ParseDiagnostic::from(&e)))
            }
        }
    }
}
