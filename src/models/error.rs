//! Provider-agnostic error taxonomy.
//!
//! Every failure that reaches a caller is a [`ProviderError`] carrying an
//! [`AppErrorKind`], a `"<Service>.<Code>"` string and the context of the
//! provider call that produced it. Layers above the provider client pass these
//! through untouched; nothing re-classifies a kind once it has been assigned.

use serde::Serialize;
use std::fmt;

/// Application-level failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AppErrorKind {
    EmptyCity,
    DateOutOfRange,
    LocationNotFound,
    ForecastNotFound,
    ExternalClientError,
    ExternalServerError,
    ProviderBadResponse,
    TooManyRequests,
    Timeout,
    Unknown,
}

impl AppErrorKind {
    pub const ALL: [AppErrorKind; 10] = [
        AppErrorKind::EmptyCity,
        AppErrorKind::DateOutOfRange,
        AppErrorKind::LocationNotFound,
        AppErrorKind::ForecastNotFound,
        AppErrorKind::ExternalClientError,
        AppErrorKind::ExternalServerError,
        AppErrorKind::ProviderBadResponse,
        AppErrorKind::TooManyRequests,
        AppErrorKind::Timeout,
        AppErrorKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorKind::EmptyCity => "EmptyCity",
            AppErrorKind::DateOutOfRange => "DateOutOfRange",
            AppErrorKind::LocationNotFound => "LocationNotFound",
            AppErrorKind::ForecastNotFound => "ForecastNotFound",
            AppErrorKind::ExternalClientError => "ExternalClientError",
            AppErrorKind::ExternalServerError => "ExternalServerError",
            AppErrorKind::ProviderBadResponse => "ProviderBadResponse",
            AppErrorKind::TooManyRequests => "TooManyRequests",
            AppErrorKind::Timeout => "Timeout",
            AppErrorKind::Unknown => "Unknown",
        }
    }

    /// Parse a kind name; anything unrecognised becomes `Unknown`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        AppErrorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(AppErrorKind::Unknown)
    }
}

impl fmt::Display for AppErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a provider error came from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProviderContext {
    /// Provider name, e.g. `OpenMeteo`
    pub name: String,
    /// Normalized service name used in error codes
    pub service: String,
    /// Service identifier before normalization
    pub raw_service: String,
    /// Request URI; absent for errors raised before a request was built
    pub uri: Option<String>,
    pub status: Option<u16>,
    /// Reason phrase matching `status`
    pub reason: Option<String>,
    /// Free-form detail from the upstream or from the validator
    pub provider_message: Option<String>,
}

/// Location of a decoding failure in the response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<&serde_json::Error> for ParseDiagnostic {
    fn from(err: &serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Classified failure of a provider call
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("{message} [{code}]")]
pub struct ProviderError {
    pub message: String,
    pub context: ProviderContext,
    /// `"<Service>.<Code>"`
    pub code: String,
    pub kind: AppErrorKind,
    pub diagnostic: Option<ParseDiagnostic>,
}

impl ProviderError {
    pub fn new(
        kind: AppErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
        context: ProviderContext,
    ) -> Self {
        Self {
            message: message.into(),
            context,
            code: code.into(),
            kind,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: ParseDiagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    /// Get a user-friendly error message for presentation layers
    pub fn user_message(&self) -> String {
        match self.kind {
            AppErrorKind::EmptyCity => "City name must not be empty".to_string(),
            AppErrorKind::DateOutOfRange => "Requested date is outside the forecast range".to_string(),
            AppErrorKind::LocationNotFound => "Location was not found".to_string(),
            AppErrorKind::ForecastNotFound => "No forecast is available for this location and date".to_string(),
            AppErrorKind::TooManyRequests => "Weather service is busy, please try again later".to_string(),
            AppErrorKind::Timeout => "Weather service temporarily unavailable due to timeout".to_string(),
            AppErrorKind::ExternalClientError
            | AppErrorKind::ExternalServerError
            | AppErrorKind::ProviderBadResponse => "Weather service temporarily unavailable".to_string(),
            AppErrorKind::Unknown => "Unexpected error while fetching the forecast".to_string(),
        }
    }
}

/// Outcome of any cancellable provider operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self {
            FetchError::Provider(err) => Some(err),
            FetchError::Cancelled => None,
        }
    }

    pub fn kind(&self) -> Option<AppErrorKind> {
        self.as_provider().map(|err| err.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip_and_fall_back_to_unknown() {
        for kind in AppErrorKind::ALL {
            assert_eq!(AppErrorKind::from_name(kind.as_str()), kind);
        }
        assert_eq!(AppErrorKind::from_name("timeout"), AppErrorKind::Timeout);
        assert_eq!(AppErrorKind::from_name("NotAKind"), AppErrorKind::Unknown);
        assert_eq!(AppErrorKind::from_name(""), AppErrorKind::Unknown);
    }

    #[test]
    fn test_display_includes_code() {
        let err = ProviderError::new(
            AppErrorKind::Timeout,
            "Forecast.Timeout",
            "Request timed out",
            ProviderContext::default(),
        );
        assert_eq!(err.to_string(), "Request timed out [Forecast.Timeout]");
        assert!(err.user_message().contains("timeout"));
    }

    #[test]
    fn test_diagnostic_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": ]").unwrap_err();
        let diagnostic = ParseDiagnostic::from(&err);
        assert_eq!(diagnostic.line, 2);
        assert!(diagnostic.column > 0);
    }

    #[test]
    fn test_fetch_error_accessors() {
        assert!(FetchError::Cancelled.is_cancelled());
        assert_eq!(FetchError::Cancelled.kind(), None);

        let provider = ProviderError::new(
            AppErrorKind::ForecastNotFound,
            "Forecast.ForecastNotFound",
            "No data",
            ProviderContext::default(),
        );
        let err: FetchError = provider.into();
        assert!(!err.is_cancelled());
        assert_eq!(err.kind(), Some(AppErrorKind::ForecastNotFound));
    }
}
