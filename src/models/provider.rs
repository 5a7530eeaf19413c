//! Provider identity and the per-service error code table.

use url::Url;

use super::error::AppErrorKind;

/// Prefix stripped from raw service identifiers
pub const PROVIDER_KEY_PREFIX: &str = "OpenMeteo";

const CLIENT_SUFFIX: &str = "Client";

/// Identity of one upstream service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: String,
    pub raw_service: String,
    pub service: String,
    pub base_url: Url,
}

impl ProviderInfo {
    /// The base URL path is forced to end with `/` so relative endpoints join under it
    pub fn new(name: impl Into<String>, raw_service: impl Into<String>, mut base_url: Url) -> Self {
        let raw_service = raw_service.into();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            name: name.into(),
            service: normalize_service(&raw_service),
            raw_service,
            base_url,
        }
    }
}

/// `OpenMeteoForecastClient` -> `Forecast`, `OpenMeteo-Geocoding-Client` -> `Geocoding`
pub fn normalize_service(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = trimmed.strip_prefix(PROVIDER_KEY_PREFIX).unwrap_or(trimmed);
    let without_suffix = without_prefix
        .strip_suffix(CLIENT_SUFFIX)
        .unwrap_or(without_prefix);
    let normalized = without_suffix.trim_matches(|c: char| c == '-' || c == '_' || c == '.');

    if normalized.is_empty() {
        trimmed.to_string()
    } else {
        normalized.to_string()
    }
}

/// Which upstream service a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Forecast,
    Geocoding,
}

impl ServiceKind {
    pub const fn not_found_code(&self) -> &'static str {
        match self {
            ServiceKind::Forecast => "ForecastNotFound",
            ServiceKind::Geocoding => "LocationNotFound",
        }
    }

    pub const fn not_found_kind(&self) -> AppErrorKind {
        match self {
            ServiceKind::Forecast => AppErrorKind::ForecastNotFound,
            ServiceKind::Geocoding => AppErrorKind::LocationNotFound,
        }
    }
}

/// Error code strings for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodes {
    service: String,
    kind: ServiceKind,
}

impl ErrorCodes {
    pub fn new(service: impl Into<String>, kind: ServiceKind) -> Self {
        Self {
            service: service.into(),
            kind,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    fn code(&self, suffix: &str) -> String {
        format!("{}.{}", self.service, suffix)
    }

    pub fn not_found(&self) -> String {
        self.code(self.kind.not_found_code())
    }

    pub fn deserialization_null(&self) -> String {
        self.code("JsonDeserializationReturnedNull")
    }

    pub fn deserialization_exception(&self) -> String {
        self.code("JsonDeserializationFailedWithException")
    }

    pub fn too_many_requests(&self) -> String {
        self.code("TooManyRequests")
    }

    pub fn internal_error(&self) -> String {
        self.code("InternalError")
    }

    pub fn network_error(&self) -> String {
        self.code("NetworkError")
    }

    pub fn timeout(&self) -> String {
        self.code("Timeout")
    }

    pub fn external_client_error(&self) -> String {
        self.code("ExternalClientError")
    }

    pub fn circuit_open(&self) -> String {
        self.code("CircuitOpen")
    }

    pub fn malformed_daily_mean(&self) -> String {
        self.code("MalformedDailyMean")
    }

    pub fn units_mismatch(&self) -> String {
        self.code("UnitsMismatch")
    }

    pub fn empty_city(&self) -> String {
        self.code("EmptyCity")
    }

    pub fn missing_timezone(&self) -> String {
        self.code("MissingTimezone")
    }

    pub fn invalid_coordinates(&self) -> String {
        self.code("InvalidCoordinates")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_service() {
        assert_eq!(normalize_service("OpenMeteoForecastClient"), "Forecast");
        assert_eq!(normalize_service("OpenMeteo-Geocoding-Client"), "Geocoding");
        assert_eq!(normalize_service("Geocoding"), "Geocoding");
        assert_eq!(normalize_service("OpenMeteoClient"), "OpenMeteoClient");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let info = ProviderInfo::new(
            "OpenMeteo",
            "OpenMeteoForecastClient",
            Url::parse("https://api.open-meteo.com/proxy").unwrap(),
        );
        assert_eq!(info.base_url.as_str(), "https://api.open-meteo.com/proxy/");
        assert_eq!(info.service, "Forecast");
        assert_eq!(info.raw_service, "OpenMeteoForecastClient");
    }

    #[test]
    fn test_codes_are_table_driven() {
        let forecast = ErrorCodes::new("Forecast", ServiceKind::Forecast);
        let geocoding = ErrorCodes::new("Geocoding", ServiceKind::Geocoding);

        assert_eq!(forecast.not_found(), "Forecast.ForecastNotFound");
        assert_eq!(geocoding.not_found(), "Geocoding.LocationNotFound");
        assert_eq!(forecast.timeout(), "Forecast.Timeout");
        assert_eq!(ServiceKind::Geocoding.not_found_kind(), AppErrorKind::LocationNotFound);
    }
}
