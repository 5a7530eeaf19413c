//! City name to [`Location`] resolution through the Open-Meteo geocoding API.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::models::open_meteo::{GeocodingResponse, GeocodingResult};
use crate::models::{
    AppErrorKind, Coordinates, ExternalLocationId, FetchError, Location, ProviderError,
    ProviderInfo, ServiceKind,
};
use crate::services::provider_client::ProviderClient;
use crate::services::resilient_client::ResilientClient;

pub const GEOCODING_SERVICE: &str = "OpenMeteoGeocodingClient";

/// Namespace of ids minted from geocoding results
pub const GEOCODING_PROVIDER_KEY: &str = "openmeteo.geocoding";

const SEARCH_PATH: &str = "v1/search";
const RESULT_COUNT: u32 = 1;

/// Anything that can turn free text into a location
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn resolve(
        &self,
        city: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Location, FetchError>;
}

pub struct OpenMeteoGeocodingClient {
    base: ProviderClient,
}

impl OpenMeteoGeocodingClient {
    pub fn new(http: Arc<ResilientClient>, provider_name: &str, base_url: Url) -> Self {
        let info = ProviderInfo::new(provider_name, GEOCODING_SERVICE, base_url);
        Self {
            base: ProviderClient::new(http, info, ServiceKind::Geocoding),
        }
    }

    pub fn info(&self) -> &ProviderInfo {
        self.base.info()
    }

    /// First match for `city`; no matches is `LocationNotFound`
    pub async fn search(
        &self,
        city: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<(GeocodingResult, Url), FetchError> {
        if city.trim().is_empty() {
            return Err(self.empty_city().into());
        }

        let mut query = vec![
            ("name", city.trim().to_string()),
            ("count", RESULT_COUNT.to_string()),
        ];
        if !language.trim().is_empty() {
            query.push(("language", language.trim().to_string()));
        }
        query.push(("format", "json".to_string()));

        let url = self.base.endpoint(SEARCH_PATH, &query)?;
        let response: GeocodingResponse = self.base.send_and_deserialize(&url, cancel).await?;

        let Some(first) = response.results.and_then(|results| results.into_iter().next()) else {
            let codes = self.base.codes();
            return Err(self
                .base
                .error(
                    codes.kind().not_found_kind(),
                    codes.not_found(),
                    format!("No location found for city '{}'", city.trim()),
                    Some(&url),
                )
                .into());
        };

        Ok((first, url))
    }

    fn empty_city(&self) -> ProviderError {
        self.base.error(
            AppErrorKind::EmptyCity,
            self.base.codes().empty_city(),
            "City cannot be empty",
            None,
        )
    }

    fn bad_result(&self, code: String, message: String, url: &Url) -> ProviderError {
        self.base
            .error(AppErrorKind::ProviderBadResponse, code, message, Some(url))
    }
}

pub struct OpenMeteoGeocodingProvider {
    client: OpenMeteoGeocodingClient,
}

impl OpenMeteoGeocodingProvider {
    pub fn new(client: OpenMeteoGeocodingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeocodingProvider for OpenMeteoGeocodingProvider {
    async fn resolve(
        &self,
        city: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Location, FetchError> {
        let (result, url) = self.client.search(city, language, cancel).await?;
        let codes = self.client.base.codes();

        let Some(timezone) = result.timezone.as_deref().filter(|tz| !tz.trim().is_empty()) else {
            return Err(self
                .client
                .bad_result(
                    codes.missing_timezone(),
                    format!("No timezone found for city '{}'", city.trim()),
                    &url,
                )
                .into());
        };

        let coordinates = Coordinates::new(result.latitude, result.longitude).map_err(|e| {
            self.client
                .bad_result(codes.invalid_coordinates(), e.to_string(), &url)
        })?;

        let external_id = ExternalLocationId::new(GEOCODING_PROVIDER_KEY, result.id.to_string())
            .map_err(|e| self.client.bad_result(codes.internal_error(), e.to_string(), &url))?;

        let location = Location::new(result.name.as_str(), coordinates, timezone, external_id)
            .map_err(|e| self.client.bad_result(codes.missing_timezone(), e.to_string(), &url))?;

        debug!(
            country = result.country.as_deref().unwrap_or_default(),
            admin1 = result.admin1.as_deref().unwrap_or_default(),
            "Geocoding result details"
        );
        info!(
            city = %city.trim(),
            name = %location.name(),
            external_id = %location.external_id().value(),
            timezone = %location.timezone(),
            "Resolved location"
        );

        Ok(location)
    }
}
