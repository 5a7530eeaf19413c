//! Open-Meteo forecast endpoint client.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::models::open_meteo::{CurrentResponse, DailyMeanSeries, MeanForecastResponse};
use crate::models::{
    AppErrorKind, Coordinates, FetchError, ProviderError, ProviderInfo, ServiceKind,
};
use crate::services::provider_client::ProviderClient;
use crate::services::resilient_client::ResilientClient;
use crate::services::validator::{self, ForecastSpan, MeanDay};

pub const FORECAST_SERVICE: &str = "OpenMeteoForecastClient";

const FORECAST_PATH: &str = "v1/forecast";
const DAILY_MEAN_FIELDS: &str = "temperature_2m_mean,weather_code";
const CURRENT_FIELDS: &str = "temperature_2m,weather_code";

/// Validated current conditions, still in upstream terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentObservation {
    pub observed_at_utc: DateTime<Utc>,
    pub temperature: f64,
    pub weather_code: Option<i32>,
}

pub struct OpenMeteoForecastClient {
    base: ProviderClient,
}

impl OpenMeteoForecastClient {
    pub fn new(http: Arc<ResilientClient>, provider_name: &str, base_url: Url) -> Self {
        let info = ProviderInfo::new(provider_name, FORECAST_SERVICE, base_url);
        Self {
            base: ProviderClient::new(http, info, ServiceKind::Forecast),
        }
    }

    pub fn info(&self) -> &ProviderInfo {
        self.base.info()
    }

    /// Mean temperature and weather code for a single date
    pub async fn get_daily_mean(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<MeanDay, FetchError> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut query = base_query(coordinates);
        query.push(("daily", DAILY_MEAN_FIELDS.to_string()));
        query.push(("timezone", "auto".to_string()));
        query.push(("start_date", day.clone()));
        query.push(("end_date", day));

        let days = self.fetch_mean(&query, ForecastSpan::Daily, cancel).await?;
        days.into_iter()
            .next()
            .ok_or_else(|| self.bad_response("Daily response contained no days").into())
    }

    /// Up to seven days starting today in the location's time zone
    pub async fn get_weekly_mean(
        &self,
        coordinates: Coordinates,
        cancel: &CancellationToken,
    ) -> Result<Vec<MeanDay>, FetchError> {
        let mut query = base_query(coordinates);
        query.push(("daily", DAILY_MEAN_FIELDS.to_string()));
        query.push(("timezone", "auto".to_string()));
        query.push(("forecast_days", "7".to_string()));

        self.fetch_mean(&query, ForecastSpan::Weekly, cancel).await
    }

    pub async fn get_current(
        &self,
        coordinates: Coordinates,
        cancel: &CancellationToken,
    ) -> Result<CurrentObservation, FetchError> {
        let mut query = base_query(coordinates);
        query.push(("current", CURRENT_FIELDS.to_string()));
        query.push(("timezone", "auto".to_string()));

        let url = self.base.endpoint(FORECAST_PATH, &query)?;
        let response: CurrentResponse = self.base.send_and_deserialize(&url, cancel).await?;

        let Some(current) = response.current.as_ref() else {
            return Err(self.not_found(&url));
        };

        let reading = validator::validate_current(current, response.current_units.as_ref())
            .map_err(|failure| self.base.validation_error(failure, &url))?;

        // Open-Meteo always reports the offset with timezone=auto; absent means UTC
        let offset_seconds = response.utc_offset_seconds.unwrap_or(0);
        let observed_at_utc = FixedOffset::east_opt(offset_seconds)
            .and_then(|offset| reading.observed_at_local.and_local_timezone(offset).single())
            .map(|at| at.with_timezone(&Utc))
            .ok_or_else(|| {
                self.base.error(
                    AppErrorKind::ProviderBadResponse,
                    self.base.codes().malformed_daily_mean(),
                    format!("Invalid utc_offset_seconds: {offset_seconds}"),
                    Some(&url),
                )
            })?;

        Ok(CurrentObservation {
            observed_at_utc,
            temperature: reading.temperature,
            weather_code: current.weather_code,
        })
    }

    async fn fetch_mean(
        &self,
        query: &[(&str, String)],
        span: ForecastSpan,
        cancel: &CancellationToken,
    ) -> Result<Vec<MeanDay>, FetchError> {
        let url = self.base.endpoint(FORECAST_PATH, query)?;
        let response: MeanForecastResponse = self.base.send_and_deserialize(&url, cancel).await?;

        if response
            .daily
            .as_ref()
            .is_some_and(DailyMeanSeries::is_present_but_empty)
        {
            return Err(self.not_found(&url));
        }

        validator::validate_mean(Some(&response), span)
            .map_err(|failure| self.base.validation_error(failure, &url).into())
    }

    /// Malformed-payload error for checks made after the request completed
    pub fn bad_response(&self, message: impl Into<String>) -> ProviderError {
        self.base.error(
            AppErrorKind::ProviderBadResponse,
            self.base.codes().malformed_daily_mean(),
            message,
            None,
        )
    }

    fn not_found(&self, url: &Url) -> FetchError {
        let codes = self.base.codes();
        self.base
            .error(
                codes.kind().not_found_kind(),
                codes.not_found(),
                "No forecast found",
                Some(url),
            )
            .into()
    }
}

fn base_query(coordinates: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", coordinates.latitude().to_string()),
        ("longitude", coordinates.longitude().to_string()),
    ]
}
