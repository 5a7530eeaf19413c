//! Forecast provider seam and its Open-Meteo implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::models::{
    CurrentForecast, DailyForecastMean, FetchError, Location, WeeklyForecastMean,
};
use crate::services::forecast_client::OpenMeteoForecastClient;
use crate::services::validator::MeanDay;
use crate::services::weather_codes::WeatherCodeTranslator;
use crate::utils::Clock;

/// Anything that can produce forecasts for a resolved location.
///
/// Values are handed out behind `Arc` so decorators can share one instance
/// between the cache and every caller.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn get_daily_mean(
        &self,
        location: &Location,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Arc<DailyForecastMean>, FetchError>;

    async fn get_weekly_mean(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Arc<WeeklyForecastMean>, FetchError>;

    async fn get_current(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Arc<CurrentForecast>, FetchError>;
}

pub struct OpenMeteoForecastProvider {
    client: OpenMeteoForecastClient,
    translator: Arc<WeatherCodeTranslator>,
    clock: Arc<dyn Clock>,
}

impl OpenMeteoForecastProvider {
    pub fn new(
        client: OpenMeteoForecastClient,
        translator: Arc<WeatherCodeTranslator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            translator,
            clock,
        }
    }

    fn to_daily(&self, day: MeanDay, location: &Location) -> DailyForecastMean {
        DailyForecastMean {
            date: day.date,
            location_id: location.id(),
            condition: self.translator.translate(day.weather_code),
            temperature_mean: day.temperature_mean,
            fetched_at_utc: self.clock.now_utc(),
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecastProvider {
    async fn get_daily_mean(
        &self,
        location: &Location,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Arc<DailyForecastMean>, FetchError> {
        let day = self
            .client
            .get_daily_mean(location.coordinates(), date, cancel)
            .await?;

        Ok(Arc::new(self.to_daily(day, location)))
    }

    async fn get_weekly_mean(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Arc<WeeklyForecastMean>, FetchError> {
        let days = self
            .client
            .get_weekly_mean(location.coordinates(), cancel)
            .await?;

        let fetched_at_utc = self.clock.now_utc();
        let days = days
            .into_iter()
            .map(|day| DailyForecastMean {
                fetched_at_utc,
                ..self.to_daily(day, location)
            })
            .collect();

        let week = WeeklyForecastMean::new(days, fetched_at_utc)
            .map_err(|e| self.client.bad_response(e.to_string()))?;

        Ok(Arc::new(week))
    }

    async fn get_current(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Arc<CurrentForecast>, FetchError> {
        let observation = self
            .client
            .get_current(location.coordinates(), cancel)
            .await?;

        Ok(Arc::new(CurrentForecast {
            observed_at_utc: observation.observed_at_utc,
            location_id: location.id(),
            temperature: observation.temperature,
            condition: self.translator.translate(observation.weather_code),
        }))
    }
}
