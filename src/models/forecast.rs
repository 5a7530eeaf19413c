//! Forecast values produced by providers and shared through the cache.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{condition::WeatherCondition, location::DomainError};

/// Upper bound on the number of days in a weekly forecast
pub const MAX_WEEK_DAYS: usize = 7;

/// Daily mean temperature and condition for one location and date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastMean {
    pub date: NaiveDate,
    pub location_id: Uuid,
    pub condition: WeatherCondition,
    /// Degrees Celsius
    pub temperature_mean: f64,
    pub fetched_at_utc: DateTime<Utc>,
}

/// Ordered run of daily means, as returned upstream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyForecastMean {
    days: Vec<DailyForecastMean>,
    fetched_at_utc: DateTime<Utc>,
}

impl WeeklyForecastMean {
    pub fn new(days: Vec<DailyForecastMean>, fetched_at_utc: DateTime<Utc>) -> Result<Self, DomainError> {
        if days.is_empty() || days.len() > MAX_WEEK_DAYS {
            return Err(DomainError::InvalidWeekLength {
                count: days.len(),
                max: MAX_WEEK_DAYS,
            });
        }
        Ok(Self { days, fetched_at_utc })
    }

    pub fn days(&self) -> &[DailyForecastMean] {
        &self.days
    }

    pub fn fetched_at_utc(&self) -> DateTime<Utc> {
        self.fetched_at_utc
    }

    /// First day of the run
    pub fn start_date(&self) -> NaiveDate {
        // non-empty by construction
        self.days[0].date
    }
}

/// Conditions observed right now at a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentForecast {
    pub observed_at_utc: DateTime<Utc>,
    pub location_id: Uuid,
    pub temperature: f64,
    pub condition: WeatherCondition,
}
