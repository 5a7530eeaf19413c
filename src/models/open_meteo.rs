//! Wire shapes of the Open-Meteo forecast and geocoding APIs.
//!
//! Everything is optional so that structurally incomplete payloads decode and
//! reach the validator instead of failing as opaque parse errors.

use serde::Deserialize;

/// `GET v1/forecast?daily=temperature_2m_mean,weather_code`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeanForecastResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub utc_offset_seconds: Option<i32>,
    pub daily_units: Option<DailyUnitsMean>,
    pub daily: Option<DailyMeanSeries>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyUnitsMean {
    pub time: Option<String>,
    pub temperature_2m_mean: Option<String>,
    pub weather_code: Option<String>,
}

/// Parallel arrays, one element per day
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyMeanSeries {
    pub time: Option<Vec<String>>,
    pub weather_code: Option<Vec<Option<i32>>>,
    pub temperature_2m_mean: Option<Vec<Option<f64>>>,
}

impl DailyMeanSeries {
    /// All three series present and empty: upstream has no days for the range
    pub fn is_present_but_empty(&self) -> bool {
        matches!(
            (&self.time, &self.weather_code, &self.temperature_2m_mean),
            (Some(t), Some(w), Some(m)) if t.is_empty() && w.is_empty() && m.is_empty()
        )
    }
}

/// `GET v1/forecast?current=temperature_2m,weather_code`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentResponse {
    pub utc_offset_seconds: Option<i32>,
    pub timezone: Option<String>,
    pub current_units: Option<CurrentUnits>,
    pub current: Option<CurrentData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentUnits {
    pub temperature_2m: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentData {
    /// Local time, `yyyy-MM-ddTHH:mm`
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub weather_code: Option<i32>,
}

/// `GET v1/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodingResponse {
    pub results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub admin1: Option<String>,
}
