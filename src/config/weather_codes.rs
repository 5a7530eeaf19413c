//! WMO weather code table.
//!
//! The default follows the WMO 4677 subset Open-Meteo emits. Deployments can
//! append overrides through `SKYCAST_WEATHER_CODES`, formatted as
//! `Condition=1,2,3;Condition=4`.

use std::env;
use tracing::warn;

use super::provider::ConfigError;
use crate::models::WeatherCondition;

/// Ordered list of code groups; a code listed twice maps to the later condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherCodeMappings {
    entries: Vec<(WeatherCondition, Vec<i32>)>,
}

impl Default for WeatherCodeMappings {
    fn default() -> Self {
        use WeatherCondition::*;

        Self {
            entries: vec![
                (Clear, vec![0]),
                (PartlyCloudy, vec![1, 2]),
                (Cloudy, vec![3]),
                (Fog, vec![45, 48]),
                (Drizzle, vec![51, 53, 55, 56, 57]),
                (LightRain, vec![61, 66, 80]),
                (Rain, vec![63, 81]),
                (HeavyRain, vec![65, 67, 82]),
                (LightSnow, vec![71, 85]),
                (Snow, vec![73, 77]),
                (HeavySnow, vec![75, 86]),
                (Thunderstorm, vec![95]),
                (Hailstorm, vec![96, 99]),
            ],
        }
    }
}

impl WeatherCodeMappings {
    pub fn new(entries: Vec<(WeatherCondition, Vec<i32>)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(WeatherCondition, Vec<i32>)] {
        &self.entries
    }

    /// Defaults plus any overrides from `SKYCAST_WEATHER_CODES`
    pub fn from_env() -> Self {
        let mut mappings = Self::default();

        if let Ok(raw) = env::var("SKYCAST_WEATHER_CODES") {
            match Self::parse(&raw) {
                Ok(overrides) => mappings.entries.extend(overrides.entries),
                Err(e) => warn!(error = %e, "Ignoring SKYCAST_WEATHER_CODES"),
            }
        }

        mappings
    }

    /// Parse `Condition=1,2;Condition=3`; blank segments are skipped
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let invalid = || ConfigError::InvalidWeatherCodes(segment.to_string());

            let (name, codes) = segment.split_once('=').ok_or_else(invalid)?;
            let condition: WeatherCondition = name.parse().map_err(|_| invalid())?;
            let codes = codes
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| c.parse::<i32>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>, _>>()?;

            entries.push((condition, codes));
        }

        Ok(Self { entries })
    }
}
