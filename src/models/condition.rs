//! Closed set of weather conditions the upstream weather codes translate into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weather condition derived from a numeric upstream weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherCondition {
    /// No code was supplied or the code is not in the mapping table
    #[default]
    Unknown,
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    LightRain,
    Rain,
    HeavyRain,
    LightSnow,
    Snow,
    HeavySnow,
    Hailstorm,
    Thunderstorm,
}

impl WeatherCondition {
    /// Every condition, in declaration order
    pub const ALL: [WeatherCondition; 14] = [
        WeatherCondition::Unknown,
        WeatherCondition::Clear,
        WeatherCondition::PartlyCloudy,
        WeatherCondition::Cloudy,
        WeatherCondition::Fog,
        WeatherCondition::Drizzle,
        WeatherCondition::LightRain,
        WeatherCondition::Rain,
        WeatherCondition::HeavyRain,
        WeatherCondition::LightSnow,
        WeatherCondition::Snow,
        WeatherCondition::HeavySnow,
        WeatherCondition::Hailstorm,
        WeatherCondition::Thunderstorm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Unknown => "Unknown",
            WeatherCondition::Clear => "Clear",
            WeatherCondition::PartlyCloudy => "PartlyCloudy",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::LightRain => "LightRain",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::HeavyRain => "HeavyRain",
            WeatherCondition::LightSnow => "LightSnow",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::HeavySnow => "HeavySnow",
            WeatherCondition::Hailstorm => "Hailstorm",
            WeatherCondition::Thunderstorm => "Thunderstorm",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a condition name does not match any variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown weather condition name: {0}")]
pub struct UnknownConditionName(pub String);

impl FromStr for WeatherCondition {
    type Err = UnknownConditionName;

    /// Case-insensitive match on the variant name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WeatherCondition::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownConditionName(s.to_string()))
    }
}
