//! Structural and semantic checks on decoded provider payloads.
//!
//! Checks run in a fixed order and the first failure wins. Nothing here does
//! I/O; the provider client maps a [`ValidationFailure`] onto its own error codes.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::models::forecast::MAX_WEEK_DAYS;
use crate::models::open_meteo::{CurrentData, CurrentUnits, MeanForecastResponse};

/// Unit the upstream must declare for temperatures
pub const EXPECTED_TEMPERATURE_UNIT: &str = "°C";

/// Plausible range for a near-surface air temperature
pub const MIN_TEMPERATURE_C: f64 = -90.0;
pub const MAX_TEMPERATURE_C: f64 = 60.0;

static CANONICAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// How many days a response is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSpan {
    Daily,
    Weekly,
}

impl ForecastSpan {
    fn accepts(&self, len: usize) -> bool {
        match self {
            ForecastSpan::Daily => len == 1,
            ForecastSpan::Weekly => (1..=MAX_WEEK_DAYS).contains(&len),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ForecastSpan::Daily => "exactly 1 day",
            ForecastSpan::Weekly => "between 1 and 7 days",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    MalformedResponse,
    UnitsMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailure {
    pub code: ValidationCode,
    pub message: String,
    /// Offending element for per-item checks
    pub index: Option<usize>,
}

impl ValidationFailure {
    fn malformed(message: impl Into<String>) -> Self {
        Self {
            code: ValidationCode::MalformedResponse,
            message: message.into(),
            index: None,
        }
    }

    fn malformed_at(index: usize, message: impl Into<String>) -> Self {
        Self {
            code: ValidationCode::MalformedResponse,
            message: message.into(),
            index: Some(index),
        }
    }

    fn units(message: impl Into<String>) -> Self {
        Self {
            code: ValidationCode::UnitsMismatch,
            message: message.into(),
            index: None,
        }
    }
}

/// One validated day of a mean forecast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanDay {
    pub date: NaiveDate,
    pub weather_code: Option<i32>,
    pub temperature_mean: f64,
}

/// Validate a daily-mean payload, returning its days in upstream order
pub fn validate_mean(
    response: Option<&MeanForecastResponse>,
    span: ForecastSpan,
) -> Result<Vec<MeanDay>, ValidationFailure> {
    let Some(response) = response else {
        return Err(ValidationFailure::malformed("Response payload is missing"));
    };
    let Some(daily) = response.daily.as_ref() else {
        return Err(ValidationFailure::malformed("Response has no daily section"));
    };

    let (Some(times), Some(codes), Some(means)) =
        (&daily.time, &daily.weather_code, &daily.temperature_2m_mean)
    else {
        return Err(ValidationFailure::malformed(
            "Daily section must contain time, weather_code and temperature_2m_mean",
        ));
    };

    let len = times.len();
    if len == 0 || codes.len() != len || means.len() != len {
        return Err(ValidationFailure::malformed(format!(
            "Daily series lengths differ or are empty: time={}, weather_code={}, temperature_2m_mean={}",
            times.len(),
            codes.len(),
            means.len()
        )));
    }

    if !span.accepts(len) {
        return Err(ValidationFailure::malformed(format!(
            "Expected {}, got {}",
            span.describe(),
            len
        )));
    }

    if let Some(unit) = response
        .daily_units
        .as_ref()
        .and_then(|units| units.temperature_2m_mean.as_deref())
    {
        check_unit(unit)?;
    }

    let mut temperatures = Vec::with_capacity(len);
    for (index, mean) in means.iter().enumerate() {
        match mean {
            Some(value) if in_temperature_range(*value) => temperatures.push(*value),
            Some(value) => {
                return Err(ValidationFailure::malformed_at(
                    index,
                    format!("temperature_2m_mean[{index}] = {value} is out of range"),
                ));
            }
            None => {
                return Err(ValidationFailure::malformed_at(
                    index,
                    format!("temperature_2m_mean[{index}] is null"),
                ));
            }
        }
    }

    let mut dates = Vec::with_capacity(len);
    for (index, raw) in times.iter().enumerate() {
        let Some(date) = parse_canonical_date(raw) else {
            return Err(ValidationFailure::malformed_at(
                index,
                format!("time[{index}] = '{raw}' is not a yyyy-MM-dd date"),
            ));
        };
        dates.push(date);
    }

    Ok(dates
        .into_iter()
        .zip(codes.iter().copied())
        .zip(temperatures)
        .map(|((date, weather_code), temperature_mean)| MeanDay {
            date,
            weather_code,
            temperature_mean,
        })
        .collect())
}

/// Validated current-conditions block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentReading {
    /// Wall-clock time at the location
    pub observed_at_local: NaiveDateTime,
    pub temperature: f64,
}

/// Validate a current-conditions block
pub fn validate_current(
    current: &CurrentData,
    units: Option<&CurrentUnits>,
) -> Result<CurrentReading, ValidationFailure> {
    if let Some(unit) = units.and_then(|u| u.temperature_2m.as_deref()) {
        check_unit(unit)?;
    }

    let temperature = match current.temperature_2m {
        Some(value) if in_temperature_range(value) => value,
        Some(value) => {
            return Err(ValidationFailure::malformed(format!(
                "temperature_2m = {value} is out of range"
            )));
        }
        None => return Err(ValidationFailure::malformed("temperature_2m is missing")),
    };

    let observed_at_local = current
        .time
        .as_deref()
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok())
        .ok_or_else(|| {
            ValidationFailure::malformed("current.time is missing or not yyyy-MM-ddTHH:mm")
        })?;

    Ok(CurrentReading {
        observed_at_local,
        temperature,
    })
}

/// Strict `yyyy-MM-dd`; rejects the looser forms chrono would otherwise accept
pub fn parse_canonical_date(raw: &str) -> Option<NaiveDate> {
    if !CANONICAL_DATE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn check_unit(unit: &str) -> Result<(), ValidationFailure> {
    if unit.trim().to_lowercase() == EXPECTED_TEMPERATURE_UNIT.to_lowercase() {
        Ok(())
    } else {
        Err(ValidationFailure::units(format!(
            "Expected temperature unit '{EXPECTED_TEMPERATURE_UNIT}', got '{unit}'"
        )))
    }
}

fn in_temperature_range(value: f64) -> bool {
    value.is_finite() && (MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&value)
}
