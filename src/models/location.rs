//! Resolved locations and the provider-scoped identifiers used to key caches.

use serde::Serialize;
use uuid::Uuid;

/// Invariant violations raised while constructing domain values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Latitude must be between -90 and 90, got {0}")]
    InvalidLatitude(f64),

    #[error("Longitude must be between -180 and 180, got {0}")]
    InvalidLongitude(f64),

    #[error("Provider key cannot be empty")]
    EmptyProviderKey,

    #[error("Identification value cannot be empty")]
    EmptyExternalValue,

    #[error("Time zone cannot be empty")]
    EmptyTimeZone,

    #[error("Weekly forecast must contain between 1 and {max} days, got {count}")]
    InvalidWeekLength { count: usize, max: usize },
}

/// Geographic coordinates, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Both values must be finite and inside their geographic range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Stable identifier of a place inside one provider's namespace.
///
/// Two resolutions of the same upstream record produce equal ids even when
/// the display name or the coordinates drift between calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExternalLocationId {
    provider: String,
    value: String,
}

impl ExternalLocationId {
    pub fn new(provider: impl Into<String>, value: impl Into<String>) -> Result<Self, DomainError> {
        let provider = provider.into();
        let value = value.into();

        if provider.trim().is_empty() {
            return Err(DomainError::EmptyProviderKey);
        }
        if value.trim().is_empty() {
            return Err(DomainError::EmptyExternalValue);
        }

        Ok(Self {
            provider,
            value: value.trim().to_string(),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A place resolved by the geocoding provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    id: Uuid,
    name: String,
    coordinates: Coordinates,
    timezone: String,
    external_id: ExternalLocationId,
}

impl Location {
    /// Create a location with a fresh process-local id
    pub fn new(
        name: impl Into<String>,
        coordinates: Coordinates,
        timezone: impl Into<String>,
        external_id: ExternalLocationId,
    ) -> Result<Self, DomainError> {
        let timezone = timezone.into();
        if timezone.trim().is_empty() {
            return Err(DomainError::EmptyTimeZone);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            coordinates,
            timezone,
            external_id,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// IANA time zone id, e.g. `Europe/Moscow`
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn external_id(&self) -> &ExternalLocationId {
        &self.external_id
    }
}
