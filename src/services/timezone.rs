//! IANA time zone lookup with a per-instance memo.

use chrono_tz::Tz;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeZoneError {
    #[error("Time zone id cannot be empty")]
    Empty,

    #[error("Cannot resolve time zone by id: {0}")]
    Unknown(String),
}

/// Resolves zone ids and remembers successful lookups
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    zones: RwLock<HashMap<String, Tz>>,
}

impl TimeZoneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, id: &str) -> Result<Tz, TimeZoneError> {
        let normalized = id.trim();
        if normalized.is_empty() {
            return Err(TimeZoneError::Empty);
        }

        if let Some(tz) = self.zones.read().get(normalized) {
            return Ok(*tz);
        }

        let tz: Tz = normalized
            .parse()
            .map_err(|_| TimeZoneError::Unknown(normalized.to_string()))?;

        self.zones.write().insert(normalized.to_string(), tz);
        Ok(tz)
    }

    /// Number of memoized zones
    pub fn len(&self) -> usize {
        self.zones.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.read().is_empty()
    }
}
