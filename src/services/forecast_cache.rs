//! Time-bounded forecast store.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::models::{DailyForecastMean, WeeklyForecastMean};
use crate::utils::Clock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Cache TTL must be greater than zero minutes")]
    InvalidTtl,
}

/// `(provider, external location value, date)`; for weekly entries the date is the week start
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: String,
    pub location: String,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(provider: impl Into<String>, location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            provider: provider.into(),
            location: location.into(),
            date,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.provider, self.location, self.date.format("%Y-%m-%d"))
    }
}

/// Storage behind the caching decorator
pub trait ForecastCache: Send + Sync {
    fn get_daily(&self, key: &CacheKey) -> Option<Arc<DailyForecastMean>>;

    fn set_daily(&self, key: CacheKey, forecast: Arc<DailyForecastMean>);

    fn get_weekly(&self, key: &CacheKey) -> Option<Arc<WeeklyForecastMean>>;

    fn set_weekly(&self, key: CacheKey, forecast: Arc<WeeklyForecastMean>);
}

#[derive(Debug)]
struct Entry<T> {
    value: Arc<T>,
    expires_at: DateTime<Utc>,
}

/// Concurrent map of entries, each expiring a fixed TTL after insertion
#[derive(Debug)]
struct ExpiringMap<T> {
    entries: RwLock<HashMap<CacheKey, Entry<T>>>,
}

impl<T> ExpiringMap<T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Arc<T>> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it unless another writer refreshed it meanwhile
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
            debug!(key = %key, "Evicted expired forecast cache entry");
        }
        None
    }

    fn set(&self, key: CacheKey, value: Arc<T>, expires_at: DateTime<Utc>) {
        self.entries.write().insert(key, Entry { value, expires_at });
    }

    fn purge(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// In-process [`ForecastCache`]
pub struct MemoryForecastCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    daily: ExpiringMap<DailyForecastMean>,
    weekly: ExpiringMap<WeeklyForecastMean>,
}

impl MemoryForecastCache {
    pub fn new(ttl_minutes: u64, clock: Arc<dyn Clock>) -> Result<Self, CacheError> {
        let minutes = i64::try_from(ttl_minutes).map_err(|_| CacheError::InvalidTtl)?;
        if minutes == 0 {
            return Err(CacheError::InvalidTtl);
        }

        Ok(Self {
            ttl: Duration::minutes(minutes),
            clock,
            daily: ExpiringMap::new(),
            weekly: ExpiringMap::new(),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_utc();
        self.daily.purge(now) + self.weekly.purge(now)
    }

    /// Entries currently stored, expired or not
    pub fn len(&self) -> usize {
        self.daily.len() + self.weekly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.clock.now_utc() + self.ttl
    }
}

impl ForecastCache for MemoryForecastCache {
    fn get_daily(&self, key: &CacheKey) -> Option<Arc<DailyForecastMean>> {
        self.daily.get(key, self.clock.now_utc())
    }

    fn set_daily(&self, key: CacheKey, forecast: Arc<DailyForecastMean>) {
        let expires_at = self.expires_at();
        self.daily.set(key, forecast, expires_at);
    }

    fn get_weekly(&self, key: &CacheKey) -> Option<Arc<WeeklyForecastMean>> {
        self.weekly.get(key, self.clock.now_utc())
    }

    fn set_weekly(&self, key: CacheKey, forecast: Arc<WeeklyForecastMean>) {
        let expires_at = self.expires_at();
        self.weekly.set(key, forecast, expires_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherCondition;
    use crate::utils::ManualClock;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap()))
    }

    fn forecast(date: NaiveDate) -> Arc<DailyForecastMean> {
        Arc::new(DailyForecastMean {
            date,
            location_id: Uuid::new_v4(),
            condition: WeatherCondition::Cloudy,
            temperature_mean: 1.5,
            fetched_at_utc: Utc::now(),
        })
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert_eq!(MemoryForecastCache::new(0, clock()).err(), Some(CacheError::InvalidTtl));
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let clock = clock();
        let cache = MemoryForecastCache::new(2, clock.clone()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let key = CacheKey::new("openmeteo", "524901", date);
        let value = forecast(date);

        cache.set_daily(key.clone(), value.clone());
        let hit = cache.get_daily(&key).unwrap();
        assert!(Arc::ptr_eq(&hit, &value));

        clock.advance(Duration::seconds(119));
        assert!(cache.get_daily(&key).is_some());

        clock.advance(Duration::seconds(1));
        assert!(cache.get_daily(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_separate_provider_location_and_date() {
        let cache = MemoryForecastCache::new(5, clock()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        cache.set_daily(CacheKey::new("a", "1", date), forecast(date));

        assert!(cache.get_daily(&CacheKey::new("b", "1", date)).is_none());
        assert!(cache.get_daily(&CacheKey::new("a", "2", date)).is_none());
        assert!(cache.get_daily(&CacheKey::new("a", "1", date.succ_opt().unwrap())).is_none());
        assert!(cache.get_weekly(&CacheKey::new("a", "1", date)).is_none());
    }

    #[test]
    fn test_purge_expired() {
        let clock = clock();
        let cache = MemoryForecastCache::new(1, clock.clone()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        cache.set_daily(CacheKey::new("a", "1", date), forecast(date));
        cache.set_daily(CacheKey::new("a", "2", date), forecast(date));

        clock.advance(Duration::minutes(1));
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_key_display() {
        let key = CacheKey::new("openmeteo", "524901", NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(key.to_string(), "openmeteo:524901:2025-01-05");
    }
}
