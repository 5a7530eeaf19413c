//! Caching decorator over any [`ForecastProvider`].

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::{CurrentForecast, DailyForecastMean, FetchError, Location, WeeklyForecastMean};
use crate::services::forecast_cache::{CacheKey, ForecastCache};
use crate::services::forecast_provider::ForecastProvider;
use crate::utils::Clock;

/// Which cache a lookup went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Daily,
    Weekly,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Daily => "daily",
            CacheKind::Weekly => "weekly",
        }
    }
}

/// Receives the outcome of every cache lookup
pub trait CacheHitRecorder: Send + Sync {
    fn record(&self, kind: CacheKind, hit: bool);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheHitRecorder;

impl CacheHitRecorder for NoopCacheHitRecorder {
    fn record(&self, _kind: CacheKind, _hit: bool) {}
}

/// A value plus whether it came from the cache
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: Arc<T>,
    pub hit: bool,
}

pub struct CachedForecastProvider {
    inner: Arc<dyn ForecastProvider>,
    cache: Arc<dyn ForecastCache>,
    provider_key: String,
    clock: Arc<dyn Clock>,
    recorder: Arc<dyn CacheHitRecorder>,
}

impl CachedForecastProvider {
    pub fn new(
        inner: Arc<dyn ForecastProvider>,
        cache: Arc<dyn ForecastCache>,
        provider_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            cache,
            provider_key: provider_key.into(),
            clock,
            recorder: Arc::new(NoopCacheHitRecorder),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn CacheHitRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn provider_key(&self) -> &str {
        &self.provider_key
    }

    fn key(&self, location: &Location, date: NaiveDate) -> CacheKey {
        CacheKey::new(
            self.provider_key.as_str(),
            location.external_id().value(),
            date,
        )
    }

    /// Daily mean for `date`, from the cache when present
    pub async fn fetch_daily(
        &self,
        location: &Location,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Cached<DailyForecastMean>, FetchError> {
        let key = self.key(location, date);

        if let Some(value) = self.cache.get_daily(&key) {
            self.recorder.record(CacheKind::Daily, true);
            debug!(key = %key, "Daily forecast cache hit");
            return Ok(Cached { value, hit: true });
        }
        self.recorder.record(CacheKind::Daily, false);

        info!(
            provider = %self.provider_key,
            city = %location.name(),
            date = %date,
            "Cache miss, calling forecast provider"
        );
        let start = Instant::now();
        let value = self.inner.get_daily_mean(location, date, cancel).await?;
        info!(
            provider = %self.provider_key,
            city = %location.name(),
            date = %date,
            duration_ms = start.elapsed().as_millis() as u64,
            "Forecast provider call completed"
        );

        self.cache.set_daily(key, value.clone());
        Ok(Cached { value, hit: false })
    }

    /// Week starting today (UTC), from the cache when present
    pub async fn fetch_weekly(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Cached<WeeklyForecastMean>, FetchError> {
        let week_start = self.clock.today_utc();
        let key = self.key(location, week_start);

        if let Some(value) = self.cache.get_weekly(&key) {
            self.recorder.record(CacheKind::Weekly, true);
            debug!(key = %key, "Weekly forecast cache hit");
            return Ok(Cached { value, hit: true });
        }
        self.recorder.record(CacheKind::Weekly, false);

        info!(
            provider = %self.provider_key,
            city = %location.name(),
            week_start = %week_start,
            "Cache miss, calling forecast provider"
        );
        let start = Instant::now();
        let value = self.inner.get_weekly_mean(location, cancel).await?;
        info!(
            provider = %self.provider_key,
            city = %location.name(),
            week_start = %week_start,
            duration_ms = start.elapsed().as_millis() as u64,
            "Forecast provider call completed"
        );

        self.cache.set_weekly(key, value.clone());
        Ok(Cached { value, hit: false })
    }
}

#[async_trait]
impl ForecastProvider for CachedForecastProvider {
    async fn get_daily_mean(
        &self,
        location: &Location,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Arc<DailyForecastMean>, FetchError> {
        self.fetch_daily(location, date, cancel)
            .await
            .map(|cached| cached.value)
    }

    async fn get_weekly_mean(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Arc<WeeklyForecastMean>, FetchError> {
        self.fetch_weekly(location, cancel)
            .await
            .map(|cached| cached.value)
    }

    async fn get_current(
        &self,
        location: &Location,
        cancel: &CancellationToken,
    ) -> Result<Arc<CurrentForecast>, FetchError> {
        self.inner.get_current(location, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AppErrorKind, Coordinates, ExternalLocationId, ProviderContext, ProviderError,
        WeatherCondition,
    };
    use crate::services::forecast_cache::MemoryForecastCache;
    use crate::utils::ManualClock;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        daily_calls: AtomicUsize,
        weekly_calls: AtomicUsize,
        current_calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingProvider {
        fn failure() -> FetchError {
            ProviderError::new(
                AppErrorKind::ExternalServerError,
                "Forecast.InternalError",
                "boom",
                ProviderContext::default(),
            )
            .into()
        }

        fn day(location: &Location, date: NaiveDate) -> DailyForecastMean {
            DailyForecastMean {
                date,
                location_id: location.id(),
                condition: WeatherCondition::Cloudy,
                temperature_mean: 1.5,
                fetched_at_utc: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ForecastProvider for CountingProvider {
        async fn get_daily_mean(
            &self,
            location: &Location,
            date: NaiveDate,
            _cancel: &CancellationToken,
        ) -> Result<Arc<DailyForecastMean>, FetchError> {
            self.daily_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Self::failure());
            }
            Ok(Arc::new(Self::day(location, date)))
        }

        async fn get_weekly_mean(
            &self,
            location: &Location,
            _cancel: &CancellationToken,
        ) -> Result<Arc<WeeklyForecastMean>, FetchError> {
            self.weekly_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Self::failure());
            }
            let start = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
            let days = (0..7)
                .map(|offset| Self::day(location, start + chrono::Days::new(offset)))
                .collect();
            Ok(Arc::new(WeeklyForecastMean::new(days, Utc::now()).unwrap()))
        }

        async fn get_current(
            &self,
            location: &Location,
            _cancel: &CancellationToken,
        ) -> Result<Arc<CurrentForecast>, FetchError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CurrentForecast {
                observed_at_utc: Utc::now(),
                location_id: location.id(),
                temperature: 2.0,
                condition: WeatherCondition::Clear,
            }))
        }
    }

    #[derive(Default)]
    struct RecordingRecorder {
        events: Mutex<Vec<(CacheKind, bool)>>,
    }

    impl CacheHitRecorder for RecordingRecorder {
        fn record(&self, kind: CacheKind, hit: bool) {
            self.events.lock().push((kind, hit));
        }
    }

    struct Fixture {
        inner: Arc<CountingProvider>,
        recorder: Arc<RecordingRecorder>,
        clock: Arc<ManualClock>,
        provider: CachedForecastProvider,
    }

    fn fixture() -> Fixture {
        let inner = Arc::new(CountingProvider::default());
        let recorder = Arc::new(RecordingRecorder::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 10, 20, 9, 0, 0).unwrap(),
        ));
        let cache = Arc::new(MemoryForecastCache::new(10, clock.clone()).unwrap());
        let provider = CachedForecastProvider::new(inner.clone(), cache, "openmeteo", clock.clone())
            .with_recorder(recorder.clone());
        Fixture {
            inner,
            recorder,
            clock,
            provider,
        }
    }

    fn moscow() -> Location {
        Location::new(
            "Moscow",
            Coordinates::new(55.75, 37.62).unwrap(),
            "Europe/Moscow",
            ExternalLocationId::new("openmeteo.geocoding", "524901").unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_daily_fetch_is_a_hit_with_same_value() {
        let f = fixture();
        let location = moscow();
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let cancel = CancellationToken::new();

        let first = f.provider.fetch_daily(&location, date, &cancel).await.unwrap();
        let second = f.provider.fetch_daily(&location, date, &cancel).await.unwrap();

        assert!(!first.hit);
        assert!(second.hit);
        assert!(Arc::ptr_eq(&first.value, &second.value));
        assert_eq!(f.inner.daily_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *f.recorder.events.lock(),
            vec![(CacheKind::Daily, false), (CacheKind::Daily, true)]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let f = fixture();
        let location = moscow();
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let cancel = CancellationToken::new();

        f.inner.fail.store(true, Ordering::SeqCst);
        let err = f.provider.fetch_daily(&location, date, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), Some(AppErrorKind::ExternalServerError));

        f.inner.fail.store(false, Ordering::SeqCst);
        let result = f.provider.fetch_daily(&location, date, &cancel).await.unwrap();
        assert!(!result.hit);
        assert_eq!(f.inner.daily_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_same_external_id_shares_entry() {
        let f = fixture();
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let cancel = CancellationToken::new();
        let renamed = Location::new(
            "Moskva",
            Coordinates::new(55.7512, 37.6184).unwrap(),
            "Europe/Moscow",
            ExternalLocationId::new("openmeteo.geocoding", "524901").unwrap(),
        )
        .unwrap();

        f.provider.fetch_daily(&moscow(), date, &cancel).await.unwrap();
        let second = f.provider.fetch_daily(&renamed, date, &cancel).await.unwrap();

        assert!(second.hit);
        assert_eq!(f.inner.daily_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_weekly_key_follows_clock_date() {
        let f = fixture();
        let location = moscow();
        let cancel = CancellationToken::new();

        f.provider.fetch_weekly(&location, &cancel).await.unwrap();
        assert!(f.provider.fetch_weekly(&location, &cancel).await.unwrap().hit);

        f.clock.advance(chrono::Duration::days(1));
        assert!(!f.provider.fetch_weekly(&location, &cancel).await.unwrap().hit);
        assert_eq!(f.inner.weekly_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_current_conditions_pass_through() {
        let f = fixture();
        let location = moscow();
        let cancel = CancellationToken::new();

        f.provider.get_current(&location, &cancel).await.unwrap();
        f.provider.get_current(&location, &cancel).await.unwrap();

        assert_eq!(f.inner.current_calls.load(Ordering::SeqCst), 2);
        assert!(f.recorder.events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_entry_expires_with_ttl() {
        let f = fixture();
        let location = moscow();
        let date = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
        let cancel = CancellationToken::new();

        f.provider.get_daily_mean(&location, date, &cancel).await.unwrap();
        f.clock.advance(chrono::Duration::minutes(10));
        f.provider.get_daily_mean(&location, date, &cancel).await.unwrap();

        assert_eq!(f.inner.daily_calls.load(Ordering::SeqCst), 2);
    }
}
