//! The air-quality query service.
//!
//! [`AirQualityService`] ties the cache store, the staleness policy, the
//! remote sensor API and the classifier together:
//!
//! 1. Read the cached entry and check it against the [`StalenessPolicy`].
//! 2. If it is stale, look up the nearest installation and its measurements,
//!    then replace the cached entry. The cache is only touched after both
//!    remote calls succeeded and the payload validated.
//! 3. Build an [`AirQualityReport`] for the caller's coordinates.
//!
//! Refreshes are single-flight: the refresh section runs under an async
//! mutex and a caller that had to wait re-checks freshness first, so
//! concurrent queries inside the window share one remote fetch.
//!
//! The cache holds one entry and is not keyed by location.

use tokio::sync::Mutex;
use tracing::{debug, info};

use airq_store::CacheStore;
use airq_types::{AirQualityReport, CacheEntry, Coordinate};

use crate::api::SensorApi;
use crate::classifier::ClassifierTable;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, GeolocationError, Result};
use crate::report::build_report;
use crate::staleness::StalenessPolicy;

/// Search and freshness parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// Search radius for the nearest installation in kilometres.
    pub radius_km: f64,
    /// Maximum number of installations requested.
    pub max_results: u32,
    pub policy: StalenessPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            radius_km: 30.0,
            max_results: 1,
            policy: StalenessPolicy::default(),
        }
    }
}

/// Answers air-quality queries from a cache backed by a remote sensor API.
///
/// # Example
///
/// ```
/// use airq_core::{AirQualityService, MockSensorApi};
/// use airq_store::MemoryStore;
/// use airq_types::Coordinate;
///
/// #[tokio::main]
/// async fn main() {
///     let service = AirQualityService::new(MockSensorApi::new(), MemoryStore::new());
///
///     let report = service.query(Coordinate::new(50.06, 19.94)).await.unwrap();
///     assert!(!report.from_cache);
///
///     let again = service.query(Coordinate::new(50.06, 19.94)).await.unwrap();
///     assert!(again.from_cache);
/// }
/// ```
pub struct AirQualityService<A, S, C = SystemClock> {
    api: A,
    store: S,
    clock: C,
    options: QueryOptions,
    classifier: ClassifierTable,
    refresh_lock: Mutex<()>,
}

impl<A, S, C> std::fmt::Debug for AirQualityService<A, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirQualityService")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<A: SensorApi, S: CacheStore> AirQualityService<A, S, SystemClock> {
    /// Create a service using the wall clock and default options.
    pub fn new(api: A, store: S) -> Self {
        Self::with_clock(api, store, SystemClock)
    }
}

impl<A: SensorApi, S: CacheStore, C: Clock> AirQualityService<A, S, C> {
    /// Create a service with an explicit clock.
    pub fn with_clock(api: A, store: S, clock: C) -> Self {
        Self {
            api,
            store,
            clock,
            options: QueryOptions::default(),
            classifier: ClassifierTable::default(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace the query options.
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the classifier table.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ClassifierTable) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Report the air quality near `coords`.
    ///
    /// Coordinates that are out of range or not finite are treated as an
    /// unavailable position.
    pub async fn query(&self, coords: Coordinate) -> Result<AirQualityReport> {
        let coords = coords
            .validate()
            .map_err(|_| GeolocationError::PositionUnavailable)?;

        let (entry, from_cache) = match self.fresh_entry().await? {
            Some(entry) => (entry, true),
            None => {
                let _guard = self.refresh_lock.lock().await;
                // Another caller may have refreshed while we waited
                match self.fresh_entry().await? {
                    Some(entry) => (entry, true),
                    None => (self.refresh(coords).await?, false),
                }
            }
        };

        build_report(coords, &entry, from_cache, &self.classifier)
    }

    /// The cached entry regardless of its age.
    pub async fn cached_entry(&self) -> Result<Option<CacheEntry>> {
        Ok(self.store.read_slots().await?.into_entry())
    }

    /// Drop the cached entry so the next query refreshes.
    pub async fn invalidate(&self) -> Result<()> {
        self.store.clear().await?;
        info!("Cache invalidated");
        Ok(())
    }

    async fn fresh_entry(&self) -> Result<Option<CacheEntry>> {
        let slots = self.store.read_slots().await?;
        let now = self.clock.now_unix();

        // An entry without installations cannot produce a report
        let present = slots.entry_present()
            && slots
                .installations
                .as_ref()
                .is_some_and(|installations| !installations.is_empty());

        if !self.options.policy.is_fresh(present, slots.timestamp, now) {
            debug!("Cache miss (timestamp {:?}, now {})", slots.timestamp, now);
            return Ok(None);
        }

        debug!("Cache hit (timestamp {:?}, now {})", slots.timestamp, now);
        Ok(slots.into_entry())
    }

    async fn refresh(&self, coords: Coordinate) -> Result<CacheEntry> {
        let now = self.clock.now_unix();
        info!(
            "Refreshing air quality near {} (radius {} km)",
            coords, self.options.radius_km
        );

        let installations = self
            .api
            .nearest_installations(coords, self.options.radius_km, self.options.max_results)
            .await?;

        let id = match installations.first() {
            Some(first) => first.id,
            None => return Err(Error::remote("no installation found")),
        };
        for installation in &installations {
            installation.validate()?;
        }

        let data = self.api.installation_measurements(id).await?;
        data.validate()?;

        let entry = CacheEntry {
            installations,
            data,
            timestamp: now,
        };
        self.store.replace_entry(&entry).await?;

        info!("Cached measurements for installation {}", id);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use airq_store::{MemoryStore, Slot};
    use airq_types::{
        Address, AirQualityCategory, AveragedValues, ForecastEntry, Installation,
        MeasurementPayload, MeasurementValue, Pollutant,
    };
    use time::macros::datetime;

    use crate::mock::{ManualClock, MockSensorApi};

    const NOW: i64 = 1_700_000_000;
    const HERE: Coordinate = Coordinate::new(50.06, 19.94);

    type TestService = AirQualityService<Arc<MockSensorApi>, Arc<MemoryStore>, Arc<ManualClock>>;

    struct Harness {
        api: Arc<MockSensorApi>,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        service: TestService,
    }

    fn harness(api: MockSensorApi) -> Harness {
        let api = Arc::new(api);
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let service =
            AirQualityService::with_clock(Arc::clone(&api), Arc::clone(&store), Arc::clone(&clock));
        Harness {
            api,
            store,
            clock,
            service,
        }
    }

    fn cached_entry(pm25: f64, timestamp: i64) -> CacheEntry {
        CacheEntry {
            installations: vec![Installation {
                id: 101,
                address: Address {
                    city: "Wrocław".to_string(),
                    street: None,
                },
                location: Coordinate::new(50.06, 19.94),
                elevation: None,
                sponsor: None,
            }],
            data: MeasurementPayload {
                current: AveragedValues {
                    values: vec![
                        MeasurementValue::new("PM25", pm25),
                        MeasurementValue::new("PM10", 20.0),
                    ],
                    ..Default::default()
                },
                forecast: vec![ForecastEntry {
                    from_date_time: datetime!(2023-11-14 23:00 UTC),
                    till_date_time: None,
                    values: vec![
                        MeasurementValue::new("PM25", 14.0),
                        MeasurementValue::new("PM10", 22.0),
                    ],
                }],
            },
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_is_served_without_fetching() {
        let h = harness(MockSensorApi::new());
        h.store
            .replace_entry(&cached_entry(12.0, NOW - 100))
            .await
            .unwrap();

        let report = h.service.query(HERE).await.unwrap();

        assert!(report.from_cache);
        assert_eq!(report.classification.category, AirQualityCategory::VeryGood);
        assert_eq!(report.sensor.city, "Wrocław");
        assert_eq!(report.fetched_at, NOW - 100);
        let forecast = report.forecast.unwrap();
        assert_eq!(forecast.timestamps, vec!["14.11 11:00"]);
        assert_eq!(h.api.nearest_calls(), 0);
        assert_eq!(h.api.measurement_calls(), 0);
    }

    #[tokio::test]
    async fn test_absent_cache_refreshes_and_writes() {
        let h = harness(
            MockSensorApi::builder()
                .installation_id(7)
                .pm25(40.0)
                .pm10(30.0)
                .build(),
        );

        let report = h.service.query(HERE).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.fetched_at, NOW);
        assert_eq!(
            report.reading(Pollutant::Pm25).unwrap().percent_of_standard,
            160
        );
        assert_eq!(
            report.reading(Pollutant::Pm10).unwrap().percent_of_standard,
            60
        );
        assert_eq!(report.classification.category, AirQualityCategory::Moderate);

        let written = h.service.cached_entry().await.unwrap().unwrap();
        assert_eq!(written.installations[0].id, 7);
        assert_eq!(written.timestamp, NOW);
        assert_eq!(written.data.current.get(Pollutant::Pm25), Some(40.0));
        assert_eq!(h.api.nearest_calls(), 1);
        assert_eq!(h.api.measurement_calls(), 1);
    }

    #[tokio::test]
    async fn test_two_queries_in_window_fetch_once() {
        let h = harness(MockSensorApi::new());

        h.service.query(HERE).await.unwrap();
        h.clock.advance(300);
        let second = h.service.query(HERE).await.unwrap();

        assert!(second.from_cache);
        assert_eq!(h.api.nearest_calls(), 1);
        assert_eq!(h.api.measurement_calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refreshed() {
        let h = harness(MockSensorApi::new());

        h.service.query(HERE).await.unwrap();
        h.clock.advance(301);
        let second = h.service.query(HERE).await.unwrap();

        assert!(!second.from_cache);
        assert_eq!(second.fetched_at, NOW + 301);
        assert_eq!(h.api.nearest_calls(), 2);
    }

    #[tokio::test]
    async fn test_custom_window() {
        let h = harness(MockSensorApi::new());
        let service = h.service.with_options(QueryOptions {
            policy: StalenessPolicy::new(60),
            ..Default::default()
        });

        service.query(HERE).await.unwrap();
        h.clock.advance(61);
        service.query(HERE).await.unwrap();

        assert_eq!(h.api.nearest_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_installations_leaves_cache_untouched() {
        let h = harness(MockSensorApi::builder().no_installations().build());
        let stale = cached_entry(12.0, NOW - 1000);
        h.store.replace_entry(&stale).await.unwrap();

        let err = h.service.query(HERE).await.unwrap_err();

        assert!(matches!(err, Error::RemoteApi { ref message, .. } if message == "no installation found"));
        assert_eq!(h.api.measurement_calls(), 0);
        assert_eq!(h.service.cached_entry().await.unwrap(), Some(stale));
    }

    #[tokio::test]
    async fn test_measurement_failure_leaves_cache_untouched() {
        let h = harness(MockSensorApi::new());
        h.api.set_fail_measurements(true, Some("upstream down")).await;
        let stale = cached_entry(12.0, NOW - 1000);
        h.store.replace_entry(&stale).await.unwrap();

        let err = h.service.query(HERE).await.unwrap_err();

        assert!(matches!(err, Error::RemoteApi { .. }));
        assert_eq!(h.api.nearest_calls(), 1);
        assert_eq!(h.service.cached_entry().await.unwrap(), Some(stale));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_malformed_and_not_cached() {
        let payload = MeasurementPayload {
            current: AveragedValues {
                values: vec![MeasurementValue::new("", 12.0)],
                ..Default::default()
            },
            forecast: Vec::new(),
        };
        let h = harness(MockSensorApi::builder().payload(payload).build());

        let err = h.service.query(HERE).await.unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_pm25_reports_unknown() {
        let h = harness(MockSensorApi::builder().pm25(None).pm10(30.0).build());

        let report = h.service.query(HERE).await.unwrap();

        assert!(report.classification.category.is_unknown());
        assert!(report.forecast.is_none());
        assert_eq!(report.current_readings.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_are_unavailable_position() {
        let h = harness(MockSensorApi::new());

        let err = h
            .service
            .query(Coordinate::new(f64::NAN, 19.94))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::GeolocationUnavailable(GeolocationError::PositionUnavailable)
        ));
        assert_eq!(h.api.nearest_calls(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_slot_forces_refresh() {
        let h = harness(MockSensorApi::new());
        h.store
            .replace_entry(&cached_entry(12.0, NOW - 10))
            .await
            .unwrap();
        h.store
            .set(Slot::Installations, serde_json::json!({"not": "a list"}))
            .await
            .unwrap();

        let report = h.service.query(HERE).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(h.api.nearest_calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_empty_installations_forces_refresh() {
        let h = harness(MockSensorApi::new());
        let mut entry = cached_entry(12.0, NOW - 10);
        entry.installations.clear();
        h.store.replace_entry(&entry).await.unwrap();

        let report = h.service.query(HERE).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.sensor.city, "Kraków");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let h = harness(MockSensorApi::new());
        h.service.query(HERE).await.unwrap();

        h.service.invalidate().await.unwrap();
        assert!(h.service.cached_entry().await.unwrap().is_none());

        h.service.query(HERE).await.unwrap();
        assert_eq!(h.api.nearest_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_queries_share_one_refresh() {
        let h = harness(
            MockSensorApi::builder()
                .latency(Duration::from_millis(200))
                .build(),
        );

        let queries = (0..8).map(|_| h.service.query(HERE));
        let reports = futures::future::join_all(queries).await;

        assert!(reports.iter().all(|r| r.is_ok()));
        let fresh = reports
            .iter()
            .filter(|r| matches!(r, Ok(report) if !report.from_cache))
            .count();
        assert_eq!(fresh, 1);
        assert_eq!(h.api.nearest_calls(), 1);
        assert_eq!(h.api.measurement_calls(), 1);
    }

    /// Store that pauses after its first installations read. Uses the
    /// provided `read_slots`.
    struct PausingStore {
        inner: MemoryStore,
        paused: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl CacheStore for PausingStore {
        async fn get(&self, slot: Slot) -> airq_store::Result<Option<serde_json::Value>> {
            let value = self.inner.get(slot).await?;
            if slot == Slot::Installations
                && !self.paused.swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(value)
        }
        async fn set(&self, slot: Slot, value: serde_json::Value) -> airq_store::Result<()> {
            self.inner.set(slot, value).await
        }
        async fn clear(&self) -> airq_store::Result<()> {
            self.inner.clear().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reader_racing_a_refresh_sees_one_generation() {
        let store = PausingStore {
            inner: MemoryStore::new(),
            paused: Default::default(),
        };
        store
            .inner
            .replace_entry(&cached_entry(90.0, NOW - 400))
            .await
            .unwrap();
        let api = Arc::new(MockSensorApi::builder().pm25(12.0).build());
        let service =
            AirQualityService::with_clock(Arc::clone(&api), store, ManualClock::new(NOW));

        let (first, second) = tokio::join!(service.query(HERE), service.query(HERE));
        let (first, second) = (first.unwrap(), second.unwrap());

        for report in [&first, &second] {
            assert_eq!(report.sensor.city, "Kraków");
            assert_eq!(report.fetched_at, NOW);
            assert_eq!(
                report.reading(Pollutant::Pm25).map(|r| r.value),
                Some(12.0)
            );
        }
        assert_eq!(api.nearest_calls(), 1);
    }

    #[tokio::test]
    async fn test_with_classifier() {
        let h = harness(MockSensorApi::builder().pm25(12.0).build());
        let table: ClassifierTable = serde_json::from_value(serde_json::json!({
            "bands": [{
                "lower": 10.0, "upper": 20.0, "category": "POOR",
                "description": "strict", "color": "#123456"
            }]
        }))
        .unwrap();
        let service = h.service.with_classifier(table);

        let report = service.query(HERE).await.unwrap();
        assert_eq!(report.classification.category, AirQualityCategory::Poor);
        assert_eq!(report.classification.color, "#123456");
    }
}
