//! Mock sensor API and clock for testing.
//!
//! [`MockSensorApi`] implements [`SensorApi`] from canned installations and
//! payloads, so the query service can be exercised without network access.
//!
//! # Features
//!
//! - **Call counters**: how many times each endpoint was hit
//! - **Failure injection**: make either endpoint fail with a message
//! - **Latency simulation**: delay every call to widen race windows
//!
//! [`ManualClock`] is a [`Clock`] whose time only moves when told to.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use airq_types::{
    Address, AveragedValues, Coordinate, Installation, InstallationId, MeasurementPayload,
    MeasurementValue,
};

use crate::api::SensorApi;
use crate::clock::Clock;
use crate::error::{Error, Result};

/// A mock sensor network.
///
/// # Example
///
/// ```
/// use airq_core::{MockSensorApi, SensorApi};
/// use airq_types::Coordinate;
///
/// #[tokio::main]
/// async fn main() {
///     let api = MockSensorApi::builder().installation_id(7).pm25(40.0).build();
///
///     let found = api
///         .nearest_installations(Coordinate::new(50.0, 19.9), 30.0, 1)
///         .await
///         .unwrap();
///     assert_eq!(found[0].id, 7);
///     assert_eq!(api.nearest_calls(), 1);
/// }
/// ```
pub struct MockSensorApi {
    installations: RwLock<Vec<Installation>>,
    payload: RwLock<MeasurementPayload>,
    nearest_calls: AtomicU32,
    measurement_calls: AtomicU32,
    fail_nearest: AtomicBool,
    fail_measurements: AtomicBool,
    fail_message: RwLock<String>,
    /// Simulated latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockSensorApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSensorApi")
            .field("nearest_calls", &self.nearest_calls())
            .field("measurement_calls", &self.measurement_calls())
            .finish()
    }
}

impl Default for MockSensorApi {
    fn default() -> Self {
        MockSensorApiBuilder::new().build()
    }
}

impl MockSensorApi {
    /// Create a mock with one installation in Kraków reporting PM2.5 = 12.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a mock.
    pub fn builder() -> MockSensorApiBuilder {
        MockSensorApiBuilder::new()
    }

    // --- Test control methods ---

    /// Replace the installations returned by the nearest search.
    pub async fn set_installations(&self, installations: Vec<Installation>) {
        *self.installations.write().await = installations;
    }

    /// Replace the measurement payload.
    pub async fn set_payload(&self, payload: MeasurementPayload) {
        *self.payload.write().await = payload;
    }

    /// Make the nearest-installation search fail.
    pub async fn set_fail_nearest(&self, fail: bool, message: Option<&str>) {
        self.fail_nearest.store(fail, Ordering::Relaxed);
        self.set_fail_message(message).await;
    }

    /// Make the measurement lookup fail.
    pub async fn set_fail_measurements(&self, fail: bool, message: Option<&str>) {
        self.fail_measurements.store(fail, Ordering::Relaxed);
        self.set_fail_message(message).await;
    }

    async fn set_fail_message(&self, message: Option<&str>) {
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Set simulated latency for every call.
    ///
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of nearest-installation searches performed.
    pub fn nearest_calls(&self) -> u32 {
        self.nearest_calls.load(Ordering::Relaxed)
    }

    /// Number of measurement lookups performed.
    pub fn measurement_calls(&self) -> u32 {
        self.measurement_calls.load(Ordering::Relaxed)
    }

    /// Reset both call counters.
    pub fn reset_calls(&self) {
        self.nearest_calls.store(0, Ordering::Relaxed);
        self.measurement_calls.store(0, Ordering::Relaxed);
    }

    async fn simulate(&self, fail: &AtomicBool) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if fail.load(Ordering::Relaxed) {
            Err(Error::remote(self.fail_message.read().await.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SensorApi for MockSensorApi {
    async fn nearest_installations(
        &self,
        _coords: Coordinate,
        _radius_km: f64,
        limit: u32,
    ) -> Result<Vec<Installation>> {
        self.nearest_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate(&self.fail_nearest).await?;

        let installations = self.installations.read().await;
        Ok(installations.iter().take(limit as usize).cloned().collect())
    }

    async fn installation_measurements(&self, id: InstallationId) -> Result<MeasurementPayload> {
        self.measurement_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate(&self.fail_measurements).await?;

        let known = self.installations.read().await.iter().any(|i| i.id == id);
        if !known {
            return Err(Error::RemoteApi {
                message: format!("Installation {id} not found"),
                status: Some(404),
            });
        }

        Ok(self.payload.read().await.clone())
    }
}

/// Builder for [`MockSensorApi`].
#[derive(Debug, Clone)]
pub struct MockSensorApiBuilder {
    installation: Option<Installation>,
    pm25: Option<f64>,
    pm10: Option<f64>,
    payload: Option<MeasurementPayload>,
    latency: Duration,
}

impl Default for MockSensorApiBuilder {
    fn default() -> Self {
        Self {
            installation: Some(MockSensorApiBuilder::default_installation()),
            pm25: Some(12.0),
            pm10: Some(20.0),
            payload: None,
            latency: Duration::ZERO,
        }
    }
}

impl MockSensorApiBuilder {
    /// Create a builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    fn default_installation() -> Installation {
        Installation {
            id: 8077,
            address: Address {
                city: "Kraków".to_string(),
                street: Some("Mikołajska".to_string()),
            },
            location: Coordinate::new(50.062006, 19.940984),
            elevation: Some(220.38),
            sponsor: None,
        }
    }

    /// Set the id of the single installation.
    #[must_use]
    pub fn installation_id(mut self, id: InstallationId) -> Self {
        if let Some(installation) = self.installation.as_mut() {
            installation.id = id;
        }
        self
    }

    /// Set the location of the single installation.
    #[must_use]
    pub fn location(mut self, location: Coordinate) -> Self {
        if let Some(installation) = self.installation.as_mut() {
            installation.location = location;
        }
        self
    }

    /// Return no installations from the nearest search.
    #[must_use]
    pub fn no_installations(mut self) -> Self {
        self.installation = None;
        self
    }

    /// Current PM2.5 value; `None` omits it.
    #[must_use]
    pub fn pm25(mut self, value: impl Into<Option<f64>>) -> Self {
        self.pm25 = value.into();
        self
    }

    /// Current PM10 value; `None` omits it.
    #[must_use]
    pub fn pm10(mut self, value: impl Into<Option<f64>>) -> Self {
        self.pm10 = value.into();
        self
    }

    /// Use a complete payload instead of the PM values.
    #[must_use]
    pub fn payload(mut self, payload: MeasurementPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Simulated latency for every call.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Build the mock.
    #[must_use]
    pub fn build(self) -> MockSensorApi {
        let payload = self.payload.unwrap_or_else(|| {
            let values = [("PM25", self.pm25), ("PM10", self.pm10)]
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| MeasurementValue::new(name, v)))
                .collect();

            MeasurementPayload {
                current: AveragedValues {
                    values,
                    ..Default::default()
                },
                forecast: Vec::new(),
            }
        });

        MockSensorApi {
            installations: RwLock::new(self.installation.into_iter().collect()),
            payload: RwLock::new(payload),
            nearest_calls: AtomicU32::new(0),
            measurement_calls: AtomicU32::new(0),
            fail_nearest: AtomicBool::new(false),
            fail_measurements: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            latency_ms: AtomicU64::new(self.latency.as_millis() as u64),
        }
    }
}

/// A [`Clock`] that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `now` (unix seconds).
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}
