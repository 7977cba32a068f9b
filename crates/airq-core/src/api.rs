//! Trait abstraction for the remote sensor network.
//!
//! [`SensorApi`] is implemented by the HTTP client
//! ([`crate::airly::AirlyClient`]) and by [`crate::mock::MockSensorApi`] for
//! tests, so the query service never depends on the network directly.

use std::sync::Arc;

use async_trait::async_trait;

use airq_types::{Coordinate, Installation, InstallationId, MeasurementPayload};

use crate::error::Result;

/// Remote source of installations and their measurements.
///
/// # Example
///
/// ```ignore
/// use airq_core::{SensorApi, Result};
/// use airq_types::Coordinate;
///
/// async fn nearest_city<A: SensorApi>(api: &A, here: Coordinate) -> Result<Option<String>> {
///     let found = api.nearest_installations(here, 30.0, 1).await?;
///     Ok(found.first().map(|i| i.address.city.clone()))
/// }
/// ```
#[async_trait]
pub trait SensorApi: Send + Sync {
    /// Installations within `radius_km` of `coords`, nearest first, at most
    /// `limit` of them. An empty list is not an error at this level.
    async fn nearest_installations(
        &self,
        coords: Coordinate,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<Installation>>;

    /// Current values and forecast for one installation.
    async fn installation_measurements(&self, id: InstallationId) -> Result<MeasurementPayload>;
}

#[async_trait]
impl<T: SensorApi + ?Sized> SensorApi for Arc<T> {
    async fn nearest_installations(
        &self,
        coords: Coordinate,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<Installation>> {
        (**self).nearest_installations(coords, radius_km, limit).await
    }

    async fn installation_measurements(&self, id: InstallationId) -> Result<MeasurementPayload> {
        (**self).installation_measurements(id).await
    }
}
