//! Resolving the caller's position.

use async_trait::async_trait;

use airq_core::GeolocationError;
use airq_types::Coordinate;

use crate::config::LocationConfig;

/// Source of the caller's current position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current position, or why it is unavailable.
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// Position taken from the command line or the configuration file.
///
/// Explicit coordinates always win. Otherwise the configured location is
/// used if sharing is enabled.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    explicit: Option<Coordinate>,
    config: LocationConfig,
}

impl ConfiguredLocation {
    pub fn new(explicit: Option<Coordinate>, config: LocationConfig) -> Self {
        Self { explicit, config }
    }
}

#[async_trait]
impl Geolocator for ConfiguredLocation {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        if let Some(coords) = self.explicit {
            return Ok(coords);
        }
        if !self.config.share {
            return Err(GeolocationError::PermissionDenied);
        }
        match (self.config.latitude, self.config.longitude) {
            (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)),
            _ => Err(GeolocationError::PositionUnavailable),
        }
    }
}
