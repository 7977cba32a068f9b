//! Cached air-quality lookups for the nearest sensor.
//!
//! This crate answers "how is the air near me?" from a short-lived local
//! cache, refreshing it from a remote sensor network when it goes stale.
//!
//! # Features
//!
//! - **Query service**: cache check, single-flight refresh, report assembly
//! - **Staleness policy**: 300 second freshness window, configurable
//! - **Classifier**: PM2.5 bands mapped to category, advice and color
//! - **Distance**: haversine great-circle distance to the sensor
//! - **Airly client**: HTTP client for the Airly v2 API (`airly` feature)
//! - **Mocks**: in-process sensor API and manual clock for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use airq_core::AirQualityService;
//! use airq_core::airly::AirlyClient;
//! use airq_store::SqliteStore;
//! use airq_types::Coordinate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = AirlyClient::new("https://airapi.airly.eu", "my-api-key")?;
//!     let store = SqliteStore::open_default()?;
//!     let service = AirQualityService::new(api, store);
//!
//!     let report = service.query(Coordinate::new(50.0614, 19.9366)).await?;
//!     println!(
//!         "{} ({} km away): {}",
//!         report.sensor.city, report.sensor.distance_km, report.classification.category
//!     );
//!     Ok(())
//! }
//! ```

#[cfg(feature = "airly")]
pub mod airly;
pub mod api;
pub mod classifier;
pub mod clock;
pub mod distance;
pub mod error;
pub mod mock;
pub mod report;
pub mod service;
pub mod staleness;

pub use api::SensorApi;
pub use classifier::{Band, ClassifierTable, classify};
pub use clock::{Clock, SystemClock};
pub use distance::{EARTH_RADIUS_KM, distance_km};
pub use error::{Error, FailureReport, GeolocationError, Result, Severity};
pub use mock::{ManualClock, MockSensorApi, MockSensorApiBuilder};
pub use report::build_report;
pub use service::{AirQualityService, QueryOptions};
pub use staleness::{FRESHNESS_WINDOW_SECS, StalenessPolicy, is_fresh};

#[cfg(feature = "airly")]
pub use airly::AirlyClient;

// Re-export from airq-types
pub use airq_types::{
    AirQualityCategory, AirQualityReport, CacheEntry, ClassificationResult, Coordinate, Forecast,
    Installation, MeasurementPayload, Pollutant, PollutantReading, SensorSummary,
};
