//! Platform-agnostic types for air-quality sensor data.
//!
//! This crate provides the shared data model used by the cache store
//! (airq-store), the query engine (airq-core) and the command-line client
//! (airq-cli).
//!
//! # Features
//!
//! - Coordinates and sensor installations
//! - Measurement payloads as returned by the sensor API
//! - The cached entry triple
//! - Classification results and the final report
//! - Validation errors for payloads received over the network
//!
//! # Example
//!
//! ```
//! use airq_types::{Coordinate, Pollutant};
//!
//! let krakow = Coordinate::new(50.0614, 19.9366);
//! assert!(krakow.is_valid());
//! assert_eq!(Pollutant::Pm25.percent_of_standard(12.5), 50);
//! ```

pub mod error;
pub mod types;

pub use error::{ValidationError, ValidationResult};
pub use types::{
    Address, AirQualityCategory, AirQualityReport, AveragedValues, CacheEntry,
    ClassificationResult, Coordinate, Forecast, ForecastEntry, Installation, InstallationId,
    MeasurementPayload, MeasurementValue, Pollutant, PollutantReading, SensorSummary, Sponsor,
};
