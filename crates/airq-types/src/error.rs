//! Error types for payload validation in airq-types.

use thiserror::Error;

/// Errors raised when a payload received from the sensor API does not
/// match the shape the rest of the workspace relies on.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// Latitude or longitude is out of range or not finite.
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate {
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },

    /// A measurement value is NaN or infinite.
    #[error("Non-finite value for {name}")]
    NonFiniteValue {
        /// Name of the measurement (e.g. `PM25`).
        name: String,
    },

    /// A required field is empty.
    #[error("Missing field: {0}")]
    MissingField(String),
}

/// Result type alias using airq-types' ValidationError type.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
