//! Error types for airq-core.
//!
//! Every failure of [`crate::AirQualityService::query`] is one of the
//! variants below. None of them is retried and none of them touches the
//! cache: the store is only cleared after both remote calls succeeded.
//!
//! | Error | Cause | Shown as |
//! |-------|-------|----------|
//! | [`Error::GeolocationUnavailable`] | permission denied, no usable position | warning |
//! | [`Error::RemoteApi`] | network failure, non-2xx status, no installation nearby | error |
//! | [`Error::MalformedResponse`] | payload shape or validation mismatch | error |
//! | [`Error::Store`] | local cache database failure | error |
//! | [`Error::InvalidConfig`] | bad base URL or missing API key | error |
//!
//! [`Error::report`] converts any error into the [`FailureReport`] that the
//! caller renders.

use serde::Serialize;
use thiserror::Error;

use airq_types::ValidationError;

/// Why the caller's position could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    /// The user refused to share their location.
    #[error("User denied geolocation")]
    PermissionDenied,
    /// No position could be determined.
    #[error("Position unavailable")]
    PositionUnavailable,
}

/// Errors that can occur while answering an air-quality query.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller's position is not available.
    #[error("Geolocation unavailable: {0}")]
    GeolocationUnavailable(#[from] GeolocationError),

    /// The remote sensor API failed or returned nothing usable.
    #[error("Remote API error: {message}")]
    RemoteApi {
        /// Description of the failure.
        message: String,
        /// HTTP status, when the server answered.
        status: Option<u16>,
    },

    /// A payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The cache store failed.
    #[error("Cache store error: {0}")]
    Store(#[from] airq_store::Error),

    /// Client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::MalformedResponse(err.to_string())
    }
}

impl Error {
    /// Create a [`Error::RemoteApi`] without an HTTP status.
    pub fn remote(message: impl Into<String>) -> Self {
        Error::RemoteApi {
            message: message.into(),
            status: None,
        }
    }

    /// Whether the user refused to share their location.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Error::GeolocationUnavailable(GeolocationError::PermissionDenied)
        )
    }

    /// Convert into the report shown to the user.
    pub fn report(&self) -> FailureReport {
        match self {
            Error::GeolocationUnavailable(GeolocationError::PermissionDenied) => FailureReport {
                severity: Severity::Warning,
                title: "Please grant location access".to_string(),
                message: "We need it to search for air quality sensors near you.".to_string(),
            },
            Error::GeolocationUnavailable(GeolocationError::PositionUnavailable) => {
                FailureReport {
                    severity: Severity::Warning,
                    title: "Location unavailable".to_string(),
                    message: "Your position could not be determined. Provide coordinates \
                              explicitly and try again."
                        .to_string(),
                }
            }
            other => FailureReport {
                severity: Severity::Error,
                title: "Something went wrong!".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// How a failure should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The user can fix this (e.g. grant location access).
    Warning,
    /// Anything else.
    Error,
}

/// Caller-visible description of a failed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Result type alias using airq-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_a_warning_with_guidance() {
        let err = Error::from(GeolocationError::PermissionDenied);

        assert!(err.is_permission_denied());
        let report = err.report();
        assert_eq!(report.severity, Severity::Warning);
        assert_eq!(report.title, "Please grant location access");
        assert!(report.message.contains("search for air quality sensors"));
    }

    #[test]
    fn test_position_unavailable_is_a_warning() {
        let err = Error::from(GeolocationError::PositionUnavailable);

        assert!(!err.is_permission_denied());
        assert_eq!(err.report().severity, Severity::Warning);
    }

    #[test]
    fn test_other_errors_are_generic() {
        let err = Error::remote("no installation found");
        let report = err.report();

        assert_eq!(report.severity, Severity::Error);
        assert_eq!(report.title, "Something went wrong!");
        assert_eq!(report.message, "Remote API error: no installation found");
    }

    #[test]
    fn test_validation_error_becomes_malformed_response() {
        let err: Error = ValidationError::MissingField("current".to_string()).into();
        assert!(matches!(err, Error::MalformedResponse(ref m) if m.contains("current")));
    }

    #[test]
    fn test_failure_report_serialization() {
        let json = serde_json::to_string(&Error::remote("boom").report()).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(json.contains("\"title\":\"Something went wrong!\""));
    }
}
