//! Core types for air-quality sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ValidationError, ValidationResult};

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within range.
    ///
    /// ```
    /// use airq_types::Coordinate;
    ///
    /// assert!(Coordinate::new(50.06, 19.94).is_valid());
    /// assert!(!Coordinate::new(91.0, 0.0).is_valid());
    /// assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    /// ```
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Return `self` if valid, otherwise a [`ValidationError`].
    pub fn validate(self) -> ValidationResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ValidationError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Identifier of a sensor installation as assigned by the remote API.
pub type InstallationId = i64;

/// Postal address of an installation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Address {
    /// City name.
    pub city: String,
    /// Street name, when the installation has one.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub street: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.street {
            Some(street) if !street.is_empty() => write!(f, "{}, {}", self.city, street),
            _ => write!(f, "{}", self.city),
        }
    }
}

/// Organisation that funds an installation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sponsor {
    /// Display name of the sponsor.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

/// A physical air-quality sensor site.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Installation {
    /// Installation identifier.
    pub id: InstallationId,
    /// Where the installation is.
    pub address: Address,
    /// Geographic position of the sensor.
    pub location: Coordinate,
    /// Elevation above sea level in metres.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub elevation: Option<f64>,
    /// Sponsor of the installation.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub sponsor: Option<Sponsor>,
}

impl Installation {
    /// Check the fields the query flow depends on.
    pub fn validate(&self) -> ValidationResult<()> {
        self.location.validate()?;
        if self.address.city.trim().is_empty() {
            return Err(ValidationError::MissingField(format!(
                "installations[{}].address.city",
                self.id
            )));
        }
        Ok(())
    }
}

/// A single named measurement, e.g. `{"name": "PM25", "value": 12.3}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementValue {
    /// Measurement name as reported by the API (`PM1`, `PM25`, `PM10`, ...).
    pub name: String,
    /// Measured value.
    pub value: f64,
}

impl MeasurementValue {
    /// Create a new measurement value.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The pollutant this value measures, if it is one we track.
    pub fn pollutant(&self) -> Option<Pollutant> {
        Pollutant::from_name(&self.name)
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingField("values[].name".to_string()));
        }
        if !self.value.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Averaged values for the current measurement window.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AveragedValues {
    /// Start of the averaging window.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            with = "time::serde::rfc3339::option",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub from_date_time: Option<OffsetDateTime>,
    /// End of the averaging window.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            with = "time::serde::rfc3339::option",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub till_date_time: Option<OffsetDateTime>,
    /// Measured values in API order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub values: Vec<MeasurementValue>,
}

impl AveragedValues {
    /// Find a value by pollutant.
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        find_value(&self.values, pollutant)
    }
}

/// One forecast window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ForecastEntry {
    /// Start of the forecast window.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub from_date_time: OffsetDateTime,
    /// End of the forecast window.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            with = "time::serde::rfc3339::option",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub till_date_time: Option<OffsetDateTime>,
    /// Forecast values in API order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub values: Vec<MeasurementValue>,
}

impl ForecastEntry {
    /// Find a value by pollutant.
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        find_value(&self.values, pollutant)
    }
}

fn find_value(values: &[MeasurementValue], pollutant: Pollutant) -> Option<f64> {
    values
        .iter()
        .find(|v| v.pollutant() == Some(pollutant))
        .map(|v| v.value)
}

/// Measurements for one installation: the current window plus a forecast.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementPayload {
    /// Current averaged values.
    pub current: AveragedValues,
    /// Forecast windows, oldest first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub forecast: Vec<ForecastEntry>,
}

impl MeasurementPayload {
    /// Check that every value has a name and a finite number.
    pub fn validate(&self) -> ValidationResult<()> {
        for value in &self.current.values {
            value.validate()?;
        }
        for entry in &self.forecast {
            for value in &entry.values {
                value.validate()?;
            }
        }
        Ok(())
    }
}

/// The single cached entry: nearest installations, their measurements, and
/// the unix time (seconds) at which they were fetched.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheEntry {
    /// Installations returned by the nearest-installation search.
    pub installations: Vec<Installation>,
    /// Measurements for the first installation.
    pub data: MeasurementPayload,
    /// Fetch time in seconds since the unix epoch.
    pub timestamp: i64,
}

/// Particulate matter pollutants tracked by reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Pollutant {
    /// Particles up to 2.5 µm.
    #[cfg_attr(feature = "serde", serde(rename = "PM25"))]
    Pm25,
    /// Particles up to 10 µm.
    #[cfg_attr(feature = "serde", serde(rename = "PM10"))]
    Pm10,
}

impl Pollutant {
    /// All tracked pollutants in report order.
    pub const ALL: [Pollutant; 2] = [Pollutant::Pm25, Pollutant::Pm10];

    /// Match an API measurement name.
    ///
    /// ```
    /// use airq_types::Pollutant;
    ///
    /// assert_eq!(Pollutant::from_name("PM25"), Some(Pollutant::Pm25));
    /// assert_eq!(Pollutant::from_name("PM10"), Some(Pollutant::Pm10));
    /// assert_eq!(Pollutant::from_name("PM1"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PM25" => Some(Pollutant::Pm25),
            "PM10" => Some(Pollutant::Pm10),
            _ => None,
        }
    }

    /// Name used by the API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM25",
            Pollutant::Pm10 => "PM10",
        }
    }

    /// WHO 24-hour reference concentration in µg/m³.
    pub fn who_standard(&self) -> f64 {
        match self {
            Pollutant::Pm25 => 25.0,
            Pollutant::Pm10 => 50.0,
        }
    }

    /// Percentage of the WHO reference, rounded half away from zero.
    ///
    /// ```
    /// use airq_types::Pollutant;
    ///
    /// assert_eq!(Pollutant::Pm25.percent_of_standard(40.0), 160);
    /// assert_eq!(Pollutant::Pm10.percent_of_standard(30.0), 60);
    /// ```
    pub fn percent_of_standard(&self, value: f64) -> i64 {
        (value / self.who_standard() * 100.0).round() as i64
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pollutant::Pm25 => write!(f, "PM2.5"),
            Pollutant::Pm10 => write!(f, "PM10"),
        }
    }
}

/// Qualitative air-quality category.
///
/// # Display vs Serialization
///
/// `Display` returns human-readable labels ("Very good", "Poor"), while serde
/// uses the upper-case variant names ("VERY_GOOD", "POOR").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[non_exhaustive]
pub enum AirQualityCategory {
    VeryGood,
    Good,
    Moderate,
    Sufficient,
    Poor,
    VeryPoor,
    /// Value outside every known band, or no PM2.5 reading at all.
    Unknown,
}

impl AirQualityCategory {
    /// Whether this is the [`AirQualityCategory::Unknown`] category.
    pub fn is_unknown(&self) -> bool {
        matches!(self, AirQualityCategory::Unknown)
    }
}

impl fmt::Display for AirQualityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AirQualityCategory::VeryGood => "Very good",
            AirQualityCategory::Good => "Good",
            AirQualityCategory::Moderate => "Moderate",
            AirQualityCategory::Sufficient => "Sufficient",
            AirQualityCategory::Poor => "Poor",
            AirQualityCategory::VeryPoor => "Very poor",
            AirQualityCategory::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Classifier verdict for a PM2.5 concentration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassificationResult {
    /// Category.
    pub category: AirQualityCategory,
    /// One-sentence advice for the category.
    pub description: String,
    /// Display color as a `#RRGGBB` string.
    pub color: String,
}

/// A current reading in a report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    /// Concentration in µg/m³.
    pub value: f64,
    /// Rounded percentage of the WHO reference.
    pub percent_of_standard: i64,
}

/// Where the reporting sensor is relative to the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SensorSummary {
    pub city: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub street: Option<String>,
    /// Distance from the caller, rounded to whole kilometres.
    pub distance_km: i64,
}

/// Aligned forecast series. All vectors have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Forecast {
    /// Window start labels, formatted `dd.MM hh:mm`.
    pub timestamps: Vec<String>,
    pub pm25_series: Vec<f64>,
    pub pm10_series: Vec<f64>,
    /// Classifier color for each PM2.5 value.
    pub pm25_colors: Vec<String>,
}

impl Forecast {
    /// Number of forecast windows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the forecast has no windows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Final output of an air-quality query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AirQualityReport {
    /// PM2.5 then PM10, whichever are present.
    pub current_readings: Vec<PollutantReading>,
    pub classification: ClassificationResult,
    pub sensor: SensorSummary,
    /// Omitted when the classification is unknown.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub forecast: Option<Forecast>,
    /// Whether the data came from the cache rather than a fresh fetch.
    pub from_cache: bool,
    /// Unix time (seconds) at which the underlying data was fetched.
    pub fetched_at: i64,
}

impl AirQualityReport {
    /// Look up a current reading by pollutant.
    pub fn reading(&self, pollutant: Pollutant) -> Option<&PollutantReading> {
        self.current_readings
            .iter()
            .find(|r| r.pollutant == pollutant)
    }
}
