//! PM2.5 classification.
//!
//! A [`ClassifierTable`] is an ordered list of concentration bands, each
//! mapping to a category, an advice sentence and a display color. Bands are
//! lower-bound inclusive and upper-bound exclusive; the first match wins and
//! anything outside every band is [`AirQualityCategory::Unknown`].
//!
//! # Example
//!
//! ```
//! use airq_core::classifier::{ClassifierTable, classify};
//! use airq_types::AirQualityCategory;
//!
//! assert_eq!(classify(12.0).category, AirQualityCategory::VeryGood);
//! assert_eq!(classify(13.0).category, AirQualityCategory::Good);
//! assert_eq!(classify(-1.0).category, AirQualityCategory::Unknown);
//!
//! let table = ClassifierTable::default();
//! assert_eq!(table.classify(80.0).category, AirQualityCategory::Poor);
//! ```

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use airq_types::{AirQualityCategory, ClassificationResult};

/// Color used for readings that fall outside every band.
pub const UNKNOWN_COLOR: &str = "#9E9E9E";

static DEFAULT_TABLE: LazyLock<ClassifierTable> = LazyLock::new(ClassifierTable::default);

/// One concentration band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Inclusive lower bound in µg/m³.
    pub lower: f64,
    /// Exclusive upper bound in µg/m³.
    pub upper: f64,
    pub category: AirQualityCategory,
    pub description: String,
    pub color: String,
}

impl Band {
    fn new(
        lower: f64,
        upper: f64,
        category: AirQualityCategory,
        description: &str,
        color: &str,
    ) -> Self {
        Self {
            lower,
            upper,
            category,
            description: description.to_string(),
            color: color.to_string(),
        }
    }

    /// Whether `value` falls inside this band. NaN is never inside.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }

    fn result(&self) -> ClassificationResult {
        ClassificationResult {
            category: self.category,
            description: self.description.clone(),
            color: self.color.clone(),
        }
    }
}

/// Ordered table of PM2.5 bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierTable {
    bands: Vec<Band>,
}

impl Default for ClassifierTable {
    /// Polish air-quality index bands for PM2.5, as used by the Airly network.
    fn default() -> Self {
        use AirQualityCategory::*;

        Self::new(vec![
            Band::new(
                0.0,
                13.0,
                VeryGood,
                "Air quality is very good. A perfect time for outdoor activities.",
                "#57B108",
            ),
            Band::new(
                13.0,
                35.0,
                Good,
                "Air quality is good. Enjoy outdoor activities.",
                "#B0DD10",
            ),
            Band::new(
                35.0,
                55.0,
                Moderate,
                "Air quality is acceptable. Sensitive people should limit long outdoor exertion.",
                "#FFD911",
            ),
            Band::new(
                55.0,
                75.0,
                Sufficient,
                "Air quality is sufficient. Consider limiting time spent outdoors.",
                "#E58100",
            ),
            Band::new(
                75.0,
                110.0,
                Poor,
                "Air quality is poor. Avoid outdoor activities and keep windows closed.",
                "#E50000",
            ),
            Band::new(
                110.0,
                1000.0,
                VeryPoor,
                "Air quality is very poor. Stay indoors if you can.",
                "#990000",
            ),
        ])
    }
}

impl ClassifierTable {
    /// Create a table from bands, checked in the given order.
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// The bands, in match order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Classify a PM2.5 concentration. Never fails.
    pub fn classify(&self, pm25: f64) -> ClassificationResult {
        self.bands
            .iter()
            .find(|band| band.contains(pm25))
            .map(Band::result)
            .unwrap_or_else(Self::unknown)
    }

    /// The result used when no band matches or no PM2.5 value exists.
    pub fn unknown() -> ClassificationResult {
        ClassificationResult {
            category: AirQualityCategory::Unknown,
            description: "No air quality classification is available for this reading."
                .to_string(),
            color: UNKNOWN_COLOR.to_string(),
        }
    }
}

/// Classify a PM2.5 concentration with the default table.
pub fn classify(pm25: f64) -> ClassificationResult {
    DEFAULT_TABLE.classify(pm25)
}
