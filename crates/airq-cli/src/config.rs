//! Configuration file management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use airq_core::airly::DEFAULT_BASE_URL;
use airq_core::{QueryOptions, StalenessPolicy};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API settings.
    pub api: ApiConfig,
    /// Nearest-installation search settings.
    pub search: SearchConfig,
    /// Local cache settings.
    pub cache: CacheConfig,
    /// Where the user is.
    pub location: LocationConfig,
}

impl Config {
    /// Load configuration from the default path, or defaults if absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_or_default(default_config_path())
    }

    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every error found.
    ///
    /// # Example
    ///
    /// ```
    /// use airq_cli::config::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.api.validate());
        errors.extend(self.search.validate());
        errors.extend(self.cache.validate());
        errors.extend(self.location.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file, or defaults if absent.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Query options derived from the search and cache sections.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            radius_km: self.search.radius_km,
            max_results: self.search.max_results,
            policy: StalenessPolicy::new(self.cache.freshness_secs),
        }
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Airly API.
    pub base_url: String,
    /// API key; `AIRLY_API_KEY` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate API configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(ValidationError {
                field: "api.base_url".to_string(),
                message: format!(
                    "invalid URL '{}': must start with http:// or https://",
                    self.base_url
                ),
            });
        }

        if let Some(key) = &self.api_key
            && key.trim().is_empty()
        {
            errors.push(ValidationError {
                field: "api.api_key".to_string(),
                message: "API key cannot be empty (remove the line instead)".to_string(),
            });
        }

        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            errors.push(ValidationError {
                field: "api.timeout_secs".to_string(),
                message: format!(
                    "timeout {} is out of range (1-{} seconds)",
                    self.timeout_secs, MAX_TIMEOUT_SECS
                ),
            });
        }

        errors
    }
}

/// Maximum request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Nearest-installation search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search radius in kilometres.
    pub radius_km: f64,
    /// Maximum installations requested.
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let options = QueryOptions::default();
        Self {
            radius_km: options.radius_km,
            max_results: options.max_results,
        }
    }
}

impl SearchConfig {
    /// Validate search configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            errors.push(ValidationError {
                field: "search.radius_km".to_string(),
                message: format!("radius must be a positive number, got {}", self.radius_km),
            });
        }

        if self.max_results == 0 {
            errors.push(ValidationError {
                field: "search.max_results".to_string(),
                message: "max_results must be at least 1".to_string(),
            });
        }

        errors
    }
}

/// Local cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Seconds a cached entry stays fresh.
    pub freshness_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: airq_store::default_db_path(),
            freshness_secs: airq_core::FRESHNESS_WINDOW_SECS,
        }
    }
}

impl CacheConfig {
    /// Validate cache configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "cache.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        if self.freshness_secs < 0 {
            errors.push(ValidationError {
                field: "cache.freshness_secs".to_string(),
                message: format!(
                    "freshness window cannot be negative, got {}",
                    self.freshness_secs
                ),
            });
        }

        errors
    }
}

/// Location configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Whether the configured location may be used.
    pub share: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            share: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl LocationConfig {
    /// Validate location configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        match (self.latitude, self.longitude) {
            (Some(lat), _) if !(-90.0..=90.0).contains(&lat) => errors.push(ValidationError {
                field: "location.latitude".to_string(),
                message: format!("latitude must be between -90 and 90, got {}", lat),
            }),
            (Some(_), None) => errors.push(ValidationError {
                field: "location.longitude".to_string(),
                message: "longitude is required when latitude is set".to_string(),
            }),
            (None, Some(_)) => errors.push(ValidationError {
                field: "location.latitude".to_string(),
                message: "latitude is required when longitude is set".to_string(),
            }),
            _ => {}
        }

        if let Some(lon) = self.longitude
            && !(-180.0..=180.0).contains(&lon)
        {
            errors.push(ValidationError {
                field: "location.longitude".to_string(),
                message: format!("longitude must be between -180 and 180, got {}", lon),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The field path (e.g., `api.base_url` or `location.latitude`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airq")
        .join("config.toml")
}
