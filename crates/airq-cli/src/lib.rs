//! Command-line client reporting the air quality at the nearest sensor.
//!
//! The CLI asks the Airly API for the installation nearest to the user,
//! classifies its PM2.5 reading and prints the current readings, the
//! sensor location and a short forecast. Results are cached on disk and
//! reused for five minutes.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `check` | Report the air quality near you |
//! | `cache show` | Show what is cached and how old it is |
//! | `cache clear` | Delete the cached entry |
//! | `cache path` | Print the cache database path |
//! | `config show` | Show the effective configuration |
//! | `config init` | Write a default configuration file |
//! | `config path` | Print the configuration file path |
//!
//! # Configuration
//!
//! The CLI reads `~/.config/airq/config.toml` (or platform equivalent):
//!
//! ```toml
//! [api]
//! base_url = "https://airapi.airly.eu"
//! timeout_secs = 10
//!
//! [search]
//! radius_km = 30.0
//! max_results = 1
//!
//! [cache]
//! freshness_secs = 300
//!
//! [location]
//! share = true
//! latitude = 50.0614
//! longitude = 19.9366
//! ```
//!
//! # Environment Variables
//!
//! - `AIRLY_API_KEY`: API key (overridden by `--api-key`)
//! - `AIRQ_CONFIG`: Configuration file path (overridden by `--config`)
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! ```bash
//! airq check --lat 50.0614 --lon 19.9366
//! airq check --format json
//! airq cache show
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod geo;
