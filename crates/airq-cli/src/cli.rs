//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "airq")]
#[command(author, version, about = "Air quality at the sensor nearest to you", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "AIRQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report the air quality near you
    Check(CheckArgs),

    /// Inspect or clear the local measurement cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `airq check`
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Latitude in decimal degrees (overrides the configured location)
    #[arg(long, requires = "lon", allow_hyphen_values = true, value_parser = parse_latitude)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees (overrides the configured location)
    #[arg(long, requires = "lat", allow_hyphen_values = true, value_parser = parse_longitude)]
    pub lon: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Keep the cache in memory for this run instead of on disk
    #[arg(long)]
    pub memory: bool,

    /// Airly API key (overrides the configured key)
    #[arg(long, env = "AIRLY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Cache subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum CacheAction {
    /// Show what is cached and how old it is
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Delete the cached entry
    Clear,
    /// Print the cache database path
    Path,
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

fn parse_coordinate(s: &str, name: &str, limit: f64) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid {}", s, name))?;

    if !value.is_finite() || !(-limit..=limit).contains(&value) {
        return Err(format!(
            "{} must be between -{} and {}, got {}",
            name, limit, limit, value
        ));
    }
    Ok(value)
}

/// Parse latitude with range validation
fn parse_latitude(s: &str) -> Result<f64, String> {
    parse_coordinate(s, "latitude", 90.0)
}

/// Parse longitude with range validation
fn parse_longitude(s: &str) -> Result<f64, String> {
    parse_coordinate(s, "longitude", 180.0)
}
