//! Check command implementation.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use airq_core::{AirQualityService, AirlyClient, SensorApi};
use airq_store::{CacheStore, MemoryStore, SqliteStore};
use airq_types::Coordinate;

use crate::cli::{CheckArgs, OutputFormat};
use crate::config::Config;
use crate::format::{
    FormatOptions, format_failure_json, format_failure_text, format_report_json,
    format_report_text,
};
use crate::geo::{ConfiguredLocation, Geolocator};

/// Execute the check command.
///
/// Failures the user should see (denied location, API errors) are printed
/// as a failure report and turned into a non-zero exit code. Setup problems
/// such as a missing API key are returned as errors.
pub async fn cmd_check(args: CheckArgs, config: &Config, opts: &FormatOptions) -> Result<ExitCode> {
    let explicit = args
        .lat
        .zip(args.lon)
        .map(|(lat, lon)| Coordinate::new(lat, lon));
    let geo = ConfiguredLocation::new(explicit, config.location.clone());

    let coords = match geo.current_position().await {
        Ok(coords) => coords,
        Err(e) => {
            warn!("Location not available: {}", e);
            return print_failure(&airq_core::Error::from(e), args.format, opts);
        }
    };
    debug!("Checking air quality near {}", coords);

    let api_key = match args.api_key.or_else(|| config.api.api_key.clone()) {
        Some(key) if !key.trim().is_empty() => key,
        _ => bail!(
            "No Airly API key configured. Pass --api-key, set AIRLY_API_KEY, \
             or add api_key to the [api] section of the config file."
        ),
    };

    let api = AirlyClient::with_timeout(&config.api.base_url, &api_key, config.api.timeout())
        .context("Failed to create Airly client")?;

    if args.memory {
        run_query(api, MemoryStore::new(), coords, args.format, config, opts).await
    } else {
        let store = SqliteStore::open(&config.cache.path).with_context(|| {
            format!("Failed to open cache at {}", config.cache.path.display())
        })?;
        run_query(api, store, coords, args.format, config, opts).await
    }
}

async fn run_query<A: SensorApi, S: CacheStore>(
    api: A,
    store: S,
    coords: Coordinate,
    format: OutputFormat,
    config: &Config,
    opts: &FormatOptions,
) -> Result<ExitCode> {
    let service = AirQualityService::new(api, store).with_options(config.query_options());

    match service.query(coords).await {
        Ok(report) => {
            let content = match format {
                OutputFormat::Json => format_report_json(&report, opts)?,
                OutputFormat::Text => format_report_text(&report, opts),
            };
            print!("{}", content);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Query failed: {}", e);
            print_failure(&e, format, opts)
        }
    }
}

fn print_failure(
    error: &airq_core::Error,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<ExitCode> {
    let failure = error.report();
    match format {
        OutputFormat::Json => print!("{}", format_failure_json(&failure, opts)?),
        OutputFormat::Text => eprint!("{}", format_failure_text(&failure, opts)),
    }
    Ok(ExitCode::FAILURE)
}
