//! Example: Checking the Air Near a Position
//!
//! This example queries the Airly API for the installation nearest to the
//! given coordinates and prints the classification and current readings.
//! The result is cached in memory, so the second query is served locally.
//!
//! Run with: `AIRLY_API_KEY=... cargo run --example check_air -- <LAT> <LON>`

use std::env;

use airq_core::AirQualityService;
use airq_core::airly::{AirlyClient, DEFAULT_BASE_URL};
use airq_store::MemoryStore;
use airq_types::Coordinate;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <LATITUDE> <LONGITUDE>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} 50.0614 19.9366", args[0]);
        std::process::exit(1);
    }
    let coords = Coordinate::new(args[1].parse()?, args[2].parse()?);

    let api_key = env::var("AIRLY_API_KEY").map_err(|_| "AIRLY_API_KEY is not set")?;
    let api = AirlyClient::new(DEFAULT_BASE_URL, &api_key)?;
    let service = AirQualityService::new(api, MemoryStore::new());

    let report = match service.query(coords).await {
        Ok(report) => report,
        Err(e) => {
            let failure = e.report();
            eprintln!("{}: {}", failure.title, failure.message);
            std::process::exit(1);
        }
    };

    println!(
        "Sensor: {} ({} km away)",
        report.sensor.city, report.sensor.distance_km
    );
    println!("Air quality: {}", report.classification.category);
    println!("  {}", report.classification.description);
    println!();
    for reading in &report.current_readings {
        println!(
            "  {:<6} {:>6.1} µg/m³  {:>4}% of WHO standard",
            reading.pollutant.to_string(),
            reading.value,
            reading.percent_of_standard
        );
    }

    if let Some(forecast) = &report.forecast {
        println!();
        println!("Forecast ({} windows):", forecast.len());
        for (i, label) in forecast.timestamps.iter().enumerate() {
            println!(
                "  {}  PM2.5 {:>6.1}  PM10 {:>6.1}",
                label, forecast.pm25_series[i], forecast.pm10_series[i]
            );
        }
    }

    // Served from the in-memory cache
    let again = service.query(coords).await?;
    println!();
    println!("Second query served from cache: {}", again.from_cache);

    Ok(())
}
