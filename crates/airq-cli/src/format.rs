//! Output formatting for text and JSON.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use airq_core::{FailureReport, Severity, StalenessPolicy};
use airq_store::{CachedSlots, SlotInfo};
use airq_types::{AirQualityReport, ClassificationResult, Forecast, SensorSummary};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Parse a `#RRGGBB` color.
fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Paint `text` in a `#RRGGBB` color, or leave it plain.
fn paint(text: &str, hex: &str, no_color: bool) -> String {
    match parse_hex_color(hex) {
        Some((r, g, b)) if !no_color => text.truecolor(r, g, b).bold().to_string(),
        _ => text.to_string(),
    }
}

/// Format the classification label in its category color.
#[must_use]
pub fn format_category(classification: &ClassificationResult, no_color: bool) -> String {
    let label = format!("[{}]", classification.category);
    paint(&label, &classification.color, no_color)
}

/// "about 1 kilometer", "about 12 kilometers".
#[must_use]
pub fn format_distance(distance_km: i64) -> String {
    let unit = if distance_km <= 1 {
        "kilometer"
    } else {
        "kilometers"
    };
    format!("about {} {}", distance_km, unit)
}

#[must_use]
pub fn format_sensor_location(sensor: &SensorSummary) -> String {
    let place = match &sensor.street {
        Some(street) => format!("{}, {}", sensor.city, street),
        None => sensor.city.clone(),
    };
    format!(
        "Sensor location: {} ({} from you)",
        place,
        format_distance(sensor.distance_km)
    )
}

/// Format a unix timestamp as RFC 3339, falling back to the raw number.
#[must_use]
pub fn format_unix(timestamp: i64) -> String {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Format age in human-readable format
#[must_use]
pub fn format_age(seconds: i64) -> String {
    if seconds < 0 {
        "in the future".to_string()
    } else if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s ago", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m ago", seconds / 3600, (seconds % 3600) / 60)
    }
}

// ============================================================================
// Report formatting
// ============================================================================

#[must_use]
pub fn format_report_text(report: &AirQualityReport, opts: &FormatOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Air quality: {}\n",
        format_category(&report.classification, opts.no_color)
    ));
    output.push_str(&format!("  {}\n\n", report.classification.description));

    for reading in &report.current_readings {
        output.push_str(&format!(
            "{:<6} {:>7.1} µg/m³   {}% of the WHO standard\n",
            reading.pollutant.to_string(),
            reading.value,
            reading.percent_of_standard
        ));
    }
    if report.current_readings.is_empty() {
        output.push_str("No current readings\n");
    }

    output.push('\n');
    output.push_str(&format_sensor_location(&report.sensor));
    output.push('\n');

    if let Some(forecast) = &report.forecast {
        output.push('\n');
        output.push_str(&format_forecast_text(forecast, opts));
    }

    let source = if report.from_cache { "cached" } else { "fresh" };
    output.push_str(&format!(
        "\nData fetched at {} ({})\n",
        format_unix(report.fetched_at),
        source
    ));

    output
}

fn format_forecast_text(forecast: &Forecast, opts: &FormatOptions) -> String {
    if forecast.is_empty() {
        return "Forecast: none available\n".to_string();
    }

    let mut output = format!("Forecast ({} windows):\n", forecast.len());
    output.push_str(&format!("  {:<14} {:>8} {:>8}\n", "Time", "PM2.5", "PM10"));
    for i in 0..forecast.len() {
        let pm25 = format!("{:>8.1}", forecast.pm25_series[i]);
        output.push_str(&format!(
            "  {:<14} {} {:>8.1}\n",
            forecast.timestamps[i],
            paint(&pm25, &forecast.pm25_colors[i], opts.no_color),
            forecast.pm10_series[i]
        ));
    }
    output
}

pub fn format_report_json(report: &AirQualityReport, opts: &FormatOptions) -> Result<String> {
    opts.as_json(report)
}

// ============================================================================
// Failure formatting
// ============================================================================

#[must_use]
pub fn format_failure_text(failure: &FailureReport, opts: &FormatOptions) -> String {
    let title = if opts.no_color {
        failure.title.clone()
    } else {
        match failure.severity {
            Severity::Warning => failure.title.yellow().bold().to_string(),
            Severity::Error => failure.title.red().bold().to_string(),
        }
    };
    format!("{}\n{}\n", title, failure.message)
}

pub fn format_failure_json(failure: &FailureReport, opts: &FormatOptions) -> Result<String> {
    opts.as_json(failure)
}

// ============================================================================
// Cache formatting
// ============================================================================

/// Summary of the cached entry as shown by `airq cache show`.
#[derive(Debug, Serialize)]
pub struct CacheSummary {
    pub present: bool,
    pub fresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<i64>,
    pub installations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest: Option<String>,
    pub forecast_windows: usize,
    pub slots: Vec<SlotInfo>,
}

impl CacheSummary {
    pub fn new(
        slots: &CachedSlots,
        info: Vec<SlotInfo>,
        policy: &StalenessPolicy,
        now: i64,
    ) -> Self {
        let installations = slots.installations.as_deref().unwrap_or_default();
        let present = slots.entry_present() && !installations.is_empty();
        Self {
            present,
            fresh: policy.is_fresh(present, slots.timestamp, now),
            timestamp: slots.timestamp,
            age_secs: slots.timestamp.map(|ts| now.saturating_sub(ts)),
            installations: installations.len(),
            nearest: installations.first().map(|i| i.address.to_string()),
            forecast_windows: slots.data.as_ref().map_or(0, |d| d.forecast.len()),
            slots: info,
        }
    }
}

#[must_use]
pub fn format_cache_text(summary: &CacheSummary, opts: &FormatOptions) -> String {
    if summary.slots.is_empty() {
        return "Cache is empty. Run 'airq check' to fetch data.\n".to_string();
    }

    let mut output = String::new();
    let state = match (summary.present, summary.fresh) {
        (true, true) => "FRESH",
        (true, false) => "STALE",
        (false, _) => "INCOMPLETE",
    };
    let state = if opts.no_color {
        format!("[{}]", state)
    } else if summary.fresh {
        format!("[{}]", state.green())
    } else {
        format!("[{}]", state.yellow())
    };
    output.push_str(&format!("Cache:         {}\n", state));

    if let Some(ts) = summary.timestamp {
        output.push_str(&format!("Fetched at:    {}\n", format_unix(ts)));
    }
    if let Some(age) = summary.age_secs {
        output.push_str(&format!("Age:           {}\n", format_age(age)));
    }
    output.push_str(&format!("Installations: {}\n", summary.installations));
    if let Some(nearest) = &summary.nearest {
        output.push_str(&format!("Nearest:       {}\n", nearest));
    }
    output.push_str(&format!("Forecast:      {} windows\n", summary.forecast_windows));

    output.push_str("\nSlots:\n");
    for slot in &summary.slots {
        output.push_str(&format!(
            "  {:<18} {:>8} bytes  updated {}\n",
            slot.key,
            slot.size_bytes,
            slot.updated_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| slot.updated_at.to_string())
        ));
    }

    output
}

pub fn format_cache_json(summary: &CacheSummary, opts: &FormatOptions) -> Result<String> {
    opts.as_json(summary)
}
