//! Turns a cached entry into the report shown to the caller.

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use airq_types::{
    AirQualityReport, CacheEntry, Coordinate, Forecast, ForecastEntry, Pollutant,
    PollutantReading, SensorSummary,
};

use crate::classifier::ClassifierTable;
use crate::distance::distance_km;
use crate::error::{Error, Result};

/// `dd.MM hh:mm` with a 12-hour clock.
const FORECAST_LABEL: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month] [hour repr:12]:[minute]");

/// Build the report for `coords` from an entry.
///
/// Current readings keep PM2.5 before PM10 and ignore every other pollutant.
/// The classification uses PM2.5; without it the category is unknown and no
/// forecast is attached.
pub fn build_report(
    coords: Coordinate,
    entry: &CacheEntry,
    from_cache: bool,
    classifier: &ClassifierTable,
) -> Result<AirQualityReport> {
    let installation = entry
        .installations
        .first()
        .ok_or_else(|| Error::remote("no installation found"))?;

    let current_readings: Vec<PollutantReading> = Pollutant::ALL
        .into_iter()
        .filter_map(|pollutant| {
            entry
                .data
                .current
                .get(pollutant)
                .map(|value| PollutantReading {
                    pollutant,
                    value,
                    percent_of_standard: pollutant.percent_of_standard(value),
                })
        })
        .collect();

    let classification = match entry.data.current.get(Pollutant::Pm25) {
        Some(pm25) => classifier.classify(pm25),
        None => ClassifierTable::unknown(),
    };

    let forecast = if classification.category.is_unknown() {
        None
    } else {
        Some(build_forecast(&entry.data.forecast, classifier)?)
    };

    Ok(AirQualityReport {
        current_readings,
        classification,
        sensor: SensorSummary {
            city: installation.address.city.clone(),
            street: installation.address.street.clone(),
            distance_km: distance_km(coords, installation.location).round() as i64,
        },
        forecast,
        from_cache,
        fetched_at: entry.timestamp,
    })
}

/// Align the forecast windows into parallel series.
///
/// Windows missing either PM2.5 or PM10 are skipped entirely so that labels
/// and values stay index-aligned.
pub fn build_forecast(entries: &[ForecastEntry], classifier: &ClassifierTable) -> Result<Forecast> {
    let mut forecast = Forecast::default();

    for entry in entries {
        let (Some(pm25), Some(pm10)) = (entry.get(Pollutant::Pm25), entry.get(Pollutant::Pm10))
        else {
            continue;
        };

        forecast.timestamps.push(forecast_label(entry.from_date_time)?);
        forecast.pm25_series.push(pm25);
        forecast.pm10_series.push(pm10);
        forecast.pm25_colors.push(classifier.classify(pm25).color);
    }

    Ok(forecast)
}

/// Format a window start as `dd.MM hh:mm` in its own offset.
///
/// The API sends UTC timestamps, so labels are UTC wall-clock times. They
/// are not converted to the local offset.
pub fn forecast_label(at: OffsetDateTime) -> Result<String> {
    at.format(FORECAST_LABEL)
        .map_err(|e| Error::MalformedResponse(format!("cannot format forecast time: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airq_types::{
        Address, AirQualityCategory, AveragedValues, Installation, MeasurementPayload,
        MeasurementValue,
    };
    use time::macros::datetime;

    fn entry(current: Vec<MeasurementValue>, forecast: Vec<ForecastEntry>) -> CacheEntry {
        CacheEntry {
            installations: vec![Installation {
                id: 7,
                address: Address {
                    city: "Kraków".to_string(),
                    street: Some("Mikołajska".to_string()),
                },
                location: Coordinate::new(50.062006, 19.940984),
                elevation: None,
                sponsor: None,
            }],
            data: MeasurementPayload {
                current: AveragedValues {
                    values: current,
                    ..Default::default()
                },
                forecast,
            },
            timestamp: 1_700_000_000,
        }
    }

    fn window(from: OffsetDateTime, values: &[(&str, f64)]) -> ForecastEntry {
        ForecastEntry {
            from_date_time: from,
            till_date_time: None,
            values: values
                .iter()
                .map(|(name, value)| MeasurementValue::new(*name, *value))
                .collect(),
        }
    }

    #[test]
    fn test_readings_are_filtered_and_ordered() {
        let e = entry(
            vec![
                MeasurementValue::new("PM1", 9.0),
                MeasurementValue::new("PM10", 30.0),
                MeasurementValue::new("TEMPERATURE", 4.5),
                MeasurementValue::new("PM25", 40.0),
            ],
            Vec::new(),
        );

        let report = build_report(
            Coordinate::new(50.062006, 19.940984),
            &e,
            false,
            &ClassifierTable::default(),
        )
        .unwrap();

        let pollutants: Vec<_> = report.current_readings.iter().map(|r| r.pollutant).collect();
        assert_eq!(pollutants, vec![Pollutant::Pm25, Pollutant::Pm10]);
        assert_eq!(report.current_readings[0].percent_of_standard, 160);
        assert_eq!(report.current_readings[1].percent_of_standard, 60);
        assert_eq!(report.classification.category, AirQualityCategory::Moderate);
        assert_eq!(report.sensor.distance_km, 0);
        assert_eq!(report.fetched_at, 1_700_000_000);
        assert!(!report.from_cache);
    }

    #[test]
    fn test_missing_pm25_is_unknown_without_forecast() {
        let e = entry(
            vec![MeasurementValue::new("PM10", 30.0)],
            vec![window(datetime!(2024-01-15 13:00 UTC), &[("PM25", 10.0), ("PM10", 20.0)])],
        );

        let report = build_report(
            Coordinate::new(50.0, 19.9),
            &e,
            true,
            &ClassifierTable::default(),
        )
        .unwrap();

        assert_eq!(report.classification.category, AirQualityCategory::Unknown);
        assert!(report.forecast.is_none());
        assert_eq!(report.current_readings.len(), 1);
    }

    #[test]
    fn test_out_of_band_pm25_has_no_forecast() {
        let e = entry(vec![MeasurementValue::new("PM25", 1500.0)], Vec::new());
        let report = build_report(
            Coordinate::new(50.0, 19.9),
            &e,
            true,
            &ClassifierTable::default(),
        )
        .unwrap();

        assert!(report.classification.category.is_unknown());
        assert!(report.forecast.is_none());
    }

    #[test]
    fn test_known_category_always_has_forecast() {
        let e = entry(vec![MeasurementValue::new("PM25", 12.0)], Vec::new());
        let report = build_report(
            Coordinate::new(50.0, 19.9),
            &e,
            true,
            &ClassifierTable::default(),
        )
        .unwrap();

        assert_eq!(report.forecast, Some(Forecast::default()));
    }

    #[test]
    fn test_distance_is_rounded() {
        let e = entry(vec![MeasurementValue::new("PM25", 12.0)], Vec::new());
        // About 11.1 km due north of the installation
        let caller = Coordinate::new(50.162006, 19.940984);

        let report = build_report(caller, &e, true, &ClassifierTable::default()).unwrap();
        assert_eq!(report.sensor.distance_km, 11);
    }

    #[test]
    fn test_empty_installations_is_an_error() {
        let mut e = entry(vec![MeasurementValue::new("PM25", 12.0)], Vec::new());
        e.installations.clear();

        let err = build_report(
            Coordinate::new(50.0, 19.9),
            &e,
            true,
            &ClassifierTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::RemoteApi { .. }));
    }

    #[test]
    fn test_forecast_matches_values_by_name() {
        let entries = vec![
            window(datetime!(2024-01-15 13:00 UTC), &[("PM10", 50.0), ("PM25", 40.0)]),
            window(datetime!(2024-01-15 14:00 UTC), &[("PM25", 8.0), ("PM10", 15.0)]),
        ];

        let forecast = build_forecast(&entries, &ClassifierTable::default()).unwrap();

        assert_eq!(forecast.timestamps, vec!["15.01 01:00", "15.01 02:00"]);
        assert_eq!(forecast.pm25_series, vec![40.0, 8.0]);
        assert_eq!(forecast.pm10_series, vec![50.0, 15.0]);
        assert_eq!(forecast.pm25_colors, vec!["#FFD911", "#57B108"]);
    }

    #[test]
    fn test_forecast_skips_incomplete_windows() {
        let entries = vec![
            window(datetime!(2024-01-15 13:00 UTC), &[("PM25", 40.0)]),
            window(datetime!(2024-01-15 14:00 UTC), &[("PM25", 8.0), ("PM10", 15.0)]),
            window(datetime!(2024-01-15 15:00 UTC), &[]),
        ];

        let forecast = build_forecast(&entries, &ClassifierTable::default()).unwrap();

        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast.timestamps, vec!["15.01 02:00"]);
        assert_eq!(forecast.pm25_series.len(), forecast.pm10_series.len());
        assert_eq!(forecast.pm25_series.len(), forecast.pm25_colors.len());
    }

    #[test]
    fn test_forecast_label_is_not_shifted_to_another_offset() {
        let at = datetime!(2024-06-01 07:00 UTC);
        assert_eq!(forecast_label(at).unwrap(), "01.06 07:00");
        assert_eq!(
            forecast_label(at.to_offset(time::macros::offset!(+2))).unwrap(),
            "01.06 09:00"
        );
    }

    #[test]
    fn test_forecast_label_uses_twelve_hour_clock() {
        assert_eq!(
            forecast_label(datetime!(2024-03-05 00:30 UTC)).unwrap(),
            "05.03 12:30"
        );
        assert_eq!(
            forecast_label(datetime!(2024-12-31 23:05 UTC)).unwrap(),
            "31.12 11:05"
        );
        assert_eq!(
            forecast_label(datetime!(2024-06-01 09:00 +02:00)).unwrap(),
            "01.06 09:00"
        );
    }
}
