use chrono::NaiveDate;

use super::{DataError, ExogenousDataset, SeriesKind};
use crate::sim::types::EpisodeConfig;

/// Checks that `dataset` covers the whole episode at the expected cadence.
///
/// Row counts are checked first (spot series need `max_episode_steps + 1`
/// rows, hourly forecasts `floor(steps * dt_hours) + 1`), then every instant
/// the episode will visit is resolved once so gaps inside a correctly sized
/// series fail here instead of mid-episode.
///
/// # Errors
///
/// Returns [`DataError::Incomplete`] naming the first short series, or the
/// lookup error for the first instant that cannot be resolved.
pub fn validate_episode_data(
    dataset: &ExogenousDataset,
    episode: &EpisodeConfig,
    coverage: Option<(NaiveDate, NaiveDate)>,
) -> Result<(), DataError> {
    let spot = episode.expected_spot_rows();
    let forecast = episode.expected_forecast_rows();

    let counts = [
        (SeriesKind::Lmp, dataset.lmp.len(), spot),
        (SeriesKind::Load, dataset.load.len(), spot),
        (SeriesKind::Moer, dataset.moer.len(), spot),
        (SeriesKind::LoadForecast, dataset.load_forecast.len(), forecast),
        (SeriesKind::SolarWindForecast, dataset.solar_wind_forecast.len(), forecast),
    ];
    for (series, actual, expected) in counts {
        if actual != expected {
            return Err(DataError::Incomplete {
                series,
                start: episode.start,
                expected,
                actual,
                available: available_note(coverage),
            });
        }
    }

    for step in 0..=episode.max_episode_steps {
        dataset.snapshot_at(episode.instant_at(step))?;
    }
    Ok(())
}

fn available_note(coverage: Option<(NaiveDate, NaiveDate)>) -> String {
    match coverage {
        Some((from, to)) => format!("data is available for {from} to {to}"),
        None => "the provider did not report a valid date range".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Interval, RenewableForecast, TimeSeries};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
    }

    fn spot(n: usize) -> TimeSeries<f64> {
        (0..n)
            .map(|k| {
                let start = t0() + Duration::minutes(5 * k as i64);
                Interval::new(start, start + Duration::minutes(5), 1.0)
            })
            .collect()
    }

    fn hourly<V: Copy>(n: usize, v: V) -> TimeSeries<V> {
        (0..n)
            .map(|h| {
                let start = t0() + Duration::hours(h as i64);
                Interval::new(start, start + Duration::hours(1), v)
            })
            .collect()
    }

    fn full_day() -> ExogenousDataset {
        ExogenousDataset {
            lmp: spot(289),
            load: spot(289),
            load_forecast: hourly(25, 1.0),
            moer: spot(289),
            solar_wind_forecast: hourly(25, RenewableForecast { solar_mw: 1.0, wind_mw: 1.0 }),
        }
    }

    fn day() -> EpisodeConfig {
        EpisodeConfig::new(t0(), 288, 300, 0)
    }

    #[test]
    fn complete_day_passes() {
        assert!(validate_episode_data(&full_day(), &day(), None).is_ok());
    }

    #[test]
    fn short_spot_series_is_rejected() {
        let mut ds = full_day();
        ds.load = spot(287);
        let coverage = Some((
            NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
        ));
        let err = validate_episode_data(&ds, &day(), coverage).unwrap_err();
        match &err {
            DataError::Incomplete { series, expected, actual, available, .. } => {
                assert_eq!(*series, SeriesKind::Load);
                assert_eq!(*expected, 289);
                assert_eq!(*actual, 287);
                assert!(available.contains("2021-10-01 to 2024-09-30"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_forecast_series_is_rejected() {
        let mut ds = full_day();
        ds.solar_wind_forecast = hourly(24, RenewableForecast { solar_mw: 1.0, wind_mw: 1.0 });
        let err = validate_episode_data(&ds, &day(), None).unwrap_err();
        assert!(matches!(
            err,
            DataError::Incomplete { series: SeriesKind::SolarWindForecast, expected: 25, actual: 24, .. }
        ));
    }

    #[test]
    fn correct_count_with_a_gap_is_rejected() {
        let mut ds = full_day();
        // drop the 00:10 sample and append one past the window end
        let mut rows: Vec<_> = ds.moer.rows().to_vec();
        rows.remove(2);
        let extra = t0() + Duration::minutes(5 * 289);
        rows.push(Interval::new(extra, extra + Duration::minutes(5), 1.0));
        ds.moer = TimeSeries::new(rows);

        let err = validate_episode_data(&ds, &day(), None).unwrap_err();
        assert!(matches!(err, DataError::MissingSample { series: SeriesKind::Moer, .. }));
    }
}
