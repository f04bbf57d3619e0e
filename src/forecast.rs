//! Alignment of hourly forecasts to the 5-minute control cadence.

use chrono::{DateTime, Duration, Utc};

use crate::data::{DataError, SeriesKind, TimeSeries};

/// How far ahead of the current instant a forecast is read, in minutes.
///
/// A step at `hh:55` therefore already sees the bucket for the next hour.
pub const FORECAST_LOOKAHEAD_MINUTES: i64 = 5;

/// Returns the value of the single forecast bucket whose
/// `[interval_start, interval_end)` window contains `current + 5 minutes`.
///
/// # Errors
///
/// Fails fast with [`DataError::NoForecastBucket`] when no bucket covers the
/// target instant and [`DataError::AmbiguousForecastBucket`] when buckets
/// overlap there.
pub fn forecast_at<V: Copy>(
    series: &TimeSeries<V>,
    kind: SeriesKind,
    current: DateTime<Utc>,
) -> Result<V, DataError> {
    let target = current + Duration::minutes(FORECAST_LOOKAHEAD_MINUTES);
    match series.covering(target).as_slice() {
        [row] => Ok(row.value),
        [] => Err(DataError::NoForecastBucket {
            series: kind,
            at: target,
        }),
        rows => Err(DataError::AmbiguousForecastBucket {
            series: kind,
            at: target,
            count: rows.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Interval;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
    }

    fn hourly(n: usize) -> TimeSeries<f64> {
        (0..n)
            .map(|h| {
                let start = t0() + Duration::hours(h as i64);
                Interval::new(start, start + Duration::hours(1), h as f64)
            })
            .collect()
    }

    #[test]
    fn reads_current_bucket_inside_the_hour() {
        let s = hourly(3);
        let v = forecast_at(&s, SeriesKind::LoadForecast, t0()).unwrap();
        assert_eq!(v, 0.0);
        let v = forecast_at(&s, SeriesKind::LoadForecast, t0() + Duration::minutes(54)).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn five_minute_lookahead_crosses_the_hour() {
        let s = hourly(3);
        let v = forecast_at(&s, SeriesKind::LoadForecast, t0() + Duration::minutes(55)).unwrap();
        assert_eq!(v, 1.0);
        let v = forecast_at(&s, SeriesKind::LoadForecast, t0() + Duration::minutes(60)).unwrap();
        assert_eq!(v, 1.0);
    }

    #[test]
    fn last_step_of_a_day_reads_the_extra_bucket() {
        let s = hourly(25);
        let v = forecast_at(&s, SeriesKind::LoadForecast, t0() + Duration::hours(24)).unwrap();
        assert_eq!(v, 24.0);
    }

    #[test]
    fn gap_fails_fast() {
        let s = hourly(1);
        let err = forecast_at(&s, SeriesKind::SolarWindForecast, t0() + Duration::minutes(55))
            .unwrap_err();
        match err {
            DataError::NoForecastBucket { series, at } => {
                assert_eq!(series, SeriesKind::SolarWindForecast);
                assert_eq!(at, t0() + Duration::hours(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn overlap_fails_fast() {
        let mut rows = hourly(2).rows().to_vec();
        rows.push(Interval::new(
            t0() + Duration::minutes(30),
            t0() + Duration::minutes(90),
            9.0,
        ));
        let s = TimeSeries::new(rows);
        let err = forecast_at(&s, SeriesKind::LoadForecast, t0() + Duration::minutes(40))
            .unwrap_err();
        assert!(matches!(err, DataError::AmbiguousForecastBucket { count: 2, .. }));
    }
}
