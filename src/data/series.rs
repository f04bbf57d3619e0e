//! Interval-indexed time series.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// One row of an interval-indexed series, covering `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<V> {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: V,
}

impl<V> Interval<V> {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, value: V) -> Self {
        Self { start, end, value }
    }

    /// Returns `true` when `instant` falls inside `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Rows sorted by interval start. Duplicates are kept so that the
/// validation layer can report them.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<V> {
    rows: Vec<Interval<V>>,
}

impl<V> Default for TimeSeries<V> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<V> FromIterator<Interval<V>> for TimeSeries<V> {
    fn from_iter<I: IntoIterator<Item = Interval<V>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<V> TimeSeries<V> {
    /// Builds a series, sorting rows by interval start (stable).
    pub fn new(mut rows: Vec<Interval<V>>) -> Self {
        rows.sort_by_key(|r| r.start);
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Interval<V>] {
        &self.rows
    }

    /// Rows whose interval starts exactly at `instant`.
    pub fn starting_at(&self, instant: DateTime<Utc>) -> &[Interval<V>] {
        let lo = self.rows.partition_point(|r| r.start < instant);
        let hi = self.rows.partition_point(|r| r.start <= instant);
        &self.rows[lo..hi]
    }

    /// Rows whose `[start, end)` window contains `instant`.
    pub fn covering(&self, instant: DateTime<Utc>) -> Vec<&Interval<V>> {
        // rows starting after `instant` can never cover it
        let hi = self.rows.partition_point(|r| r.start <= instant);
        self.rows[..hi].iter().filter(|r| r.contains(instant)).collect()
    }
}

impl<V: Clone> TimeSeries<V> {
    /// Rows with `interval_start` in `[start, end)`.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let lo = self.rows.partition_point(|r| r.start < start);
        let hi = self.rows.partition_point(|r| r.start < end).max(lo);
        Self {
            rows: self.rows[lo..hi].to_vec(),
        }
    }
}

/// Parses a timestamp and normalizes it to UTC.
///
/// Accepts RFC 3339 (`T` or space separated), `YYYY-MM-DD HH:MM:SS±HH:MM`,
/// and offset-less forms which are read as UTC. A bare date means midnight
/// UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

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
    fn rows_are_sorted_on_construction() {
        let a = Interval::new(t0() + Duration::hours(1), t0() + Duration::hours(2), 1.0);
        let b = Interval::new(t0(), t0() + Duration::hours(1), 0.0);
        let s = TimeSeries::new(vec![a, b]);
        assert_eq!(s.rows()[0].value, 0.0);
        assert_eq!(s.rows()[1].value, 1.0);
    }

    #[test]
    fn window_is_half_open_on_start() {
        let s = hourly(48);
        let w = s.window(t0() + Duration::hours(2), t0() + Duration::hours(5));
        assert_eq!(w.len(), 3);
        assert_eq!(w.rows()[0].value, 2.0);
        assert_eq!(w.rows()[2].value, 4.0);
    }

    #[test]
    fn window_outside_data_is_empty() {
        let s = hourly(4);
        assert!(s.window(t0() + Duration::days(3), t0() + Duration::days(4)).is_empty());
        assert!(s.window(t0() + Duration::hours(3), t0()).is_empty());
    }

    #[test]
    fn starting_at_finds_exact_match() {
        let s = hourly(5);
        assert_eq!(s.starting_at(t0() + Duration::hours(3)).len(), 1);
        assert!(s.starting_at(t0() + Duration::minutes(30)).is_empty());
    }

    #[test]
    fn covering_respects_half_open_bucket() {
        let s = hourly(5);
        let hits = s.covering(t0() + Duration::minutes(59));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, 0.0);

        let hits = s.covering(t0() + Duration::hours(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, 1.0);
    }

    #[test]
    fn parses_common_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2021, 10, 1, 7, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2021-10-01T07:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2021-10-01 07:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-10-01 00:00:00-07:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-10-01 07:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-10-01"), Some(t0()));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
