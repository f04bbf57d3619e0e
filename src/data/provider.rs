use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use super::series::{Interval, TimeSeries, parse_timestamp};
use super::{DataError, ExogenousDataset, RenewableForecast, SeriesKind};

/// Source of exogenous series for an episode.
///
/// Implementations return every series filtered to rows whose
/// `interval_start` lies in `[start, end)`, sorted by time and normalized to
/// UTC. Row-count and cadence checks belong to the validation layer.
pub trait DataProvider {
    /// Fetches all five series for the half-open window `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns a `DataError` if the underlying data cannot be read or parsed.
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ExogenousDataset, DataError>;

    /// Calendar range the provider holds data for, when known.
    fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        None
    }
}

/// File names of the five series, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub lmp: PathBuf,
    pub load: PathBuf,
    pub load_forecast: PathBuf,
    pub moer: PathBuf,
    pub solar_wind_forecast: PathBuf,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            lmp: PathBuf::from("lmp/caiso_5min_rtm_sp15_lmp_20211001_20240930"),
            load: PathBuf::from("load/caiso_5min_load_20211001_20240930"),
            load_forecast: PathBuf::from(
                "load_forecast/caiso_hourly_load_forecast_20211001_20240930",
            ),
            moer: PathBuf::from("moer/caiso_sdge_5min_moer_v2_20211001_20240930"),
            solar_wind_forecast: PathBuf::from(
                "solar_wind_forecast/caiso_sp15_hourly_solar_wind_forecast_20211001_20240930",
            ),
        }
    }
}

/// Reads exogenous series from delimited text files.
///
/// Each file needs `interval_start` and `interval_end` columns plus its value
/// column(s): `lmp`, `load`, `load_forecast`, `moer`, and `solar_mw` /
/// `wind_mw` for the renewable forecast. Other columns are ignored.
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    dir: PathBuf,
    files: DataFiles,
    coverage: Option<(NaiveDate, NaiveDate)>,
}

impl CsvDataProvider {
    /// Creates a provider reading the default file layout under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: DataFiles::default(),
            coverage: None,
        }
    }

    /// Overrides the file names.
    pub fn with_files(mut self, files: DataFiles) -> Self {
        self.files = files;
        self
    }

    /// Records the calendar range the files are known to cover.
    pub fn with_coverage(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.coverage = Some((from, to));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn scalar(
        &self,
        kind: SeriesKind,
        file: &Path,
        column: &str,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<TimeSeries<f64>, DataError> {
        read_series(&self.dir.join(file), kind, [column], window, |[v]| v)
    }
}

impl DataProvider for CsvDataProvider {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ExogenousDataset, DataError> {
        let window = (start, end);
        let files = &self.files;

        Ok(ExogenousDataset {
            lmp: self.scalar(SeriesKind::Lmp, &files.lmp, "lmp", window)?,
            load: self.scalar(SeriesKind::Load, &files.load, "load", window)?,
            load_forecast: self.scalar(
                SeriesKind::LoadForecast,
                &files.load_forecast,
                "load_forecast",
                window,
            )?,
            moer: self.scalar(SeriesKind::Moer, &files.moer, "moer", window)?,
            solar_wind_forecast: read_series(
                &self.dir.join(&files.solar_wind_forecast),
                SeriesKind::SolarWindForecast,
                ["solar_mw", "wind_mw"],
                window,
                |[solar_mw, wind_mw]| RenewableForecast { solar_mw, wind_mw },
            )?,
        })
    }

    fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.coverage
    }
}

/// Reads one series, keeping rows whose interval starts inside `window`.
///
/// Values are only parsed for rows inside the window.
fn read_series<V, const N: usize>(
    path: &Path,
    kind: SeriesKind,
    value_columns: [&str; N],
    window: (DateTime<Utc>, DateTime<Utc>),
    to_value: impl Fn([f64; N]) -> V,
) -> Result<TimeSeries<V>, DataError> {
    let csv_err = |source| DataError::Csv {
        series: kind,
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().from_path(path).map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn {
                series: kind,
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let start_idx = column("interval_start")?;
    let end_idx = column("interval_end")?;
    let mut value_idx = [0usize; N];
    for (slot, name) in value_idx.iter_mut().zip(value_columns) {
        *slot = column(name)?;
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, csv::Position::line);
        let timestamp = |idx: usize| {
            let raw = record.get(idx).unwrap_or_default();
            parse_timestamp(raw).ok_or_else(|| DataError::InvalidTimestamp {
                series: kind,
                path: path.to_path_buf(),
                line,
                value: raw.to_string(),
            })
        };

        let start = timestamp(start_idx)?;
        if start < window.0 || start >= window.1 {
            continue;
        }
        let end = timestamp(end_idx)?;

        let mut values = [0.0; N];
        for (value, (&idx, name)) in values.iter_mut().zip(value_idx.iter().zip(value_columns)) {
            let raw = record.get(idx).unwrap_or_default().trim();
            *value = raw.parse::<f64>().map_err(|_| DataError::InvalidValue {
                series: kind,
                path: path.to_path_buf(),
                line,
                column: name.to_string(),
                value: raw.to_string(),
            })?;
        }
        rows.push(Interval::new(start, end, to_value(values)));
    }

    debug!(series = %kind, path = %path.display(), rows = rows.len(), "read series");
    Ok(TimeSeries::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "{}_provider_{name}_{}",
            env!("CARGO_CRATE_NAME"),
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_and_windows_a_scalar_series() {
        let dir = scratch_dir("scalar");
        let path = dir.join("lmp.csv");
        fs::write(
            &path,
            ",interval_start,interval_end,location,lmp\n\
             0,2021-09-30 23:55:00+00:00,2021-10-01 00:00:00+00:00,SP15,10.0\n\
             1,2021-10-01 00:05:00+00:00,2021-10-01 00:10:00+00:00,SP15,12.5\n\
             2,2021-09-30 17:00:00-07:00,2021-09-30 17:05:00-07:00,SP15,11.0\n\
             3,2021-10-01 00:10:00+00:00,2021-10-01 00:15:00+00:00,SP15,not-a-number\n",
        )
        .unwrap();

        let series = read_series(
            &path,
            SeriesKind::Lmp,
            ["lmp"],
            (t0(), t0() + Duration::minutes(10)),
            |[v]| v,
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        // the -07:00 row is normalized to 00:00 UTC and sorted first
        assert_eq!(series.rows()[0].start, t0());
        assert_eq!(series.rows()[0].value, 11.0);
        assert_eq!(series.rows()[1].value, 12.5);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reports_missing_value_column() {
        let dir = scratch_dir("missing_column");
        let path = dir.join("load.csv");
        fs::write(
            &path,
            "interval_start,interval_end,demand\n2021-10-01 00:00:00+00:00,2021-10-01 00:05:00+00:00,1\n",
        )
        .unwrap();

        let err = read_series(&path, SeriesKind::Load, ["load"], (t0(), t0() + Duration::hours(1)), |[v]| v)
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "load"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reports_bad_value_inside_window() {
        let dir = scratch_dir("bad_value");
        let path = dir.join("moer.csv");
        fs::write(
            &path,
            "interval_start,interval_end,moer\n2021-10-01 00:00:00+00:00,2021-10-01 00:05:00+00:00,\n",
        )
        .unwrap();

        let err = read_series(&path, SeriesKind::Moer, ["moer"], (t0(), t0() + Duration::hours(1)), |[v]| v)
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { line: 2, .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_a_csv_error() {
        let provider = CsvDataProvider::new("/nonexistent/storage_env");
        let err = provider.fetch(t0(), t0() + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, DataError::Csv { series: SeriesKind::Lmp, .. }));
    }

    #[test]
    fn coverage_is_reported_when_configured() {
        let from = NaiveDate::from_ymd_opt(2021, 10, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let provider = CsvDataProvider::new("data").with_coverage(from, to);
        assert_eq!(provider.coverage(), Some((from, to)));
        assert_eq!(CsvDataProvider::new("data").coverage(), None);
    }
}
