//! Exogenous market, grid, and forecast data feeding the environment.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::forecast::forecast_at;

/// CSV-backed data provider.
pub mod provider;
pub mod series;
/// Completeness checks run before an environment becomes usable.
pub mod validation;

pub use provider::{CsvDataProvider, DataProvider};
pub use series::{Interval, TimeSeries};

/// The five exogenous series an episode needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Lmp,
    Load,
    LoadForecast,
    Moer,
    SolarWindForecast,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Lmp => "LMP",
            Self::Load => "load",
            Self::LoadForecast => "load forecast",
            Self::Moer => "MOER",
            Self::SolarWindForecast => "solar and wind forecast",
        };
        f.write_str(label)
    }
}

/// Day-ahead renewable generation forecast for one hourly bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenewableForecast {
    pub solar_mw: f64,
    pub wind_mw: f64,
}

/// Errors raised while reading, windowing, or looking up exogenous data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {series} data from \"{}\": {source}", path.display())]
    Csv {
        series: SeriesKind,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{series} data in \"{}\" has no `{column}` column", path.display())]
    MissingColumn {
        series: SeriesKind,
        path: PathBuf,
        column: String,
    },
    #[error("{series} data in \"{}\", line {line}: cannot parse timestamp \"{value}\"", path.display())]
    InvalidTimestamp {
        series: SeriesKind,
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("{series} data in \"{}\", line {line}: `{column}` value \"{value}\" is not a number", path.display())]
    InvalidValue {
        series: SeriesKind,
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error(
        "incomplete {series} data for the episode starting {start}: expected {expected} rows, found {actual}; {available}"
    )]
    Incomplete {
        series: SeriesKind,
        start: DateTime<Utc>,
        expected: usize,
        actual: usize,
        available: String,
    },
    #[error("{series} data has no sample starting at {at}")]
    MissingSample { series: SeriesKind, at: DateTime<Utc> },
    #[error("{series} data has {count} samples starting at {at}")]
    DuplicateSample {
        series: SeriesKind,
        at: DateTime<Utc>,
        count: usize,
    },
    #[error("{series} data has no forecast bucket covering {at}")]
    NoForecastBucket { series: SeriesKind, at: DateTime<Utc> },
    #[error("{series} data has {count} overlapping forecast buckets covering {at}")]
    AmbiguousForecastBucket {
        series: SeriesKind,
        at: DateTime<Utc>,
        count: usize,
    },
}

/// Exogenous values observed at one simulated instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExogenousSnapshot {
    pub lmp: f64,
    pub load: f64,
    pub load_forecast: f64,
    pub moer: f64,
    pub solar_forecast: f64,
    pub wind_forecast: f64,
}

/// Aligned exogenous series for one episode (or a wider span).
///
/// Spot series (`lmp`, `load`, `moer`) have 5-minute rows; forecast series
/// have hourly rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExogenousDataset {
    pub lmp: TimeSeries<f64>,
    pub load: TimeSeries<f64>,
    pub load_forecast: TimeSeries<f64>,
    pub moer: TimeSeries<f64>,
    pub solar_wind_forecast: TimeSeries<RenewableForecast>,
}

impl ExogenousDataset {
    /// Restricts every series to rows with `interval_start` in `[start, end)`.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            lmp: self.lmp.window(start, end),
            load: self.load.window(start, end),
            load_forecast: self.load_forecast.window(start, end),
            moer: self.moer.window(start, end),
            solar_wind_forecast: self.solar_wind_forecast.window(start, end),
        }
    }

    /// Looks up every exogenous value for `instant`.
    ///
    /// Spot values must start exactly at `instant`; forecasts come from the
    /// hourly bucket valid five minutes ahead.
    ///
    /// # Errors
    ///
    /// Returns a `DataError` when a spot sample is missing or duplicated, or
    /// when a forecast bucket cannot be resolved uniquely.
    pub fn snapshot_at(&self, instant: DateTime<Utc>) -> Result<ExogenousSnapshot, DataError> {
        let renewables = forecast_at(&self.solar_wind_forecast, SeriesKind::SolarWindForecast, instant)?;
        Ok(ExogenousSnapshot {
            lmp: exact(&self.lmp, SeriesKind::Lmp, instant)?,
            load: exact(&self.load, SeriesKind::Load, instant)?,
            load_forecast: forecast_at(&self.load_forecast, SeriesKind::LoadForecast, instant)?,
            moer: exact(&self.moer, SeriesKind::Moer, instant)?,
            solar_forecast: renewables.solar_mw,
            wind_forecast: renewables.wind_mw,
        })
    }
}

impl DataProvider for ExogenousDataset {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ExogenousDataset, DataError> {
        Ok(self.window(start, end))
    }

    fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.lmp.rows().first()?.start.date_naive();
        let last = self.lmp.rows().last()?.start.date_naive();
        Some((first, last))
    }
}

fn exact(series: &TimeSeries<f64>, kind: SeriesKind, instant: DateTime<Utc>) -> Result<f64, DataError> {
    match series.starting_at(instant) {
        [row] => Ok(row.value),
        [] => Err(DataError::MissingSample { series: kind, at: instant }),
        rows => Err(DataError::DuplicateSample {
            series: kind,
            at: instant,
            count: rows.len(),
        }),
    }
}
