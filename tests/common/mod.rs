//! Shared test fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use storage_env::data::provider::DataFiles;
use storage_env::data::{ExogenousDataset, Interval, RenewableForecast, TimeSeries};
use storage_env::env::EnvSettings;
use storage_env::sim::types::EpisodeConfig;

/// Start of the reference episode, 2021-10-01 00:00 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
}

/// Settings for a `steps`-long episode of 5-minute intervals (seed 42).
pub fn settings(steps: usize) -> EnvSettings {
    EnvSettings {
        episode: EpisodeConfig::new(start(), steps, 300, 42),
        ..EnvSettings::default()
    }
}

/// Synthetic dataset covering `steps` five-minute steps.
///
/// Spot series have `steps + 1` rows; forecasts have one hourly bucket per
/// started hour plus the bucket the final lookahead lands in.
pub fn dataset_with(
    steps: usize,
    lmp: impl Fn(usize) -> f64,
    moer: impl Fn(usize) -> f64,
) -> ExogenousDataset {
    let spot = |f: &dyn Fn(usize) -> f64| -> TimeSeries<f64> {
        (0..=steps)
            .map(|k| {
                let t = start() + Duration::minutes(5 * k as i64);
                Interval::new(t, t + Duration::minutes(5), f(k))
            })
            .collect()
    };
    let hours = EpisodeConfig::new(start(), steps, 300, 0).expected_forecast_rows();
    let hourly = |h: usize| {
        let t = start() + Duration::hours(h as i64);
        (t, t + Duration::hours(1))
    };

    ExogenousDataset {
        lmp: spot(&lmp),
        load: spot(&|k| 20_000.0 + 10.0 * k as f64),
        load_forecast: (0..hours)
            .map(|h| {
                let (s, e) = hourly(h);
                Interval::new(s, e, 21_000.0 + 100.0 * h as f64)
            })
            .collect(),
        moer: spot(&moer),
        solar_wind_forecast: (0..hours)
            .map(|h| {
                let (s, e) = hourly(h);
                let solar_mw = if (6..18).contains(&h) { 4_000.0 } else { 0.0 };
                Interval::new(s, e, RenewableForecast { solar_mw, wind_mw: 900.0 + h as f64 })
            })
            .collect(),
    }
}

/// One full day with a daily price swing: cheap at night, expensive in
/// the evening.
pub fn day_dataset() -> ExogenousDataset {
    dataset_with(
        288,
        |k| if (204..252).contains(&k) { 120.0 } else { 30.0 + (k % 12) as f64 },
        |_| 850.0,
    )
}

/// Fresh scratch directory under the system temp dir, keyed by test binary,
/// `name` and process id.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "storage_env_{}_{name}_{}",
        env!("CARGO_CRATE_NAME"),
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Writes `dataset` under `dir` using the default CAISO file layout.
pub fn write_csv_dataset(dir: &Path, dataset: &ExogenousDataset) {
    let files = DataFiles::default();
    write_scalar(&dir.join(&files.lmp), "lmp", &dataset.lmp);
    write_scalar(&dir.join(&files.load), "load", &dataset.load);
    write_scalar(&dir.join(&files.load_forecast), "load_forecast", &dataset.load_forecast);
    write_scalar(&dir.join(&files.moer), "moer", &dataset.moer);

    let path = dir.join(&files.solar_wind_forecast);
    let mut wtr = writer(&path);
    wtr.write_record(["", "interval_start", "interval_end", "solar_mw", "wind_mw"]).unwrap();
    for (i, row) in dataset.solar_wind_forecast.rows().iter().enumerate() {
        wtr.write_record([
            i.to_string(),
            stamp(row.start),
            stamp(row.end),
            row.value.solar_mw.to_string(),
            row.value.wind_mw.to_string(),
        ])
        .unwrap();
    }
    wtr.flush().unwrap();
}

fn write_scalar(path: &Path, column: &str, series: &TimeSeries<f64>) {
    let mut wtr = writer(path);
    wtr.write_record(["", "interval_start", "interval_end", column]).unwrap();
    for (i, row) in series.rows().iter().enumerate() {
        wtr.write_record([i.to_string(), stamp(row.start), stamp(row.end), row.value.to_string()])
            .unwrap();
    }
    wtr.flush().unwrap();
}

fn writer(path: &Path) -> csv::Writer<fs::File> {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    csv::Writer::from_path(path).unwrap()
}

fn stamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}
