//! TOML-based environment configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::data::provider::{CsvDataProvider, DataFiles};
use crate::data::series::parse_timestamp;
use crate::devices::StorageSpec;
use crate::env::EnvSettings;
use crate::sim::types::EpisodeConfig;

/// Top-level environment configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`EnvConfig::from_toml_file`] or use [`EnvConfig::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    /// Storage device parameters.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Episode timing and space options.
    #[serde(default)]
    pub episode: EpisodeSection,
    /// Location of the exogenous data files.
    #[serde(default)]
    pub data: DataConfig,
}

/// Storage device parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Lower bound of stored energy (MWh).
    pub min_energy: f64,
    /// Upper bound of stored energy (MWh).
    pub max_energy: f64,
    /// Mean of the initial storage distribution (MWh).
    pub initial_mean: f64,
    /// Standard deviation of the initial storage distribution (MWh).
    pub initial_std: f64,
    /// Charge efficiency (0.0–1.0].
    pub charge_efficiency: f64,
    /// Discharge efficiency (0.0–1.0].
    pub discharge_efficiency: f64,
    /// Power at full action (MW).
    pub max_power: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let spec = StorageSpec::default();
        Self {
            min_energy: spec.min_energy,
            max_energy: spec.max_energy,
            initial_mean: spec.initial_mean,
            initial_std: spec.initial_std,
            charge_efficiency: spec.charge_efficiency,
            discharge_efficiency: spec.discharge_efficiency,
            max_power: spec.max_power,
        }
    }
}

impl StorageConfig {
    pub fn spec(&self) -> StorageSpec {
        StorageSpec {
            min_energy: self.min_energy,
            max_energy: self.max_energy,
            initial_mean: self.initial_mean,
            initial_std: self.initial_std,
            charge_efficiency: self.charge_efficiency,
            discharge_efficiency: self.discharge_efficiency,
            max_power: self.max_power,
        }
    }
}

/// Episode timing and space options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EpisodeSection {
    /// Environment name used in logs.
    pub name: String,
    /// Episode start, RFC 3339 or `YYYY-MM-DD` (midnight UTC).
    pub start: String,
    /// Steps per episode (must be > 0).
    pub max_episode_steps: usize,
    /// Control interval in seconds (must be > 0).
    pub control_interval_secs: u32,
    /// Expose normalized spaces.
    pub rescale_spaces: bool,
    /// Seed for initial storage sampling.
    pub seed: u64,
    /// Normalized state-of-charge range `[low, high]`.
    pub observation_range: [f64; 2],
}

impl Default for EpisodeSection {
    fn default() -> Self {
        Self {
            name: "energy_storage".to_string(),
            start: "2021-10-01T00:00:00Z".to_string(),
            max_episode_steps: 288,
            control_interval_secs: 300,
            rescale_spaces: true,
            seed: 42,
            observation_range: [0.0, 1.0],
        }
    }
}

/// Location and known coverage of the exogenous data files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Directory the file paths below are relative to.
    pub dir: PathBuf,
    pub lmp_file: PathBuf,
    pub load_file: PathBuf,
    pub load_forecast_file: PathBuf,
    pub moer_file: PathBuf,
    pub solar_wind_forecast_file: PathBuf,
    /// First day the files cover, quoted in error messages.
    pub available_from: Option<NaiveDate>,
    /// Last day the files cover.
    pub available_to: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        let files = DataFiles::default();
        Self {
            dir: PathBuf::from("data/cleaned_data"),
            lmp_file: files.lmp,
            load_file: files.load,
            load_forecast_file: files.load_forecast,
            moer_file: files.moer,
            solar_wind_forecast_file: files.solar_wind_forecast,
            available_from: NaiveDate::from_ymd_opt(2021, 10, 1),
            available_to: NaiveDate::from_ymd_opt(2024, 9, 30),
        }
    }
}

impl DataConfig {
    /// Builds a CSV provider for these files.
    pub fn provider(&self) -> CsvDataProvider {
        let provider = CsvDataProvider::new(&self.dir).with_files(DataFiles {
            lmp: self.lmp_file.clone(),
            load: self.load_file.clone(),
            load_forecast: self.load_forecast_file.clone(),
            moer: self.moer_file.clone(),
            solar_wind_forecast: self.solar_wind_forecast_file.clone(),
        });
        match (self.available_from, self.available_to) {
            (Some(from), Some(to)) => provider.with_coverage(from, to),
            _ => provider,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"storage.max_energy"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Checks the storage parameters and observation range shared by
/// [`EnvConfig`] and [`EnvSettings`].
pub(crate) fn physical_errors(spec: &StorageSpec, observation_range: (f64, f64)) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let finite = [
        ("storage.min_energy", spec.min_energy),
        ("storage.max_energy", spec.max_energy),
        ("storage.initial_mean", spec.initial_mean),
        ("storage.initial_std", spec.initial_std),
        ("storage.max_power", spec.max_power),
    ];
    for (field, value) in finite {
        if !value.is_finite() {
            errors.push(ConfigError::new(field, "must be a finite number"));
        }
    }
    if !errors.is_empty() {
        return errors;
    }

    if spec.min_energy >= spec.max_energy {
        errors.push(ConfigError::new("storage.min_energy", "must be < storage.max_energy"));
    }
    if spec.initial_std < 0.0 {
        errors.push(ConfigError::new("storage.initial_std", "must be >= 0"));
    }
    for (field, eta) in [
        ("storage.charge_efficiency", spec.charge_efficiency),
        ("storage.discharge_efficiency", spec.discharge_efficiency),
    ] {
        if !(eta > 0.0 && eta <= 1.0) {
            errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
        }
    }
    if spec.max_power < 0.0 {
        errors.push(ConfigError::new("storage.max_power", "must be >= 0"));
    }

    let (low, high) = observation_range;
    if !(low.is_finite() && high.is_finite() && low < high) {
        errors.push(ConfigError::new(
            "episode.observation_range",
            "must be two finite numbers with low < high",
        ));
    }
    errors
}

/// Checks that the whole episode, plus the trailing forecast interval, fits
/// in the representable date range.
pub(crate) fn horizon_errors(episode: &EpisodeConfig) -> Vec<ConfigError> {
    if episode.data_window_end().is_some() {
        return Vec::new();
    }
    vec![ConfigError::new(
        "episode.max_episode_steps",
        format!(
            "episode end is out of range: {} steps of {} s from {}",
            episode.max_episode_steps,
            episode.control_interval.num_seconds(),
            episode.start
        ),
    )]
}

impl EnvConfig {
    /// Returns the baseline preset: the reference CAISO day.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the lossless preset: ideal round-trip efficiency.
    pub fn lossless() -> Self {
        Self {
            storage: StorageConfig {
                charge_efficiency: 1.0,
                discharge_efficiency: 1.0,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the long-duration preset: larger reservoir and lower power,
    /// run for a week.
    pub fn long_duration() -> Self {
        Self {
            storage: StorageConfig {
                min_energy: 10.0,
                max_energy: 200.0,
                initial_mean: 100.0,
                initial_std: 20.0,
                max_power: 10.0,
                ..StorageConfig::default()
            },
            episode: EpisodeSection {
                max_episode_steps: 7 * 288,
                ..EpisodeSection::default()
            },
            data: DataConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "lossless", "long_duration"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "lossless" => Ok(Self::lossless()),
            "long_duration" => Ok(Self::long_duration()),
            _ => Err(ConfigError::new(
                "preset",
                format!("unknown preset \"{name}\", available: {}", Self::PRESETS.join(", ")),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let ep = &self.episode;
        let [low, high] = ep.observation_range;
        let mut errors = physical_errors(&self.storage.spec(), (low, high));

        let start = parse_timestamp(&ep.start);
        if start.is_none() {
            errors.push(ConfigError::new(
                "episode.start",
                format!("cannot parse \"{}\" as a timestamp or date", ep.start),
            ));
        }
        if ep.max_episode_steps == 0 {
            errors.push(ConfigError::new("episode.max_episode_steps", "must be > 0"));
        }
        if ep.control_interval_secs == 0 {
            errors.push(ConfigError::new("episode.control_interval_secs", "must be > 0"));
        }
        if let Some(start) = start.filter(|_| ep.max_episode_steps > 0 && ep.control_interval_secs > 0) {
            let episode = EpisodeConfig::new(start, ep.max_episode_steps, ep.control_interval_secs, ep.seed);
            errors.extend(horizon_errors(&episode));
        }

        if let (Some(from), Some(to)) = (self.data.available_from, self.data.available_to) {
            if from > to {
                errors.push(ConfigError::new(
                    "data.available_from",
                    "must not be after data.available_to",
                ));
            }
        }

        errors
    }

    /// Validates the configuration and converts it into environment settings.
    ///
    /// # Errors
    ///
    /// Returns every validation error when the configuration is invalid.
    pub fn env_settings(&self) -> Result<EnvSettings, Vec<ConfigError>> {
        let errors = self.validate();
        let ep = &self.episode;
        let start = match parse_timestamp(&ep.start) {
            Some(start) if errors.is_empty() => start,
            _ => return Err(errors),
        };
        let [low, high] = ep.observation_range;
        Ok(EnvSettings {
            name: ep.name.clone(),
            storage: self.storage.spec(),
            episode: EpisodeConfig::new(start, ep.max_episode_steps, ep.control_interval_secs, ep.seed),
            rescale_spaces: ep.rescale_spaces,
            observation_range: (low, high),
        })
    }
}
