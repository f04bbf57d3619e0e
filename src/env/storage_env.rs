//! Episode controller for a single grid-connected storage device.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::observation::{OBSERVATION_DIM, ObservationInfo, ObservationVector};
use super::spaces::{BoxSpace, Rescaler};
use super::{ComponentEnv, EnvError, Transition};
use crate::config::{self, ConfigError};
use crate::data::validation::validate_episode_data;
use crate::data::{DataProvider, ExogenousDataset, ExogenousSnapshot};
use crate::devices::sampling::initial_storage;
use crate::devices::{Dispatch, EnergyStorage, StorageSpec, step_reward};
use crate::sim::clock::EpisodeClock;
use crate::sim::types::EpisodeConfig;

/// Unix timestamp of 2021-10-01T00:00:00Z, the default episode start.
pub const DEFAULT_START_UNIX: i64 = 1_633_046_400;

/// Raw bounds of the action. -1 is full charge, +1 full discharge.
pub const ACTION_RANGE: (f64, f64) = (-1.0, 1.0);

/// Everything needed to build an environment.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub name: String,
    pub storage: StorageSpec,
    pub episode: EpisodeConfig,
    /// Expose normalized observation/action spaces.
    pub rescale_spaces: bool,
    /// Target range of the normalized state of charge.
    pub observation_range: (f64, f64),
}

impl Default for EnvSettings {
    fn default() -> Self {
        let start = DateTime::from_timestamp(DEFAULT_START_UNIX, 0).unwrap_or_default();
        Self {
            name: "energy_storage".to_string(),
            storage: StorageSpec::default(),
            episode: EpisodeConfig::new(start, 288, 300, 0),
            rescale_spaces: true,
            observation_range: (0.0, 1.0),
        }
    }
}

impl EnvSettings {
    /// Returns every physical or timing constraint the settings violate.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = config::physical_errors(&self.storage, self.observation_range);
        errors.extend(config::horizon_errors(&self.episode));
        errors
    }
}

/// Caller-supplied initial stored energy.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageOverride {
    Energy(f64),
    /// Text that should parse as a number.
    Text(String),
}

impl StorageOverride {
    /// Coerces the override to a number, if possible. Infinities are kept
    /// and clamp to the storage bounds; NaN is rejected.
    pub fn coerce(&self) -> Option<f64> {
        let value = match self {
            Self::Energy(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (!value.is_nan()).then_some(value)
    }
}

impl From<f64> for StorageOverride {
    fn from(v: f64) -> Self {
        Self::Energy(v)
    }
}

impl From<&str> for StorageOverride {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl fmt::Display for StorageOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Energy(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Options accepted by [`EnergyStorageEnv::reset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetOptions {
    pub init_storage: Option<StorageOverride>,
    /// Re-seeds the initial-storage sampler before this reset.
    pub seed: Option<u64>,
}

impl ResetOptions {
    pub fn with_init_storage(mut self, value: impl Into<StorageOverride>) -> Self {
        self.init_storage = Some(value.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// How the stored energy at the start of an episode was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialStorage {
    /// Drawn from the truncated normal around `initial_mean`.
    Sampled,
    /// Taken from a valid override, clamped into the storage range.
    Override,
    /// The override was not a finite number; `initial_mean` was used.
    Fallback,
}

#[derive(Debug, Clone)]
struct EpisodeState {
    storage: EnergyStorage,
    clock: EpisodeClock,
    exogenous: ExogenousSnapshot,
    initial: InitialStorage,
    last_dispatch: Option<Dispatch>,
}

/// A battery participating in an energy market, driven one control
/// interval at a time.
///
/// The exogenous dataset is fetched and validated once in
/// [`EnergyStorageEnv::new`]; `reset` and `step` only perform in-memory
/// lookups.
#[derive(Debug)]
pub struct EnergyStorageEnv {
    settings: EnvSettings,
    dataset: ExogenousDataset,
    rng: StdRng,
    soc_scale: Rescaler,
    action_scale: Rescaler,
    state: Option<EpisodeState>,
}

impl EnergyStorageEnv {
    /// Builds an environment, fetching and validating the episode's data.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidConfig`] for inconsistent settings and
    /// [`EnvError::Data`] when the provider fails or the data does not cover
    /// the episode.
    pub fn new<P: DataProvider + ?Sized>(settings: EnvSettings, provider: &P) -> Result<Self, EnvError> {
        let errors = settings.validate();
        if !errors.is_empty() {
            return Err(EnvError::InvalidConfig(errors));
        }

        let episode = &settings.episode;
        let end = episode
            .data_window_end()
            .ok_or_else(|| EnvError::InvalidConfig(config::horizon_errors(episode)))?;
        info!(env = %settings.name, start = %episode.start, end = %end, "retrieving exogenous data");
        let dataset = provider.fetch(episode.start, end)?;
        validate_episode_data(&dataset, episode, provider.coverage())?;
        info!(
            env = %settings.name,
            spot_rows = dataset.lmp.len(),
            forecast_rows = dataset.load_forecast.len(),
            "exogenous data ready"
        );

        let soc_scale = Rescaler::new(settings.storage.storage_range(), settings.observation_range);
        Ok(Self {
            rng: StdRng::seed_from_u64(episode.seed),
            soc_scale,
            action_scale: Rescaler::new(ACTION_RANGE, ACTION_RANGE),
            dataset,
            settings,
            state: None,
        })
    }

    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    pub fn dataset(&self) -> &ExogenousDataset {
        &self.dataset
    }

    /// Current observation vector and its named view.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::NotReset`] before the first `reset`.
    pub fn observation(&self) -> Result<(ObservationVector, ObservationInfo), EnvError> {
        let state = self.state.as_ref().ok_or(EnvError::NotReset)?;
        Ok(observe(state, self.soc_scaling()))
    }

    /// Returns `true` once `max_episode_steps` steps have been taken. An
    /// environment that was never reset is not terminal.
    pub fn is_terminal(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.clock.is_finished())
    }

    /// Steps taken in the current episode.
    pub fn simulation_step(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.clock.step())
    }

    pub fn current_datetime(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|s| s.clock.now())
    }

    pub fn current_storage(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.storage.current_storage())
    }

    pub fn initial_storage(&self) -> Option<InitialStorage> {
        self.state.as_ref().map(|s| s.initial)
    }

    /// Power figures of the most recent step, including the grid-facing
    /// power. `None` before the first step of an episode.
    pub fn last_dispatch(&self) -> Option<Dispatch> {
        self.state.as_ref().and_then(|s| s.last_dispatch)
    }

    fn soc_scaling(&self) -> Option<&Rescaler> {
        soc_scaling(&self.settings, &self.soc_scale)
    }

    fn choose_initial_storage(&mut self, init: Option<&StorageOverride>) -> (f64, InitialStorage) {
        let spec = &self.settings.storage;
        match init {
            None => (
                spec.clamp(initial_storage(&mut self.rng, spec.initial_mean, spec.initial_std)),
                InitialStorage::Sampled,
            ),
            Some(value) => match value.coerce() {
                Some(energy) => (spec.clamp(energy), InitialStorage::Override),
                None => {
                    warn!(
                        env = %self.settings.name,
                        value = %value,
                        fallback = spec.initial_mean,
                        "initial storage override is not a number, using the mean"
                    );
                    (spec.clamp(spec.initial_mean), InitialStorage::Fallback)
                }
            },
        }
    }
}

fn soc_scaling<'a>(settings: &EnvSettings, soc_scale: &'a Rescaler) -> Option<&'a Rescaler> {
    settings.rescale_spaces.then_some(soc_scale)
}

fn observe(state: &EpisodeState, soc_scale: Option<&Rescaler>) -> (ObservationVector, ObservationInfo) {
    let raw = state.storage.current_storage();
    let soc = soc_scale.map_or(raw, |scale| scale.to_scaled(raw));
    let info = ObservationInfo::new(raw, &state.exogenous);
    (info.to_vector(soc), info)
}

impl ComponentEnv for EnergyStorageEnv {
    type Observation = ObservationVector;
    type Info = ObservationInfo;
    type ResetOptions = ResetOptions;

    fn reset(&mut self, options: ResetOptions) -> Result<(ObservationVector, ObservationInfo), EnvError> {
        if let Some(seed) = options.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        let (energy, origin) = self.choose_initial_storage(options.init_storage.as_ref());

        let episode = &self.settings.episode;
        let clock = EpisodeClock::new(episode.start, episode.control_interval, episode.max_episode_steps);
        let exogenous = self.dataset.snapshot_at(clock.now())?;
        let state = EpisodeState {
            storage: EnergyStorage::new(self.settings.storage, energy, episode),
            clock,
            exogenous,
            initial: origin,
            last_dispatch: None,
        };
        debug!(env = %self.settings.name, storage = energy, origin = ?origin, "reset");

        let observation = observe(&state, self.soc_scaling());
        self.state = Some(state);
        Ok(observation)
    }

    fn step(&mut self, action: f64) -> Result<Transition<ObservationVector, ObservationInfo>, EnvError> {
        if !action.is_finite() {
            return Err(EnvError::InvalidAction(action));
        }
        let state = self.state.as_mut().ok_or(EnvError::NotReset)?;
        let next = state.clock.peek_next().ok_or(EnvError::EpisodeTerminated)?;
        // resolve data before touching state so a lookup failure leaves the episode intact
        let exogenous = self.dataset.snapshot_at(next)?;

        state.clock.advance();
        state.exogenous = exogenous;

        let raw_action = if self.settings.rescale_spaces {
            self.action_scale.to_raw(action)
        } else {
            action
        };
        let dispatch = state.storage.dispatch(raw_action * self.settings.storage.max_power);
        state.last_dispatch = Some(dispatch);

        let reward = step_reward(exogenous.lmp, exogenous.moer, dispatch.feasible);
        let terminal = state.clock.is_finished();
        debug!(
            step = state.clock.step(),
            datetime = %next,
            action,
            requested = dispatch.requested,
            feasible = dispatch.feasible,
            storage = state.storage.current_storage(),
            reward,
            "step"
        );

        let (observation, info) = observe(state, soc_scaling(&self.settings, &self.soc_scale));
        Ok(Transition {
            observation,
            reward,
            terminal,
            info,
        })
    }

    fn observation_space(&self) -> BoxSpace {
        let soc = self.soc_scale.space(self.settings.rescale_spaces);
        let mut low = vec![f64::NEG_INFINITY; OBSERVATION_DIM];
        let mut high = vec![f64::INFINITY; OBSERVATION_DIM];
        low[0] = soc.low()[0];
        high[0] = soc.high()[0];
        BoxSpace::new(low, high)
    }

    fn action_space(&self) -> BoxSpace {
        self.action_scale.space(self.settings.rescale_spaces)
    }
}
