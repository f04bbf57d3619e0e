//! Reinforcement-learning environment surface.

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::DataError;

pub mod observation;
/// Box spaces and raw/normalized rescaling.
pub mod spaces;
pub mod storage_env;

pub use observation::{OBSERVATION_LABELS, ObservationInfo, ObservationVector};
pub use spaces::{BoxSpace, Rescaler};
pub use storage_env::{
    EnergyStorageEnv, EnvSettings, InitialStorage, ResetOptions, StorageOverride,
};

/// Result of one `step` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O, I> {
    pub observation: O,
    pub reward: f64,
    pub terminal: bool,
    pub info: I,
}

/// The capabilities a component environment exposes to an agent or an
/// enclosing multi-component environment.
pub trait ComponentEnv {
    type Observation;
    type Info;
    type ResetOptions: Default;

    /// Starts a new episode and returns the initial observation.
    ///
    /// # Errors
    ///
    /// Returns an `EnvError` if the initial observation cannot be built.
    fn reset(&mut self, options: Self::ResetOptions) -> Result<(Self::Observation, Self::Info), EnvError>;

    /// Advances the episode by one control interval.
    ///
    /// # Errors
    ///
    /// Returns an `EnvError` if the environment has not been reset, the
    /// episode has already terminated, or `action` is not a finite number.
    fn step(&mut self, action: f64) -> Result<Transition<Self::Observation, Self::Info>, EnvError>;

    fn observation_space(&self) -> BoxSpace;

    fn action_space(&self) -> BoxSpace;
}

/// Errors surfaced by environment construction and stepping.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid environment settings: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("environment must be reset before stepping")]
    NotReset,
    #[error("episode has terminated; call reset to start a new one")]
    EpisodeTerminated,
    #[error("action must be a finite number, got {0}")]
    InvalidAction(f64),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
