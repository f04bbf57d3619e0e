//! Device simulation components.

/// Random initial-condition sampling.
pub mod sampling;
/// Grid-connected energy storage model.
pub mod storage;

pub use storage::{Dispatch, EnergyStorage, StorageSpec, step_reward};
