use crate::sim::types::EpisodeConfig;

/// Physical and operational parameters of a storage device.
///
/// Energies are in the same unit as `max_power * hours` (MWh with the CAISO
/// dataset defaults).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageSpec {
    /// Lower bound of stored energy.
    pub min_energy: f64,
    /// Upper bound of stored energy.
    pub max_energy: f64,
    /// Mean of the initial storage distribution.
    pub initial_mean: f64,
    /// Standard deviation of the initial storage distribution.
    pub initial_std: f64,
    /// Charging efficiency (0..1.0].
    pub charge_efficiency: f64,
    /// Discharging efficiency (0..1.0].
    pub discharge_efficiency: f64,
    /// Power reached at an action magnitude of 1.
    pub max_power: f64,
}

impl Default for StorageSpec {
    fn default() -> Self {
        Self {
            min_energy: 3.0,
            max_energy: 50.0,
            initial_mean: 30.0,
            initial_std: 5.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.9,
            max_power: 15.0,
        }
    }
}

impl StorageSpec {
    /// Returns `(min_energy, max_energy)`.
    pub fn storage_range(&self) -> (f64, f64) {
        (self.min_energy, self.max_energy)
    }

    /// Clamps an energy value into the storage range.
    pub fn clamp(&self, energy: f64) -> f64 {
        energy.clamp(self.min_energy, self.max_energy)
    }
}

/// Outcome of dispatching one power request against the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch {
    /// Power asked for (positive = discharge).
    pub requested: f64,
    /// Power enacted after SOC feasibility clamping (positive = discharge).
    pub feasible: f64,
    /// Grid-facing power (positive = load, negative = generation).
    pub grid_power: f64,
}

/// A grid-connected storage device with separate linear charge and
/// discharge efficiency models.
///
/// # Power Convention (Device)
/// - Positive power: Discharging (energy leaves storage)
/// - Negative power: Charging (energy enters storage)
///
/// The grid-facing figure in [`Dispatch::grid_power`] uses the opposite,
/// feeder-style convention.
#[derive(Debug, Clone)]
pub struct EnergyStorage {
    spec: StorageSpec,

    /// Stored energy, always within the storage range after a dispatch.
    current_storage: f64,

    /// Duration of one control interval in hours.
    dt_hours: f64,
}

impl EnergyStorage {
    /// Creates a storage device holding `initial_storage`.
    ///
    /// # Panics
    ///
    /// Panics if the storage range is empty, efficiencies are outside
    /// (0, 1], or `max_power` is negative.
    pub fn new(spec: StorageSpec, initial_storage: f64, config: &EpisodeConfig) -> Self {
        assert!(spec.min_energy < spec.max_energy);
        assert!(spec.charge_efficiency > 0.0 && spec.charge_efficiency <= 1.0);
        assert!(spec.discharge_efficiency > 0.0 && spec.discharge_efficiency <= 1.0);
        assert!(spec.max_power >= 0.0);

        Self {
            spec,
            current_storage: initial_storage,
            dt_hours: config.dt_hours,
        }
    }

    pub fn spec(&self) -> &StorageSpec {
        &self.spec
    }

    /// Currently stored energy.
    pub fn current_storage(&self) -> f64 {
        self.current_storage
    }

    /// Returns the largest power that keeps the SOC inside the storage range
    /// over one control interval.
    ///
    /// Requests that stay feasible are returned unchanged, including zero.
    pub fn validate_power(&self, power: f64) -> f64 {
        let (min, max) = self.spec.storage_range();

        if power > 0.0 {
            let after = self.current_storage
                - power * self.dt_hours / self.spec.discharge_efficiency;
            if after < min {
                return (self.current_storage - min).max(0.0) / self.dt_hours;
            }
        } else if power < 0.0 {
            let after =
                self.current_storage - self.spec.charge_efficiency * power * self.dt_hours;
            if after > max {
                return -(max - self.current_storage).max(0.0) / self.dt_hours;
            }
        }

        power
    }

    /// Updates the stored energy for an already validated power.
    pub fn apply_power(&mut self, power: f64) {
        if power < 0.0 {
            self.current_storage -= self.spec.charge_efficiency * power * self.dt_hours;
            // absorb rounding drift
            self.current_storage = self.current_storage.min(self.spec.max_energy);
        } else if power > 0.0 {
            self.current_storage -= power * self.dt_hours / self.spec.discharge_efficiency;
            self.current_storage = self.current_storage.max(self.spec.min_energy);
        }
    }

    /// Validates and applies `requested` power in one step.
    pub fn dispatch(&mut self, requested: f64) -> Dispatch {
        let feasible = self.validate_power(requested);
        self.apply_power(feasible);
        Dispatch {
            requested,
            feasible,
            grid_power: -feasible,
        }
    }

    /// Stored energy mapped linearly from the storage range onto
    /// `[scaled_low, scaled_high]`.
    pub fn normalized(&self, scaled_low: f64, scaled_high: f64) -> f64 {
        crate::env::spaces::to_scaled(
            self.current_storage,
            self.spec.min_energy,
            self.spec.max_energy,
            scaled_low,
            scaled_high,
        )
    }
}

/// Per-step reward: `(price + carbon intensity) * power`.
///
/// Discharging earns `price + moer` per unit when that sum is positive;
/// charging pays it.
pub fn step_reward(lmp: f64, moer: f64, power: f64) -> f64 {
    (lmp + moer) * power
}
