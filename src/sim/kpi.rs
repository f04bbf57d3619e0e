//! Post-hoc episode summary computed from step results.

use std::fmt;

use super::types::StepResult;

/// Aggregate indicators derived from a complete episode.
///
/// Computed post-hoc from `Vec<StepResult>` so that reported figures always
/// agree with the recorded steps.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Number of steps taken.
    pub steps: usize,
    /// Sum of per-step rewards.
    pub total_reward: f64,
    /// Energy drawn from the grid while charging (MWh).
    pub energy_charged: f64,
    /// Energy delivered to the grid while discharging (MWh).
    pub energy_discharged: f64,
    /// Sum of `|feasible power| * dt` (MWh).
    pub throughput: f64,
    /// Throughput divided by twice the usable storage range.
    pub equivalent_full_cycles: f64,
    /// Steps whose enacted power differs from the requested power.
    pub clamped_steps: usize,
    pub min_storage: f64,
    pub max_storage: f64,
    pub final_storage: f64,
}

impl EpisodeSummary {
    /// Computes the summary from the complete step record vector.
    ///
    /// # Arguments
    ///
    /// * `results` - Step results of one episode, in order
    /// * `dt_hours` - Control interval in hours
    /// * `usable_energy` - `max_energy - min_energy`, for cycle counting
    pub fn from_results(results: &[StepResult], dt_hours: f64, usable_energy: f64) -> Self {
        let Some(last) = results.last() else {
            return Self {
                steps: 0,
                total_reward: 0.0,
                energy_charged: 0.0,
                energy_discharged: 0.0,
                throughput: 0.0,
                equivalent_full_cycles: 0.0,
                clamped_steps: 0,
                min_storage: 0.0,
                max_storage: 0.0,
                final_storage: 0.0,
            };
        };

        let mut total_reward = 0.0;
        let mut charged = 0.0;
        let mut discharged = 0.0;
        let mut clamped = 0;
        let mut min_storage = f64::INFINITY;
        let mut max_storage = f64::NEG_INFINITY;

        for r in results {
            total_reward += r.reward;
            let energy = r.feasible_power * dt_hours;
            if energy < 0.0 {
                charged -= energy;
            } else {
                discharged += energy;
            }
            if (r.feasible_power - r.requested_power).abs() > 1e-12 {
                clamped += 1;
            }
            min_storage = min_storage.min(r.storage);
            max_storage = max_storage.max(r.storage);
        }

        let throughput = charged + discharged;
        let cycles = if usable_energy > 0.0 {
            throughput / (2.0 * usable_energy)
        } else {
            0.0
        };

        Self {
            steps: results.len(),
            total_reward,
            energy_charged: charged,
            energy_discharged: discharged,
            throughput,
            equivalent_full_cycles: cycles,
            clamped_steps: clamped,
            min_storage,
            max_storage,
            final_storage: last.storage,
        }
    }
}

impl fmt::Display for EpisodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Summary ---")?;
        writeln!(f, "Steps:               {}", self.steps)?;
        writeln!(f, "Total reward:        {:.2}", self.total_reward)?;
        writeln!(f, "Energy charged:      {:.3} MWh", self.energy_charged)?;
        writeln!(f, "Energy discharged:   {:.3} MWh", self.energy_discharged)?;
        writeln!(
            f,
            "Throughput:          {:.3} MWh ({:.2} equiv. cycles)",
            self.throughput, self.equivalent_full_cycles
        )?;
        writeln!(f, "Clamped steps:       {}", self.clamped_steps)?;
        write!(
            f,
            "Storage:             min {:.2} / max {:.2} / final {:.2} MWh",
            self.min_storage, self.max_storage, self.final_storage
        )
    }
}
