//! Core simulation types: episode timing and per-step records.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Centralized episode timing configuration.
///
/// The environment, the storage device, and the validation layer all read
/// their timing from this struct, so `dt_hours` is derived in one place.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use storage_env::sim::types::EpisodeConfig;
///
/// let start = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
/// let cfg = EpisodeConfig::new(start, 288, 300, 42);
/// assert!((cfg.dt_hours - 5.0 / 60.0).abs() < 1e-12);
/// assert_eq!(cfg.expected_spot_rows(), 289);
/// assert_eq!(cfg.expected_forecast_rows(), 25);
/// ```
#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// First instant of the episode (UTC).
    pub start: DateTime<Utc>,
    /// Number of `step` calls before the episode is terminal.
    pub max_episode_steps: usize,
    /// Simulated time between consecutive steps.
    pub control_interval: Duration,
    /// Duration of one control interval in hours.
    pub dt_hours: f64,
    /// Seed for the initial-storage sampler.
    pub seed: u64,
}

impl EpisodeConfig {
    /// Creates a new episode configuration.
    ///
    /// # Arguments
    ///
    /// * `start` - First instant of the episode
    /// * `max_episode_steps` - Steps per episode (must be > 0)
    /// * `control_interval_secs` - Control interval in seconds (must be > 0)
    /// * `seed` - Random seed for initial storage sampling
    ///
    /// # Panics
    ///
    /// Panics if `max_episode_steps` or `control_interval_secs` is zero.
    pub fn new(
        start: DateTime<Utc>,
        max_episode_steps: usize,
        control_interval_secs: u32,
        seed: u64,
    ) -> Self {
        assert!(max_episode_steps > 0, "max_episode_steps must be > 0");
        assert!(control_interval_secs > 0, "control_interval_secs must be > 0");
        Self {
            start,
            max_episode_steps,
            control_interval: Duration::seconds(i64::from(control_interval_secs)),
            dt_hours: f64::from(control_interval_secs) / 3600.0,
            seed,
        }
    }

    /// Instant reached after `step` control intervals, or `None` if it falls
    /// outside the representable date range.
    pub fn checked_instant_at(&self, step: usize) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(step)
            .ok()?
            .checked_mul(self.control_interval.num_seconds())?;
        self.start.checked_add_signed(Duration::try_seconds(secs)?)
    }

    /// Instant reached after `step` control intervals.
    ///
    /// # Panics
    ///
    /// Panics if the instant is not representable. Steps up to
    /// `max_episode_steps + 1` are safe once [`data_window_end`](Self::data_window_end)
    /// has returned `Some`.
    pub fn instant_at(&self, step: usize) -> DateTime<Utc> {
        match self.checked_instant_at(step) {
            Some(instant) => instant,
            None => panic!("step {step} is past the representable episode horizon"),
        }
    }

    /// Exclusive end of the data window fetched for one episode.
    ///
    /// Covers the terminal instant plus one extra interval so that the last
    /// forecast lookup still has a bucket. `None` when the episode runs past
    /// the representable date range.
    pub fn data_window_end(&self) -> Option<DateTime<Utc>> {
        self.checked_instant_at(self.max_episode_steps.checked_add(1)?)
    }

    /// Rows expected in each spot series (price, load, carbon intensity).
    pub fn expected_spot_rows(&self) -> usize {
        self.max_episode_steps + 1
    }

    /// Rows expected in each hourly forecast series.
    pub fn expected_forecast_rows(&self) -> usize {
        let hours = self.max_episode_steps as f64 * self.dt_hours;
        // Small epsilon: 288 * (300 / 3600) is not exactly 24.0 in binary.
        (hours + 1e-9).floor() as usize + 1
    }
}

/// Complete record of one environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Simulation step after this transition (1-based).
    pub step: usize,
    /// Simulated instant after this transition.
    pub datetime: DateTime<Utc>,
    /// Action passed to `step`.
    pub action: f64,
    /// Power requested by the action (positive = discharge).
    pub requested_power: f64,
    /// Power actually enacted after feasibility clamping.
    pub feasible_power: f64,
    /// Grid-facing power (positive = load, negative = generation).
    pub grid_power: f64,
    /// Stored energy after this step.
    pub storage: f64,
    /// Locational marginal price at this instant.
    pub lmp: f64,
    /// Marginal operating emissions rate at this instant.
    pub moer: f64,
    /// Reward returned by the environment.
    pub reward: f64,
    /// Whether this step ended the episode.
    pub terminal: bool,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} ({}) | action={:>5.2} req={:>7.2} feas={:>7.2} grid={:>7.2} | \
             storage={:>6.2} | lmp={:>7.2} moer={:>7.2} | reward={:>9.2}{}",
            self.step,
            self.datetime.format("%Y-%m-%d %H:%M"),
            self.action,
            self.requested_power,
            self.feasible_power,
            self.grid_power,
            self.storage,
            self.lmp,
            self.moer,
            self.reward,
            if self.terminal { " [terminal]" } else { "" },
        )
    }
}
