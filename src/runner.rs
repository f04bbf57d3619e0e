//! Rolls out a full episode under a policy.

use tracing::info;

use crate::env::{ComponentEnv, EnergyStorageEnv, EnvError, ResetOptions};
use crate::sim::kpi::EpisodeSummary;
use crate::sim::policy::Policy;
use crate::sim::types::StepResult;

/// Step records and summary of one episode.
#[derive(Debug, Clone)]
pub struct EpisodeRun {
    pub results: Vec<StepResult>,
    pub summary: EpisodeSummary,
}

/// Resets `env` with `options` and steps it until terminal, asking `policy`
/// for every action.
///
/// # Errors
///
/// Propagates the first `EnvError` raised by `reset` or `step`.
pub fn run_episode(
    env: &mut EnergyStorageEnv,
    policy: &mut dyn Policy,
    options: ResetOptions,
) -> Result<EpisodeRun, EnvError> {
    let (_, mut info) = env.reset(options)?;
    let episode = env.settings().episode.clone();
    let (min, max) = env.settings().storage.storage_range();
    info!(
        policy = policy.name(),
        start = %episode.start,
        steps = episode.max_episode_steps,
        initial_storage = info.state_of_charge,
        "starting episode"
    );

    let mut results = Vec::with_capacity(episode.max_episode_steps);
    loop {
        let action = policy.action(&info);
        let transition = env.step(action)?;
        let dispatch = env.last_dispatch().ok_or(EnvError::NotReset)?;
        info = transition.info;

        results.push(StepResult {
            step: env.simulation_step().unwrap_or_default(),
            datetime: env.current_datetime().unwrap_or(episode.start),
            action,
            requested_power: dispatch.requested,
            feasible_power: dispatch.feasible,
            grid_power: dispatch.grid_power,
            storage: info.state_of_charge,
            lmp: info.locational_marginal_price,
            moer: info.marginal_operating_emissions_rate,
            reward: transition.reward,
            terminal: transition.terminal,
        });

        if transition.terminal {
            break;
        }
    }

    let summary = EpisodeSummary::from_results(&results, episode.dt_hours, max - min);
    info!(
        steps = summary.steps,
        total_reward = summary.total_reward,
        final_storage = summary.final_storage,
        "episode finished"
    );
    Ok(EpisodeRun { results, summary })
}
