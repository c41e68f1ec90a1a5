//! Episode loop driving a set of agents against one environment.

use std::collections::{BTreeMap, HashSet};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agents::Agent;
use crate::core::error::Result;
use crate::core::types::{Actions, AgentId, AllocationVector, Transition};
use crate::env::engine::TradingEnv;

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of episodes.
    pub episodes: usize,
    /// Stop an episode after this many steps even if the tape continues.
    pub max_steps: Option<usize>,
    /// Keep per-step rewards and actions in the history.
    pub record: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            episodes: 1,
            max_steps: None,
            record: true,
        }
    }
}

impl RunConfig {
    /// Set the number of episodes.
    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    /// Cap the number of steps per episode.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Enable or disable per-step recording.
    pub fn with_record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }
}

/// What happened during a run, per agent and per episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunHistory {
    /// Per-step rewards, `rewards[agent][episode][step]`.
    pub rewards: BTreeMap<AgentId, Vec<Vec<f64>>>,
    /// Per-step actions, `actions[agent][episode][step]`.
    pub actions: BTreeMap<AgentId, Vec<Vec<AllocationVector>>>,
    /// Cumulative reward of every episode, recorded even without `record`.
    pub totals: BTreeMap<AgentId, Vec<f64>>,
}

impl RunHistory {
    /// Number of completed episodes.
    pub fn episodes(&self) -> usize {
        self.totals.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Rewards of one agent in one episode.
    pub fn episode_rewards(&self, agent: &str, episode: usize) -> Option<&[f64]> {
        self.rewards
            .get(agent)
            .and_then(|episodes| episodes.get(episode))
            .map(Vec::as_slice)
    }

    /// Cumulative reward of every episode of one agent.
    pub fn cumulative_rewards(&self, agent: &str) -> Option<&[f64]> {
        self.totals.get(agent).map(Vec::as_slice)
    }
}

/// Run `agents` against `env` for `config.episodes` episodes.
///
/// The registry is cleared and rebuilt from the agents; an agent whose name
/// is already taken is skipped. Within a step every agent acts, then observes,
/// in parallel.
pub fn run(
    env: &mut TradingEnv,
    agents: &mut [Box<dyn Agent>],
    config: &RunConfig,
) -> Result<RunHistory> {
    env.unregister(None);

    let mut seen = HashSet::new();
    let mut active: Vec<&mut Box<dyn Agent>> = Vec::with_capacity(agents.len());
    for agent in agents.iter_mut() {
        if seen.insert(agent.name().to_string()) {
            env.register(agent.name());
            active.push(agent);
        } else {
            warn!("duplicate agent name `{}` ignored", agent.name());
        }
    }

    let mut history = RunHistory::default();
    for name in seen {
        history.totals.insert(name.clone(), Vec::with_capacity(config.episodes));
        if config.record {
            history.rewards.insert(name.clone(), Vec::with_capacity(config.episodes));
            history.actions.insert(name, Vec::with_capacity(config.episodes));
        }
    }

    for episode in 0..config.episodes {
        let mut observation = env.reset()?;
        active
            .par_iter_mut()
            .for_each(|agent| agent.begin_episode(&observation));

        let mut episode_rewards: BTreeMap<AgentId, Vec<f64>> = BTreeMap::new();
        let mut episode_actions: BTreeMap<AgentId, Vec<AllocationVector>> = BTreeMap::new();
        let mut totals: BTreeMap<AgentId, f64> = BTreeMap::new();
        let mut steps = 0;

        loop {
            if config.max_steps.map_or(false, |max| steps >= max) {
                break;
            }

            let actions: Actions = active
                .par_iter_mut()
                .map(|agent| {
                    let action = agent.act(&observation);
                    (agent.name().to_string(), action)
                })
                .collect();

            let result = env.step(&actions)?;
            let done = result.done;

            active.par_iter_mut().for_each(|agent| {
                let name = agent.name();
                if let (Some(action), Some(&reward)) =
                    (actions.get(name), result.rewards.get(name))
                {
                    let transition = Transition {
                        observation: &observation,
                        action,
                        reward,
                        done,
                        next_observation: &result.observation,
                    };
                    agent.observe(&transition);
                }
            });

            for (name, reward) in &result.rewards {
                *totals.entry(name.clone()).or_insert(0.0) += reward;
                if config.record {
                    episode_rewards.entry(name.clone()).or_default().push(*reward);
                }
            }
            if config.record {
                for (name, action) in actions {
                    episode_actions.entry(name).or_default().push(action);
                }
            }

            observation = result.observation;
            steps += 1;
            if done {
                break;
            }
        }

        active.par_iter_mut().for_each(|agent| agent.end_episode());

        for (name, series) in history.totals.iter_mut() {
            let total = totals.get(name).copied().unwrap_or(0.0);
            info!("episode {}: agent `{}` cumulative reward {:.6}", episode, name, total);
            series.push(total);
        }
        if config.record {
            for (name, series) in history.rewards.iter_mut() {
                series.push(episode_rewards.remove(name).unwrap_or_default());
            }
            for (name, series) in history.actions.iter_mut() {
                series.push(episode_actions.remove(name).unwrap_or_default());
            }
        }
    }

    Ok(history)
}
