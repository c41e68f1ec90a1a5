//! Multi-agent trading environment.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::core::error::{GymError, Result};
use crate::core::tape::{PriceTape, ReturnTape};
use crate::core::types::{
    Actions, AgentId, EnvConfig, EnvState, Info, Observation, Price, Rewards, StepResult,
    Timestamp,
};
use crate::env::record::AgentRecord;
use crate::optim::objectives::dot;
use crate::space::AllocationSpace;

/// Simulation engine shared by a set of registered agents.
///
/// All agents step together over one price tape. The reward of an agent at
/// cursor `t` is the inner product of the returns realized at `t` with the
/// allocation it submitted.
#[derive(Debug, Clone)]
pub struct TradingEnv {
    config: EnvConfig,
    prices: PriceTape,
    returns: ReturnTape,
    action_space: AllocationSpace,
    cursor: usize,
    state: EnvState,
    agents: BTreeMap<AgentId, AgentRecord>,
}

impl TradingEnv {
    /// Create an environment over a price tape.
    ///
    /// The tape's cash column must match the configured cash symbol and price.
    pub fn new(prices: PriceTape, config: EnvConfig) -> Result<Self> {
        if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
            return Err(GymError::invalid_parameter(format!(
                "budget tolerance must be finite and positive, got {}",
                config.tolerance
            )));
        }
        if prices.cash_symbol() != config.cash_symbol {
            return Err(GymError::type_mismatch(format!(
                "tape cash column `{}` does not match configured `{}`",
                prices.cash_symbol(),
                config.cash_symbol
            )));
        }
        let cash_price = prices.row(0).and_then(|row| row.last().copied());
        if cash_price != Some(config.cash_price) {
            return Err(GymError::invalid_parameter(format!(
                "tape cash price {:?} does not match configured {}",
                cash_price, config.cash_price
            )));
        }

        let returns = prices.returns();
        let action_space = AllocationSpace::for_short_sales(prices.num_assets(), config.short_sales)
            .with_tolerance(config.tolerance);

        info!(
            "trading env: {} instruments + {}, {} timestamps, short_sales={}",
            prices.universe().len(),
            prices.cash_symbol(),
            prices.len(),
            config.short_sales
        );

        Ok(Self {
            config,
            prices,
            returns,
            action_space,
            cursor: 0,
            state: EnvState::Initialized,
            agents: BTreeMap::new(),
        })
    }

    /// Build the price tape from raw rows and create the environment.
    ///
    /// # Arguments
    /// * `universe` - Instrument identifiers (without cash)
    /// * `timestamps` - Strictly increasing index
    /// * `rows` - One price row per timestamp
    /// * `config` - Environment configuration (cash column included)
    pub fn from_prices(
        universe: Vec<String>,
        timestamps: Vec<Timestamp>,
        rows: Vec<Vec<Price>>,
        config: EnvConfig,
    ) -> Result<Self> {
        let tape = PriceTape::with_cash(
            universe,
            timestamps,
            rows,
            &config.cash_symbol,
            config.cash_price,
        )?;
        Self::new(tape, config)
    }

    /// Register an agent. Registering an existing name leaves its record untouched.
    pub fn register(&mut self, name: impl Into<AgentId>) {
        let name = name.into();
        if self.agents.contains_key(&name) {
            debug!("agent `{}` already registered", name);
            return;
        }
        debug!("registering agent `{}`", name);
        let record = AgentRecord::new(self.prices.timestamps(), self.prices.num_assets());
        self.agents.insert(name, record);
    }

    /// Remove one agent, or every agent when `name` is `None`.
    pub fn unregister(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                if self.agents.remove(name).is_some() {
                    debug!("unregistered agent `{}`", name);
                } else {
                    debug!("unregister: agent `{}` is not registered", name);
                }
            }
            None => {
                debug!("unregistering all {} agents", self.agents.len());
                self.agents.clear();
            }
        }
    }

    /// Start a new episode at the first timestamp.
    pub fn reset(&mut self) -> Result<Observation> {
        if self.agents.is_empty() {
            warn!("reset rejected: no agents registered");
            return Err(GymError::NoAgentsRegistered);
        }
        self.cursor = 0;
        self.state = EnvState::Running;
        self.agents.values_mut().for_each(AgentRecord::reset);
        debug!("episode reset with {} agents", self.agents.len());
        Ok(self.observation())
    }

    /// Advance one period with the allocations of every registered agent.
    ///
    /// All validation happens before any state changes, so a rejected call
    /// leaves the environment exactly as it was.
    pub fn step(&mut self, actions: &Actions) -> Result<StepResult> {
        self.validate(actions)?;

        let next = self.cursor + 1;
        let period_returns = self
            .returns
            .at_price_index(next)
            .ok_or_else(|| GymError::insufficient_data(next + 1, self.prices.len()))?;

        let rewards: Rewards = actions
            .par_iter()
            .map(|(name, allocation)| (name.clone(), dot(period_returns, allocation)))
            .collect();

        for (name, record) in self.agents.iter_mut() {
            if let (Some(allocation), Some(reward)) = (actions.get(name), rewards.get(name)) {
                record.record(next, allocation.clone(), *reward);
            }
        }

        self.cursor = next;
        let done = self.cursor == self.prices.last_index();
        if done {
            self.state = EnvState::Terminated;
            debug!("episode terminated at index {}", self.cursor);
        }

        Ok(StepResult {
            observation: self.observation(),
            rewards,
            done,
            info: Info::new(),
        })
    }

    fn validate(&self, actions: &Actions) -> Result<()> {
        if self.agents.is_empty() {
            warn!("step rejected: no agents registered");
            return Err(GymError::NoAgentsRegistered);
        }
        if self.state != EnvState::Running {
            warn!("step rejected: environment is {}", self.state);
            return Err(GymError::EpisodeNotRunning {
                state: self.state.to_string(),
            });
        }

        let missing: Vec<String> = self
            .agents
            .keys()
            .filter(|name| !actions.contains_key(*name))
            .cloned()
            .collect();
        let mut unexpected: Vec<String> = actions
            .keys()
            .filter(|name| !self.agents.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            unexpected.sort();
            warn!(
                "step rejected: missing actions {:?}, unexpected actions {:?}",
                missing, unexpected
            );
            return Err(GymError::InvalidActionSet {
                missing,
                unexpected,
            });
        }

        for name in self.agents.keys() {
            if let Some(allocation) = actions.get(name) {
                if !self.action_space.contains(allocation) {
                    warn!("step rejected: invalid allocation from `{}`: {:?}", name, allocation);
                    return Err(GymError::invalid_allocation(name.as_str(), allocation));
                }
            }
        }
        Ok(())
    }

    /// Observation at the current cursor.
    pub fn observation(&self) -> Observation {
        Observation {
            index: self.cursor,
            timestamp: self.index(),
            prices: self.prices.row(self.cursor).map(<[f64]>::to_vec).unwrap_or_default(),
            returns: self.returns.at_price_index(self.cursor).map(<[f64]>::to_vec),
        }
    }

    /// Current cursor position.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Lifecycle state.
    #[inline]
    pub fn state(&self) -> EnvState {
        self.state
    }

    /// Timestamp at the cursor.
    pub fn index(&self) -> Timestamp {
        self.prices.timestamps()[self.cursor]
    }

    /// The price tape.
    pub fn prices(&self) -> &PriceTape {
        &self.prices
    }

    /// The return tape.
    pub fn returns(&self) -> &ReturnTape {
        &self.returns
    }

    /// The space of admissible allocations.
    pub fn action_space(&self) -> &AllocationSpace {
        &self.action_space
    }

    /// Instrument identifiers without cash.
    pub fn universe(&self) -> &[String] {
        self.prices.universe()
    }

    /// Configuration.
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Record of a registered agent.
    pub fn record(&self, name: &str) -> Option<&AgentRecord> {
        self.agents.get(name)
    }

    /// Registered agent names, sorted.
    pub fn agents(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    /// Check whether `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }
}
