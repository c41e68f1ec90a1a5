//! Core data types for allocgym.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Type alias for price values.
pub type Price = f64;

/// Type alias for timestamp values (nanoseconds since epoch by convention).
pub type Timestamp = i64;

/// Registry key of an agent.
pub type AgentId = String;

/// Fractional wealth weights across instruments, cash last.
pub type AllocationVector = Vec<f64>;

/// Submitted actions for one step, keyed by agent.
pub type Actions = HashMap<AgentId, AllocationVector>;

/// Realized rewards for one step, keyed by agent.
pub type Rewards = HashMap<AgentId, f64>;

/// Diagnostic information attached to a step (empty by default).
pub type Info = BTreeMap<String, String>;

/// Default tolerance of the budget constraint.
pub const BUDGET_TOLERANCE: f64 = 1e-5;

/// Lifecycle state of a trading environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvState {
    /// Constructed, never reset.
    Initialized,
    /// Between `reset` and the terminal step.
    Running,
    /// Cursor sits on the last index of the tape.
    Terminated,
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvState::Initialized => "initialized",
            EnvState::Running => "running",
            EnvState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Market snapshot handed to agents.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Cursor position on the price tape.
    pub index: usize,
    /// Timestamp at `index`.
    pub timestamp: Timestamp,
    /// Prices at `index`, cash last.
    pub prices: Vec<Price>,
    /// Period returns ending at `index`; `None` on the first timestamp.
    pub returns: Option<Vec<f64>>,
}

impl Observation {
    /// Number of assets including cash.
    #[inline]
    pub fn num_assets(&self) -> usize {
        self.prices.len()
    }
}

/// Outcome of a successful `step`.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Observation at the new cursor.
    pub observation: Observation,
    /// Reward per agent.
    pub rewards: Rewards,
    /// True iff the new cursor is the last index.
    pub done: bool,
    /// Reserved diagnostics.
    pub info: Info,
}

/// One agent-environment interaction, passed to `Agent::observe`.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub observation: &'a Observation,
    pub action: &'a [f64],
    pub reward: f64,
    pub done: bool,
    pub next_observation: &'a Observation,
}

/// Trading environment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Permit negative weights. When false the action space is `[0, inf)`.
    pub short_sales: bool,
    /// Budget-constraint tolerance.
    pub tolerance: f64,
    /// Identifier of the synthetic cash column.
    pub cash_symbol: String,
    /// Constant price of the cash column.
    pub cash_price: Price,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            short_sales: true,
            tolerance: BUDGET_TOLERANCE,
            cash_symbol: "CASH".to_string(),
            cash_price: 1.0,
        }
    }
}

impl EnvConfig {
    /// Set the short-sale policy.
    pub fn with_short_sales(mut self, short_sales: bool) -> Self {
        self.short_sales = short_sales;
        self
    }

    /// Set the budget tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the cash column identifier.
    pub fn with_cash_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.cash_symbol = symbol.into();
        self
    }
}
