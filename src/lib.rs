//! allocgym - multi-agent portfolio allocation simulator.
//!
//! This crate provides:
//! - Price and return tapes with a synthetic cash column
//! - A budget-constrained allocation space with sampling and projection
//! - Sharpe-ratio and risk-aversion objectives with transaction costs
//! - A constrained optimizer over the allocation space
//! - A trading environment stepping many agents in lockstep
//! - Built-in agents and an episode runner
//! - Wealth, drawdown and summary statistics

pub mod agents;
pub mod core;
pub mod env;
pub mod metrics;
pub mod optim;
pub mod space;

pub use crate::agents::Agent;
pub use crate::core::{GymError, Result};
pub use crate::env::{run, RunConfig, TradingEnv};
pub use crate::space::AllocationSpace;
