//! Portfolio optimization: objectives, moment estimates and the constrained solver.

pub mod estimate;
pub mod objectives;
pub mod solver;

pub use objectives::{risk_aversion, sharpe_ratio, BuiltinObjective, Objective};
pub use solver::{ConstrainedOptimizer, Convergence, OptimizationResult, OptimizerConfig};
