//! Optimizer-backed agent over a rolling window of returns.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::agents::traits::Agent;
use crate::core::error::Result;
use crate::core::types::{AllocationVector, Observation, Transition};
use crate::core::window::RingBuffer;
use crate::optim::estimate;
use crate::optim::objectives::{BuiltinObjective, Objective};
use crate::optim::solver::{ConstrainedOptimizer, OptimizerConfig};

/// Configuration of a [`QuadraticAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticConfig {
    /// Number of return rows kept for estimation.
    pub window: usize,
    /// Objective minimized every period.
    pub objective: BuiltinObjective,
    /// Allow negative weights.
    pub short_sales: bool,
    /// Solver settings.
    pub optimizer: OptimizerConfig,
}

impl Default for QuadraticConfig {
    fn default() -> Self {
        Self {
            window: 10,
            objective: BuiltinObjective::default(),
            short_sales: false,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl QuadraticConfig {
    /// Set the estimation window.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the objective.
    pub fn with_objective(mut self, objective: BuiltinObjective) -> Self {
        self.objective = objective;
        self
    }

    /// Set the short-sale policy.
    pub fn with_short_sales(mut self, short_sales: bool) -> Self {
        self.short_sales = short_sales;
        self
    }
}

/// Re-optimizes its portfolio each period from window estimates.
///
/// `mu` is the window mean. `sigma` is the sample covariance once the window
/// is full and the identity before. The previous allocation warm-starts each
/// solve unless the objective is not finite there, as with an all-cash
/// portfolio under the Sharpe ratio; the solve then starts from uniform. A
/// failed solve keeps the starting allocation.
#[derive(Debug, Clone)]
pub struct QuadraticAgent {
    name: String,
    config: QuadraticConfig,
    optimizer: ConstrainedOptimizer,
    memory: RingBuffer<Vec<f64>>,
    weights: Option<AllocationVector>,
}

impl QuadraticAgent {
    /// Create a new quadratic agent.
    pub fn new(name: impl Into<String>, config: QuadraticConfig) -> Result<Self> {
        let memory = RingBuffer::new(config.window)?;
        Ok(Self {
            name: name.into(),
            optimizer: ConstrainedOptimizer::new(config.optimizer.clone()),
            config,
            memory,
            weights: None,
        })
    }

    /// Tangency-portfolio agent: Sharpe objective without transaction costs.
    pub fn tangent(name: impl Into<String>, window: usize) -> Result<Self> {
        let config = QuadraticConfig::default()
            .with_window(window)
            .with_objective(BuiltinObjective::sharpe_ratio(0.0));
        Self::new(name, config)
    }

    /// Configuration.
    pub fn config(&self) -> &QuadraticConfig {
        &self.config
    }

    /// Allocation chosen at the last `act`, if any.
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Number of return rows currently in the window.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    fn estimates(&self) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        let rows = self.memory.to_vec();
        let mu = estimate::mean(&rows)?;
        let sigma = if self.memory.is_full() && rows.len() >= 2 {
            estimate::covariance(&rows)?
        } else {
            estimate::identity(mu.len())
        };
        Ok((mu, sigma))
    }
}

impl Agent for QuadraticAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, observation: &Observation) -> AllocationVector {
        let n = observation.num_assets();
        let uniform = || vec![1.0 / n as f64; n];
        let previous = self.weights.take().filter(|w| w.len() == n);

        if self.memory.is_empty() {
            let weights = previous.unwrap_or_else(uniform);
            self.weights = Some(weights.clone());
            return weights;
        }

        let (mu, sigma) = match self.estimates() {
            Ok(estimates) => estimates,
            Err(err) => {
                warn!("{}: keeping previous allocation: {}", self.name, err);
                let weights = previous.unwrap_or_else(uniform);
                self.weights = Some(weights.clone());
                return weights;
            }
        };

        let previous = previous.filter(|w| {
            let usable = w.len() == mu.len()
                && self.config.objective.evaluate(w, &mu, &sigma, w).is_finite();
            if !usable {
                debug!(
                    "{}: {} undefined at previous allocation, starting from uniform",
                    self.name, self.config.objective
                );
            }
            usable
        });
        let fallback = previous.clone().unwrap_or_else(uniform);

        let solved = self.optimizer.minimize(
            &self.config.objective,
            &mu,
            &sigma,
            previous.as_deref(),
            self.config.short_sales,
        );

        let weights = match solved {
            Ok(result) => {
                debug!(
                    "{}: {} solved in {} iterations, value {:.6}",
                    self.name, self.config.objective, result.iterations, result.value
                );
                result.weights
            }
            Err(err) => {
                warn!("{}: keeping starting allocation: {}", self.name, err);
                fallback
            }
        };
        self.weights = Some(weights.clone());
        weights
    }

    fn begin_episode(&mut self, _observation: &Observation) {
        self.memory.clear();
        self.weights = None;
    }

    fn observe(&mut self, transition: &Transition<'_>) {
        if let Some(returns) = &transition.next_observation.returns {
            if returns.iter().all(|r| r.is_finite()) {
                self.memory.push(returns.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::AllocationSpace;

    fn observation(index: usize, returns: Option<Vec<f64>>) -> Observation {
        Observation {
            index,
            timestamp: index as i64,
            prices: vec![1.0, 1.0, 1.0],
            returns,
        }
    }

    fn feed(agent: &mut QuadraticAgent, rows: &[Vec<f64>]) {
        let first = observation(0, None);
        for (i, row) in rows.iter().enumerate() {
            let next = observation(i + 1, Some(row.clone()));
            let action = vec![0.0, 0.0, 1.0];
            agent.observe(&Transition {
                observation: &first,
                action: &action,
                reward: 0.0,
                done: false,
                next_observation: &next,
            });
        }
    }

    #[test]
    fn test_uniform_before_any_observation() {
        let mut agent = QuadraticAgent::new("q", QuadraticConfig::default()).unwrap();
        let w = agent.act(&observation(0, None));
        assert_eq!(w.len(), 3);
        assert!(w.iter().all(|&x| (x - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = QuadraticConfig::default().with_window(0);
        assert!(QuadraticAgent::new("q", config).is_err());
    }

    #[test]
    fn test_window_is_bounded() {
        let mut agent = QuadraticAgent::tangent("t", 3).unwrap();
        feed(&mut agent, &vec![vec![0.01, 0.02, 0.0]; 5]);
        assert_eq!(agent.memory_len(), 3);
    }

    #[test]
    fn test_risk_aversion_prefers_better_asset() {
        let config = QuadraticConfig::default()
            .with_window(4)
            .with_objective(BuiltinObjective::risk_aversion(1.0, 0.0));
        let mut agent = QuadraticAgent::new("q", config).unwrap();
        feed(
            &mut agent,
            &[
                vec![0.05, -0.01, 0.0],
                vec![0.04, 0.00, 0.0],
                vec![0.06, -0.02, 0.0],
                vec![0.05, -0.01, 0.0],
            ],
        );
        let w = agent.act(&observation(4, Some(vec![0.05, -0.01, 0.0])));
        assert!(AllocationSpace::long_only(3).contains(&w));
        assert!(w[0] > w[1]);
        assert_eq!(agent.weights(), Some(w.as_slice()));
    }

    #[test]
    fn test_failed_solve_keeps_previous_allocation() {
        // cash only: zero mean and zero covariance make the Sharpe ratio undefined
        let mut agent = QuadraticAgent::tangent("t", 2).unwrap();
        let first = agent.act(&observation(0, None));
        feed(&mut agent, &[vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]]);
        let w = agent.act(&observation(2, Some(vec![0.0, 0.0, 0.0])));
        assert_eq!(w, first);
    }

    #[test]
    fn test_all_cash_start_is_not_sticky() {
        let mut agent = QuadraticAgent::tangent("t", 3).unwrap();
        agent.weights = Some(vec![0.0, 0.0, 1.0]);
        feed(
            &mut agent,
            &[
                vec![0.02, 0.01, 0.0],
                vec![0.04, -0.01, 0.0],
                vec![0.03, 0.02, 0.0],
            ],
        );
        let w = agent.act(&observation(3, Some(vec![0.03, 0.02, 0.0])));
        assert!(AllocationSpace::long_only(3).contains(&w));
        assert!(w[2] < 1.0 - 1e-6);
        assert_eq!(agent.weights(), Some(w.as_slice()));
    }

    #[test]
    fn test_begin_episode_clears_memory() {
        let mut agent = QuadraticAgent::tangent("t", 3).unwrap();
        feed(&mut agent, &[vec![0.01, 0.02, 0.0]]);
        agent.begin_episode(&observation(0, None));
        assert_eq!(agent.memory_len(), 0);
        assert!(agent.weights().is_none());
    }
}
