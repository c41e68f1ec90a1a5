//! Constrained portfolio optimizer.
//!
//! Minimizes an [`Objective`] over allocation vectors subject to the budget
//! equality `sum(w) = 1` and, without short sales, `w >= 0`. Every iterate is
//! projected onto the feasible set, so the budget is part of the solve rather
//! than a check afterwards.
//!
//! The method is a projected-gradient sequence with central finite-difference
//! gradients and an Armijo backtracking line search. No closed form is assumed
//! since the transaction-cost term is not differentiable.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::error::{GymError, Result};
use crate::optim::objectives::{dot, Objective};
use crate::space::AllocationSpace;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Maximum number of outer iterations.
    pub max_iter: usize,
    /// Relative objective improvement below which the solve stops.
    pub ftol: f64,
    /// Projected-gradient norm below which the solve stops.
    pub gtol: f64,
    /// Step length tried on the first iteration.
    pub initial_step: f64,
    /// Largest step length the line search may grow to.
    pub max_step: f64,
    /// Step length below which no descent is considered possible.
    pub min_step: f64,
    /// Relative finite-difference increment.
    pub fd_step: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            ftol: 1e-12,
            gtol: 1e-9,
            initial_step: 1.0,
            max_step: 100.0,
            min_step: 1e-14,
            fd_step: 1e-7,
        }
    }
}

impl OptimizerConfig {
    /// Set the iteration limit.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the objective tolerance.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }
}

/// Reason a solve terminated successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convergence {
    /// Projected gradient vanished.
    Stationary,
    /// Objective improvement fell below `ftol`.
    ObjectiveTolerance,
    /// The line search found no descent down to `min_step`.
    NoDescent,
}

/// Outcome of a successful solve.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Optimal allocation.
    pub weights: Vec<f64>,
    /// Objective value at `weights`.
    pub value: f64,
    /// Objective value at the starting point.
    pub initial_value: f64,
    /// Outer iterations performed.
    pub iterations: usize,
    /// Termination reason.
    pub convergence: Convergence,
}

/// Budget-constrained minimizer.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedOptimizer {
    /// Configuration.
    pub config: OptimizerConfig,
}

impl ConstrainedOptimizer {
    /// Create an optimizer with the given configuration.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimize `objective` over the allocation space.
    ///
    /// # Arguments
    /// * `objective` - Functional to minimize
    /// * `mu` - Expected returns (length M)
    /// * `sigma` - Covariance matrix (M x M)
    /// * `previous` - Previous allocation: warm start and transaction-cost
    ///   reference; uniform when `None`
    /// * `short_sales` - Allow negative weights
    ///
    /// # Returns
    /// The optimal weights, or `OptimizationFailure` when the solver cannot
    /// converge. A failed solve never yields a partial vector.
    pub fn minimize<O: Objective + ?Sized>(
        &self,
        objective: &O,
        mu: &[f64],
        sigma: &[Vec<f64>],
        previous: Option<&[f64]>,
        short_sales: bool,
    ) -> Result<OptimizationResult> {
        let m = mu.len();
        if m == 0 {
            return Err(GymError::empty_data("expected returns"));
        }
        if sigma.len() != m {
            return Err(GymError::length_mismatch(m, sigma.len()));
        }
        if let Some(row) = sigma.iter().find(|row| row.len() != m) {
            return Err(GymError::length_mismatch(m, row.len()));
        }

        let space = AllocationSpace::for_short_sales(m, short_sales);
        let reference = match previous {
            Some(w0) if w0.len() != m => return Err(GymError::length_mismatch(m, w0.len())),
            Some(w0) => w0.to_vec(),
            None => space.uniform(),
        };
        if reference.iter().any(|w| !w.is_finite()) {
            return Err(GymError::optimization_failure(
                "initial guess contains non-finite weights",
            ));
        }

        let f = |w: &[f64]| objective.evaluate(w, mu, sigma, &reference);

        let mut x = space.project(&reference);
        let mut fx = f(&x);
        if !fx.is_finite() {
            return Err(GymError::optimization_failure(format!(
                "objective is not finite at the initial point ({})",
                fx
            )));
        }
        let initial_value = fx;
        let mut step = self.config.initial_step;

        for iter in 0..self.config.max_iter {
            let grad = self.gradient(&f, &x);
            if grad.iter().any(|g| !g.is_finite()) {
                return Err(GymError::optimization_failure(format!(
                    "non-finite gradient at iteration {}",
                    iter
                )));
            }

            let unit = space.project(&descend(&x, &grad, 1.0));
            if max_abs_diff(&unit, &x) <= self.config.gtol {
                return self.finish(&space, x, fx, initial_value, iter, Convergence::Stationary);
            }

            let mut accepted = None;
            while step >= self.config.min_step {
                let candidate = space.project(&descend(&x, &grad, step));
                let delta: Vec<f64> = candidate.iter().zip(x.iter()).map(|(c, xi)| c - xi).collect();
                let slope = dot(&grad, &delta);
                let fc = f(&candidate);
                if fc.is_finite() && fc <= fx + ARMIJO * slope {
                    accepted = Some((candidate, fc));
                    break;
                }
                step *= 0.5;
            }

            let Some((candidate, fc)) = accepted else {
                return self.finish(&space, x, fx, initial_value, iter, Convergence::NoDescent);
            };

            let improvement = fx - fc;
            x = candidate;
            fx = fc;
            if improvement <= self.config.ftol * (1.0 + fx.abs()) {
                return self.finish(
                    &space,
                    x,
                    fx,
                    initial_value,
                    iter + 1,
                    Convergence::ObjectiveTolerance,
                );
            }
            step = (step * 2.0).min(self.config.max_step);
        }

        Err(GymError::optimization_failure(format!(
            "iteration limit of {} reached",
            self.config.max_iter
        )))
    }

    fn finish(
        &self,
        space: &AllocationSpace,
        weights: Vec<f64>,
        value: f64,
        initial_value: f64,
        iterations: usize,
        convergence: Convergence,
    ) -> Result<OptimizationResult> {
        if !space.contains(&weights) {
            return Err(GymError::optimization_failure(format!(
                "solution left the feasible set: {:?}",
                weights
            )));
        }
        debug!(
            "optimizer converged ({:?}) after {} iterations: value {:.6} -> {:.6}",
            convergence, iterations, initial_value, value
        );
        Ok(OptimizationResult {
            weights,
            value,
            initial_value,
            iterations,
            convergence,
        })
    }

    /// Central finite-difference gradient.
    fn gradient<F: Fn(&[f64]) -> f64>(&self, f: &F, x: &[f64]) -> Vec<f64> {
        let mut probe = x.to_vec();
        (0..x.len())
            .map(|i| {
                let h = self.config.fd_step * x[i].abs().max(1.0);
                probe[i] = x[i] + h;
                let up = f(&probe);
                probe[i] = x[i] - h;
                let down = f(&probe);
                probe[i] = x[i];
                (up - down) / (2.0 * h)
            })
            .collect()
    }
}

fn descend(x: &[f64], grad: &[f64], step: f64) -> Vec<f64> {
    x.iter().zip(grad.iter()).map(|(xi, gi)| xi - step * gi).collect()
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0_f64, |m, (x, y)| m.max((x - y).abs()))
}
