//! Portfolio objective functionals, in minimization form.
//!
//! Reward-like quantities are negated so that every objective is minimized.
//! Shapes are contract preconditions: a mismatched covariance, mean or weight
//! vector panics instead of producing a wrong number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::GymError;

/// Transaction-cost coefficient of the Sharpe objective unless configured.
pub const DEFAULT_GAMMA: f64 = 0.0;
/// Risk-aversion coefficient unless configured.
pub const DEFAULT_ALPHA: f64 = 1.0;
/// Transaction-cost coefficient of the risk-aversion objective unless configured.
pub const DEFAULT_BETA: f64 = 0.0;

/// Inner product `w · r`.
#[inline]
pub fn dot(w: &[f64], r: &[f64]) -> f64 {
    w.iter().zip(r.iter()).map(|(a, b)| a * b).sum()
}

/// Expected portfolio return `w · mu`.
#[inline]
pub fn portfolio_return(w: &[f64], mu: &[f64]) -> f64 {
    dot(w, mu)
}

/// Portfolio variance `wᵀ Σ w`.
pub fn portfolio_variance(w: &[f64], sigma: &[Vec<f64>]) -> f64 {
    sigma
        .iter()
        .zip(w.iter())
        .map(|(row, wi)| wi * dot(row, w))
        .sum()
}

/// Transaction costs `coef · |w - w0|₁`.
pub fn transaction_costs(w: &[f64], w0: &[f64], coef: f64) -> f64 {
    w.iter().zip(w0.iter()).map(|(a, b)| (a - b).abs()).sum::<f64>() * coef
}

fn assert_shapes(w: &[f64], mu: &[f64], sigma: &[Vec<f64>], w0: &[f64]) {
    let m = sigma.len();
    assert!(
        sigma.iter().all(|row| row.len() == m),
        "covariance matrix must be square"
    );
    assert_eq!(mu.len(), m, "mean vector and covariance matrix differ in size");
    assert_eq!(w.len(), w0.len(), "candidate and previous weights differ in shape");
    assert_eq!(w.len(), m, "weights and mean vector differ in size");
}

/// Negated Sharpe ratio with transaction costs.
///
/// `-(w·mu / sqrt(wᵀΣw)) + gamma·|w - w0|₁`
pub fn sharpe_ratio(w: &[f64], mu: &[f64], sigma: &[Vec<f64>], w0: &[f64], gamma: f64) -> f64 {
    assert_shapes(w, mu, sigma, w0);
    let ratio = portfolio_return(w, mu) / portfolio_variance(w, sigma).sqrt();
    -(ratio - transaction_costs(w, w0, gamma))
}

/// Negated mean-variance utility with transaction costs.
///
/// `-(w·mu - alpha·wᵀΣw - beta·|w - w0|₁)`
pub fn risk_aversion(
    w: &[f64],
    mu: &[f64],
    sigma: &[Vec<f64>],
    w0: &[f64],
    alpha: f64,
    beta: f64,
) -> f64 {
    assert_shapes(w, mu, sigma, w0);
    -(portfolio_return(w, mu)
        - alpha * portfolio_variance(w, sigma)
        - transaction_costs(w, w0, beta))
}

/// A scalar functional of portfolio weights to be minimized.
pub trait Objective: Send + Sync {
    /// Evaluate at candidate weights `w` given previous weights `w0`.
    fn evaluate(&self, w: &[f64], mu: &[f64], sigma: &[Vec<f64>], w0: &[f64]) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&[f64], &[f64], &[Vec<f64>], &[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, w: &[f64], mu: &[f64], sigma: &[Vec<f64>], w0: &[f64]) -> f64 {
        self(w, mu, sigma, w0)
    }
}

/// The built-in objectives, selected by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinObjective {
    /// Tangency portfolio with an L1 transaction-cost penalty.
    SharpeRatio { gamma: f64 },
    /// Mean-variance trade-off with an L1 transaction-cost penalty.
    RiskAversion { alpha: f64, beta: f64 },
}

impl BuiltinObjective {
    /// Sharpe objective with the given cost coefficient.
    pub fn sharpe_ratio(gamma: f64) -> Self {
        Self::SharpeRatio { gamma }
    }

    /// Risk-aversion objective with the given coefficients.
    pub fn risk_aversion(alpha: f64, beta: f64) -> Self {
        Self::RiskAversion { alpha, beta }
    }

    /// Canonical name, as accepted by `FromStr`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SharpeRatio { .. } => "sharpe_ratio",
            Self::RiskAversion { .. } => "risk_aversion",
        }
    }
}

impl Default for BuiltinObjective {
    fn default() -> Self {
        Self::SharpeRatio {
            gamma: DEFAULT_GAMMA,
        }
    }
}

impl Objective for BuiltinObjective {
    fn evaluate(&self, w: &[f64], mu: &[f64], sigma: &[Vec<f64>], w0: &[f64]) -> f64 {
        match *self {
            Self::SharpeRatio { gamma } => sharpe_ratio(w, mu, sigma, w0, gamma),
            Self::RiskAversion { alpha, beta } => risk_aversion(w, mu, sigma, w0, alpha, beta),
        }
    }
}

impl FromStr for BuiltinObjective {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sharpe_ratio" | "sharpe" => Ok(Self::SharpeRatio {
                gamma: DEFAULT_GAMMA,
            }),
            "risk_aversion" => Ok(Self::RiskAversion {
                alpha: DEFAULT_ALPHA,
                beta: DEFAULT_BETA,
            }),
            other => Err(GymError::type_mismatch(format!(
                "unknown objective `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for BuiltinObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharpeRatio { gamma } => write!(f, "sharpe_ratio(gamma={})", gamma),
            Self::RiskAversion { alpha, beta } => {
                write!(f, "risk_aversion(alpha={}, beta={})", alpha, beta)
            }
        }
    }
}
