//! Agent that bets on the last period repeating itself.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agents::traits::Agent;
use crate::core::types::{AllocationVector, Observation};
use crate::space::AllocationSpace;

/// Softmax over the most recent returns: assets that just did well get more.
///
/// Without a usable return row (first period, or NaN) it falls back to a
/// random long-only allocation.
#[derive(Debug, Clone)]
pub struct PersistenceAgent {
    name: String,
    rng: StdRng,
}

impl PersistenceAgent {
    /// Create a new persistence agent with an explicit seed for the fallback draw.
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Numerically stable softmax.
pub fn softmax(x: &[f64]) -> Vec<f64> {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = x.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exp.iter().sum();
    exp.iter().map(|e| e / total).collect()
}

impl Agent for PersistenceAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, observation: &Observation) -> AllocationVector {
        match &observation.returns {
            Some(returns) if returns.iter().all(|r| r.is_finite()) => softmax(returns),
            _ => AllocationSpace::long_only(observation.num_assets()).sample(&mut self.rng),
        }
    }
}
