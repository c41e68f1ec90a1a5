//! Agent betting everything on one asset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agents::traits::Agent;
use crate::core::types::{AllocationVector, Observation};

/// Puts all wealth in a single column chosen uniformly at random each period.
#[derive(Debug, Clone)]
pub struct BinaryAgent {
    name: String,
    rng: StdRng,
}

impl BinaryAgent {
    /// Create a new binary agent with an explicit seed.
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for BinaryAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, observation: &Observation) -> AllocationVector {
        let n = observation.num_assets();
        let mut weights = vec![0.0; n];
        if n > 0 {
            weights[self.rng.gen_range(0..n)] = 1.0;
        }
        weights
    }
}
