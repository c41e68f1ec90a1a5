//! Agent drawing random allocations.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agents::traits::Agent;
use crate::core::types::{AllocationVector, Observation};
use crate::space::AllocationSpace;

/// Samples a fresh member of the allocation space every period.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    name: String,
    short_sales: bool,
    rng: StdRng,
}

impl RandomAgent {
    /// Create a long-only random agent with an explicit seed.
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            short_sales: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Allow negative weights in the drawn allocations.
    pub fn with_short_sales(mut self, short_sales: bool) -> Self {
        self.short_sales = short_sales;
        self
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, observation: &Observation) -> AllocationVector {
        AllocationSpace::for_short_sales(observation.num_assets(), self.short_sales)
            .sample(&mut self.rng)
    }
}
