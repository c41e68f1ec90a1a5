//! Equal-weight agent.

use crate::agents::traits::Agent;
use crate::core::types::{AllocationVector, Observation};

/// Spreads wealth equally over every column, cash included.
#[derive(Debug, Clone)]
pub struct UniformAgent {
    name: String,
}

impl UniformAgent {
    /// Create a new uniform agent.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Agent for UniformAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, observation: &Observation) -> AllocationVector {
        let n = observation.num_assets();
        vec![1.0 / n as f64; n]
    }
}
