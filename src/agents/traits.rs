//! The agent contract.

use crate::core::types::{AllocationVector, Observation, Transition};

/// A participant of the trading environment.
///
/// Agents own their state; the runner drives every agent of a step in
/// parallel, hence the `Send` bound.
pub trait Agent: Send {
    /// Registry identifier.
    fn name(&self) -> &str;

    /// Allocation to hold over the next period, cash last.
    fn act(&mut self, observation: &Observation) -> AllocationVector;

    /// Called after `reset` with the first observation of an episode.
    fn begin_episode(&mut self, _observation: &Observation) {}

    /// Called after every step with the realized transition.
    fn observe(&mut self, _transition: &Transition<'_>) {}

    /// Called once the episode is done.
    fn end_episode(&mut self) {}
}
