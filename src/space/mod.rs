//! Action space of the trading environment.

pub mod allocation;

pub use allocation::AllocationSpace;
