//! Core types and utilities for allocgym.

pub mod error;
pub mod tape;
pub mod timeseries;
pub mod types;
pub mod window;

pub use error::{GymError, Result};
pub use tape::{PriceTape, ReturnTape};
pub use timeseries::TimeSeries;
pub use types::*;
pub use window::RingBuffer;
