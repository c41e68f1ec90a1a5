//! Simulation engine, agent records and the episode runner.

pub mod engine;
pub mod record;
pub mod runner;

pub use engine::TradingEnv;
pub use record::AgentRecord;
pub use runner::{run, RunConfig, RunHistory};
