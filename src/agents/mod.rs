//! Agent contract and built-in strategies.

pub mod binary;
pub mod persistence;
pub mod quadratic;
pub mod random;
pub mod traits;
pub mod uniform;

pub use binary::BinaryAgent;
pub use persistence::PersistenceAgent;
pub use quadratic::{QuadraticAgent, QuadraticConfig};
pub use random::RandomAgent;
pub use traits::Agent;
pub use uniform::UniformAgent;
