//! Error types for allocgym.

use thiserror::Error;

/// Result type alias for allocgym operations.
pub type Result<T> = std::result::Result<T, GymError>;

/// Error types for the simulation engine and optimizer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GymError {
    /// A constructor or configuration argument has the wrong shape or type.
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    /// A submitted allocation is not a member of the action space.
    #[error("Invalid allocation from agent `{agent}`: {allocation:?}")]
    InvalidAllocation { agent: String, allocation: Vec<f64> },

    /// Submitted action keys differ from the registered agents.
    #[error("Invalid action set: missing {missing:?}, unexpected {unexpected:?}")]
    InvalidActionSet {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// `reset` or `step` called with an empty registry.
    #[error("No agents registered")]
    NoAgentsRegistered,

    /// The constrained solver did not converge.
    #[error("Optimization failure: {message}")]
    OptimizationFailure { message: String },

    /// `step` called outside of a running episode.
    #[error("Episode is not running (state: {state})")]
    EpisodeNotRunning { state: String },

    /// Data length mismatch between arrays.
    #[error("Data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Invalid parameter value.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Insufficient data for calculation.
    #[error("Insufficient data: need at least {required} elements, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Empty data error.
    #[error("Empty data provided for {context}")]
    EmptyData { context: String },
}

impl GymError {
    /// Create a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    /// Create an invalid allocation error.
    pub fn invalid_allocation(agent: impl Into<String>, allocation: &[f64]) -> Self {
        Self::InvalidAllocation {
            agent: agent.into(),
            allocation: allocation.to_vec(),
        }
    }

    /// Create an optimization failure carrying the solver diagnostic.
    pub fn optimization_failure(message: impl Into<String>) -> Self {
        Self::OptimizationFailure {
            message: message.into(),
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Create an empty data error.
    pub fn empty_data(context: impl Into<String>) -> Self {
        Self::EmptyData {
            context: context.into(),
        }
    }

    /// Whether the error is an optimizer convergence failure.
    #[inline]
    pub fn is_optimization_failure(&self) -> bool {
        matches!(self, Self::OptimizationFailure { .. })
    }
}
