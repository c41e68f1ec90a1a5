//! Performance metrics over realized rewards.

pub mod drawdown;
pub mod returns;
pub mod streaming;
pub mod summary;

pub use drawdown::{drawdown_curve, max_drawdown, DrawdownTracker};
pub use returns::{cumulative_return, pnl};
pub use streaming::StreamingMoments;
pub use summary::SummaryStatistics;
