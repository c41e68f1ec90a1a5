//! Per-agent allocation and reward history.

use crate::core::timeseries::TimeSeries;
use crate::core::types::{AllocationVector, Timestamp};

/// Allocations and rewards of one agent, indexed by the price-tape timestamps.
///
/// Row 0 holds the initial portfolio (all wealth in cash) with reward 0.
/// Rows not yet reached hold NaN. Equality treats two unfilled cells as
/// equal, so a record compares equal to its own clone.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// Allocation held over the period ending at each timestamp.
    pub allocations: TimeSeries<AllocationVector>,
    /// Realized reward at each timestamp.
    pub rewards: TimeSeries<f64>,
}

impl AgentRecord {
    /// Create a fresh record over `timestamps` for `num_assets` columns (cash last).
    pub fn new(timestamps: &[Timestamp], num_assets: usize) -> Self {
        let mut record = Self {
            allocations: TimeSeries::filled(timestamps.to_vec(), vec![f64::NAN; num_assets]),
            rewards: TimeSeries::with_nan(timestamps.to_vec()),
        };
        record.seed();
        record
    }

    fn seed(&mut self) {
        let num_assets = self.num_assets();
        if num_assets > 0 {
            let mut all_cash = vec![0.0; num_assets];
            all_cash[num_assets - 1] = 1.0;
            self.allocations.set(0, all_cash);
        }
        self.rewards.set(0, 0.0);
    }

    /// Number of columns in every allocation row.
    pub fn num_assets(&self) -> usize {
        self.allocations.values.first().map_or(0, Vec::len)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Store the allocation and reward realized at `index`.
    pub(crate) fn record(&mut self, index: usize, allocation: AllocationVector, reward: f64) {
        self.allocations.set(index, allocation);
        self.rewards.set(index, reward);
    }

    /// Allocation at `index`, `None` when not yet filled.
    pub fn allocation(&self, index: usize) -> Option<&[f64]> {
        self.allocations
            .get(index)
            .filter(|row| row.iter().all(|w| !w.is_nan()))
            .map(Vec::as_slice)
    }

    /// Reward at `index`, `None` when not yet filled.
    pub fn reward(&self, index: usize) -> Option<f64> {
        self.rewards.get(index).copied().filter(|r| !r.is_nan())
    }

    /// Wealth path: running product of `(1 + reward)` over filled rows.
    pub fn wealth(&self) -> TimeSeries<f64> {
        self.rewards.compound()
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        let num_assets = self.num_assets();
        self.allocations.values.fill(vec![f64::NAN; num_assets]);
        self.rewards.values.fill(f64::NAN);
        self.seed();
    }
}

impl PartialEq for AgentRecord {
    fn eq(&self, other: &Self) -> bool {
        self.allocations.timestamps == other.allocations.timestamps
            && self.rewards.timestamps == other.rewards.timestamps
            && same_cells(&self.rewards.values, &other.rewards.values)
            && self.allocations.values.len() == other.allocations.values.len()
            && self
                .allocations
                .values
                .iter()
                .zip(other.allocations.values.iter())
                .all(|(a, b)| same_cells(a, b))
    }
}

fn same_cells(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}
