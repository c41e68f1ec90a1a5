//! Summary statistics of a realized return series.

use serde::{Deserialize, Serialize};

use crate::core::error::{GymError, Result};
use crate::env::record::AgentRecord;
use crate::metrics::drawdown::DrawdownTracker;
use crate::metrics::returns::cumulative_return;
use crate::metrics::streaming::StreamingMoments;

/// Confidence level of the historical VaR and CVaR.
pub const VAR_CONFIDENCE: f64 = 0.95;

/// Strategy report over per-period returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of valid returns.
    pub count: usize,
    /// Mean period return.
    pub mean: f64,
    /// Compounded total return.
    pub cumulative: f64,
    /// Sample standard deviation (annualized when a period count is given).
    pub volatility: f64,
    /// Mean over standard deviation (annualized when a period count is given).
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough loss of the wealth path, as a fraction.
    pub max_drawdown: f64,
    /// Mean drawdown length in periods.
    pub avg_drawdown_duration: f64,
    /// Population skewness.
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
    /// `|q95| / |q5|` of the returns.
    pub tail_ratio: f64,
    /// Historical 5% return quantile.
    pub value_at_risk: f64,
    /// Mean return at or below the value at risk.
    pub conditional_value_at_risk: f64,
    /// Fraction of positive returns.
    pub hit_ratio: f64,
    /// Average win over average loss.
    pub avg_win_to_avg_loss: f64,
    /// Expected profit per period, `hit·avg_win - miss·avg_loss`.
    pub avg_profitability_per_trade: f64,
}

impl SummaryStatistics {
    /// Unannualized statistics of `returns`. NaN values are ignored.
    pub fn from_returns(returns: &[f64]) -> Result<Self> {
        Self::with_periods(returns, None)
    }

    /// Statistics of `returns`, annualizing volatility and Sharpe with
    /// `periods_per_year` when given.
    ///
    /// # Arguments
    /// * `returns` - Realized per-period returns
    /// * `periods_per_year` - e.g. 252 for daily data
    pub fn with_periods(returns: &[f64], periods_per_year: Option<f64>) -> Result<Self> {
        if let Some(periods) = periods_per_year {
            if !(periods.is_finite() && periods > 0.0) {
                return Err(GymError::invalid_parameter(format!(
                    "periods per year must be positive, got {}",
                    periods
                )));
            }
        }

        let mut valid: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
        if valid.is_empty() {
            return Err(GymError::empty_data("returns"));
        }

        let moments: StreamingMoments = valid.iter().copied().collect();
        let mut tracker = DrawdownTracker::with_initial(1.0);
        let mut wealth = 1.0;
        for r in &valid {
            wealth *= 1.0 + r;
            tracker.update(wealth);
        }

        let scale = periods_per_year.map_or(1.0, f64::sqrt);
        let std = moments.std_dev();
        let sharpe_ratio = if std > 0.0 {
            moments.mean() / std * scale
        } else {
            0.0
        };

        valid.sort_by(f64::total_cmp);
        let q5 = quantile(&valid, 1.0 - VAR_CONFIDENCE);
        let q95 = quantile(&valid, VAR_CONFIDENCE);
        let tail: Vec<f64> = valid.iter().copied().filter(|&r| r <= q5).collect();
        let cvar = if tail.is_empty() {
            q5
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };

        let avg_win = moments.avg_win();
        let avg_loss = moments.avg_loss();
        let awal = if avg_loss > 0.0 {
            avg_win / avg_loss
        } else if avg_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Ok(Self {
            count: moments.count(),
            mean: moments.mean(),
            cumulative: cumulative_return(&valid),
            volatility: std * scale,
            sharpe_ratio,
            max_drawdown: tracker.max_drawdown(),
            avg_drawdown_duration: tracker.average_duration(),
            skewness: moments.skewness(),
            kurtosis: moments.kurtosis(),
            tail_ratio: q95.abs() / q5.abs(),
            value_at_risk: q5,
            conditional_value_at_risk: cvar,
            hit_ratio: moments.hit_ratio(),
            avg_win_to_avg_loss: awal,
            avg_profitability_per_trade: moments.hit_ratio() * avg_win
                - moments.loss_ratio() * avg_loss,
        })
    }

    /// Statistics of the rewards an agent has realized so far.
    pub fn from_record(record: &AgentRecord) -> Result<Self> {
        // row 0 is the seeded starting point, not a realized period
        let rewards = record.rewards.values.get(1..).unwrap_or_default();
        Self::from_returns(rewards)
    }
}

/// Linear-interpolated quantile of sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
