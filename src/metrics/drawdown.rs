//! Incremental drawdown tracking over a wealth path.

/// Drawdown tracker for incremental wealth updates.
#[derive(Debug, Clone)]
pub struct DrawdownTracker {
    /// Current peak value.
    peak: f64,
    /// Current drawdown as a fraction of the peak.
    current_drawdown: f64,
    /// Maximum drawdown seen.
    max_drawdown: f64,
    /// Periods since the last peak.
    current_duration: usize,
    /// Longest drawdown duration.
    max_duration: usize,
    /// Durations of drawdowns that have been recovered.
    completed_durations: Vec<usize>,
    /// Index at max drawdown.
    max_drawdown_idx: usize,
    /// Total count of updates.
    count: usize,
}

impl Default for DrawdownTracker {
    fn default() -> Self {
        Self::with_initial(1.0)
    }
}

impl DrawdownTracker {
    /// Create a tracker whose first peak is `initial_value`.
    pub fn with_initial(initial_value: f64) -> Self {
        Self {
            peak: initial_value,
            current_drawdown: 0.0,
            max_drawdown: 0.0,
            current_duration: 0,
            max_duration: 0,
            completed_durations: Vec::new(),
            max_drawdown_idx: 0,
            count: 1,
        }
    }

    /// Update with a new wealth value. NaN values are skipped.
    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.count += 1;

        if value >= self.peak {
            if self.current_duration > 0 {
                self.completed_durations.push(self.current_duration);
            }
            self.peak = value;
            self.current_drawdown = 0.0;
            self.current_duration = 0;
        } else {
            self.current_drawdown = if self.peak > 0.0 {
                (self.peak - value) / self.peak
            } else {
                0.0
            };
            self.current_duration += 1;

            if self.current_drawdown > self.max_drawdown {
                self.max_drawdown = self.current_drawdown;
                self.max_drawdown_idx = self.count - 1;
            }
            self.max_duration = self.max_duration.max(self.current_duration);
        }
    }

    /// Current drawdown as a fraction.
    #[inline]
    pub fn current_drawdown(&self) -> f64 {
        self.current_drawdown
    }

    /// Maximum drawdown as a fraction.
    #[inline]
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Maximum drawdown as percentage.
    #[inline]
    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown * 100.0
    }

    /// Current peak value.
    #[inline]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Periods since the last peak.
    #[inline]
    pub fn current_duration(&self) -> usize {
        self.current_duration
    }

    /// Longest drawdown duration in periods.
    #[inline]
    pub fn max_duration(&self) -> usize {
        self.max_duration
    }

    /// Mean duration over every drawdown, the unrecovered one included.
    pub fn average_duration(&self) -> f64 {
        let ongoing = usize::from(self.current_duration > 0);
        let episodes = self.completed_durations.len() + ongoing;
        if episodes == 0 {
            return 0.0;
        }
        let total: usize = self.completed_durations.iter().sum::<usize>() + self.current_duration;
        total as f64 / episodes as f64
    }

    /// Check if currently in drawdown.
    #[inline]
    pub fn in_drawdown(&self) -> bool {
        self.current_drawdown > 0.0
    }

    /// Update index at which the max drawdown occurred.
    #[inline]
    pub fn max_drawdown_idx(&self) -> usize {
        self.max_drawdown_idx
    }
}

/// Drawdown (fraction below the running peak) at each point of a wealth path.
pub fn drawdown_curve(wealth: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    wealth
        .iter()
        .map(|&w| {
            if w.is_nan() {
                return f64::NAN;
            }
            peak = peak.max(w);
            if peak > 0.0 {
                (peak - w) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Maximum drawdown of a wealth path as a fraction.
pub fn max_drawdown(wealth: &[f64]) -> f64 {
    drawdown_curve(wealth)
        .iter()
        .filter(|d| !d.is_nan())
        .fold(0.0f64, |a, &b| a.max(b))
}

/// Drawdown periods as `(peak_idx, last_idx_below_peak, max_drawdown)`.
pub fn drawdown_periods(wealth: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = wealth.len();
    if n < 2 {
        return vec![];
    }

    let mut periods = Vec::new();
    let mut peak = wealth[0];
    let mut peak_idx = 0;
    let mut in_dd = false;
    let mut max_dd = 0.0;

    for i in 1..n {
        if wealth[i] >= peak {
            if in_dd {
                periods.push((peak_idx, i - 1, max_dd));
                in_dd = false;
                max_dd = 0.0;
            }
            peak = wealth[i];
            peak_idx = i;
        } else if peak > 0.0 {
            in_dd = true;
            max_dd = f64::max(max_dd, (peak - wealth[i]) / peak);
        }
    }

    if in_dd {
        periods.push((peak_idx, n - 1, max_dd));
    }

    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tracking() {
        let mut tracker = DrawdownTracker::with_initial(100.0);

        tracker.update(110.0);
        tracker.update(105.0); // 4.5% drawdown
        tracker.update(120.0);
        tracker.update(100.0); // 16.67% drawdown

        assert!((tracker.max_drawdown_pct() - 16.67).abs() < 0.1);
        assert!((tracker.peak() - 120.0).abs() < 1e-10);
        assert!(tracker.in_drawdown());
        assert_eq!(tracker.max_drawdown_idx(), 4);
    }

    #[test]
    fn test_durations() {
        let mut tracker = DrawdownTracker::default();
        for w in [0.9, 0.8, 1.1, 1.0, 1.2, 1.15] {
            tracker.update(w);
        }
        // drawdowns of 2, 1 and an ongoing 1 periods
        assert_eq!(tracker.max_duration(), 2);
        assert!((tracker.average_duration() - 4.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_drawdown_curve() {
        let wealth = vec![1.0, 1.1, 1.05, 1.2, 1.0];
        let dd = drawdown_curve(&wealth);

        assert_eq!(dd.len(), 5);
        assert!(dd[0].abs() < 1e-10);
        assert!(dd[1].abs() < 1e-10);
        assert!((dd[2] - 0.05 / 1.1).abs() < 1e-10);
        assert!(dd[3].abs() < 1e-10);
        assert!((dd[4] - 0.2 / 1.2).abs() < 1e-10);
    }

    #[test]
    fn test_max_drawdown() {
        let wealth = vec![1.0, 1.2, 0.9, 1.1, 0.85];
        // (1.2 - 0.85) / 1.2
        assert!((max_drawdown(&wealth) - 0.35 / 1.2).abs() < 1e-10);
    }

    #[test]
    fn test_drawdown_periods() {
        let wealth = vec![1.0, 1.1, 1.05, 1.15, 1.0, 1.2];
        let periods = drawdown_periods(&wealth);

        assert_eq!(periods.len(), 2);
        assert_eq!((periods[0].0, periods[0].1), (1, 2));
        assert_eq!((periods[1].0, periods[1].1), (3, 4));
    }
}
