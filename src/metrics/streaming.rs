//! Streaming moments using Welford's algorithm.
//!
//! Single-pass mean, variance, skewness and kurtosis of a return series,
//! plus the win/loss tallies needed for hit-ratio style statistics.

/// Streaming return moments.
///
/// Higher moments use the one-pass update of Terriberry, an extension of
/// Welford's method.
#[derive(Debug, Clone, Default)]
pub struct StreamingMoments {
    /// Number of observations.
    count: usize,
    /// Running mean.
    mean: f64,
    /// Sum of squared deviations.
    m2: f64,
    /// Sum of cubed deviations.
    m3: f64,
    /// Sum of fourth-power deviations.
    m4: f64,
    /// Sum of returns.
    sum: f64,
    /// Sum of positive returns.
    sum_positive: f64,
    /// Sum of negative returns.
    sum_negative: f64,
    /// Count of positive returns.
    count_positive: usize,
    /// Count of negative returns.
    count_negative: usize,
}

impl StreamingMoments {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with a new return. NaN values are skipped.
    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;
        self.sum += value;

        if value > 0.0 {
            self.sum_positive += value;
            self.count_positive += 1;
        } else if value < 0.0 {
            self.sum_negative += value;
            self.count_negative += 1;
        }

        let delta = value - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;
    }

    /// Get the number of observations.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Get the running mean (NaN when empty).
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.mean
    }

    /// Sum of all observations.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Get the sample variance.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return f64::NAN;
        }
        self.m2 / (self.count - 1) as f64
    }

    /// Get the sample standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Skewness from population moments, `m3 / m2^1.5`.
    pub fn skewness(&self) -> f64 {
        if self.count < 2 || self.m2 == 0.0 {
            return f64::NAN;
        }
        let n = self.count as f64;
        n.sqrt() * self.m3 / self.m2.powf(1.5)
    }

    /// Excess kurtosis from population moments, `m4 / m2² - 3`.
    pub fn kurtosis(&self) -> f64 {
        if self.count < 2 || self.m2 == 0.0 {
            return f64::NAN;
        }
        let n = self.count as f64;
        n * self.m4 / (self.m2 * self.m2) - 3.0
    }

    /// Fraction of strictly positive observations.
    pub fn hit_ratio(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.count_positive as f64 / self.count as f64
    }

    /// Average positive observation (0 when there are none).
    pub fn avg_win(&self) -> f64 {
        if self.count_positive == 0 {
            return 0.0;
        }
        self.sum_positive / self.count_positive as f64
    }

    /// Average negative observation as a magnitude (0 when there are none).
    pub fn avg_loss(&self) -> f64 {
        if self.count_negative == 0 {
            return 0.0;
        }
        -self.sum_negative / self.count_negative as f64
    }

    /// Fraction of strictly negative observations.
    pub fn loss_ratio(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.count_negative as f64 / self.count as f64
    }

    /// Merge another accumulator into this one.
    pub fn merge(&mut self, other: &StreamingMoments) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        let delta = other.mean - self.mean;
        let delta2 = delta * delta;

        let m2 = self.m2 + other.m2 + delta2 * na * nb / n;
        let m3 = self.m3
            + other.m3
            + delta * delta2 * na * nb * (na - nb) / (n * n)
            + 3.0 * delta * (na * other.m2 - nb * self.m2) / n;
        let m4 = self.m4
            + other.m4
            + delta2 * delta2 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * delta2 * (na * na * other.m2 + nb * nb * self.m2) / (n * n)
            + 4.0 * delta * (na * other.m3 - nb * self.m3) / n;

        self.mean += delta * nb / n;
        self.m2 = m2;
        self.m3 = m3;
        self.m4 = m4;
        self.count += other.count;
        self.sum += other.sum;
        self.sum_positive += other.sum_positive;
        self.sum_negative += other.sum_negative;
        self.count_positive += other.count_positive;
        self.count_negative += other.count_negative;
    }
}

impl FromIterator<f64> for StreamingMoments {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut moments = Self::new();
        for value in iter {
            moments.update(value);
        }
        moments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_statistics() {
        let moments: StreamingMoments = [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().collect();

        assert_eq!(moments.count(), 5);
        assert!((moments.mean() - 3.0).abs() < 1e-10);
        // Sample variance of [1,2,3,4,5] = 2.5
        assert!((moments.variance() - 2.5).abs() < 1e-10);
        assert!(moments.skewness().abs() < 1e-10);
        // m4/m2² = (2*16 + 2*1)/5 / 2² = 1.7
        assert!((moments.kurtosis() - (1.7 - 3.0)).abs() < 1e-10);
    }

    #[test]
    fn test_welford_numerical_stability() {
        let base = 1e10;
        let moments: StreamingMoments = [base + 1.0, base + 2.0, base + 3.0].into_iter().collect();

        assert!((moments.mean() - (base + 2.0)).abs() < 1e-5);
        assert!((moments.variance() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_skewness_sign() {
        let right: StreamingMoments = [0.0, 0.0, 0.0, 0.0, 10.0].into_iter().collect();
        assert!(right.skewness() > 0.0);
        let left: StreamingMoments = [0.0, 0.0, 0.0, 0.0, -10.0].into_iter().collect();
        assert!(left.skewness() < 0.0);
    }

    #[test]
    fn test_win_loss() {
        let moments: StreamingMoments = [0.02, -0.01, 0.04, -0.03, 0.0, f64::NAN].into_iter().collect();
        assert_eq!(moments.count(), 5);
        assert!((moments.hit_ratio() - 0.4).abs() < 1e-10);
        assert!((moments.avg_win() - 0.03).abs() < 1e-10);
        assert!((moments.avg_loss() - 0.02).abs() < 1e-10);
    }

    #[test]
    fn test_merge() {
        let values = [0.01, -0.02, 0.03, 0.05, -0.04, 0.02, 0.0];
        let full: StreamingMoments = values.into_iter().collect();

        let mut left: StreamingMoments = values[..3].iter().copied().collect();
        let right: StreamingMoments = values[3..].iter().copied().collect();
        left.merge(&right);

        assert_eq!(left.count(), full.count());
        assert!((left.mean() - full.mean()).abs() < 1e-12);
        assert!((left.variance() - full.variance()).abs() < 1e-12);
        assert!((left.skewness() - full.skewness()).abs() < 1e-9);
        assert!((left.kurtosis() - full.kurtosis()).abs() < 1e-9);
    }
}
