//! Budget-constrained allocation space.
//!
//! An [`AllocationSpace`] is the set of weight vectors of a fixed length whose
//! elements sum to one (within a tolerance) and lie inside per-element bounds.

use std::fmt;

use rand::Rng;

use crate::core::error::{GymError, Result};
use crate::core::types::{AllocationVector, BUDGET_TOLERANCE};

/// Maximum bracket expansions when searching the projection multiplier.
const MAX_BRACKET_STEPS: usize = 200;
/// Bisection iterations for the projection multiplier.
const BISECTION_STEPS: usize = 200;

/// Shape of the per-element bounds, decides the sampling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundsKind {
    /// `[-inf, inf]` everywhere.
    Unrestricted,
    /// `[0, inf]` everywhere.
    LongOnly,
    /// Anything else.
    Custom,
}

/// Set of legal allocation vectors.
#[derive(Debug, Clone)]
pub struct AllocationSpace {
    low: Vec<f64>,
    high: Vec<f64>,
    tolerance: f64,
    kind: BoundsKind,
}

impl AllocationSpace {
    /// Unrestricted space: only the budget constraint applies.
    pub fn new(dim: usize) -> Self {
        Self {
            low: vec![f64::NEG_INFINITY; dim],
            high: vec![f64::INFINITY; dim],
            tolerance: BUDGET_TOLERANCE,
            kind: BoundsKind::Unrestricted,
        }
    }

    /// Long-only space: every weight in `[0, inf)`.
    pub fn long_only(dim: usize) -> Self {
        Self {
            low: vec![0.0; dim],
            high: vec![f64::INFINITY; dim],
            tolerance: BUDGET_TOLERANCE,
            kind: BoundsKind::LongOnly,
        }
    }

    /// Unrestricted when `short_sales` is set, long-only otherwise.
    pub fn for_short_sales(dim: usize, short_sales: bool) -> Self {
        if short_sales {
            Self::new(dim)
        } else {
            Self::long_only(dim)
        }
    }

    /// Space with explicit per-element bounds.
    ///
    /// Fails when the bound vectors differ in length, a lower bound exceeds
    /// its upper bound, or no vector inside the box can sum to one.
    pub fn with_bounds(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(GymError::length_mismatch(low.len(), high.len()));
        }
        if low.iter().chain(high.iter()).any(|b| b.is_nan()) {
            return Err(GymError::type_mismatch("bounds must not be NaN"));
        }
        if let Some(i) = (0..low.len()).find(|&i| low[i] > high[i]) {
            return Err(GymError::invalid_parameter(format!(
                "lower bound {} exceeds upper bound {} at position {}",
                low[i], high[i], i
            )));
        }
        let low_sum: f64 = low.iter().sum();
        let high_sum: f64 = high.iter().sum();
        if low_sum > 1.0 || high_sum < 1.0 {
            return Err(GymError::invalid_parameter(format!(
                "budget is infeasible for bounds summing to [{}, {}]",
                low_sum, high_sum
            )));
        }

        let kind = if low.iter().all(|&l| l == f64::NEG_INFINITY)
            && high.iter().all(|&h| h == f64::INFINITY)
        {
            BoundsKind::Unrestricted
        } else if low.iter().all(|&l| l == 0.0) && high.iter().all(|&h| h == f64::INFINITY) {
            BoundsKind::LongOnly
        } else {
            BoundsKind::Custom
        };

        Ok(Self {
            low,
            high,
            tolerance: BUDGET_TOLERANCE,
            kind,
        })
    }

    /// Override the budget tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Length of member vectors.
    #[inline]
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Lower bounds.
    pub fn low(&self) -> &[f64] {
        &self.low
    }

    /// Upper bounds.
    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// Budget tolerance.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether negative weights are admissible for some element.
    pub fn allows_short_sales(&self) -> bool {
        self.low.iter().any(|&l| l < 0.0)
    }

    /// Equal weights `1/n`.
    pub fn uniform(&self) -> AllocationVector {
        let n = self.dim();
        vec![1.0 / n as f64; n]
    }

    /// Membership test: dimensionality, bounds and budget must all hold.
    ///
    /// Never fails; a NaN element is out of bounds.
    pub fn contains(&self, x: &[f64]) -> bool {
        if x.len() != self.dim() {
            return false;
        }
        let in_bounds = x
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi);
        if !in_bounds {
            return false;
        }
        let total: f64 = x.iter().sum();
        (total - 1.0).abs() < self.tolerance
    }

    /// Draw a random member of the space.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> AllocationVector {
        let n = self.dim();
        if n == 0 {
            return Vec::new();
        }

        match self.kind {
            BoundsKind::LongOnly => {
                let draws: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
                let total: f64 = draws.iter().sum();
                if total > 0.0 {
                    draws.iter().map(|d| d / total).collect()
                } else {
                    self.uniform()
                }
            }
            BoundsKind::Unrestricted => {
                let mut weights = Vec::with_capacity(n);
                let mut gross = 0.0_f64;
                let mut net = 0.0_f64;
                for _ in 0..n - 1 {
                    let remainder = (1.0 - gross).max(0.0);
                    let w = if remainder > 0.0 {
                        rng.gen_range(-remainder..=remainder)
                    } else {
                        0.0
                    };
                    gross += w.abs();
                    net += w;
                    weights.push(w);
                }
                weights.push(1.0 - net);
                weights
            }
            BoundsKind::Custom => {
                let draws: Vec<f64> = self
                    .low
                    .iter()
                    .zip(self.high.iter())
                    .map(|(&lo, &hi)| {
                        let a = if lo.is_finite() { lo } else { hi.min(0.0) - 1.0 };
                        let b = if hi.is_finite() { hi } else { a.max(0.0) + 1.0 };
                        if b > a {
                            rng.gen_range(a..=b)
                        } else {
                            a
                        }
                    })
                    .collect();
                self.project(&draws)
            }
        }
    }

    /// Euclidean projection onto `{x : sum(x) = 1, low <= x <= high}`.
    ///
    /// Solves for the shift `lambda` with `sum(clamp(y - lambda)) = 1`; closed
    /// form when the space is unrestricted, bisection otherwise.
    pub fn project(&self, y: &[f64]) -> AllocationVector {
        let n = y.len();
        debug_assert_eq!(n, self.dim());
        if n == 0 {
            return Vec::new();
        }

        let total: f64 = y.iter().sum();
        let centre = (total - 1.0) / n as f64;

        if self.kind == BoundsKind::Unrestricted {
            return y.iter().map(|v| v - centre).collect();
        }

        let mass = |lambda: f64| -> f64 {
            y.iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .map(|(&v, (&lo, &hi))| (v - lambda).clamp(lo, hi))
                .sum()
        };

        // mass() is non-increasing in lambda: widen until 1 is bracketed.
        let mut width = 1.0_f64.max(y.iter().fold(0.0_f64, |m, v| m.max(v.abs())));
        let mut lo = centre - width;
        for _ in 0..MAX_BRACKET_STEPS {
            if mass(lo) >= 1.0 {
                break;
            }
            width *= 2.0;
            lo = centre - width;
        }
        let mut width = 1.0_f64.max(width);
        let mut hi = centre + width;
        for _ in 0..MAX_BRACKET_STEPS {
            if mass(hi) <= 1.0 {
                break;
            }
            width *= 2.0;
            hi = centre + width;
        }

        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if mass(mid) >= 1.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let lambda = 0.5 * (lo + hi);
        let mut x: Vec<f64> = y
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .map(|(&v, (&lo, &hi))| (v - lambda).clamp(lo, hi))
            .collect();

        // Spread the rounding residual over coordinates with slack.
        let residual = 1.0 - x.iter().sum::<f64>();
        if residual != 0.0 {
            let free: Vec<usize> = (0..n)
                .filter(|&i| {
                    if residual > 0.0 {
                        x[i] < self.high[i]
                    } else {
                        x[i] > self.low[i]
                    }
                })
                .collect();
            if !free.is_empty() {
                let share = residual / free.len() as f64;
                for i in free {
                    x[i] = (x[i] + share).clamp(self.low[i], self.high[i]);
                }
            }
        }

        x
    }
}

fn bound_close(a: f64, b: f64) -> bool {
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

impl PartialEq for AllocationSpace {
    fn eq(&self, other: &Self) -> bool {
        self.dim() == other.dim()
            && self
                .low
                .iter()
                .zip(other.low.iter())
                .all(|(&a, &b)| bound_close(a, b))
            && self
                .high
                .iter()
                .zip(other.high.iter())
                .all(|(&a, &b)| bound_close(a, b))
    }
}

impl fmt::Display for AllocationSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AllocationSpace({})", self.dim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_contains_truth_table() {
        let space = AllocationSpace::long_only(3);

        assert!(space.contains(&[0.2, 0.3, 0.5]));
        assert!(space.contains(&[1.0, 0.0, 0.0]));
        assert!(space.contains(&[0.2, 0.3, 0.5 + 5e-6]));

        // wrong dimensionality
        assert!(!space.contains(&[0.5, 0.5]));
        // out of bounds
        assert!(!space.contains(&[-0.1, 0.6, 0.5]));
        // budget violated
        assert!(!space.contains(&[0.2, 0.3, 0.6]));
        assert!(!space.contains(&[0.2, 0.3, 0.5 + 2e-5]));
        // NaN
        assert!(!space.contains(&[f64::NAN, 0.5, 0.5]));
    }

    #[test]
    fn test_unrestricted_accepts_shorts() {
        let space = AllocationSpace::new(3);
        assert!(space.contains(&[-1.0, 1.5, 0.5]));
        assert!(!space.contains(&[-1.0, 1.5, 0.6]));
        assert!(!space.contains(&[f64::INFINITY, 0.0, 0.0]));
        assert!(space.allows_short_sales());
        assert!(!AllocationSpace::long_only(3).allows_short_sales());
    }

    #[test]
    fn test_samples_are_members() {
        let mut rng = StdRng::seed_from_u64(7);
        for dim in 2..=10 {
            let spaces = [
                AllocationSpace::new(dim),
                AllocationSpace::long_only(dim),
                AllocationSpace::with_bounds(vec![-0.5; dim], vec![0.8; dim]).unwrap(),
            ];
            for space in &spaces {
                for _ in 0..1000 {
                    let x = space.sample(&mut rng);
                    assert!(space.contains(&x), "{} rejected its sample {:?}", space, x);
                }
            }
        }
    }

    #[test]
    fn test_project_onto_simplex() {
        let space = AllocationSpace::long_only(3);
        let x = space.project(&[0.9, 0.9, -2.0]);
        assert!(space.contains(&x));
        assert!((x[0] - 0.5).abs() < 1e-9);
        assert!((x[1] - 0.5).abs() < 1e-9);
        assert_eq!(x[2], 0.0);

        // feasible points are fixed
        let y = [0.2, 0.3, 0.5];
        let x = space.project(&y);
        for (a, b) in x.iter().zip(y.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_project_unrestricted() {
        let space = AllocationSpace::new(2);
        let x = space.project(&[2.0, 1.0]);
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn test_with_bounds_validation() {
        assert!(AllocationSpace::with_bounds(vec![0.0], vec![0.0, 1.0]).is_err());
        assert!(AllocationSpace::with_bounds(vec![0.5, 0.0], vec![0.4, 1.0]).is_err());
        assert!(AllocationSpace::with_bounds(vec![0.6, 0.6], vec![1.0, 1.0]).is_err());
        assert!(AllocationSpace::with_bounds(vec![0.0, 0.0], vec![0.4, 0.4]).is_err());

        let space = AllocationSpace::with_bounds(vec![0.0; 4], vec![f64::INFINITY; 4]).unwrap();
        assert_eq!(space, AllocationSpace::long_only(4));
    }

    #[test]
    fn test_equality() {
        assert_eq!(AllocationSpace::new(3), AllocationSpace::new(3));
        assert_ne!(AllocationSpace::new(3), AllocationSpace::long_only(3));
        assert_ne!(AllocationSpace::new(3), AllocationSpace::new(4));
        let a = AllocationSpace::with_bounds(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let b = AllocationSpace::with_bounds(vec![1e-12, 0.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "AllocationSpace(2)");
    }
}
