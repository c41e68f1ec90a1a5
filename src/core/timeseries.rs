//! Time-indexed array wrapper.

use super::types::Timestamp;

/// A time-indexed series of values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<T> {
    /// Timestamps for each value.
    pub timestamps: Vec<Timestamp>,
    /// Values.
    pub values: Vec<T>,
}

impl<T: Clone> TimeSeries<T> {
    /// Create a new time series.
    pub fn new(timestamps: Vec<Timestamp>, values: Vec<T>) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self { timestamps, values }
    }

    /// Create a series holding `fill` at every timestamp.
    pub fn filled(timestamps: Vec<Timestamp>, fill: T) -> Self {
        let len = timestamps.len();
        Self {
            timestamps,
            values: vec![fill; len],
        }
    }

    /// Get the length.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get value at index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Get timestamp at index.
    #[inline]
    pub fn get_timestamp(&self, index: usize) -> Option<Timestamp> {
        self.timestamps.get(index).copied()
    }

    /// Overwrite the value at `index`. Returns false when out of range.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Position of `timestamp` in the (sorted) index.
    pub fn position(&self, timestamp: Timestamp) -> Option<usize> {
        self.timestamps.binary_search(&timestamp).ok()
    }

    /// Value recorded at `timestamp`.
    pub fn at(&self, timestamp: Timestamp) -> Option<&T> {
        self.position(timestamp).and_then(|i| self.values.get(i))
    }

    /// Iterator over (timestamp, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &T)> {
        self.timestamps.iter().copied().zip(self.values.iter())
    }
}

impl TimeSeries<f64> {
    /// Create a series filled with NaN over the given index.
    pub fn with_nan(timestamps: Vec<Timestamp>) -> Self {
        Self::filled(timestamps, f64::NAN)
    }

    /// Values that are not NaN, in time order.
    pub fn valid_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    /// Calculate sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.iter().filter(|v| !v.is_nan()).sum()
    }

    /// Calculate mean of all values.
    pub fn mean(&self) -> f64 {
        let valid = self.valid_values();
        if valid.is_empty() {
            return f64::NAN;
        }
        valid.iter().sum::<f64>() / valid.len() as f64
    }

    /// Calculate sample standard deviation.
    pub fn std(&self) -> f64 {
        let valid = self.valid_values();
        if valid.len() < 2 {
            return f64::NAN;
        }
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        let variance =
            valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (valid.len() - 1) as f64;
        variance.sqrt()
    }

    /// Running product of `(1 + value)`, NaN values leave the level unchanged.
    pub fn compound(&self) -> Self {
        let mut level = 1.0;
        let values = self
            .values
            .iter()
            .map(|v| {
                if !v.is_nan() {
                    level *= 1.0 + v;
                }
                level
            })
            .collect();
        Self {
            timestamps: self.timestamps.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_lookup() {
        let mut ts = TimeSeries::with_nan(vec![10, 20, 30]);
        assert!(ts.set(1, 0.5));
        assert!(!ts.set(3, 0.5));
        assert_eq!(ts.position(20), Some(1));
        assert_eq!(ts.position(25), None);
        assert!((ts.at(20).copied().unwrap() - 0.5).abs() < 1e-12);
        assert!(ts.at(10).unwrap().is_nan());
    }

    #[test]
    fn test_nan_aware_statistics() {
        let ts = TimeSeries::new(vec![0, 1, 2, 3], vec![f64::NAN, 1.0, 2.0, 3.0]);
        assert!((ts.sum() - 6.0).abs() < 1e-12);
        assert!((ts.mean() - 2.0).abs() < 1e-12);
        assert!((ts.std() - 1.0).abs() < 1e-12);
        assert_eq!(ts.valid_values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_compound() {
        let ts = TimeSeries::new(vec![0, 1, 2, 3], vec![0.0, 0.1, f64::NAN, -0.5]);
        let wealth = ts.compound();
        assert!((wealth.values[0] - 1.0).abs() < 1e-12);
        assert!((wealth.values[1] - 1.1).abs() < 1e-12);
        assert!((wealth.values[2] - 1.1).abs() < 1e-12);
        assert!((wealth.values[3] - 0.55).abs() < 1e-12);
    }
}
