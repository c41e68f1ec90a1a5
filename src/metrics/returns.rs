//! Wealth paths from period returns.

/// Wealth path of a strategy starting at 1.0: `pnl[0] = 1`, `pnl[t] = pnl[t-1] * (1 + r[t-1])`.
///
/// NaN returns leave wealth unchanged.
pub fn pnl(returns: &[f64]) -> Vec<f64> {
    let mut wealth = Vec::with_capacity(returns.len() + 1);
    let mut level = 1.0;
    wealth.push(level);
    for &r in returns {
        if !r.is_nan() {
            level *= 1.0 + r;
        }
        wealth.push(level);
    }
    wealth
}

/// Total compounded return, `prod(1 + r) - 1`.
pub fn cumulative_return(returns: &[f64]) -> f64 {
    returns
        .iter()
        .filter(|r| !r.is_nan())
        .fold(1.0, |acc, r| acc * (1.0 + r))
        - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl() {
        let wealth = pnl(&[0.1, -0.5, f64::NAN, 1.0]);
        assert_eq!(wealth.len(), 5);
        assert!((wealth[1] - 1.1).abs() < 1e-10);
        assert!((wealth[2] - 0.55).abs() < 1e-10);
        assert!((wealth[3] - 0.55).abs() < 1e-10);
        assert!((wealth[4] - 1.1).abs() < 1e-10);
    }

    #[test]
    fn test_cumulative_return() {
        assert!((cumulative_return(&[0.1, 0.1]) - 0.21).abs() < 1e-10);
        assert!(cumulative_return(&[]).abs() < 1e-10);
    }
}
