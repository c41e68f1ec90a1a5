//! Moment estimates of a returns window.

use crate::core::error::{GymError, Result};

/// Column means of `rows` (each row one observation).
pub fn mean(rows: &[Vec<f64>]) -> Result<Vec<f64>> {
    let first = rows.first().ok_or_else(|| GymError::empty_data("returns window"))?;
    let m = first.len();
    let mut mu = vec![0.0; m];
    for row in rows {
        if row.len() != m {
            return Err(GymError::length_mismatch(m, row.len()));
        }
        for (acc, v) in mu.iter_mut().zip(row.iter()) {
            *acc += v;
        }
    }
    let n = rows.len() as f64;
    mu.iter_mut().for_each(|v| *v /= n);
    Ok(mu)
}

/// Sample covariance (denominator `n - 1`) of the columns of `rows`.
pub fn covariance(rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    if rows.len() < 2 {
        return Err(GymError::insufficient_data(2, rows.len()));
    }
    let mu = mean(rows)?;
    let m = mu.len();
    let mut cov = vec![vec![0.0; m]; m];
    for row in rows {
        for i in 0..m {
            let di = row[i] - mu[i];
            for j in i..m {
                cov[i][j] += di * (row[j] - mu[j]);
            }
        }
    }
    let denom = (rows.len() - 1) as f64;
    for i in 0..m {
        for j in i..m {
            cov[i][j] /= denom;
            cov[j][i] = cov[i][j];
        }
    }
    Ok(cov)
}

/// `m × m` identity matrix.
pub fn identity(m: usize) -> Vec<Vec<f64>> {
    let mut eye = vec![vec![0.0; m]; m];
    for (i, row) in eye.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    eye
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 6.0]];
        assert_eq!(mean(&rows).unwrap(), vec![2.0, 4.0]);
        assert!(mean(&[]).is_err());
        assert!(mean(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_covariance() {
        let rows = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        let cov = covariance(&rows).unwrap();
        assert!((cov[0][0] - 1.0).abs() < 1e-12);
        assert!((cov[0][1] - 2.0).abs() < 1e-12);
        assert!((cov[1][0] - 2.0).abs() < 1e-12);
        assert!((cov[1][1] - 4.0).abs() < 1e-12);
        assert!(covariance(&rows[..1]).is_err());
    }

    #[test]
    fn test_identity() {
        let eye = identity(3);
        assert_eq!(eye[1], vec![0.0, 1.0, 0.0]);
    }
}
