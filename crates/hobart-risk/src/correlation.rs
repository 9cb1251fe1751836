//! Pearson correlation.

use crate::error::RiskError;
use ndarray::{Array2, Axis};

/// Correlation matrix implied by a covariance matrix.
///
/// `labels` name the assets in error messages.
///
/// # Errors
/// Returns [`RiskError::SingularCovariance`] if an asset has zero variance.
pub fn correlation_from_covariance(
    covariance: &Array2<f64>,
    labels: &[String],
) -> Result<Array2<f64>, RiskError> {
    let n = covariance.nrows();
    let std_devs = covariance.diag().mapv(f64::sqrt);

    if let Some(idx) = std_devs.iter().position(|s| *s <= f64::EPSILON) {
        let name = labels.get(idx).map_or_else(|| format!("#{idx}"), Clone::clone);
        return Err(RiskError::SingularCovariance(format!(
            "asset {name} has zero variance"
        )));
    }

    let mut corr = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        corr[[i, i]] = 1.0;
        for j in (i + 1)..n {
            let rho = (covariance[[i, j]] / (std_devs[i] * std_devs[j])).clamp(-1.0, 1.0);
            corr[[i, j]] = rho;
            corr[[j, i]] = rho;
        }
    }
    Ok(corr)
}

/// Pearson correlation of the columns of a return matrix.
///
/// # Errors
/// Needs at least two rows; fails on a constant column.
pub fn pearson_correlation(returns: &Array2<f64>) -> Result<Array2<f64>, RiskError> {
    let n_periods = returns.nrows();
    if n_periods < 2 {
        return Err(RiskError::InsufficientData {
            what: "return observations",
            required: 2,
            actual: n_periods,
        });
    }
    let means = returns
        .mean_axis(Axis(0))
        .ok_or(RiskError::InsufficientData {
            what: "return observations",
            required: 2,
            actual: 0,
        })?;
    let centered = returns - &means.insert_axis(Axis(0));
    let scatter = centered.t().dot(&centered);
    let labels: Vec<String> = (0..returns.ncols()).map(|i| format!("#{i}")).collect();
    correlation_from_covariance(&scatter, &labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_correlation() {
        // Column 1 doubles column 0, column 2 negates it
        let col: Vec<f64> = vec![1.0, 2.0, 3.0, 5.0];
        let returns = Array2::from_shape_fn((4, 3), |(t, j)| match j {
            0 => col[t],
            1 => 2.0 * col[t],
            _ => -col[t],
        });
        let corr = pearson_correlation(&returns).unwrap();
        assert_relative_eq!(corr[[0, 1]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr[[0, 2]], -1.0, epsilon = 1e-12);
        assert_relative_eq!(corr[[1, 1]], 1.0);
    }

    #[test]
    fn test_constant_column_is_singular() {
        let returns = Array2::from_shape_vec((3, 2), vec![0.01, 0.0, 0.02, 0.0, -0.01, 0.0]).unwrap();
        assert!(matches!(
            pearson_correlation(&returns),
            Err(RiskError::SingularCovariance(_))
        ));
    }

    #[test]
    fn test_from_covariance() {
        let cov = Array2::from_shape_vec((2, 2), vec![0.04, 0.006, 0.006, 0.09]).unwrap();
        let labels = vec!["A".to_string(), "B".to_string()];
        let corr = correlation_from_covariance(&cov, &labels).unwrap();
        // 0.006 / (0.2 * 0.3)
        assert_relative_eq!(corr[[1, 0]], 0.1, epsilon = 1e-12);
    }
}
