//! Dense linear algebra for small symmetric matrices.
//!
//! Problem sizes here are tens of assets, so plain `O(n^3)` routines on
//! `ndarray` storage are sufficient and avoid a LAPACK dependency.

use crate::error::RiskError;
use ndarray::{Array1, Array2};

/// Relative pivot threshold below which a Cholesky factorization is rejected.
pub const CHOLESKY_TOLERANCE: f64 = 1e-12;

/// Lower-triangular Cholesky factor `L` with `A = L L^T`.
///
/// # Errors
/// Returns [`RiskError::SingularCovariance`] if a pivot falls below
/// `CHOLESKY_TOLERANCE` relative to the largest diagonal entry, and
/// [`RiskError::DimensionMismatch`] for non-square input.
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>, RiskError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(RiskError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let scale = matrix
        .diag()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    let mut lower = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut pivot = matrix[[j, j]];
        for k in 0..j {
            pivot -= lower[[j, k]] * lower[[j, k]];
        }
        if !pivot.is_finite() || pivot <= CHOLESKY_TOLERANCE * scale {
            return Err(RiskError::SingularCovariance(format!(
                "non-positive pivot {pivot:.3e} at row {j}"
            )));
        }
        let diag = pivot.sqrt();
        lower[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= lower[[i, k]] * lower[[j, k]];
            }
            lower[[i, j]] = sum / diag;
        }
    }

    Ok(lower)
}

/// Solve `L L^T x = b` given the Cholesky factor `L`.
pub fn cholesky_solve(lower: &Array2<f64>, rhs: &Array1<f64>) -> Array1<f64> {
    let n = lower.nrows();

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = rhs[i];
        for k in 0..i {
            sum -= lower[[i, k]] * y[k];
        }
        y[i] = sum / lower[[i, i]];
    }

    // Back substitution: L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= lower[[k, i]] * x[k];
        }
        x[i] = sum / lower[[i, i]];
    }

    x
}

/// Solve `A x = b` for symmetric positive definite `A`.
///
/// # Errors
/// Fails when `A` is not positive definite.
pub fn solve_spd(matrix: &Array2<f64>, rhs: &Array1<f64>) -> Result<Array1<f64>, RiskError> {
    if rhs.len() != matrix.nrows() {
        return Err(RiskError::DimensionMismatch {
            expected: matrix.nrows(),
            actual: rhs.len(),
        });
    }
    let lower = cholesky(matrix)?;
    Ok(cholesky_solve(&lower, rhs))
}

/// Inverse of a symmetric positive definite matrix.
///
/// # Errors
/// Fails when `A` is not positive definite.
pub fn inverse_spd(matrix: &Array2<f64>) -> Result<Array2<f64>, RiskError> {
    let n = matrix.nrows();
    let lower = cholesky(matrix)?;
    let mut inverse = Array2::<f64>::zeros((n, n));
    let mut unit = Array1::<f64>::zeros(n);

    for j in 0..n {
        unit.fill(0.0);
        unit[j] = 1.0;
        inverse.column_mut(j).assign(&cholesky_solve(&lower, &unit));
    }

    // Symmetrize away round-off
    let transposed = inverse.t().to_owned();
    Ok((inverse + transposed) * 0.5)
}

/// Check if a matrix is positive definite
pub fn is_positive_definite(matrix: &Array2<f64>) -> bool {
    cholesky(matrix).is_ok()
}

/// Eigenvalues of a symmetric matrix by cyclic Jacobi rotations, descending.
///
/// # Errors
/// Returns [`RiskError::DimensionMismatch`] for non-square input and
/// [`RiskError::InvalidParameter`] if the sweeps do not converge.
pub fn symmetric_eigenvalues(
    matrix: &Array2<f64>,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<Array1<f64>, RiskError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(RiskError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut converged = false;

    for _sweep in 0..max_sweeps {
        let off_diagonal: f64 = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| a[[i, j]] * a[[i, j]])
            .sum();
        if off_diagonal.sqrt() < tolerance {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                a[[p, p]] -= t * apq;
                a[[q, q]] += t * apq;
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for r in 0..n {
                    if r != p && r != q {
                        let arp = a[[r, p]];
                        let arq = a[[r, q]];
                        a[[r, p]] = c * arp - s * arq;
                        a[[p, r]] = a[[r, p]];
                        a[[r, q]] = s * arp + c * arq;
                        a[[q, r]] = a[[r, q]];
                    }
                }
            }
        }
    }

    if !converged && n > 1 {
        return Err(RiskError::InvalidParameter(format!(
            "Jacobi eigenvalue iteration did not converge in {max_sweeps} sweeps"
        )));
    }

    let mut eigenvalues: Vec<f64> = a.diag().to_vec();
    eigenvalues.sort_by(|x, y| y.total_cmp(x));
    Ok(Array1::from(eigenvalues))
}

/// Ratio of the largest to the smallest eigenvalue.
///
/// Infinite when the smallest eigenvalue is zero or negative, or when the
/// eigenvalues cannot be computed.
pub fn condition_number(matrix: &Array2<f64>) -> f64 {
    match symmetric_eigenvalues(matrix, 100, 1e-14) {
        Ok(eigenvalues) if !eigenvalues.is_empty() => {
            let max_eig = eigenvalues[0];
            let min_eig = eigenvalues[eigenvalues.len() - 1];
            if min_eig <= 1e-15 * max_eig.abs().max(1.0) {
                f64::INFINITY
            } else {
                max_eig / min_eig
            }
        }
        _ => f64::INFINITY,
    }
}
