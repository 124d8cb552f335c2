#![allow(clippy::needless_range_loop)]
//! Matrix decompositions and solvers.
//!
//! Cholesky factorization of symmetric positive definite matrices with
//! solves, log-determinants and triangular inverses, plus the
//! eigenvalue-guided ridge that keeps near-singular LD and precision
//! matrices factorizable.

use crate::dense::DenseMatrix;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("Matrix contains non-finite entries")]
    NonFinite,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cholesky failed after {attempts} ridge attempts (last ridge: {ridge:.2e})")]
    RegularizationFailed { attempts: usize, ridge: f64 },
}

/// Result of a Cholesky decomposition.
#[derive(Debug, Clone)]
pub struct CholeskyDecomp {
    /// Lower triangular factor L such that A = L * L'.
    pub l: DenseMatrix,
}

impl CholeskyDecomp {
    /// Compute the Cholesky decomposition of a symmetric positive definite matrix.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: a.ncols(),
            });
        }
        let mut l = DenseMatrix::zeros(n, n);

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(j, k) * l.get(j, k);
            }
            let diag = a.get(j, j) - sum;
            // NaN fails this test as well
            if diag.is_nan() || diag <= 0.0 {
                return Err(LinalgError::NotPositiveDefinite);
            }
            l.set(j, j, diag.sqrt());

            for i in (j + 1)..n {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l.get(i, k) * l.get(j, k);
                }
                l.set(i, j, (a.get(i, j) - sum) / l.get(j, j));
            }
        }

        Ok(CholeskyDecomp { l })
    }

    /// Factorize `a`, lifting its spectrum with a diagonal ridge if needed.
    ///
    /// A plain factorization is tried first. On failure the minimum
    /// eigenvalue is computed and a ridge of `min_eigenvalue - lambda_min`
    /// (at least `min_eigenvalue`) is added; the ridge grows tenfold on
    /// each further failure, up to `max_attempts` tries.
    ///
    /// Returns the factor and the ridge that was added (0.0 when none).
    pub fn regularized(
        a: &DenseMatrix,
        min_eigenvalue: f64,
        max_attempts: usize,
    ) -> Result<(Self, f64), LinalgError> {
        if !a.all_finite() {
            return Err(LinalgError::NonFinite);
        }
        if let Ok(chol) = Self::new(a) {
            return Ok((chol, 0.0));
        }

        let lambda_min = min_eigenvalue_of(a)?;
        let mut ridge = (min_eigenvalue - lambda_min).max(min_eigenvalue);
        for _ in 0..max_attempts {
            match Self::new(&a.with_added_diagonal(ridge)) {
                Ok(chol) => return Ok((chol, ridge)),
                Err(_) => ridge *= 10.0,
            }
        }
        Err(LinalgError::RegularizationFailed {
            attempts: max_attempts,
            ridge,
        })
    }

    /// Dimension of the factorized matrix.
    pub fn dim(&self) -> usize {
        self.l.nrows()
    }

    /// Solve L * L' * x = b.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.dim();
        assert_eq!(b.len(), n);

        // Forward substitution: L * y = b
        let y = self.forward_substitute(b);

        // Backward substitution: L' * x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l.get(j, i) * x[j];
            }
            x[i] = (y[i] - sum) / self.l.get(i, i);
        }

        x
    }

    /// Solve L * y = b.
    fn forward_substitute(&self, b: &[f64]) -> Vec<f64> {
        let n = self.dim();
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += self.l.get(i, j) * y[j];
            }
            y[i] = (b[i] - sum) / self.l.get(i, i);
        }
        y
    }

    /// log|A| = 2 * sum(log L_ii).
    pub fn log_det(&self) -> f64 {
        2.0 * self.l.diag().iter().map(|d| d.ln()).sum::<f64>()
    }

    /// Inverse of the lower triangular factor, L^{-1}.
    ///
    /// Built column by column with forward substitution; the result is
    /// lower triangular.
    pub fn lower_inverse(&self) -> DenseMatrix {
        let n = self.dim();
        let mut inv = DenseMatrix::zeros(n, n);
        for c in 0..n {
            for i in c..n {
                let mut s = if i == c { 1.0 } else { 0.0 };
                for k in c..i {
                    s -= self.l.get(i, k) * inv.get(k, c);
                }
                inv.set(i, c, s / self.l.get(i, i));
            }
        }
        inv
    }

    /// A^{-1} = L^{-T} L^{-1}, symmetric by construction.
    pub fn inverse(&self) -> DenseMatrix {
        let linv = self.lower_inverse();
        let mut inv = linv.transpose().mat_mul(&linv);
        inv.symmetrize();
        inv
    }
}

/// Compute eigenvalues of a symmetric matrix.
/// Returns eigenvalues sorted in descending order.
pub fn symmetric_eigenvalues(a: &DenseMatrix) -> Result<Vec<f64>, LinalgError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }
    if !a.all_finite() {
        return Err(LinalgError::NonFinite);
    }

    let mat = a.as_faer();
    let eigen = mat.selfadjoint_eigendecomposition(faer::Side::Lower);
    let s = eigen.s();
    let mut evals: Vec<f64> = (0..n).map(|i| s.column_vector().read(i)).collect();
    evals.sort_by(|a, b| b.total_cmp(a));
    Ok(evals)
}

/// Smallest eigenvalue of a symmetric matrix.
pub fn min_eigenvalue_of(a: &DenseMatrix) -> Result<f64, LinalgError> {
    let evals = symmetric_eigenvalues(a)?;
    Ok(evals.last().copied().unwrap_or(0.0))
}

/// Ratio of largest to smallest eigenvalue (infinite when singular).
pub fn condition_number(a: &DenseMatrix) -> Result<f64, LinalgError> {
    let evals = symmetric_eigenvalues(a)?;
    match (evals.first(), evals.last()) {
        (Some(&hi), Some(&lo)) if lo > 0.0 => Ok(hi / lo),
        (Some(_), Some(_)) => Ok(f64::INFINITY),
        _ => Ok(1.0),
    }
}

/// Lift a symmetric positive semi-definite matrix so its minimum
/// eigenvalue is at least `min_eigenvalue`.
///
/// Returns the (possibly) shifted matrix and the ridge added to its
/// diagonal, which is 0.0 when the spectrum was already above the
/// tolerance.
pub fn regularize_psd(
    a: &DenseMatrix,
    min_eigenvalue: f64,
) -> Result<(DenseMatrix, f64), LinalgError> {
    let lambda_min = min_eigenvalue_of(a)?;
    if lambda_min >= min_eigenvalue {
        return Ok((a.clone(), 0.0));
    }
    let ridge = min_eigenvalue - lambda_min;
    Ok((a.with_added_diagonal(ridge), ridge))
}
