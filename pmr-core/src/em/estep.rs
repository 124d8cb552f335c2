//! E-step: posterior of the latent instrument effects.
//!
//! Given the current parameters, beta | y, z is Gaussian with
//!
//!   Omega = I / sigma_beta2 + S1 / sigma_e1_2 + alpha^2 S2 / sigma_e2_2
//!   b     = X1'y / sigma_e1_2 + alpha (X2'z - gamma S2 1) / sigma_e2_2
//!   mean  = Omega^{-1} b,   covariance = Omega^{-1}
//!
//! The M-step only needs the mean and three traces of the covariance, so
//! the covariance matrix is owned by [`Posterior`] and dropped with it at
//! the end of each iteration.

use pmr_linalg::decomposition::{CholeskyDecomp, LinalgError};
use pmr_linalg::dense::DenseMatrix;

use crate::model::params::ModelParameters;
use crate::stats::SufficientStats;

/// Posterior moments of beta for one iteration.
#[derive(Debug, Clone)]
pub struct Posterior {
    /// Posterior mean mu.
    pub mean: Vec<f64>,
    /// Posterior covariance Omega^{-1}.
    pub covariance: DenseMatrix,
    /// tr(Sigma).
    pub trace_cov: f64,
    /// tr(S1 Sigma).
    pub trace_s1_cov: f64,
    /// tr(S2 Sigma).
    pub trace_s2_cov: f64,
    /// Ridge added to Omega to make it factorizable (0.0 when none).
    pub ridge: f64,
}

impl Posterior {
    /// Posterior variances of each beta_j.
    pub fn covariance_diagonal(&self) -> Vec<f64> {
        self.covariance.diag()
    }
}

/// Build the posterior precision Omega and the linear term b.
pub fn precision_system(
    params: &ModelParameters,
    stats: &SufficientStats,
) -> (DenseMatrix, Vec<f64>) {
    let p = stats.n_instruments();
    let inv_b = 1.0 / params.sigma_beta2;
    let inv_e1 = 1.0 / params.sigma_e1_2;
    let inv_e2 = 1.0 / params.sigma_e2_2;
    let alpha = params.alpha;
    let a2 = alpha * alpha * inv_e2;

    let mut omega = DenseMatrix::zeros(p, p);
    for j in 0..p {
        for i in 0..p {
            let mut v = stats.xtx1.get(i, j) * inv_e1 + a2 * stats.xtx2.get(i, j);
            if i == j {
                v += inv_b;
            }
            omega.set(i, j, v);
        }
    }
    omega.symmetrize();

    let b = (0..p)
        .map(|j| {
            stats.xty[j] * inv_e1
                + alpha * (stats.xtz[j] - params.gamma * stats.xtx2_one[j]) * inv_e2
        })
        .collect();

    (omega, b)
}

/// Compute the posterior of beta under `params`.
///
/// Falls back to a ridge-regularized factorization of Omega when the
/// plain Cholesky fails; the error is returned only when every ridge
/// attempt fails.
pub fn posterior(
    params: &ModelParameters,
    stats: &SufficientStats,
    min_eigenvalue: f64,
    max_attempts: usize,
) -> Result<Posterior, LinalgError> {
    let (omega, b) = precision_system(params, stats);
    let (chol, ridge) = CholeskyDecomp::regularized(&omega, min_eigenvalue, max_attempts)?;

    let mean = chol.solve(&b);
    let covariance = chol.inverse();

    let trace_cov = covariance.trace();
    // Both factors symmetric, so the Frobenius inner product is tr(S Sigma)
    let trace_s1_cov = stats.xtx1.frobenius_inner(&covariance);
    let trace_s2_cov = stats.xtx2.frobenius_inner(&covariance);

    Ok(Posterior {
        mean,
        covariance,
        trace_cov,
        trace_s1_cov,
        trace_s2_cov,
        ridge,
    })
}
