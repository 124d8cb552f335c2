//! Observed-data log-likelihood with beta integrated out.
//!
//! Completing the square in beta turns the (n1 + n2)-dimensional Gaussian
//! density into a p-dimensional computation:
//!
//!   loglik = -1/2 [ (n1 + n2) log 2pi + n1 log s1 + n2 log s2 + p log sb
//!                   + log|Omega| + y'y / s1 + r'r / s2 - b' Omega^{-1} b ]
//!
//! with r = z - gamma X2 1 and (Omega, b) from [`precision_system`].

use std::f64::consts::PI;

use pmr_linalg::decomposition::{CholeskyDecomp, LinalgError};
use pmr_linalg::dense::DenseMatrix;

use crate::model::params::ModelParameters;
use crate::stats::SufficientStats;

use super::estep::precision_system;

/// Evaluate the marginal log-likelihood at `params`.
pub fn log_likelihood(
    params: &ModelParameters,
    stats: &SufficientStats,
    min_eigenvalue: f64,
    max_attempts: usize,
) -> Result<f64, LinalgError> {
    let (omega, b) = precision_system(params, stats);
    let (chol, _) = CholeskyDecomp::regularized(&omega, min_eigenvalue, max_attempts)?;
    let mu = chol.solve(&b);

    let p = stats.n_instruments() as f64;
    let g = params.gamma;
    let rtr = stats.ztz - 2.0 * g * stats.one_xtz + g * g * stats.one_xtx2_one;

    let quad = stats.yty / params.sigma_e1_2 + rtr / params.sigma_e2_2 - DenseMatrix::dot(&b, &mu);

    let ll = -0.5
        * ((stats.n1 + stats.n2) * (2.0 * PI).ln()
            + stats.n1 * params.sigma_e1_2.ln()
            + stats.n2 * params.sigma_e2_2.ln()
            + p * params.sigma_beta2.ln()
            + chol.log_det()
            + quad);
    Ok(ll)
}
