//! Deterministic starting values.

use pmr_linalg::dense::DenseMatrix;

use crate::model::params::{Constraints, ModelParameters};
use crate::stats::SufficientStats;
use crate::util::math::safe_div;

use super::mstep::{apply_floor, TraitMoments, VarianceComponent as V};

/// Starting parameters from marginal regressions.
///
/// beta_j = X1j'y / X1j'X1j, and alpha/gamma come from an unconstrained
/// least-squares pass of z on [X2 beta, X2 1]. When that 2x2 system is
/// singular (always so with a single instrument), gamma starts at zero
/// and alpha comes from the causal column alone. Fixed parameters are
/// zeroed afterwards and the residual variances use the zeroed values.
pub fn initial_parameters(
    stats: &SufficientStats,
    constraints: Constraints,
    floor: f64,
) -> ModelParameters {
    let p = stats.n_instruments();
    let beta: Vec<f64> = (0..p)
        .map(|j| safe_div(stats.xty[j], stats.xtx1.get(j, j), 1e-30, 0.0))
        .collect();

    let sigma_beta2 = DenseMatrix::dot(&beta, &beta) / p as f64;

    // Residual variance of y after projecting on X1 beta
    let h = DenseMatrix::dot(&beta, &stats.xty);
    let q = stats.xtx1.quad_form(&beta);
    let explained = safe_div(h * h, q, 1e-30, 0.0);
    let sigma_e1_2 = (stats.yty - explained) / stats.n1;
    let sigma_u2 = q / stats.n1;

    let moments = TraitMoments::new(&beta, 0.0, stats);
    let det = moments.q2 * moments.d - moments.c * moments.c;
    let (alpha, gamma) = if det > 1e-10 * moments.q2 * moments.d {
        (
            (moments.d * moments.hz - moments.c * moments.gz) / det,
            (moments.q2 * moments.gz - moments.c * moments.hz) / det,
        )
    } else {
        (safe_div(moments.hz, moments.q2, 1e-30, 0.0), 0.0)
    };
    let (alpha, gamma) = constraints.apply(alpha, gamma);
    let sigma_e2_2 = moments.residual_ss(alpha, gamma) / stats.n2;

    let mut floored = Vec::new();
    ModelParameters {
        alpha,
        gamma,
        beta,
        sigma_beta2: apply_floor(sigma_beta2, floor, V::SigmaBeta, &mut floored),
        sigma_u2: apply_floor(sigma_u2, floor, V::SigmaU, &mut floored),
        sigma_e1_2: apply_floor(sigma_e1_2, floor, V::SigmaE1, &mut floored),
        sigma_e2_2: apply_floor(sigma_e2_2, floor, V::SigmaE2, &mut floored),
    }
}
