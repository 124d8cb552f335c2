//! M-step: closed-form parameter updates.
//!
//! Every update maximizes the expected complete-data log-likelihood
//! under the current posterior, so the observed log-likelihood never
//! decreases unless a variance floor binds.

use pmr_linalg::dense::DenseMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{PmrError, Result};
use crate::model::params::{Constraints, ModelParameters};
use crate::stats::SufficientStats;

use super::estep::Posterior;

/// Names of the variance components, for floor reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarianceComponent {
    SigmaBeta,
    SigmaU,
    SigmaE1,
    SigmaE2,
}

impl VarianceComponent {
    /// All components, in the order of [`ModelParameters::variances`].
    pub const ALL: [VarianceComponent; 4] = [
        VarianceComponent::SigmaBeta,
        VarianceComponent::SigmaU,
        VarianceComponent::SigmaE1,
        VarianceComponent::SigmaE2,
    ];

    pub fn index(self) -> usize {
        match self {
            VarianceComponent::SigmaBeta => 0,
            VarianceComponent::SigmaU => 1,
            VarianceComponent::SigmaE1 => 2,
            VarianceComponent::SigmaE2 => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VarianceComponent::SigmaBeta => "sigma_beta2",
            VarianceComponent::SigmaU => "sigma_u2",
            VarianceComponent::SigmaE1 => "sigma_e1_2",
            VarianceComponent::SigmaE2 => "sigma_e2_2",
        }
    }
}

/// Updated parameters plus the components that were clamped to the floor.
#[derive(Debug, Clone)]
pub struct MStepOutcome {
    pub params: ModelParameters,
    pub floored: Vec<VarianceComponent>,
}

/// GWAS-side moments of the expected complete-data likelihood.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TraitMoments {
    /// E[beta' S2 beta].
    pub q2: f64,
    /// E[beta]' S2 1.
    pub c: f64,
    /// 1' S2 1.
    pub d: f64,
    /// E[beta]' X2'z.
    pub hz: f64,
    /// 1' X2'z.
    pub gz: f64,
    /// z'z.
    pub ztz: f64,
}

impl TraitMoments {
    pub(crate) fn new(beta: &[f64], trace_s2: f64, stats: &SufficientStats) -> Self {
        Self {
            q2: stats.xtx2.quad_form(beta) + trace_s2,
            c: DenseMatrix::dot(beta, &stats.xtx2_one),
            d: stats.one_xtx2_one,
            hz: DenseMatrix::dot(beta, &stats.xtz),
            gz: stats.one_xtz,
            ztz: stats.ztz,
        }
    }

    /// Expected residual sum of squares ||z - alpha X2 beta - gamma X2 1||^2.
    pub(crate) fn residual_ss(&self, alpha: f64, gamma: f64) -> f64 {
        self.ztz - 2.0 * alpha * self.hz - 2.0 * gamma * self.gz
            + alpha * alpha * self.q2
            + 2.0 * alpha * gamma * self.c
            + gamma * gamma * self.d
    }

    /// Solve for (alpha, gamma) under the constraints.
    ///
    /// Returns `None` when the required normal equations are singular.
    pub(crate) fn solve(&self, constraints: Constraints) -> Option<(f64, f64)> {
        match (constraints.alpha_fixed, constraints.gamma_fixed) {
            (true, true) => Some((0.0, 0.0)),
            (true, false) => (self.d > 0.0).then(|| (0.0, self.gz / self.d)),
            (false, true) => (self.q2 > 0.0).then(|| (self.hz / self.q2, 0.0)),
            (false, false) => {
                let det = self.q2 * self.d - self.c * self.c;
                if !(det > f64::EPSILON * self.q2 * self.d) {
                    return None;
                }
                let alpha = (self.d * self.hz - self.c * self.gz) / det;
                let gamma = (self.q2 * self.gz - self.c * self.hz) / det;
                Some((alpha, gamma))
            }
        }
    }
}

/// Clamp `value` to `floor`, recording the component when it binds.
pub(crate) fn apply_floor(
    value: f64,
    floor: f64,
    component: VarianceComponent,
    floored: &mut Vec<VarianceComponent>,
) -> f64 {
    if value < floor {
        floored.push(component);
        floor
    } else {
        value
    }
}

/// Run one M-step from the posterior of `post`.
pub fn update_parameters(
    post: &Posterior,
    stats: &SufficientStats,
    constraints: Constraints,
    floor: f64,
    iteration: usize,
) -> Result<MStepOutcome> {
    let mu = &post.mean;
    let p = mu.len() as f64;
    let mut floored = Vec::new();

    let mu_sq = DenseMatrix::dot(mu, mu);
    let sigma_beta2 = (mu_sq + post.trace_cov) / p;

    // E[beta' S1 beta]
    let q1 = stats.xtx1.quad_form(mu) + post.trace_s1_cov;
    let mu_xty = DenseMatrix::dot(mu, &stats.xty);
    let sigma_e1_2 = (stats.yty - 2.0 * mu_xty + q1) / stats.n1;
    let sigma_u2 = q1 / stats.n1;

    let moments = TraitMoments::new(mu, post.trace_s2_cov, stats);
    let (alpha, gamma) = moments.solve(constraints).ok_or_else(|| {
        PmrError::numerical(
            iteration,
            format!(
                "singular alpha/gamma normal equations (q2={:.3e}, c={:.3e}, d={:.3e})",
                moments.q2, moments.c, moments.d
            ),
        )
    })?;
    let sigma_e2_2 = moments.residual_ss(alpha, gamma) / stats.n2;

    let params = ModelParameters {
        alpha,
        gamma,
        beta: mu.clone(),
        sigma_beta2: apply_floor(sigma_beta2, floor, VarianceComponent::SigmaBeta, &mut floored),
        sigma_u2: apply_floor(sigma_u2, floor, VarianceComponent::SigmaU, &mut floored),
        sigma_e1_2: apply_floor(sigma_e1_2, floor, VarianceComponent::SigmaE1, &mut floored),
        sigma_e2_2: apply_floor(sigma_e2_2, floor, VarianceComponent::SigmaE2, &mut floored),
    };

    Ok(MStepOutcome { params, floored })
}
