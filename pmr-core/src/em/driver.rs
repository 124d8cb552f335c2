//! EM iteration for a single model variant.
//!
//! Each iteration runs the E-step, the M-step and one log-likelihood
//! evaluation, then checks |loglik[t] - loglik[t-1]| < tol. Running out
//! of iterations is reported through `converged = false`, not as an
//! error.

use tracing::{debug, info, warn};

use crate::error::{PmrError, Result};
use crate::model::params::{Constraints, ModelVariant};
use crate::model::result::FitResult;
use crate::stats::SufficientStats;

use super::estep::posterior;
use super::init::initial_parameters;
use super::loglik::log_likelihood;
use super::mstep::{update_parameters, VarianceComponent};

/// Configuration for EM iterations.
#[derive(Debug, Clone)]
pub struct EmConfig {
    /// Maximum number of EM iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the absolute log-likelihood change.
    pub tol: f64,
    /// Lower bound applied to every variance component.
    pub variance_floor: f64,
    /// Minimum eigenvalue enforced on LD and precision matrices.
    pub min_eigenvalue: f64,
    /// Factorization retries with a growing ridge before giving up.
    pub max_ridge_attempts: usize,
    /// Consecutive floored iterations of one component that abort the fit.
    pub max_floor_streak: usize,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-5,
            variance_floor: 1e-6,
            min_eigenvalue: 1e-6,
            max_ridge_attempts: 8,
            max_floor_streak: 50,
        }
    }
}

impl EmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(PmrError::validation("max_iter must be at least 1"));
        }
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(PmrError::validation(format!(
                "tol must be positive and finite (got {})",
                self.tol
            )));
        }
        if !(self.variance_floor > 0.0 && self.variance_floor.is_finite()) {
            return Err(PmrError::validation(format!(
                "variance_floor must be positive and finite (got {})",
                self.variance_floor
            )));
        }
        if !(self.min_eigenvalue > 0.0 && self.min_eigenvalue.is_finite()) {
            return Err(PmrError::validation(format!(
                "min_eigenvalue must be positive and finite (got {})",
                self.min_eigenvalue
            )));
        }
        if self.max_ridge_attempts == 0 || self.max_floor_streak == 0 {
            return Err(PmrError::validation(
                "max_ridge_attempts and max_floor_streak must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Fit one model variant by EM on precomputed sufficient statistics.
pub fn run_em(
    stats: &SufficientStats,
    constraints: Constraints,
    config: &EmConfig,
) -> Result<FitResult> {
    config.validate()?;

    let variant = ModelVariant::from_constraints(constraints);
    info!(
        "Starting EM ({}) with n1={}, n2={}, p={}",
        variant,
        stats.n1,
        stats.n2,
        stats.n_instruments()
    );

    let mut params = initial_parameters(stats, constraints, config.variance_floor);
    let mut loglik: Vec<f64> = Vec::with_capacity(config.max_iter.min(1024));
    let mut floor_streak = [0usize; 4];
    let mut converged = false;
    let mut n_iterations = 0;

    for iter in 1..=config.max_iter {
        n_iterations = iter;

        let post = posterior(
            &params,
            stats,
            config.min_eigenvalue,
            config.max_ridge_attempts,
        )
        .map_err(|e| PmrError::numerical(iter, format!("E-step factorization failed: {}", e)))?;
        if post.ridge > 0.0 {
            debug!("Iteration {}: posterior precision regularized (ridge={:.3e})", iter, post.ridge);
        }

        let outcome = update_parameters(&post, stats, constraints, config.variance_floor, iter)?;
        params = outcome.params;

        for component in VarianceComponent::ALL {
            let k = component.index();
            if outcome.floored.contains(&component) {
                floor_streak[k] += 1;
                if floor_streak[k] >= config.max_floor_streak {
                    return Err(PmrError::numerical(
                        iter,
                        format!(
                            "{} held at the variance floor for {} consecutive iterations",
                            component.name(),
                            floor_streak[k]
                        ),
                    ));
                }
            } else {
                floor_streak[k] = 0;
            }
        }

        let ll = log_likelihood(
            &params,
            stats,
            config.min_eigenvalue,
            config.max_ridge_attempts,
        )
        .map_err(|e| PmrError::numerical(iter, format!("log-likelihood evaluation failed: {}", e)))?;
        if !ll.is_finite() {
            return Err(PmrError::numerical(iter, "non-finite log-likelihood"));
        }

        let change = loglik.last().map(|prev| ll - prev);
        loglik.push(ll);

        debug!(
            "Iteration {}: loglik={:.6}, alpha={:.6}, gamma={:.6}, sigma_beta2={:.4e}, sigma_e1_2={:.4}, sigma_e2_2={:.4}",
            iter,
            ll,
            params.alpha,
            params.gamma,
            params.sigma_beta2,
            params.sigma_e1_2,
            params.sigma_e2_2
        );

        if let Some(delta) = change {
            if delta.abs() < config.tol {
                converged = true;
                info!("EM ({}) converged at iteration {}, loglik={:.6}", variant, iter, ll);
                break;
            }
        }
    }

    if !converged {
        warn!(
            "EM ({}) did not converge after {} iterations",
            variant, config.max_iter
        );
    }

    Ok(FitResult {
        params,
        loglik,
        converged,
        iterations: n_iterations,
        constraints,
        ld_ridge: stats.ld_ridge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmr_linalg::dense::DenseMatrix;

    fn small_stats() -> SufficientStats {
        SufficientStats::new(
            200.0,
            DenseMatrix::from_row_major(2, 2, &[200.0, 60.0, 60.0, 200.0]),
            vec![60.0, 30.0],
            200.0,
            300.0,
            DenseMatrix::from_row_major(2, 2, &[300.0, 90.0, 90.0, 300.0]),
            vec![40.0, 15.0],
            300.0,
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(EmConfig::default().validate().is_ok());
        let bad = EmConfig {
            max_iter: 0,
            ..Default::default()
        };
        assert!(bad.validate().unwrap_err().is_validation());
        let bad = EmConfig {
            tol: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = EmConfig {
            variance_floor: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_trajectory_length_matches_iterations() {
        let config = EmConfig {
            max_iter: 5,
            tol: 1e-300,
            ..Default::default()
        };
        let fit = run_em(&small_stats(), Constraints::unconstrained(), &config).unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.iterations, 5);
        assert_eq!(fit.loglik.len(), 5);
    }

    #[test]
    fn test_single_iteration_never_converges() {
        let config = EmConfig {
            max_iter: 1,
            tol: 1e10,
            ..Default::default()
        };
        let fit = run_em(&small_stats(), Constraints::unconstrained(), &config).unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.loglik.len(), 1);
    }

    #[test]
    fn test_monotone_trajectory() {
        let config = EmConfig {
            max_iter: 40,
            ..Default::default()
        };
        let fit = run_em(&small_stats(), Constraints::unconstrained(), &config).unwrap();
        assert!(fit.iterations >= 2);
        for w in fit.loglik.windows(2) {
            assert!(w[1] - w[0] >= -1e-6, "loglik decreased: {:?}", w);
        }
    }

    #[test]
    fn test_floor_streak_is_numerical_error() {
        // Every variance is far below this floor, so all bind at iteration 1
        let config = EmConfig {
            variance_floor: 10.0,
            max_floor_streak: 1,
            ..Default::default()
        };
        let err = run_em(&small_stats(), Constraints::unconstrained(), &config).unwrap_err();
        match err {
            PmrError::Numerical { iteration, reason } => {
                assert_eq!(iteration, 1);
                assert!(reason.contains("variance floor"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
