//! FitResult: the outcome of one EM fit.

use serde::{Deserialize, Serialize};

use super::params::{Constraints, ModelParameters, ModelVariant};

/// Final estimates and diagnostics of a single fit.
///
/// Created fresh by each fit call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Parameters after the last completed iteration.
    pub params: ModelParameters,
    /// Observed-data log-likelihood after each completed M-step.
    pub loglik: Vec<f64>,
    /// Whether the log-likelihood change fell below the tolerance.
    pub converged: bool,
    /// Number of EM iterations performed.
    pub iterations: usize,
    /// Constraints the fit was run under.
    pub constraints: Constraints,
    /// Ridge added to the eQTL and GWAS LD matrices before fitting.
    pub ld_ridge: [f64; 2],
}

impl FitResult {
    pub fn variant(&self) -> ModelVariant {
        ModelVariant::from_constraints(self.constraints)
    }

    /// Maximum of the log-likelihood trajectory.
    pub fn max_loglik(&self) -> f64 {
        self.loglik
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Log-likelihood at the final parameters.
    pub fn final_loglik(&self) -> f64 {
        self.loglik.last().copied().unwrap_or(f64::NEG_INFINITY)
    }

    /// Number of instruments the model was fitted on.
    pub fn n_instruments(&self) -> usize {
        self.params.beta.len()
    }
}
