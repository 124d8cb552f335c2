//! Entry points for fitting one gene in either input mode.
//!
//! Inputs are validated before any iteration runs. Each call is pure:
//! identical inputs give bit-identical results, and calls on different
//! genes or variants may run concurrently.

use pmr_linalg::dense::DenseMatrix;

use crate::em::driver::{run_em, EmConfig};
use crate::error::Result;
use crate::model::data::{ObservationSet, SummarySet};
use crate::model::params::Constraints;
use crate::model::result::FitResult;
use crate::stats::{to_sufficient_statistics, SufficientStats};

/// Fit from individual-level data.
///
/// `y` and `x1` are the eQTL cohort, `z` and `x2` the GWAS cohort. All
/// columns and both phenotypes must already be standardized.
pub fn fit_individual(
    y: &[f64],
    z: &[f64],
    x1: &DenseMatrix,
    x2: &DenseMatrix,
    constraints: Constraints,
    config: &EmConfig,
) -> Result<FitResult> {
    let data = ObservationSet::new(y, z, x1, x2)?;
    fit_observations(&data, constraints, config)
}

/// Fit from a validated [`ObservationSet`].
pub fn fit_observations(
    data: &ObservationSet<'_>,
    constraints: Constraints,
    config: &EmConfig,
) -> Result<FitResult> {
    let stats = SufficientStats::from_observations(data)?;
    run_em(&stats, constraints, config)
}

/// Fit from summary statistics: marginal effects on expression (`betax`)
/// and on the trait (`betay`), LD matrices and cohort sizes.
#[allow(clippy::too_many_arguments)]
pub fn fit_summary(
    betax: &[f64],
    betay: &[f64],
    sigma1: &DenseMatrix,
    sigma2: &DenseMatrix,
    n1: usize,
    n2: usize,
    constraints: Constraints,
    config: &EmConfig,
) -> Result<FitResult> {
    let summary = SummarySet::new(
        betax.to_vec(),
        betay.to_vec(),
        sigma1.clone(),
        sigma2.clone(),
        n1,
        n2,
    )?;
    fit_summary_set(&summary, constraints, config)
}

/// Fit from a validated [`SummarySet`].
pub fn fit_summary_set(
    summary: &SummarySet,
    constraints: Constraints,
    config: &EmConfig,
) -> Result<FitResult> {
    let stats = to_sufficient_statistics(summary, config.min_eigenvalue)?;
    run_em(&stats, constraints, config)
}
