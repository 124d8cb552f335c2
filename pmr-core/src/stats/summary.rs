//! Summary-statistics adapter.
//!
//! Rebuilds the sufficient statistics from marginal effect sizes, LD
//! matrices and sample sizes using the standard approximation for
//! standardized instruments and phenotypes:
//!
//!   X1'X1 ~ n1 * Sigma1,   X1'y ~ n1 * betax,   y'y ~ n1
//!   X2'X2 ~ n2 * Sigma2,   X2'z ~ n2 * betay,   z'z ~ n2
//!
//! The approximation is exact only when the inputs really were computed
//! on unit-variance instruments and traits. That precondition is the
//! caller's responsibility and is not checked here.

use pmr_linalg::decomposition::regularize_psd;
use tracing::debug;

use crate::error::Result;
use crate::model::data::SummarySet;

use super::sufficient::SufficientStats;

/// Convert summary-level inputs into sufficient statistics.
///
/// Each LD matrix is first lifted so that its minimum eigenvalue is at
/// least `min_eigenvalue`; the ridges added are recorded in
/// [`SufficientStats::ld_ridge`].
pub fn to_sufficient_statistics(
    summary: &SummarySet,
    min_eigenvalue: f64,
) -> Result<SufficientStats> {
    let n1 = summary.n1 as f64;
    let n2 = summary.n2 as f64;

    let (sigma1, ridge1) = regularize_psd(&summary.sigma1, min_eigenvalue)?;
    let (sigma2, ridge2) = regularize_psd(&summary.sigma2, min_eigenvalue)?;
    if ridge1 > 0.0 || ridge2 > 0.0 {
        debug!(
            "Regularized LD matrices: ridge1={:.3e}, ridge2={:.3e}",
            ridge1, ridge2
        );
    }

    let xty: Vec<f64> = summary.betax.iter().map(|b| n1 * b).collect();
    let xtz: Vec<f64> = summary.betay.iter().map(|b| n2 * b).collect();

    let mut stats = SufficientStats::new(
        n1,
        sigma1.scale(n1),
        xty,
        n1,
        n2,
        sigma2.scale(n2),
        xtz,
        n2,
    )?;
    stats.ld_ridge = [ridge1, ridge2];
    Ok(stats)
}
