//! Fit result serialization.
//!
//! Results are stored as pretty-printed JSON so they can be inspected
//! by hand and re-loaded to compute test statistics later.

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::result::FitResult;

/// Save a fit result as JSON.
pub fn save_fit_json(fit: &FitResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(fit)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write fit result: {}", path.display()))?;
    Ok(())
}

/// Load a fit result written by [`save_fit_json`].
pub fn load_fit_json(path: &Path) -> Result<FitResult> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fit result: {}", path.display()))?;
    let fit: FitResult = serde_json::from_str(&data)?;

    if fit.loglik.len() != fit.iterations {
        bail!(
            "Corrupt fit result: {} log-likelihood values for {} iterations",
            fit.loglik.len(),
            fit.iterations
        );
    }

    Ok(fit)
}

/// Human-readable summary of a fit.
pub fn result_summary(fit: &FitResult) -> String {
    let p = &fit.params;
    format!(
        "PMR fit ({})\n\
         Instruments: {}\n\
         alpha: {:.6}{}\n\
         gamma: {:.6}{}\n\
         sigma_beta2: {:.6e}\n\
         sigma_u2: {:.6}\n\
         sigma_e1_2: {:.6}\n\
         sigma_e2_2: {:.6}\n\
         Log-likelihood: {:.4}\n\
         Iterations: {} ({})",
        fit.variant(),
        fit.n_instruments(),
        p.alpha,
        if fit.constraints.alpha_fixed { " (fixed)" } else { "" },
        p.gamma,
        if fit.constraints.gamma_fixed { " (fixed)" } else { "" },
        p.sigma_beta2,
        p.sigma_u2,
        p.sigma_e1_2,
        p.sigma_e2_2,
        fit.final_loglik(),
        fit.iterations,
        if fit.converged { "converged" } else { "not converged" },
    )
}
