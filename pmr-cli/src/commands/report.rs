//! Shared pieces of the fit commands: EM options, parallel variant fits,
//! likelihood-ratio tests and report output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::info;

use pmr_core::model::serialization::{result_summary, save_fit_json};
use pmr_core::{Constraints, EmConfig, FitResult, ModelVariant, PmrError};

/// EM options shared by the fit commands.
#[derive(Args, Debug, Clone)]
pub struct EmArgs {
    /// Maximum EM iterations
    #[arg(long, default_value = "1000")]
    max_iter: usize,

    /// Convergence tolerance on the log-likelihood change
    #[arg(long, default_value = "1e-5")]
    tol: f64,

    /// Lower bound for every variance component
    #[arg(long, default_value = "1e-6")]
    variance_floor: f64,

    /// Minimum eigenvalue enforced on LD and precision matrices
    #[arg(long, default_value = "1e-6")]
    min_eigenvalue: f64,

    /// Factorization retries with a growing ridge
    #[arg(long, default_value = "8")]
    max_ridge_attempts: usize,

    /// Consecutive iterations a variance may sit at the floor
    #[arg(long, default_value = "50")]
    max_floor_streak: usize,
}

impl EmArgs {
    pub fn to_config(&self) -> EmConfig {
        EmConfig {
            max_iter: self.max_iter,
            tol: self.tol,
            variance_floor: self.variance_floor,
            min_eigenvalue: self.min_eigenvalue,
            max_ridge_attempts: self.max_ridge_attempts,
            max_floor_streak: self.max_floor_streak,
        }
    }
}

/// Fits of the three tested variants of one gene.
#[derive(Debug, Clone, Serialize)]
pub struct VariantFits {
    pub full: FitResult,
    pub alpha_null: FitResult,
    pub gamma_null: FitResult,
}

/// Fit the full, alpha-null and gamma-null variants in parallel.
pub fn fit_tested_variants<F>(fit: F) -> Result<VariantFits>
where
    F: Fn(Constraints) -> Result<FitResult, PmrError> + Sync,
{
    let mut fits: Vec<FitResult> = ModelVariant::TESTED
        .par_iter()
        .map(|&variant| {
            fit(variant.constraints()).with_context(|| format!("Fitting the {} model failed", variant))
        })
        .collect::<Result<_>>()?;

    // par_iter on a slice preserves order: full, alpha_null, gamma_null
    let gamma_null = fits.pop().context("missing gamma_null fit")?;
    let alpha_null = fits.pop().context("missing alpha_null fit")?;
    let full = fits.pop().context("missing full fit")?;
    Ok(VariantFits {
        full,
        alpha_null,
        gamma_null,
    })
}

/// One likelihood-ratio test on 1 degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LrtResult {
    pub statistic: f64,
    pub pvalue: f64,
}

/// 2 * (max loglik H1 - max loglik H0), floored at 0, against chi-square(1).
pub fn likelihood_ratio_test(h1: &FitResult, h0: &FitResult) -> Result<LrtResult> {
    let statistic = (2.0 * (h1.max_loglik() - h0.max_loglik())).max(0.0);
    let chi2 = ChiSquared::new(1.0).context("chi-square distribution")?;
    Ok(LrtResult {
        statistic,
        pvalue: chi2.sf(statistic),
    })
}

/// Everything reported for one gene.
#[derive(Debug, Clone, Serialize)]
pub struct GeneReport {
    pub gene: String,
    pub instruments: Vec<String>,
    pub ld_ridge: [f64; 2],
    /// H0: alpha = 0.
    pub causal_test: LrtResult,
    /// H0: gamma = 0.
    pub pleiotropy_test: LrtResult,
    pub fits: VariantFits,
}

impl GeneReport {
    pub fn new(gene: &str, instruments: Vec<String>, fits: VariantFits) -> Result<Self> {
        let causal_test = likelihood_ratio_test(&fits.full, &fits.alpha_null)?;
        let pleiotropy_test = likelihood_ratio_test(&fits.full, &fits.gamma_null)?;
        Ok(Self {
            gene: gene.to_string(),
            instruments,
            ld_ridge: fits.full.ld_ridge,
            causal_test,
            pleiotropy_test,
            fits,
        })
    }

    pub fn print(&self) {
        println!("Gene: {} ({} instruments)", self.gene, self.instruments.len());
        println!("{}", result_summary(&self.fits.full));
        println!(
            "Causal test (alpha = 0):     LRT = {:.4}, p = {:.4e}",
            self.causal_test.statistic, self.causal_test.pvalue
        );
        println!(
            "Pleiotropy test (gamma = 0): LRT = {:.4}, p = {:.4e}",
            self.pleiotropy_test.statistic, self.pleiotropy_test.pvalue
        );
    }

    /// Write `<prefix>.pmr.json` plus one `<prefix>.<variant>.fit.json`
    /// per fitted variant. Returns the report path.
    pub fn write(&self, output_prefix: &str) -> Result<PathBuf> {
        let report_path = PathBuf::from(format!("{}.pmr.json", output_prefix));
        if let Some(parent) = report_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;

        for fit in [&self.fits.full, &self.fits.alpha_null, &self.fits.gamma_null] {
            let path = format!("{}.{}.fit.json", output_prefix, fit.variant());
            save_fit_json(fit, Path::new(&path))?;
        }
        info!("Results written to {}", report_path.display());
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmr_core::ModelParameters;

    fn fit(constraints: Constraints, loglik: Vec<f64>) -> FitResult {
        FitResult {
            params: ModelParameters {
                alpha: if constraints.alpha_fixed { 0.0 } else { 0.4 },
                gamma: 0.0,
                beta: vec![0.1, 0.2],
                sigma_beta2: 0.02,
                sigma_u2: 0.3,
                sigma_e1_2: 0.7,
                sigma_e2_2: 0.95,
            },
            iterations: loglik.len(),
            loglik,
            converged: true,
            constraints,
            ld_ridge: [0.0, 0.0],
        }
    }

    #[test]
    fn test_lrt_statistic_and_pvalue() {
        let h1 = fit(Constraints::unconstrained(), vec![-1010.0, -1000.0]);
        let h0 = fit(Constraints::alpha_null(), vec![-1003.0, -1001.92]);
        let lrt = likelihood_ratio_test(&h1, &h0).unwrap();
        assert!((lrt.statistic - 3.84).abs() < 1e-9);
        assert!((lrt.pvalue - 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_lrt_is_floored_at_zero() {
        let h1 = fit(Constraints::unconstrained(), vec![-1000.0]);
        let h0 = fit(Constraints::gamma_null(), vec![-999.5]);
        let lrt = likelihood_ratio_test(&h1, &h0).unwrap();
        assert_eq!(lrt.statistic, 0.0);
        assert!((lrt.pvalue - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fits_come_back_in_variant_order() {
        let fits = fit_tested_variants(|c| Ok(fit(c, vec![-1.0]))).unwrap();
        assert_eq!(fits.full.variant(), ModelVariant::Full);
        assert_eq!(fits.alpha_null.variant(), ModelVariant::AlphaNull);
        assert_eq!(fits.gamma_null.variant(), ModelVariant::GammaNull);
    }

    #[test]
    fn test_write_report() {
        let fits = fit_tested_variants(|c| Ok(fit(c, vec![-5.0, -4.0]))).unwrap();
        let report = GeneReport::new("GENE1", vec!["rs1".into(), "rs2".into()], fits).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("out/GENE1");
        let path = report.write(prefix.to_str().unwrap()).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["gene"], "GENE1");
        assert_eq!(value["causal_test"]["statistic"], 0.0);
        let fit_path = format!("{}.alpha_null.fit.json", prefix.display());
        let loaded = pmr_core::model::serialization::load_fit_json(Path::new(&fit_path)).unwrap();
        assert_eq!(loaded.constraints, Constraints::alpha_null());
    }
}
