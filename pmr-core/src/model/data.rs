//! Validated model inputs.
//!
//! Both input modes assume the caller has standardized every instrument
//! column and both phenotypes to zero mean and unit variance. Nothing
//! here re-standardizes; the checks are limited to shapes, symmetry,
//! sample sizes and finiteness.

use pmr_linalg::dense::DenseMatrix;

use crate::error::{PmrError, Result};

/// Relative tolerance used when checking LD matrices for symmetry.
pub const SYMMETRY_TOL: f64 = 1e-8;

/// Individual-level data for one gene.
///
/// `y` is expression in the eQTL cohort (n1 samples, genotypes `x1`);
/// `z` is the complex trait in the GWAS cohort (n2 samples, genotypes `x2`).
#[derive(Debug, Clone, Copy)]
pub struct ObservationSet<'a> {
    pub y: &'a [f64],
    pub z: &'a [f64],
    pub x1: &'a DenseMatrix,
    pub x2: &'a DenseMatrix,
}

impl<'a> ObservationSet<'a> {
    pub fn new(
        y: &'a [f64],
        z: &'a [f64],
        x1: &'a DenseMatrix,
        x2: &'a DenseMatrix,
    ) -> Result<Self> {
        if y.len() != x1.nrows() {
            return Err(PmrError::validation(format!(
                "expression length {} does not match eQTL genotype rows {}",
                y.len(),
                x1.nrows()
            )));
        }
        if z.len() != x2.nrows() {
            return Err(PmrError::validation(format!(
                "trait length {} does not match GWAS genotype rows {}",
                z.len(),
                x2.nrows()
            )));
        }
        if x1.ncols() != x2.ncols() {
            return Err(PmrError::validation(format!(
                "eQTL and GWAS genotypes have different instrument counts ({} vs {})",
                x1.ncols(),
                x2.ncols()
            )));
        }
        if x1.ncols() == 0 {
            return Err(PmrError::validation("at least one instrument is required"));
        }
        if y.is_empty() || z.is_empty() {
            return Err(PmrError::validation("both cohorts need at least one sample"));
        }
        if !y.iter().chain(z.iter()).all(|v| v.is_finite()) {
            return Err(PmrError::validation("phenotypes contain non-finite values"));
        }
        if !x1.all_finite() || !x2.all_finite() {
            return Err(PmrError::validation(
                "genotype matrices contain non-finite values (impute missing dosages first)",
            ));
        }
        Ok(Self { y, z, x1, x2 })
    }

    /// Number of instruments p.
    pub fn n_instruments(&self) -> usize {
        self.x1.ncols()
    }

    pub fn n1(&self) -> usize {
        self.y.len()
    }

    pub fn n2(&self) -> usize {
        self.z.len()
    }
}

/// Summary-level data for one gene.
///
/// `betax`/`betay` are per-instrument marginal effects on expression and
/// on the trait; `sigma1`/`sigma2` are the LD (correlation) matrices of
/// the eQTL and GWAS reference panels.
#[derive(Debug, Clone)]
pub struct SummarySet {
    pub betax: Vec<f64>,
    pub betay: Vec<f64>,
    pub sigma1: DenseMatrix,
    pub sigma2: DenseMatrix,
    pub n1: usize,
    pub n2: usize,
}

impl SummarySet {
    pub fn new(
        betax: Vec<f64>,
        betay: Vec<f64>,
        sigma1: DenseMatrix,
        sigma2: DenseMatrix,
        n1: usize,
        n2: usize,
    ) -> Result<Self> {
        let p = betax.len();
        if p == 0 {
            return Err(PmrError::validation("at least one instrument is required"));
        }
        if betay.len() != p {
            return Err(PmrError::validation(format!(
                "betax has {} entries but betay has {}",
                p,
                betay.len()
            )));
        }
        for (name, sigma) in [("Sigma1", &sigma1), ("Sigma2", &sigma2)] {
            if sigma.nrows() != p || sigma.ncols() != p {
                return Err(PmrError::validation(format!(
                    "{} is {}x{}, expected {}x{}",
                    name,
                    sigma.nrows(),
                    sigma.ncols(),
                    p,
                    p
                )));
            }
            if !sigma.all_finite() {
                return Err(PmrError::validation(format!(
                    "{} contains non-finite values",
                    name
                )));
            }
            if !sigma.is_symmetric(SYMMETRY_TOL) {
                return Err(PmrError::validation(format!("{} is not symmetric", name)));
            }
        }
        if n1 == 0 || n2 == 0 {
            return Err(PmrError::validation(format!(
                "sample sizes must be positive (n1={}, n2={})",
                n1, n2
            )));
        }
        if !betax.iter().chain(betay.iter()).all(|v| v.is_finite()) {
            return Err(PmrError::validation("effect sizes contain non-finite values"));
        }
        Ok(Self {
            betax,
            betay,
            sigma1,
            sigma2,
            n1,
            n2,
        })
    }

    /// Number of instruments p.
    pub fn n_instruments(&self) -> usize {
        self.betax.len()
    }
}
