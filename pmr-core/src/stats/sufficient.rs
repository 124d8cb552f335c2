//! Sufficient statistics shared by both input modes.
//!
//! The EM engine never touches raw genotypes: every E-step, M-step and
//! likelihood evaluation is written against the cross-products below.
//! Building them from individual-level data costs O(n p^2) once per fit.

use pmr_linalg::dense::DenseMatrix;

use crate::error::{PmrError, Result};
use crate::model::data::ObservationSet;

/// Cross-product statistics of the eQTL (1) and GWAS (2) cohorts.
#[derive(Debug, Clone)]
pub struct SufficientStats {
    /// eQTL sample size.
    pub n1: f64,
    /// GWAS sample size.
    pub n2: f64,
    /// X1' X1 (p x p).
    pub xtx1: DenseMatrix,
    /// X1' y.
    pub xty: Vec<f64>,
    /// y' y.
    pub yty: f64,
    /// X2' X2 (p x p).
    pub xtx2: DenseMatrix,
    /// X2' z.
    pub xtz: Vec<f64>,
    /// z' z.
    pub ztz: f64,
    /// X2' X2 1, the GWAS cross-product with the pleiotropy direction.
    pub xtx2_one: Vec<f64>,
    /// 1' X2' X2 1.
    pub one_xtx2_one: f64,
    /// 1' X2' z.
    pub one_xtz: f64,
    /// Ridge added to each LD matrix before scaling (summary mode only).
    pub ld_ridge: [f64; 2],
}

impl SufficientStats {
    /// Assemble statistics from cross-products, deriving the pleiotropy
    /// direction terms.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n1: f64,
        xtx1: DenseMatrix,
        xty: Vec<f64>,
        yty: f64,
        n2: f64,
        xtx2: DenseMatrix,
        xtz: Vec<f64>,
        ztz: f64,
    ) -> Result<Self> {
        let p = xty.len();
        if p == 0 {
            return Err(PmrError::validation("at least one instrument is required"));
        }
        let shapes_ok = xtx1.nrows() == p
            && xtx1.ncols() == p
            && xtx2.nrows() == p
            && xtx2.ncols() == p
            && xtz.len() == p;
        if !shapes_ok {
            return Err(PmrError::validation(format!(
                "cross-product dimensions disagree with {} instruments",
                p
            )));
        }
        if !(n1 > 0.0 && n2 > 0.0) {
            return Err(PmrError::validation("sample sizes must be positive"));
        }

        let xtx2_one = xtx2.row_sums();
        let one_xtx2_one = xtx2_one.iter().sum();
        let one_xtz = xtz.iter().sum();

        Ok(Self {
            n1,
            n2,
            xtx1,
            xty,
            yty,
            xtx2,
            xtz,
            ztz,
            xtx2_one,
            one_xtx2_one,
            one_xtz,
            ld_ridge: [0.0, 0.0],
        })
    }

    /// Compute statistics from individual-level data.
    pub fn from_observations(data: &ObservationSet<'_>) -> Result<Self> {
        let xtx1 = data.x1.gram();
        let xty = data.x1.t_mat_vec(data.y);
        let yty = DenseMatrix::dot(data.y, data.y);

        let xtx2 = data.x2.gram();
        let xtz = data.x2.t_mat_vec(data.z);
        let ztz = DenseMatrix::dot(data.z, data.z);

        Self::new(
            data.n1() as f64,
            xtx1,
            xty,
            yty,
            data.n2() as f64,
            xtx2,
            xtz,
            ztz,
        )
    }

    /// Number of instruments p.
    pub fn n_instruments(&self) -> usize {
        self.xty.len()
    }
}
