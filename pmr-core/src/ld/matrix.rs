//! LD matrices and marginal effects from individual-level data.
//!
//! Produces the inputs of summary mode from the same genotypes and
//! phenotypes that individual mode consumes: Pearson correlation among
//! instruments, and per-instrument marginal regression slopes.

use pmr_linalg::dense::DenseMatrix;

use crate::error::Result;
use crate::model::data::{ObservationSet, SummarySet};

/// Compute the LD correlation matrix of the instrument columns of `x`.
///
/// Returns a p x p matrix whose (i, j) entry is the Pearson correlation
/// of columns i and j. Monomorphic columns get unit diagonal and zero
/// off-diagonal entries.
pub fn compute_ld_matrix(x: &DenseMatrix) -> DenseMatrix {
    let n = x.nrows();
    let p = x.ncols();
    if p == 0 {
        return DenseMatrix::zeros(0, 0);
    }

    // Center each column once
    let centered: Vec<(Vec<f64>, f64)> = (0..p)
        .map(|j| {
            let col = x.col(j);
            let mean = col.iter().sum::<f64>() / n as f64;
            let c: Vec<f64> = col.iter().map(|v| v - mean).collect();
            let ss = DenseMatrix::dot(&c, &c);
            (c, ss.sqrt())
        })
        .collect();

    let mut ld = DenseMatrix::zeros(p, p);

    for i in 0..p {
        ld.set(i, i, 1.0);
        let (ci, norm_i) = &centered[i];
        if *norm_i < 1e-10 {
            continue;
        }

        for j in (i + 1)..p {
            let (cj, norm_j) = &centered[j];
            if *norm_j < 1e-10 {
                continue;
            }
            let r = DenseMatrix::dot(ci, cj) / (norm_i * norm_j);
            ld.set(i, j, r);
            ld.set(j, i, r);
        }
    }

    ld
}

/// Per-instrument marginal regression slopes of `v` on each column of `x`:
/// x_j' v / x_j' x_j. Monomorphic columns get a zero slope.
pub fn marginal_effects(x: &DenseMatrix, v: &[f64]) -> Vec<f64> {
    let xtv = x.t_mat_vec(v);
    (0..x.ncols())
        .map(|j| {
            let col = x.col(j);
            let ss = DenseMatrix::dot(&col, &col);
            if ss > 1e-30 {
                xtv[j] / ss
            } else {
                0.0
            }
        })
        .collect()
}

/// Derive summary statistics from individual-level data.
///
/// On standardized inputs this yields statistics that reproduce the
/// individual-level sufficient statistics exactly, so summary and
/// individual fits of the same data agree.
pub fn summarize_individual(data: &ObservationSet<'_>) -> Result<SummarySet> {
    SummarySet::new(
        marginal_effects(data.x1, data.y),
        marginal_effects(data.x2, data.z),
        compute_ld_matrix(data.x1),
        compute_ld_matrix(data.x2),
        data.n1(),
        data.n2(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ld_perfect_correlation() {
        let x = DenseMatrix::from_columns(&[
            vec![0.0, 1.0, 2.0, 0.0, 1.0],
            vec![0.0, 1.0, 2.0, 0.0, 1.0],
        ]);
        let ld = compute_ld_matrix(&x);
        assert!((ld.get(0, 0) - 1.0).abs() < 1e-10);
        assert!((ld.get(0, 1) - 1.0).abs() < 1e-10);
        assert!((ld.get(1, 0) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_ld_anticorrelation_and_monomorphic() {
        let x = DenseMatrix::from_columns(&[
            vec![0.0, 1.0, 2.0, 1.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0],
        ]);
        let ld = compute_ld_matrix(&x);
        assert!((ld.get(0, 1) + 1.0).abs() < 1e-10);
        assert_eq!(ld.get(0, 2), 0.0);
        assert_eq!(ld.get(2, 2), 1.0);
    }

    #[test]
    fn test_ld_symmetric() {
        let x = DenseMatrix::from_columns(&[
            vec![0.0, 1.0, 2.0],
            vec![1.0, 1.0, 0.0],
            vec![2.0, 0.0, 1.0],
        ]);
        let ld = compute_ld_matrix(&x);
        assert!(ld.is_symmetric(1e-12));
    }

    #[test]
    fn test_marginal_effects() {
        let x = DenseMatrix::from_columns(&[vec![1.0, -1.0, 0.0], vec![0.0, 0.0, 0.0]]);
        let slopes = marginal_effects(&x, &[2.0, -2.0, 5.0]);
        assert!((slopes[0] - 2.0).abs() < 1e-12);
        assert_eq!(slopes[1], 0.0);
    }
}
