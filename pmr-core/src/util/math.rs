//! Mathematical utility functions.
//!
//! Standardization uses the population standard deviation (divide by n),
//! which is the convention under which the summary-statistics
//! approximation X'X ~ n * Sigma holds exactly.

use pmr_linalg::dense::DenseMatrix;

/// Mean and population standard deviation of a slice. NaN entries are skipped.
pub fn mean_and_sd(values: &[f64]) -> (f64, f64) {
    let (sum, sum_sq, n) = values.iter().fold((0.0, 0.0, 0usize), |(s, ss, n), &v| {
        if v.is_nan() {
            (s, ss, n)
        } else {
            (s + v, ss + v * v, n + 1)
        }
    });
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let var = sum_sq / n as f64 - mean * mean;
    (mean, var.max(0.0).sqrt())
}

/// Standardize in place to zero mean and unit population variance.
///
/// Constant inputs are set to zero. Returns false in that case.
pub fn standardize(values: &mut [f64]) -> bool {
    let (mean, sd) = mean_and_sd(values);
    if sd > 1e-10 {
        for v in values.iter_mut() {
            *v = (*v - mean) / sd;
        }
        true
    } else {
        for v in values.iter_mut() {
            *v = 0.0;
        }
        false
    }
}

/// Standardize every column of `x`. Returns the indices of constant columns.
pub fn standardize_columns(x: &DenseMatrix) -> (DenseMatrix, Vec<usize>) {
    let mut constant = Vec::new();
    let columns: Vec<Vec<f64>> = (0..x.ncols())
        .map(|j| {
            let mut col = x.col(j);
            if !standardize(&mut col) {
                constant.push(j);
            }
            col
        })
        .collect();
    let out = if columns.is_empty() {
        DenseMatrix::zeros(x.nrows(), 0)
    } else {
        DenseMatrix::from_columns(&columns)
    };
    (out, constant)
}

/// a / b, or `fallback` when |b| is below `eps`.
pub fn safe_div(a: f64, b: f64, eps: f64, fallback: f64) -> f64 {
    if b.abs() > eps {
        a / b
    } else {
        fallback
    }
}
