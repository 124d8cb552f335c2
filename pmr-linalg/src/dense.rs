#![allow(clippy::needless_range_loop)]
//! Dense matrix operations backed by faer.
//!
//! Wraps faer's column-major Mat<f64> with the handful of operations the
//! PMR engine needs: cross-products of instrument matrices, quadratic
//! forms, symmetric checks and diagonal shifts.

use faer::Mat;

/// A dense matrix wrapper around faer's `Mat<f64>`.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    inner: Mat<f64>,
}

impl DenseMatrix {
    /// Create a new dense matrix filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, ncols),
        }
    }

    /// Create a dense matrix from a flat vec (column-major order).
    pub fn from_col_major(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i]);
        Self { inner }
    }

    /// Create a dense matrix from a flat slice in row-major order.
    pub fn from_row_major(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]);
        Self { inner }
    }

    /// Build a matrix from a list of columns of equal length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Self {
        let ncols = columns.len();
        let nrows = columns.first().map_or(0, |c| c.len());
        assert!(columns.iter().all(|c| c.len() == nrows));
        let inner = Mat::from_fn(nrows, ncols, |i, j| columns[j][i]);
        Self { inner }
    }

    /// Create an identity matrix of size n x n.
    pub fn identity(n: usize) -> Self {
        let inner = Mat::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 });
        Self { inner }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.read(row, col)
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.inner.write(row, col, value);
    }

    /// Get a reference to the underlying faer matrix.
    pub fn as_faer(&self) -> &Mat<f64> {
        &self.inner
    }

    /// Matrix-vector product: self * v.
    pub fn mat_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.ncols(), v.len());
        let n = self.nrows();
        let mut result = vec![0.0; n];
        for j in 0..self.ncols() {
            let vj = v[j];
            for i in 0..n {
                result[i] += self.inner.read(i, j) * vj;
            }
        }
        result
    }

    /// Transposed matrix-vector product: self' * v.
    ///
    /// For an n x p instrument matrix this is the p-vector of
    /// instrument/phenotype cross-products.
    pub fn t_mat_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.nrows(), v.len());
        (0..self.ncols())
            .map(|j| {
                let mut s = 0.0;
                for i in 0..self.nrows() {
                    s += self.inner.read(i, j) * v[i];
                }
                s
            })
            .collect()
    }

    /// Matrix-matrix product: self * other.
    pub fn mat_mul(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.ncols(), other.nrows());
        let result = &self.inner * &other.inner;
        DenseMatrix { inner: result }
    }

    /// Transpose.
    pub fn transpose(&self) -> DenseMatrix {
        let inner = self.inner.transpose().to_owned();
        DenseMatrix { inner }
    }

    /// Cross-product self' * self (p x p for an n x p matrix).
    pub fn gram(&self) -> DenseMatrix {
        let mut g = self.transpose().mat_mul(self);
        g.symmetrize();
        g
    }

    /// Extract column as a Vec<f64>.
    pub fn col(&self, j: usize) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.inner.read(i, j)).collect()
    }

    /// Scalar multiplication.
    pub fn scale(&self, s: f64) -> DenseMatrix {
        let inner = Mat::from_fn(self.nrows(), self.ncols(), |i, j| {
            self.inner.read(i, j) * s
        });
        DenseMatrix { inner }
    }

    /// Return a copy with `shift` added to every diagonal entry.
    pub fn with_added_diagonal(&self, shift: f64) -> DenseMatrix {
        let mut out = self.clone();
        let n = self.nrows().min(self.ncols());
        for i in 0..n {
            out.inner.write(i, i, out.inner.read(i, i) + shift);
        }
        out
    }

    /// Diagonal of a square matrix.
    pub fn diag(&self) -> Vec<f64> {
        let n = self.nrows().min(self.ncols());
        (0..n).map(|i| self.inner.read(i, i)).collect()
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> f64 {
        self.diag().iter().sum()
    }

    /// Row sums, i.e. self * 1.
    pub fn row_sums(&self) -> Vec<f64> {
        self.mat_vec(&vec![1.0; self.ncols()])
    }

    /// Sum of element-wise products, sum_ij A_ij B_ij.
    ///
    /// Equals tr(A B) when either argument is symmetric.
    pub fn frobenius_inner(&self, other: &DenseMatrix) -> f64 {
        assert_eq!(self.nrows(), other.nrows());
        assert_eq!(self.ncols(), other.ncols());
        let mut sum = 0.0;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                sum += self.inner.read(i, j) * other.inner.read(i, j);
            }
        }
        sum
    }

    /// Quadratic form v' * self * w.
    pub fn bilinear(&self, v: &[f64], w: &[f64]) -> f64 {
        assert_eq!(self.nrows(), v.len());
        let mw = self.mat_vec(w);
        Self::dot(v, &mw)
    }

    /// Quadratic form v' * self * v.
    pub fn quad_form(&self, v: &[f64]) -> f64 {
        self.bilinear(v, v)
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        let mut m: f64 = 0.0;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                m = m.max(self.inner.read(i, j).abs());
            }
        }
        m
    }

    /// True when the matrix is square and |a_ij - a_ji| <= tol * max(1, max|a|).
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let scale = self.max_abs().max(1.0);
        for j in 0..self.ncols() {
            for i in (j + 1)..self.nrows() {
                if (self.inner.read(i, j) - self.inner.read(j, i)).abs() > tol * scale {
                    return false;
                }
            }
        }
        true
    }

    /// Replace a square matrix with (A + A') / 2.
    pub fn symmetrize(&mut self) {
        let n = self.nrows();
        for j in 0..n {
            for i in (j + 1)..n {
                let v = 0.5 * (self.inner.read(i, j) + self.inner.read(j, i));
                self.inner.write(i, j, v);
                self.inner.write(j, i, v);
            }
        }
    }

    /// True when every entry is finite.
    pub fn all_finite(&self) -> bool {
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                if !self.inner.read(i, j).is_finite() {
                    return false;
                }
            }
        }
        true
    }

    /// Dot product of two slices.
    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }
}

impl std::fmt::Display for DenseMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{:.6}", self.inner.read(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
