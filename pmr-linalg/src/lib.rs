//! pmr-linalg: Linear algebra wrappers for PMR-RS
//!
//! Provides the dense matrix type, Cholesky factorization with
//! log-determinants and triangular inverses, and the eigenvalue-guided
//! ridge regularization used by the EM engine on near-singular LD and
//! precision matrices.

pub mod decomposition;
pub mod dense;

pub use decomposition::{CholeskyDecomp, LinalgError};
pub use dense::DenseMatrix;
