//! Error taxonomy for PMR fits.
//!
//! Validation failures are raised before the first EM iteration;
//! numerical failures abort only the fit that produced them. Running out
//! of iterations is not an error and is reported through
//! [`crate::FitResult::converged`].

use pmr_linalg::LinalgError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PmrError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("numerical failure at iteration {iteration}: {reason}")]
    Numerical { iteration: usize, reason: String },

    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

impl PmrError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn numerical(iteration: usize, reason: impl Into<String>) -> Self {
        Self::Numerical {
            iteration,
            reason: reason.into(),
        }
    }

    /// True for failures detected before any iteration ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Numerical { .. } | Self::Linalg(_))
    }
}

pub type Result<T> = std::result::Result<T, PmrError>;
