//! pmr-core: Statistical core of PMR-RS
//!
//! Fits the probabilistic Mendelian randomization model, which jointly
//! estimates the causal effect of gene expression on a complex trait and
//! an Egger-style horizontal pleiotropy effect, by EM over a latent
//! instrument-to-expression effect vector. Individual-level data and
//! summary statistics share one numerical core through
//! [`stats::SufficientStats`].

pub mod em;
pub mod error;
pub mod fit;
pub mod ld;
pub mod model;
pub mod stats;
pub mod util;

pub use em::driver::EmConfig;
pub use error::PmrError;
pub use fit::{fit_individual, fit_observations, fit_summary, fit_summary_set};
pub use model::params::{Constraints, ModelParameters, ModelVariant};
pub use model::result::FitResult;
