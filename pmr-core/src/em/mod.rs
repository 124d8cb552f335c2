//! Expectation-maximization for the PMR model.

pub mod driver;
pub mod estep;
pub mod init;
pub mod loglik;
pub mod mstep;

pub use driver::{run_em, EmConfig};
