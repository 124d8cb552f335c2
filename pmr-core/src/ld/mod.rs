//! LD (instrument correlation) computations.

pub mod matrix;

pub use matrix::{compute_ld_matrix, marginal_effects, summarize_individual};
