pub mod fit_individual;
pub mod fit_summary;
pub mod ld_matrix;
pub mod report;
