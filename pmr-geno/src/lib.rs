//! pmr-geno: Input files for PMR-RS
//!
//! Reads instrument genotypes from PLINK bed/bim/fam, phenotype tables,
//! per-instrument summary statistics and LD matrix files, and matches
//! samples between genotype and phenotype sources.

pub mod instruments;
pub mod ld_file;
pub mod phenotype;
pub mod plink;
pub mod sample;
pub mod sumstats;
pub mod traits;

pub use traits::{AlleleMatch, GenotypeReader, MarkerData, MarkerInfo};
