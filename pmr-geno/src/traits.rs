//! Core traits for genotype reading.

use anyhow::Result;

/// Information about an instrument (variant).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInfo {
    /// Chromosome (e.g. "1", "22", "X").
    pub chrom: String,
    /// Position in base pairs.
    pub pos: u64,
    /// Variant ID (e.g. rsID).
    pub id: String,
    /// Reference allele.
    pub ref_allele: String,
    /// Alternative (counted) allele.
    pub alt_allele: String,
}

/// How the alleles of the same variant compare between two files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleMatch {
    /// Same counted allele.
    Same,
    /// Ref and alt exchanged; dosages count the other allele.
    Swapped,
    /// Different allele pairs.
    Mismatch,
}

impl MarkerInfo {
    /// Compare allele pairs with `other`, ignoring case.
    pub fn allele_match(&self, other: &MarkerInfo) -> AlleleMatch {
        let eq = |a: &str, b: &str| a.eq_ignore_ascii_case(b);
        if eq(&self.alt_allele, &other.alt_allele) && eq(&self.ref_allele, &other.ref_allele) {
            AlleleMatch::Same
        } else if eq(&self.alt_allele, &other.ref_allele) && eq(&self.ref_allele, &other.alt_allele)
        {
            AlleleMatch::Swapped
        } else {
            AlleleMatch::Mismatch
        }
    }
}

/// Dosages of one marker across the selected samples.
#[derive(Debug, Clone)]
pub struct MarkerData {
    pub info: MarkerInfo,
    /// Alt-allele dosage per sample (0.0 to 2.0); NaN when missing.
    pub dosages: Vec<f64>,
    /// Alt-allele frequency among non-missing samples.
    pub af: f64,
    /// Number of non-missing samples.
    pub n_valid: usize,
}

impl MarkerData {
    /// Allele frequency and non-missing count of a dosage vector.
    pub fn compute_af(dosages: &[f64]) -> (f64, usize) {
        let (sum, n) = dosages
            .iter()
            .filter(|d| !d.is_nan())
            .fold((0.0, 0usize), |(s, n), &d| (s + d, n + 1));
        let af = if n > 0 { sum / (2.0 * n as f64) } else { 0.0 };
        (af, n)
    }

    /// Impute missing dosages with twice the allele frequency.
    pub fn impute_missing(&mut self) -> usize {
        let impute_val = 2.0 * self.af;
        let mut n_imputed = 0;
        for d in &mut self.dosages {
            if d.is_nan() {
                *d = impute_val;
                n_imputed += 1;
            }
        }
        n_imputed
    }

    /// Count the other allele: d -> 2 - d, with alleles and af swapped.
    pub fn flip(&mut self) {
        for d in &mut self.dosages {
            *d = 2.0 - *d;
        }
        self.af = 1.0 - self.af;
        std::mem::swap(&mut self.info.ref_allele, &mut self.info.alt_allele);
    }

    /// True when every non-missing dosage is identical.
    pub fn is_monomorphic(&self) -> bool {
        let mut observed = self.dosages.iter().filter(|d| !d.is_nan());
        match observed.next() {
            Some(first) => observed.all(|d| (d - first).abs() < 1e-12),
            None => true,
        }
    }
}

/// Random access to instrument genotypes.
///
/// Implemented by [`crate::plink::PlinkReader`]; the CLI works through
/// `&mut dyn GenotypeReader`.
pub trait GenotypeReader: Send {
    /// Total number of markers in the file.
    fn n_markers(&self) -> usize;

    /// Number of samples returned by `read_marker`.
    fn n_samples(&self) -> usize;

    /// IDs of the samples returned by `read_marker`, in order.
    fn sample_ids(&self) -> &[String];

    /// Restrict and reorder subsequent reads to `ids`. Every ID must be
    /// present in the file.
    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()>;

    /// Index of the marker with the given ID.
    fn marker_index(&self, id: &str) -> Option<usize>;

    /// Read genotype data for marker at the given index.
    fn read_marker(&mut self, index: usize) -> Result<MarkerData>;

    /// Marker metadata without reading genotypes.
    fn marker_info(&self, index: usize) -> Result<MarkerInfo>;
}
