//! Instrument selection and genotype matrix assembly.
//!
//! Missing dosages are mean-imputed (2 * af). Markers absent from a file
//! or monomorphic among the selected samples are dropped with a warning,
//! since they carry no information about the instrument effects. Shared
//! instruments are expressed in the eQTL file's counted allele.

use std::path::Path;

use anyhow::{bail, Context, Result};
use pmr_linalg::dense::DenseMatrix;
use tracing::{debug, info, warn};

use crate::traits::{AlleleMatch, GenotypeReader, MarkerData};

/// Dosage matrix (samples x instruments) with its instrument IDs.
#[derive(Debug, Clone)]
pub struct InstrumentMatrix {
    pub ids: Vec<String>,
    pub x: DenseMatrix,
}

/// The same instruments read from the eQTL and GWAS cohorts.
#[derive(Debug, Clone)]
pub struct SharedInstruments {
    pub ids: Vec<String>,
    pub x1: DenseMatrix,
    pub x2: DenseMatrix,
}

/// Read an instrument ID list: first field of each non-empty line;
/// lines starting with '#' are skipped.
pub fn read_id_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read instrument list: {}", path.display()))?;
    Ok(contents
        .lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .filter_map(|l| l.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// All marker IDs of a reader, in file order.
pub fn all_marker_ids(reader: &dyn GenotypeReader) -> Result<Vec<String>> {
    (0..reader.n_markers())
        .map(|i| reader.marker_info(i).map(|m| m.id))
        .collect()
}

fn read_imputed(reader: &mut dyn GenotypeReader, id: &str) -> Result<Option<MarkerData>> {
    let Some(index) = reader.marker_index(id) else {
        return Ok(None);
    };
    let mut marker = reader.read_marker(index)?;
    if marker.is_monomorphic() {
        return Ok(None);
    }
    marker.impute_missing();
    Ok(Some(marker))
}

/// Read `wanted` instruments from one reader.
pub fn read_instruments(
    reader: &mut dyn GenotypeReader,
    wanted: &[String],
) -> Result<InstrumentMatrix> {
    let mut ids = Vec::new();
    let mut columns = Vec::new();
    for id in wanted {
        match read_imputed(reader, id)? {
            Some(marker) => {
                ids.push(id.clone());
                columns.push(marker.dosages);
            }
            None => warn!("Instrument {} missing or monomorphic; dropped", id),
        }
    }
    if columns.is_empty() {
        bail!("None of the {} requested instruments could be used", wanted.len());
    }
    info!("Read {} instruments for {} samples", ids.len(), reader.n_samples());
    Ok(InstrumentMatrix {
        ids,
        x: DenseMatrix::from_columns(&columns),
    })
}

/// Read `wanted` instruments from both cohorts, keeping only those
/// usable in both.
///
/// GWAS dosages whose alleles are swapped relative to the eQTL file are
/// flipped to 2 - d; instruments with different allele pairs are dropped.
pub fn read_shared_instruments(
    eqtl: &mut dyn GenotypeReader,
    gwas: &mut dyn GenotypeReader,
    wanted: &[String],
) -> Result<SharedInstruments> {
    let mut ids = Vec::new();
    let mut cols1 = Vec::new();
    let mut cols2 = Vec::new();
    for id in wanted {
        let m1 = read_imputed(eqtl, id)?;
        let m2 = read_imputed(gwas, id)?;
        match (m1, m2) {
            (Some(a), Some(mut b)) => {
                match a.info.allele_match(&b.info) {
                    AlleleMatch::Same => {}
                    AlleleMatch::Swapped => {
                        debug!("Instrument {}: GWAS alleles swapped; flipping dosages", id);
                        b.flip();
                    }
                    AlleleMatch::Mismatch => {
                        warn!(
                            "Instrument {} has alleles {}/{} (eQTL) but {}/{} (GWAS); dropped",
                            id,
                            a.info.alt_allele,
                            a.info.ref_allele,
                            b.info.alt_allele,
                            b.info.ref_allele
                        );
                        continue;
                    }
                }
                ids.push(id.clone());
                cols1.push(a.dosages);
                cols2.push(b.dosages);
            }
            _ => warn!("Instrument {} not usable in both cohorts; dropped", id),
        }
    }
    if ids.is_empty() {
        bail!("No instrument is usable in both the eQTL and GWAS genotypes");
    }
    info!(
        "Using {} shared instruments ({} eQTL, {} GWAS samples)",
        ids.len(),
        eqtl.n_samples(),
        gwas.n_samples()
    );
    Ok(SharedInstruments {
        ids,
        x1: DenseMatrix::from_columns(&cols1),
        x2: DenseMatrix::from_columns(&cols2),
    })
}
