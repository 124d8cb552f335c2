//! PLINK bed/bim/fam reader using memory-mapped files.
//!
//! PLINK binary format consists of three files:
//! - .bed: Binary genotype data (2 bits per genotype, packed)
//! - .bim: Variant information (chrom, id, cm, pos, a1, a2)
//! - .fam: Sample information (fid, iid, father, mother, sex, pheno)
//!
//! Reference: https://www.cog-genomics.org/plink/1.9/formats#bed

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use tracing::debug;

use crate::traits::{GenotypeReader, MarkerData, MarkerInfo};

/// One .bim line.
#[derive(Debug, Clone)]
pub struct BimEntry {
    pub chrom: String,
    pub id: String,
    pub pos: u64,
    /// Counted allele (A1).
    pub allele1: String,
    pub allele2: String,
}

/// Reader for PLINK bed/bim/fam files.
pub struct PlinkReader {
    mmap: Mmap,
    bim: Vec<BimEntry>,
    /// IID of every sample in .fam order.
    fam_ids: Vec<String>,
    bytes_per_marker: usize,
    /// Variant ID -> marker index.
    id_index: HashMap<String, usize>,
    /// IDs and .fam positions of the samples currently read.
    selected_ids: Vec<String>,
    selected: Vec<usize>,
}

impl PlinkReader {
    /// Open `<prefix>.bed`, `<prefix>.bim` and `<prefix>.fam`.
    pub fn new<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        // Append rather than replace: prefixes such as `chr1.gene` carry dots
        let base = prefix.as_ref().as_os_str();
        let with_ext = |ext: &str| {
            let mut path = base.to_os_string();
            path.push(ext);
            PathBuf::from(path)
        };
        let bed_path = with_ext(".bed");
        let bim_path = with_ext(".bim");
        let fam_path = with_ext(".fam");

        let fam_ids = Self::parse_fam(&fam_path)?;
        let bim = Self::parse_bim(&bim_path)?;

        let bed_file = std::fs::File::open(&bed_path)
            .with_context(|| format!("Failed to open bed file: {}", bed_path.display()))?;
        // SAFETY: the mapping is read-only and the file is not modified while mapped
        let mmap = unsafe { Mmap::map(&bed_file)? };

        if mmap.len() < 3 {
            bail!("Bed file too small");
        }
        if mmap[0] != 0x6C || mmap[1] != 0x1B {
            bail!("Invalid PLINK bed file magic number");
        }
        if mmap[2] != 0x01 {
            bail!("Only SNP-major bed files are supported (mode byte = 0x01)");
        }

        let bytes_per_marker = fam_ids.len().div_ceil(4);
        let expected_size = 3 + bytes_per_marker * bim.len();
        if mmap.len() < expected_size {
            bail!(
                "Bed file too small: expected at least {} bytes, got {}",
                expected_size,
                mmap.len()
            );
        }

        let mut id_index = HashMap::with_capacity(bim.len());
        for (i, entry) in bim.iter().enumerate() {
            if id_index.insert(entry.id.clone(), i).is_some() {
                debug!("Duplicate variant ID {} in {}; using last occurrence", entry.id, bim_path.display());
            }
        }

        Ok(Self {
            mmap,
            bim,
            selected_ids: fam_ids.clone(),
            selected: (0..fam_ids.len()).collect(),
            fam_ids,
            bytes_per_marker,
            id_index,
        })
    }

    fn parse_fam(path: &Path) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fam file: {}", path.display()))?;
        let mut ids = Vec::new();
        for (line_num, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 6 {
                bail!("Fam file line {} has fewer than 6 fields", line_num + 1);
            }
            ids.push(fields[1].to_string());
        }
        Ok(ids)
    }

    fn parse_bim(path: &Path) -> Result<Vec<BimEntry>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bim file: {}", path.display()))?;
        let mut entries = Vec::new();
        for (line_num, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 6 {
                bail!("Bim file line {} has fewer than 6 fields", line_num + 1);
            }
            let pos = fields[3].parse().with_context(|| {
                format!("Bim file line {}: invalid position '{}'", line_num + 1, fields[3])
            })?;
            entries.push(BimEntry {
                chrom: fields[0].to_string(),
                id: fields[1].to_string(),
                pos,
                allele1: fields[4].to_string(),
                allele2: fields[5].to_string(),
            });
        }
        Ok(entries)
    }

    /// Decode a single genotype: A1 dosage 0, 1, 2, or NaN for missing.
    #[inline]
    fn decode_genotype(byte: u8, offset: usize) -> f64 {
        match (byte >> (offset * 2)) & 0x03 {
            0b00 => 2.0,
            0b01 => f64::NAN,
            0b10 => 1.0,
            _ => 0.0,
        }
    }

    fn info_of(entry: &BimEntry) -> MarkerInfo {
        MarkerInfo {
            chrom: entry.chrom.clone(),
            pos: entry.pos,
            id: entry.id.clone(),
            ref_allele: entry.allele2.clone(),
            alt_allele: entry.allele1.clone(),
        }
    }
}

impl GenotypeReader for PlinkReader {
    fn n_markers(&self) -> usize {
        self.bim.len()
    }

    fn n_samples(&self) -> usize {
        self.selected.len()
    }

    fn sample_ids(&self) -> &[String] {
        &self.selected_ids
    }

    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()> {
        let positions: HashMap<&str, usize> = self
            .fam_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            match positions.get(id.as_str()) {
                Some(&i) => selected.push(i),
                None => bail!("Sample {} not found in fam file", id),
            }
        }
        self.selected = selected;
        self.selected_ids = ids.to_vec();
        Ok(())
    }

    fn marker_index(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    fn read_marker(&mut self, index: usize) -> Result<MarkerData> {
        if index >= self.bim.len() {
            bail!("Marker index {} out of range ({})", index, self.bim.len());
        }
        let offset = 3 + index * self.bytes_per_marker;
        let block = &self.mmap[offset..offset + self.bytes_per_marker];

        let dosages: Vec<f64> = self
            .selected
            .iter()
            .map(|&s| Self::decode_genotype(block[s / 4], s % 4))
            .collect();
        let (af, n_valid) = MarkerData::compute_af(&dosages);

        Ok(MarkerData {
            info: Self::info_of(&self.bim[index]),
            dosages,
            af,
            n_valid,
        })
    }

    fn marker_info(&self, index: usize) -> Result<MarkerInfo> {
        match self.bim.get(index) {
            Some(entry) => Ok(Self::info_of(entry)),
            None => bail!("Marker index {} out of range ({})", index, self.bim.len()),
        }
    }
}

/// Write a bed/bim/fam trio from a marker-major dosage table.
///
/// `dosages[m][s]` is the A1 dosage of marker m in sample s; NaN is
/// written as missing.
#[cfg(test)]
pub(crate) fn write_test_plink(
    prefix: &Path,
    sample_ids: &[&str],
    marker_ids: &[&str],
    dosages: &[Vec<f64>],
) -> Result<()> {
    use std::io::Write;

    let mut fam = std::fs::File::create(prefix.with_extension("fam"))?;
    for id in sample_ids {
        writeln!(fam, "{} {} 0 0 0 -9", id, id)?;
    }
    let mut bim = std::fs::File::create(prefix.with_extension("bim"))?;
    for (m, id) in marker_ids.iter().enumerate() {
        writeln!(bim, "1\t{}\t0\t{}\tG\tA", id, 1000 + m)?;
    }

    let mut bed = vec![0x6C, 0x1B, 0x01];
    for row in dosages {
        let mut bytes = vec![0u8; sample_ids.len().div_ceil(4)];
        for (s, &d) in row.iter().enumerate() {
            let code: u8 = if d.is_nan() {
                0b01
            } else if d == 2.0 {
                0b00
            } else if d == 1.0 {
                0b10
            } else {
                0b11
            };
            bytes[s / 4] |= code << ((s % 4) * 2);
        }
        bed.extend_from_slice(&bytes);
    }
    std::fs::write(prefix.with_extension("bed"), bed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_genotype_offsets() {
        let byte: u8 = 0b11_10_01_00;
        assert_eq!(PlinkReader::decode_genotype(byte, 0), 2.0);
        assert!(PlinkReader::decode_genotype(byte, 1).is_nan());
        assert_eq!(PlinkReader::decode_genotype(byte, 2), 1.0);
        assert_eq!(PlinkReader::decode_genotype(byte, 3), 0.0);
    }

    #[test]
    fn test_read_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("cohort");
        let dosages = vec![
            vec![0.0, 1.0, 2.0, f64::NAN, 1.0],
            vec![2.0, 2.0, 0.0, 1.0, 0.0],
        ];
        write_test_plink(&prefix, &["s1", "s2", "s3", "s4", "s5"], &["rsA", "rsB"], &dosages)
            .unwrap();

        let mut reader = PlinkReader::new(&prefix).unwrap();
        assert_eq!(reader.n_markers(), 2);
        assert_eq!(reader.n_samples(), 5);
        assert_eq!(reader.marker_index("rsB"), Some(1));
        assert_eq!(reader.marker_index("rsZ"), None);

        let m0 = reader.read_marker(0).unwrap();
        assert_eq!(m0.info.id, "rsA");
        assert_eq!(m0.info.alt_allele, "G");
        assert_eq!(m0.n_valid, 4);
        assert!(m0.dosages[3].is_nan());
        assert_eq!(m0.dosages[4], 1.0);

        reader
            .set_sample_subset(&["s5".to_string(), "s1".to_string()])
            .unwrap();
        let m1 = reader.read_marker(1).unwrap();
        assert_eq!(m1.dosages, vec![0.0, 2.0]);
        assert_eq!(reader.sample_ids(), &["s5".to_string(), "s1".to_string()]);

        assert!(reader.set_sample_subset(&["missing".to_string()]).is_err());
        assert!(reader.read_marker(2).is_err());
    }
}
