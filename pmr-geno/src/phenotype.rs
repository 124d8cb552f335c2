//! Phenotype table parser.
//!
//! Reads tab- or space-delimited files with a header line, a sample ID
//! column and one numeric phenotype column. Missing values become NaN.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

/// One phenotype column with its sample IDs, in file order.
#[derive(Debug, Clone)]
pub struct PhenotypeData {
    pub sample_ids: Vec<String>,
    /// Phenotype values (NaN for missing).
    pub values: Vec<f64>,
}

impl PhenotypeData {
    /// Number of samples with a non-missing value.
    pub fn n_observed(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Parse `pheno_col` and `sample_id_col` from a phenotype file.
pub fn parse_phenotype_file(
    path: &Path,
    pheno_col: &str,
    sample_id_col: &str,
) -> Result<PhenotypeData> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read phenotype file: {}", path.display()))?;

    let mut lines = contents.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| anyhow!("Empty phenotype file: {}", path.display()))?;

    let delim = if header_line.contains('\t') { '\t' } else { ' ' };
    let split = |line: &str| -> Vec<String> {
        if delim == '\t' {
            line.split('\t').map(|s| s.trim().to_string()).collect()
        } else {
            line.split_whitespace().map(str::to_string).collect()
        }
    };

    let headers = split(header_line);
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in {}", name, path.display()))
    };
    let id_idx = column(sample_id_col)?;
    let pheno_idx = column(pheno_col)?;
    let needed = id_idx.max(pheno_idx) + 1;

    let mut sample_ids = Vec::new();
    let mut values = Vec::new();
    for (line_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split(line);
        if fields.len() < needed {
            bail!(
                "{} line {} has {} fields (expected at least {})",
                path.display(),
                line_num + 2,
                fields.len(),
                needed
            );
        }
        sample_ids.push(fields[id_idx].clone());
        values.push(parse_value(&fields[pheno_idx]));
    }

    Ok(PhenotypeData { sample_ids, values })
}

/// Parse a string value to f64, treating NA/missing as NaN.
pub(crate) fn parse_value(s: &str) -> f64 {
    match s {
        "NA" | "na" | "Na" | "." | "" | "-" | "NaN" | "nan" => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}
