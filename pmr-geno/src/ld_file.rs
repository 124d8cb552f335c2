//! LD matrix files.
//!
//! Format: tab-delimited; the first line holds the instrument IDs, then
//! one matrix row per line.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use pmr_linalg::dense::DenseMatrix;

/// Write an LD matrix with its instrument IDs.
pub fn write_ld_matrix(ld: &DenseMatrix, ids: &[String], path: &Path) -> Result<()> {
    if ld.nrows() != ids.len() || ld.ncols() != ids.len() {
        bail!(
            "LD matrix is {}x{} but {} instrument IDs were given",
            ld.nrows(),
            ld.ncols(),
            ids.len()
        );
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create LD file: {}", path.display()))?;
    let mut f = std::io::BufWriter::new(file);

    writeln!(f, "{}", ids.join("\t"))?;
    for i in 0..ld.nrows() {
        let row: Vec<String> = (0..ld.ncols())
            .map(|j| format!("{:.8}", ld.get(i, j)))
            .collect();
        writeln!(f, "{}", row.join("\t"))?;
    }
    f.flush()?;
    Ok(())
}

/// Read an LD matrix file written by [`write_ld_matrix`].
pub fn read_ld_matrix(path: &Path) -> Result<(Vec<String>, DenseMatrix)> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read LD file: {}", path.display()))?;
    let mut lines = contents.lines().filter(|l| !l.trim().is_empty());
    let ids: Vec<String> = lines
        .next()
        .ok_or_else(|| anyhow!("Empty LD file: {}", path.display()))?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let p = ids.len();

    let mut data = Vec::with_capacity(p * p);
    let mut n_rows = 0;
    for line in lines {
        let row: Vec<f64> = line
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>()
                    .with_context(|| format!("{}: invalid LD value '{}'", path.display(), v))
            })
            .collect::<Result<_>>()?;
        if row.len() != p {
            bail!(
                "{} row {} has {} values, expected {}",
                path.display(),
                n_rows + 1,
                row.len(),
                p
            );
        }
        data.extend(row);
        n_rows += 1;
    }
    if n_rows != p {
        bail!("{} has {} rows for {} instruments", path.display(), n_rows, p);
    }
    Ok((ids, DenseMatrix::from_row_major(p, p, &data)))
}

/// Reorder and subset an LD matrix to the instruments in `wanted`.
pub fn align_ld_matrix(ids: &[String], ld: &DenseMatrix, wanted: &[String]) -> Result<DenseMatrix> {
    let position: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let index: Vec<usize> = wanted
        .iter()
        .map(|id| {
            position
                .get(id.as_str())
                .copied()
                .ok_or_else(|| anyhow!("Instrument {} not present in LD matrix", id))
        })
        .collect::<Result<_>>()?;

    let q = index.len();
    let mut out = DenseMatrix::zeros(q, q);
    for (a, &i) in index.iter().enumerate() {
        for (b, &j) in index.iter().enumerate() {
            out.set(a, b, ld.get(i, j));
        }
    }
    Ok(out)
}
