//! Per-instrument summary statistics table.
//!
//! Tab- or whitespace-delimited with a header naming at least the
//! columns `id`, `betax` and `betay` (case-insensitive, any order).
//! `betax` is the marginal effect on expression, `betay` on the trait.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::phenotype::parse_value;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub ids: Vec<String>,
    pub betax: Vec<f64>,
    pub betay: Vec<f64>,
}

impl SummaryTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rows whose IDs appear in `keep`, in table order.
    pub fn retain_ids(&self, keep: &[String]) -> SummaryTable {
        let keep: std::collections::HashSet<&str> = keep.iter().map(String::as_str).collect();
        let mut out = SummaryTable {
            ids: Vec::new(),
            betax: Vec::new(),
            betay: Vec::new(),
        };
        for i in 0..self.len() {
            if keep.contains(self.ids[i].as_str()) {
                out.ids.push(self.ids[i].clone());
                out.betax.push(self.betax[i]);
                out.betay.push(self.betay[i]);
            }
        }
        out
    }
}

/// Parse a summary-statistics file. Rows with a missing effect are an error.
pub fn read_summary_table(path: &Path) -> Result<SummaryTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read summary statistics: {}", path.display()))?;
    let mut lines = contents.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<String> = lines
        .next()
        .ok_or_else(|| anyhow!("Empty summary statistics file: {}", path.display()))?
        .split_whitespace()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in {}", name, path.display()))
    };
    let (id_idx, bx_idx, by_idx) = (column("id")?, column("betax")?, column("betay")?);
    let needed = id_idx.max(bx_idx).max(by_idx) + 1;

    let mut table = SummaryTable {
        ids: Vec::new(),
        betax: Vec::new(),
        betay: Vec::new(),
    };
    for (row, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < needed {
            bail!("{} row {} has too few fields", path.display(), row + 1);
        }
        let bx = parse_value(fields[bx_idx]);
        let by = parse_value(fields[by_idx]);
        if !bx.is_finite() || !by.is_finite() {
            bail!(
                "{}: instrument {} has a missing or non-finite effect size",
                path.display(),
                fields[id_idx]
            );
        }
        table.ids.push(fields[id_idx].to_string());
        table.betax.push(bx);
        table.betay.push(by);
    }
    Ok(table)
}
