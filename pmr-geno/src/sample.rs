//! Sample matching between phenotype and genotype sources.

use std::collections::HashSet;

use crate::phenotype::PhenotypeData;

/// Samples of one cohort usable for fitting: present in the genotype
/// file and with a non-missing phenotype.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortSamples {
    /// Sample IDs, in phenotype-file order.
    pub ids: Vec<String>,
    /// Phenotype values aligned with `ids`.
    pub values: Vec<f64>,
}

impl CohortSamples {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Keep phenotyped samples that are also genotyped.
///
/// Samples with a missing phenotype are dropped, as are repeated IDs
/// after their first occurrence.
pub fn match_cohort(pheno: &PhenotypeData, genotype_ids: &[String]) -> CohortSamples {
    let genotyped: HashSet<&str> = genotype_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    let mut ids = Vec::new();
    let mut values = Vec::new();
    for (id, &v) in pheno.sample_ids.iter().zip(pheno.values.iter()) {
        if v.is_nan() || !genotyped.contains(id.as_str()) || !seen.insert(id.as_str()) {
            continue;
        }
        ids.push(id.clone());
        values.push(v);
    }
    CohortSamples { ids, values }
}

/// IDs present in both lists, in the order of `primary`.
pub fn intersect_ids(primary: &[String], other: &[String]) -> Vec<String> {
    let lookup: HashSet<&str> = other.iter().map(String::as_str).collect();
    primary
        .iter()
        .filter(|id| lookup.contains(id.as_str()))
        .cloned()
        .collect()
}
