//! Fit one gene from individual-level data.
//!
//! pmr fit-individual --eqtl-plink ... --gwas-plink ... --expr-file ... --expr-col GENE1
//!     --trait-file ... --trait-col bmi --output-prefix out/GENE1

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use pmr_core::fit_observations;
use pmr_core::model::data::ObservationSet;
use pmr_core::util::math::{standardize, standardize_columns};
use pmr_geno::instruments::{all_marker_ids, read_id_list, read_shared_instruments};
use pmr_geno::phenotype::parse_phenotype_file;
use pmr_geno::plink::PlinkReader;
use pmr_geno::sample::{intersect_ids, match_cohort};
use pmr_geno::traits::GenotypeReader;

use super::report::{fit_tested_variants, EmArgs, GeneReport};

#[derive(Args)]
pub struct FitIndividualArgs {
    /// PLINK file prefix of the eQTL cohort (bed/bim/fam)
    #[arg(long)]
    eqtl_plink: String,

    /// PLINK file prefix of the GWAS cohort (bed/bim/fam)
    #[arg(long)]
    gwas_plink: String,

    /// Expression phenotype file
    #[arg(long)]
    expr_file: String,

    /// Expression column name
    #[arg(long)]
    expr_col: String,

    /// Trait phenotype file
    #[arg(long)]
    trait_file: String,

    /// Trait column name
    #[arg(long)]
    trait_col: String,

    /// Sample ID column name in both phenotype files
    #[arg(long, default_value = "IID")]
    sample_id_col: String,

    /// File listing instrument IDs, one per line (default: all shared markers)
    #[arg(long)]
    instruments: Option<String>,

    /// Gene name used in the report (default: the expression column)
    #[arg(long)]
    gene: Option<String>,

    /// Output file prefix
    #[arg(long)]
    output_prefix: String,

    #[command(flatten)]
    em: EmArgs,
}

pub fn run(args: FitIndividualArgs) -> Result<()> {
    let gene = args.gene.clone().unwrap_or_else(|| args.expr_col.clone());
    info!("=== PMR individual-level fit: {} ===", gene);

    let mut eqtl = PlinkReader::new(&args.eqtl_plink)?;
    let mut gwas = PlinkReader::new(&args.gwas_plink)?;
    info!(
        "eQTL genotypes: {} markers x {} samples; GWAS genotypes: {} markers x {} samples",
        eqtl.n_markers(),
        eqtl.n_samples(),
        gwas.n_markers(),
        gwas.n_samples()
    );

    let expr = parse_phenotype_file(Path::new(&args.expr_file), &args.expr_col, &args.sample_id_col)?;
    let trait_data =
        parse_phenotype_file(Path::new(&args.trait_file), &args.trait_col, &args.sample_id_col)?;
    info!(
        "Phenotypes: {} observed expression values, {} observed trait values",
        expr.n_observed(),
        trait_data.n_observed()
    );

    let cohort1 = match_cohort(&expr, eqtl.sample_ids());
    let cohort2 = match_cohort(&trait_data, gwas.sample_ids());
    info!(
        "Matched samples: {} eQTL, {} GWAS",
        cohort1.len(),
        cohort2.len()
    );
    if cohort1.len() < 2 || cohort2.len() < 2 {
        bail!("Too few samples with both genotypes and a phenotype");
    }
    eqtl.set_sample_subset(&cohort1.ids)?;
    gwas.set_sample_subset(&cohort2.ids)?;

    let wanted = match &args.instruments {
        Some(path) => read_id_list(Path::new(path))?,
        None => intersect_ids(&all_marker_ids(&eqtl)?, &all_marker_ids(&gwas)?),
    };
    let shared = read_shared_instruments(&mut eqtl, &mut gwas, &wanted)?;

    // Standardization is the caller's job; the core never re-standardizes
    let (x1, constant1) = standardize_columns(&shared.x1);
    let (x2, constant2) = standardize_columns(&shared.x2);
    if !constant1.is_empty() || !constant2.is_empty() {
        bail!("Instruments became constant after imputation");
    }
    let mut y = cohort1.values;
    let mut z = cohort2.values;
    if !standardize(&mut y) || !standardize(&mut z) {
        bail!("Expression or trait values are constant across samples");
    }

    let data = ObservationSet::new(&y, &z, &x1, &x2)?;
    let config = args.em.to_config();
    let fits = fit_tested_variants(|c| fit_observations(&data, c, &config))?;

    let report = GeneReport::new(&gene, shared.ids, fits)?;
    report.print();
    report.write(&args.output_prefix)?;
    Ok(())
}
