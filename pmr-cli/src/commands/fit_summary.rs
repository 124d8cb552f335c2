//! Fit one gene from summary statistics.
//!
//! pmr fit-summary --sumstats gene.tsv --eqtl-ld eqtl.ld.txt --gwas-ld gwas.ld.txt
//!     --n1 670 --n2 337000 --output-prefix out/GENE1

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use pmr_core::fit_summary_set;
use pmr_core::model::data::SummarySet;
use pmr_geno::ld_file::{align_ld_matrix, read_ld_matrix};
use pmr_geno::sample::intersect_ids;
use pmr_geno::sumstats::read_summary_table;

use super::report::{fit_tested_variants, EmArgs, GeneReport};

#[derive(Args)]
pub struct FitSummaryArgs {
    /// Summary statistics file with id, betax and betay columns
    #[arg(long)]
    sumstats: String,

    /// LD matrix of the eQTL reference panel
    #[arg(long)]
    eqtl_ld: String,

    /// LD matrix of the GWAS reference panel
    #[arg(long)]
    gwas_ld: String,

    /// eQTL sample size
    #[arg(long)]
    n1: usize,

    /// GWAS sample size
    #[arg(long)]
    n2: usize,

    /// Gene name used in the report
    #[arg(long, default_value = "gene")]
    gene: String,

    /// Output file prefix
    #[arg(long)]
    output_prefix: String,

    #[command(flatten)]
    em: EmArgs,
}

pub fn run(args: FitSummaryArgs) -> Result<()> {
    info!("=== PMR summary-level fit: {} ===", args.gene);

    let table = read_summary_table(Path::new(&args.sumstats))?;
    let (ids1, ld1) = read_ld_matrix(Path::new(&args.eqtl_ld))?;
    let (ids2, ld2) = read_ld_matrix(Path::new(&args.gwas_ld))?;

    let in_both = intersect_ids(&ids1, &ids2);
    let table = table.retain_ids(&in_both);
    if table.is_empty() {
        bail!("No instrument appears in the summary statistics and both LD matrices");
    }
    info!("{} instruments with summary statistics and LD", table.len());

    let sigma1 = align_ld_matrix(&ids1, &ld1, &table.ids)?;
    let sigma2 = align_ld_matrix(&ids2, &ld2, &table.ids)?;
    let summary = SummarySet::new(
        table.betax.clone(),
        table.betay.clone(),
        sigma1,
        sigma2,
        args.n1,
        args.n2,
    )?;

    let config = args.em.to_config();
    let fits = fit_tested_variants(|c| fit_summary_set(&summary, c, &config))?;
    if fits.full.ld_ridge.iter().any(|&r| r > 0.0) {
        info!(
            "LD matrices regularized: ridge eQTL={:.3e}, GWAS={:.3e}",
            fits.full.ld_ridge[0], fits.full.ld_ridge[1]
        );
    }

    let report = GeneReport::new(&args.gene, table.ids, fits)?;
    report.print();
    report.write(&args.output_prefix)?;
    Ok(())
}
