//! LD matrix computation.
//!
//! pmr ld-matrix --plink-file ref --instruments gene.snps --output gene.ld.txt

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use pmr_core::ld::compute_ld_matrix;
use pmr_geno::instruments::{all_marker_ids, read_id_list, read_instruments};
use pmr_geno::ld_file::write_ld_matrix;
use pmr_geno::plink::PlinkReader;
use pmr_geno::traits::GenotypeReader;

#[derive(Args)]
pub struct LdMatrixArgs {
    /// PLINK file prefix
    #[arg(long)]
    plink_file: String,

    /// File listing instrument IDs, one per line (default: all markers)
    #[arg(long)]
    instruments: Option<String>,

    /// Output LD file
    #[arg(long)]
    output: String,
}

pub fn run(args: LdMatrixArgs) -> Result<()> {
    info!("=== PMR LD matrix ===");

    let mut reader = PlinkReader::new(&args.plink_file)?;
    info!(
        "Loaded {} markers x {} samples from PLINK files",
        reader.n_markers(),
        reader.n_samples()
    );

    let wanted = match &args.instruments {
        Some(path) => read_id_list(Path::new(path))?,
        None => all_marker_ids(&reader)?,
    };
    let instruments = read_instruments(&mut reader, &wanted)?;
    let ld = compute_ld_matrix(&instruments.x);

    let output = Path::new(&args.output);
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_ld_matrix(&ld, &instruments.ids, output)?;
    info!(
        "LD matrix for {} instruments written to {}",
        instruments.ids.len(),
        output.display()
    );
    Ok(())
}
