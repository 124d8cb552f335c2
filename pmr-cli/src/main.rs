//! pmr: probabilistic Mendelian randomization from the command line.
//!
//! Each fit command handles one gene: it fits the full, alpha-null and
//! gamma-null models concurrently and reports the causal and pleiotropy
//! likelihood-ratio tests.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pmr",
    version,
    about = "PMR-RS: probabilistic Mendelian randomization with pleiotropy",
    long_about = "Tests the causal effect of gene expression on a complex trait while\n\
                  modeling horizontal pleiotropy and LD among instruments.\n\
                  Works from individual-level genotypes or from summary statistics."
)]
struct Cli {
    /// Worker threads for the per-gene model fits (0 = one per core)
    #[arg(long, default_value = "3", global = true)]
    threads: usize,

    /// Verbosity level (-v info, -vv EM iterations, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit one gene from individual-level genotypes and phenotypes
    FitIndividual(commands::fit_individual::FitIndividualArgs),

    /// Fit one gene from marginal effect sizes and LD matrices
    FitSummary(commands::fit_summary::FitSummaryArgs),

    /// Compute an LD matrix for a set of instruments
    LdMatrix(commands::ld_matrix::LdMatrixArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::FitIndividual(_) => "fit-individual",
            Commands::FitSummary(_) => "fit-summary",
            Commands::LdMatrix(_) => "ld-matrix",
        }
    }
}

/// RUST_LOG takes precedence over the -v count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Size the global pool; 0 lets rayon pick one thread per core.
fn init_thread_pool(threads: usize) {
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!("Could not configure the thread pool ({}); using rayon defaults", e);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    init_thread_pool(cli.threads);

    info!(
        "PMR-RS v{}: {} with {} worker threads",
        env!("CARGO_PKG_VERSION"),
        cli.command.name(),
        rayon::current_num_threads()
    );

    match cli.command {
        Commands::FitIndividual(args) => commands::fit_individual::run(args),
        Commands::FitSummary(args) => commands::fit_summary::run(args),
        Commands::LdMatrix(args) => commands::ld_matrix::run(args),
    }
}
