//! Deterministic data simulation shared by the integration and property tests.

#![allow(dead_code)]

use pmr_core::util::math::{mean_and_sd, standardize, standardize_columns};
use pmr_linalg::dense::DenseMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Individual-level data for one simulated gene.
pub struct SimulatedGene {
    pub x1: DenseMatrix,
    pub x2: DenseMatrix,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

/// Parameters of a simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub n1: usize,
    pub n2: usize,
    pub p: usize,
    /// Correlation between adjacent instruments (AR(1) LD).
    pub rho: f64,
    pub alpha: f64,
    pub gamma: f64,
    /// Proportion of expression variance explained by the instruments.
    pub h: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n1: 2000,
            n2: 2000,
            p: 10,
            rho: 0.3,
            alpha: 0.5,
            gamma: 0.0,
            h: 0.4,
        }
    }
}

/// Standardized instruments with AR(1) correlation across columns.
pub fn ar1_genotypes(rng: &mut ChaCha8Rng, n: usize, p: usize, rho: f64) -> DenseMatrix {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let innovation = (1.0 - rho * rho).sqrt();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(p);
    for j in 0..p {
        let mut col = Vec::with_capacity(n);
        for i in 0..n {
            let e = normal.sample(rng);
            col.push(if j == 0 {
                e
            } else {
                rho * columns[j - 1][i] + innovation * e
            });
        }
        columns.push(col);
    }
    let (x, constant) = standardize_columns(&DenseMatrix::from_columns(&columns));
    assert!(constant.is_empty());
    x
}

/// Simulate one gene under the PMR model and standardize both phenotypes.
pub fn simulate(seed: u64, cfg: SimConfig) -> SimulatedGene {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();

    let x1 = ar1_genotypes(&mut rng, cfg.n1, cfg.p, cfg.rho);
    let x2 = ar1_genotypes(&mut rng, cfg.n2, cfg.p, cfg.rho);

    // Scale beta so that X1 beta explains a fraction h of expression
    let raw: Vec<f64> = (0..cfg.p).map(|_| normal.sample(&mut rng)).collect();
    let (_, sd) = mean_and_sd(&x1.mat_vec(&raw));
    let beta: Vec<f64> = raw.iter().map(|b| b * cfg.h.sqrt() / sd).collect();

    let g1 = x1.mat_vec(&beta);
    let noise1 = (1.0 - cfg.h).sqrt();
    let mut y: Vec<f64> = g1.iter().map(|g| g + noise1 * normal.sample(&mut rng)).collect();

    let g2 = x2.mat_vec(&beta);
    let pleio = x2.row_sums();
    let signal: Vec<f64> = g2
        .iter()
        .zip(pleio.iter())
        .map(|(g, s)| cfg.alpha * g + cfg.gamma * s)
        .collect();
    let (_, signal_sd) = mean_and_sd(&signal);
    let noise2 = (1.0 - signal_sd * signal_sd).max(0.1).sqrt();
    let mut z: Vec<f64> = signal
        .iter()
        .map(|s| s + noise2 * normal.sample(&mut rng))
        .collect();

    standardize(&mut y);
    standardize(&mut z);

    SimulatedGene { x1, x2, y, z }
}
