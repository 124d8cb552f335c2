//! Property-based tests using proptest.
//!
//! These check invariants that must hold for every simulated gene rather
//! than specific numerical values:
//!   - log-likelihood trajectories never decrease
//!   - fixed parameters stay at exactly zero
//!   - variance components stay at or above the floor
//!   - LD matrices are symmetric correlation matrices
//!   - ridge regularization lifts the spectrum to the requested minimum

mod common;

use proptest::prelude::*;

use common::{simulate, SimConfig};
use pmr_core::ld::compute_ld_matrix;
use pmr_core::{fit_individual, EmConfig, ModelVariant};
use pmr_linalg::decomposition::{min_eigenvalue_of, regularize_psd};
use pmr_linalg::dense::DenseMatrix;

fn short_config() -> EmConfig {
    EmConfig {
        max_iter: 30,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// 1. EM invariants on small simulated genes
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_em_invariants(
        seed in 0u64..10_000,
        p in 1usize..5,
        n1 in 80usize..200,
        n2 in 80usize..200,
        alpha in -0.8f64..0.8,
        variant_idx in 0usize..4,
    ) {
        let cfg = SimConfig { n1, n2, p, alpha, ..Default::default() };
        let gene = simulate(seed, cfg);
        let variant = [
            ModelVariant::Full,
            ModelVariant::AlphaNull,
            ModelVariant::GammaNull,
            ModelVariant::Neither,
        ][variant_idx];
        let config = short_config();

        let fit = fit_individual(
            &gene.y, &gene.z, &gene.x1, &gene.x2, variant.constraints(), &config,
        ).unwrap();

        prop_assert_eq!(fit.loglik.len(), fit.iterations);
        for w in fit.loglik.windows(2) {
            prop_assert!(w[1] - w[0] >= -1e-6, "loglik decreased: {} -> {}", w[0], w[1]);
        }

        let c = variant.constraints();
        if c.alpha_fixed {
            prop_assert_eq!(fit.params.alpha, 0.0);
        }
        if c.gamma_fixed {
            prop_assert_eq!(fit.params.gamma, 0.0);
        }
        for v in fit.params.variances() {
            prop_assert!(v >= config.variance_floor);
        }
        prop_assert_eq!(fit.params.beta.len(), p);
    }
}

// ---------------------------------------------------------------------------
// 2. LD matrices are symmetric with unit diagonal and |r| <= 1
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_ld_is_correlation_matrix(
        seed in 0u64..10_000,
        p in 1usize..8,
        n in 20usize..100,
    ) {
        let cfg = SimConfig { n1: n, n2: n, p, rho: 0.6, ..Default::default() };
        let gene = simulate(seed, cfg);
        let ld = compute_ld_matrix(&gene.x1);

        prop_assert!(ld.is_symmetric(1e-12));
        for i in 0..p {
            prop_assert!((ld.get(i, i) - 1.0).abs() < 1e-12);
            for j in 0..p {
                prop_assert!(ld.get(i, j).abs() <= 1.0 + 1e-12);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Ridge regularization of rank-deficient LD
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_regularization_lifts_min_eigenvalue(
        values in prop::collection::vec(-1.0f64..1.0, 2..6),
        min_eig in prop::sample::select(vec![1e-6, 1e-4, 1e-2]),
    ) {
        // Rank-one outer product v v', never positive definite for p >= 2
        let p = values.len();
        let a = DenseMatrix::from_col_major(
            p,
            p,
            (0..p * p).map(|k| values[k % p] * values[k / p]).collect(),
        );
        let (reg, ridge) = regularize_psd(&a, min_eig).unwrap();
        prop_assert!(ridge > 0.0);
        let lambda_min = min_eigenvalue_of(&reg).unwrap();
        prop_assert!(lambda_min >= min_eig * (1.0 - 1e-6) - 1e-12,
            "lambda_min {} below {}", lambda_min, min_eig);
    }
}
