//! End-to-end fits on simulated genes.
//!
//! Data are simulated from the PMR model with deterministic ChaCha8 seeds,
//! so every assertion below is reproducible.

mod common;

use common::{simulate, SimConfig, SimulatedGene};
use pmr_core::ld::summarize_individual;
use pmr_core::model::data::ObservationSet;
use pmr_core::{
    fit_individual, fit_observations, fit_summary, fit_summary_set, Constraints, EmConfig,
    FitResult, ModelVariant,
};
use pmr_linalg::dense::DenseMatrix;
use statrs::distribution::{ChiSquared, ContinuousCDF};

fn fit_variant(gene: &SimulatedGene, variant: ModelVariant) -> FitResult {
    fit_individual(
        &gene.y,
        &gene.z,
        &gene.x1,
        &gene.x2,
        variant.constraints(),
        &EmConfig::default(),
    )
    .unwrap()
}

fn lrt(h1: &FitResult, h0: &FitResult) -> (f64, f64) {
    let stat = (2.0 * (h1.max_loglik() - h0.max_loglik())).max(0.0);
    let pvalue = ChiSquared::new(1.0).unwrap().sf(stat);
    (stat, pvalue)
}

fn assert_monotone(fit: &FitResult) {
    for (t, w) in fit.loglik.windows(2).enumerate() {
        assert!(
            w[1] - w[0] >= -1e-6,
            "{}: loglik decreased at iteration {}: {} -> {}",
            fit.variant(),
            t + 2,
            w[0],
            w[1]
        );
    }
}

mod individual_mode {
    use super::*;

    #[test]
    fn test_converges_and_recovers_causal_effect() {
        let gene = simulate(1, SimConfig::default());
        let fit = fit_variant(&gene, ModelVariant::Full);

        assert!(fit.converged, "did not converge in {} iterations", fit.iterations);
        assert_eq!(fit.loglik.len(), fit.iterations);
        assert!(
            (fit.params.alpha - 0.5).abs() < 0.1,
            "alpha = {}",
            fit.params.alpha
        );
        assert!(fit.params.gamma.abs() < 0.05, "gamma = {}", fit.params.gamma);
        assert_eq!(fit.ld_ridge, [0.0, 0.0]);
    }

    #[test]
    fn test_every_variant_is_monotone() {
        let gene = simulate(2, SimConfig::default());
        for variant in [
            ModelVariant::Full,
            ModelVariant::AlphaNull,
            ModelVariant::GammaNull,
            ModelVariant::Neither,
        ] {
            assert_monotone(&fit_variant(&gene, variant));
        }
    }

    #[test]
    fn test_fixed_parameters_are_exactly_zero() {
        let gene = simulate(3, SimConfig::default());

        let alpha_null = fit_variant(&gene, ModelVariant::AlphaNull);
        assert_eq!(alpha_null.params.alpha, 0.0);
        assert_eq!(alpha_null.constraints, Constraints::alpha_null());

        let gamma_null = fit_variant(&gene, ModelVariant::GammaNull);
        assert_eq!(gamma_null.params.gamma, 0.0);

        let neither = fit_variant(&gene, ModelVariant::Neither);
        assert_eq!(neither.params.alpha, 0.0);
        assert_eq!(neither.params.gamma, 0.0);
        assert!(neither.params.is_finite());
    }

    #[test]
    fn test_variances_stay_above_floor() {
        let gene = simulate(4, SimConfig::default());
        let config = EmConfig::default();
        for variant in ModelVariant::TESTED {
            let fit = fit_variant(&gene, variant);
            assert!(fit
                .params
                .variances()
                .iter()
                .all(|&v| v >= config.variance_floor));
        }
    }

    #[test]
    fn test_identical_inputs_give_identical_results() {
        let gene = simulate(5, SimConfig::default());
        let a = fit_variant(&gene, ModelVariant::Full);
        let b = fit_variant(&gene, ModelVariant::Full);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_instrument() {
        let cfg = SimConfig {
            n1: 500,
            n2: 500,
            p: 1,
            ..Default::default()
        };
        let gene = simulate(6, cfg);
        for variant in ModelVariant::TESTED {
            let first = fit_variant(&gene, variant);
            let second = fit_variant(&gene, variant);
            assert!(first.params.is_finite());
            assert!(first.loglik.iter().all(|l| l.is_finite()));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_ill_conditioned_instruments() {
        // Second instrument is a near-copy of the first in both cohorts
        let cfg = SimConfig {
            n1: 800,
            n2: 800,
            p: 4,
            ..Default::default()
        };
        let gene = simulate(7, cfg);
        let nudge = |x: &DenseMatrix| {
            let mut out = x.clone();
            for i in 0..x.nrows() {
                let jitter = 1e-5 * (((i * 7919) % 13) as f64 - 6.0);
                out.set(i, 1, x.get(i, 0) + jitter);
            }
            pmr_core::util::math::standardize_columns(&out).0
        };
        let x1 = nudge(&gene.x1);
        let x2 = nudge(&gene.x2);

        let cond = pmr_linalg::decomposition::condition_number(&x1.gram()).unwrap();
        assert!(cond > 1e8, "condition number only {:.3e}", cond);

        let fit = fit_individual(
            &gene.y,
            &gene.z,
            &x1,
            &x2,
            Constraints::unconstrained(),
            &EmConfig::default(),
        )
        .unwrap();
        assert!(fit.params.is_finite());
        assert!(fit.loglik.iter().all(|l| l.is_finite()));
    }
}

mod summary_mode {
    use super::*;

    #[test]
    fn test_matches_individual_mode() {
        let cfg = SimConfig {
            n1: 1000,
            n2: 1200,
            p: 6,
            ..Default::default()
        };
        let gene = simulate(11, cfg);
        let data = ObservationSet::new(&gene.y, &gene.z, &gene.x1, &gene.x2).unwrap();
        let summary = summarize_individual(&data).unwrap();

        for variant in ModelVariant::TESTED {
            let config = EmConfig::default();
            let ind = fit_observations(&data, variant.constraints(), &config).unwrap();
            let sum = fit_summary_set(&summary, variant.constraints(), &config).unwrap();

            assert!(
                (ind.params.alpha - sum.params.alpha).abs() < 1e-4,
                "{}: alpha {} vs {}",
                variant,
                ind.params.alpha,
                sum.params.alpha
            );
            assert!((ind.params.gamma - sum.params.gamma).abs() < 1e-4);
            let scale = ind.final_loglik().abs().max(1.0);
            assert!((ind.final_loglik() - sum.final_loglik()).abs() / scale < 1e-6);
        }
    }

    #[test]
    fn test_singular_ld_is_regularized() {
        // Instruments 0 and 1 in perfect LD in the eQTL panel
        let sigma1 = DenseMatrix::from_row_major(
            3,
            3,
            &[1.0, 1.0, 0.2, 1.0, 1.0, 0.2, 0.2, 0.2, 1.0],
        );
        let sigma2 = DenseMatrix::from_row_major(
            3,
            3,
            &[1.0, 0.3, 0.1, 0.3, 1.0, 0.3, 0.1, 0.3, 1.0],
        );
        let fit = fit_summary(
            &[0.20, 0.20, 0.05],
            &[0.08, 0.09, 0.02],
            &sigma1,
            &sigma2,
            1000,
            5000,
            Constraints::unconstrained(),
            &EmConfig::default(),
        )
        .unwrap();

        assert!(fit.ld_ridge[0] > 0.0);
        assert_eq!(fit.ld_ridge[1], 0.0);
        assert!(fit.params.is_finite());
        assert_monotone(&fit);
    }

    #[test]
    fn test_input_validation() {
        let ld = DenseMatrix::identity(2);
        let config = EmConfig::default();
        let c = Constraints::unconstrained();

        let err = fit_summary(&[0.1, 0.2], &[0.1], &ld, &ld, 100, 100, c, &config).unwrap_err();
        assert!(err.is_validation());

        let asym = DenseMatrix::from_row_major(2, 2, &[1.0, 0.5, 0.4, 1.0]);
        let err = fit_summary(&[0.1, 0.2], &[0.1, 0.0], &asym, &ld, 100, 100, c, &config)
            .unwrap_err();
        assert!(err.is_validation());

        let err = fit_summary(&[0.1, 0.2], &[0.1, 0.0], &ld, &ld, 0, 100, c, &config).unwrap_err();
        assert!(err.is_validation());

        let bad_config = EmConfig {
            tol: -1.0,
            ..Default::default()
        };
        let err = fit_summary(&[0.1, 0.2], &[0.1, 0.0], &ld, &ld, 100, 100, c, &bad_config)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_individual_validation() {
        let x1 = DenseMatrix::identity(3);
        let x2 = DenseMatrix::zeros(4, 2);
        let err = fit_individual(
            &[0.0; 3],
            &[0.0; 4],
            &x1,
            &x2,
            Constraints::unconstrained(),
            &EmConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_validation());

        // Config errors surface from the EM driver before any iteration
        let x = DenseMatrix::identity(3);
        let bad_config = EmConfig {
            max_iter: 0,
            ..Default::default()
        };
        let err = fit_individual(
            &[1.0, -1.0, 0.0],
            &[0.5, 0.0, -0.5],
            &x,
            &x,
            Constraints::unconstrained(),
            &bad_config,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }
}

mod likelihood_ratio {
    use super::*;

    #[test]
    fn test_causal_effect_is_detected() {
        for seed in 100..105 {
            let gene = simulate(seed, SimConfig::default());
            let full = fit_variant(&gene, ModelVariant::Full);
            let alpha_null = fit_variant(&gene, ModelVariant::AlphaNull);
            let (stat, pvalue) = lrt(&full, &alpha_null);
            assert!(
                pvalue < 0.05,
                "seed {}: alpha LRT {} (p = {})",
                seed,
                stat,
                pvalue
            );
        }
    }

    #[test]
    fn test_pleiotropy_is_not_detected_without_pleiotropy() {
        for seed in 100..110 {
            let gene = simulate(seed, SimConfig::default());
            let full = fit_variant(&gene, ModelVariant::Full);
            let gamma_null = fit_variant(&gene, ModelVariant::GammaNull);
            let (stat, pvalue) = lrt(&full, &gamma_null);
            assert!(stat >= 0.0);
            assert!(
                pvalue >= 0.05,
                "seed {}: gamma LRT {} (p = {})",
                seed,
                stat,
                pvalue
            );
        }
    }
}
