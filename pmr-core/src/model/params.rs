//! Model parameters and sub-model constraints.

use serde::{Deserialize, Serialize};

/// Current estimate of every PMR parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Causal effect of expression on the trait.
    pub alpha: f64,
    /// Horizontal pleiotropy effect shared by all instruments.
    pub gamma: f64,
    /// Instrument-to-expression effects (posterior mean, length p).
    pub beta: Vec<f64>,
    /// Prior variance of each entry of beta.
    pub sigma_beta2: f64,
    /// Per-sample variance of the latent true-expression signal X1 * beta.
    pub sigma_u2: f64,
    /// Residual variance of expression.
    pub sigma_e1_2: f64,
    /// Residual variance of the trait.
    pub sigma_e2_2: f64,
}

impl ModelParameters {
    /// The four variance components, in declaration order.
    pub fn variances(&self) -> [f64; 4] {
        [self.sigma_beta2, self.sigma_u2, self.sigma_e1_2, self.sigma_e2_2]
    }

    pub fn is_finite(&self) -> bool {
        self.alpha.is_finite()
            && self.gamma.is_finite()
            && self.beta.iter().all(|b| b.is_finite())
            && self.variances().iter().all(|v| v.is_finite())
    }
}

/// Which parameters are held at exactly zero for a fit.
///
/// Both flags may be set together: the resulting model has neither a
/// causal nor a pleiotropic path and is fitted like any other variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub alpha_fixed: bool,
    pub gamma_fixed: bool,
}

impl Constraints {
    pub const fn new(alpha_fixed: bool, gamma_fixed: bool) -> Self {
        Self {
            alpha_fixed,
            gamma_fixed,
        }
    }

    pub const fn unconstrained() -> Self {
        Self::new(false, false)
    }

    pub const fn alpha_null() -> Self {
        Self::new(true, false)
    }

    pub const fn gamma_null() -> Self {
        Self::new(false, true)
    }

    /// Apply the constraints to a candidate (alpha, gamma) pair.
    pub fn apply(&self, alpha: f64, gamma: f64) -> (f64, f64) {
        (
            if self.alpha_fixed { 0.0 } else { alpha },
            if self.gamma_fixed { 0.0 } else { gamma },
        )
    }
}

/// Named sub-models used for likelihood-ratio testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// alpha and gamma both free (H1).
    Full,
    /// alpha = 0, the null of the causal test.
    AlphaNull,
    /// gamma = 0, the null of the pleiotropy test.
    GammaNull,
    /// alpha = gamma = 0.
    Neither,
}

impl ModelVariant {
    /// The three variants needed for the causal and pleiotropy tests.
    pub const TESTED: [ModelVariant; 3] = [
        ModelVariant::Full,
        ModelVariant::AlphaNull,
        ModelVariant::GammaNull,
    ];

    pub fn constraints(self) -> Constraints {
        match self {
            ModelVariant::Full => Constraints::unconstrained(),
            ModelVariant::AlphaNull => Constraints::alpha_null(),
            ModelVariant::GammaNull => Constraints::gamma_null(),
            ModelVariant::Neither => Constraints::new(true, true),
        }
    }

    pub fn from_constraints(c: Constraints) -> Self {
        match (c.alpha_fixed, c.gamma_fixed) {
            (false, false) => ModelVariant::Full,
            (true, false) => ModelVariant::AlphaNull,
            (false, true) => ModelVariant::GammaNull,
            (true, true) => ModelVariant::Neither,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelVariant::Full => "full",
            ModelVariant::AlphaNull => "alpha_null",
            ModelVariant::GammaNull => "gamma_null",
            ModelVariant::Neither => "neither",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints_apply() {
        assert_eq!(Constraints::unconstrained().apply(0.3, -0.1), (0.3, -0.1));
        assert_eq!(Constraints::alpha_null().apply(0.3, -0.1), (0.0, -0.1));
        assert_eq!(Constraints::gamma_null().apply(0.3, -0.1), (0.3, 0.0));
        assert_eq!(Constraints::new(true, true).apply(0.3, -0.1), (0.0, 0.0));
    }

    #[test]
    fn test_variant_roundtrip() {
        for v in [
            ModelVariant::Full,
            ModelVariant::AlphaNull,
            ModelVariant::GammaNull,
            ModelVariant::Neither,
        ] {
            assert_eq!(ModelVariant::from_constraints(v.constraints()), v);
        }
        assert_eq!(ModelVariant::AlphaNull.to_string(), "alpha_null");
    }
}
