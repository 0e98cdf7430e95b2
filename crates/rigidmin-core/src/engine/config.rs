use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// What the stepper does with a curvature pair whose `s·y` is not strictly positive
/// (or whose reciprocal is not finite).
///
/// Such pairs arise near saddle regions or after a poor step, and storing them makes the
/// inverse-Hessian estimate indefinite or non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurvaturePolicy {
    /// Discard the offending pair and keep the existing history.
    #[default]
    SkipUpdate,
    /// Discard the offending pair and clear the whole history.
    ResetHistory,
    /// Store the pair as is. A non-finite step is then reported as an error.
    Unguarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LbfgsConfig {
    /// Number of curvature pairs kept (`M`).
    pub history_size: usize,
    /// Upper bound on the Euclidean norm of a single step.
    pub max_step: f64,
    /// Diagonal inverse-Hessian estimate `H0` used before any history exists.
    pub initial_inverse_hessian: f64,
    /// Replace `H0` by `s·y / y·y` of the newest curvature pair once one is stored.
    pub scale_inverse_hessian: bool,
    pub curvature_policy: CurvaturePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuenchConfig {
    pub lbfgs: LbfgsConfig,
    pub max_iterations: usize,
    /// Convergence threshold on the RMS gradient, `|g| / sqrt(N)`.
    pub tolerance: f64,
    /// Largest energy increase accepted for a trial step before it is shortened.
    pub max_energy_rise: f64,
    /// Number of times a trial step may be shortened tenfold.
    pub max_backtracks: usize,
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("expected a positive finite number, got {}", value),
        })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("expected a non-negative finite number, got {}", value),
        })
    }
}

#[derive(Default)]
pub struct LbfgsConfigBuilder {
    history_size: Option<usize>,
    max_step: Option<f64>,
    initial_inverse_hessian: Option<f64>,
    scale_inverse_hessian: Option<bool>,
    curvature_policy: Option<CurvaturePolicy>,
}

impl LbfgsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_size(mut self, m: usize) -> Self {
        self.history_size = Some(m);
        self
    }
    pub fn max_step(mut self, step: f64) -> Self {
        self.max_step = Some(step);
        self
    }
    pub fn initial_inverse_hessian(mut self, h0: f64) -> Self {
        self.initial_inverse_hessian = Some(h0);
        self
    }
    pub fn scale_inverse_hessian(mut self, enabled: bool) -> Self {
        self.scale_inverse_hessian = Some(enabled);
        self
    }
    pub fn curvature_policy(mut self, policy: CurvaturePolicy) -> Self {
        self.curvature_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<LbfgsConfig, ConfigError> {
        let history_size = self
            .history_size
            .ok_or(ConfigError::MissingParameter("history_size"))?;
        if history_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "history_size",
                reason: "the history must hold at least one correction".to_string(),
            });
        }
        Ok(LbfgsConfig {
            history_size,
            max_step: require_positive(
                "max_step",
                self.max_step.ok_or(ConfigError::MissingParameter("max_step"))?,
            )?,
            initial_inverse_hessian: require_positive(
                "initial_inverse_hessian",
                self.initial_inverse_hessian
                    .ok_or(ConfigError::MissingParameter("initial_inverse_hessian"))?,
            )?,
            scale_inverse_hessian: self.scale_inverse_hessian.unwrap_or(true),
            curvature_policy: self.curvature_policy.unwrap_or_default(),
        })
    }
}

#[derive(Default)]
pub struct QuenchConfigBuilder {
    lbfgs: Option<LbfgsConfig>,
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
    max_energy_rise: Option<f64>,
    max_backtracks: Option<usize>,
}

impl QuenchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lbfgs(mut self, config: LbfgsConfig) -> Self {
        self.lbfgs = Some(config);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn max_energy_rise(mut self, rise: f64) -> Self {
        self.max_energy_rise = Some(rise);
        self
    }
    pub fn max_backtracks(mut self, n: usize) -> Self {
        self.max_backtracks = Some(n);
        self
    }

    pub fn build(self) -> Result<QuenchConfig, ConfigError> {
        Ok(QuenchConfig {
            lbfgs: self.lbfgs.ok_or(ConfigError::MissingParameter("lbfgs"))?,
            max_iterations: self
                .max_iterations
                .ok_or(ConfigError::MissingParameter("max_iterations"))?,
            tolerance: require_non_negative(
                "tolerance",
                self.tolerance.ok_or(ConfigError::MissingParameter("tolerance"))?,
            )?,
            max_energy_rise: require_non_negative(
                "max_energy_rise",
                self.max_energy_rise
                    .ok_or(ConfigError::MissingParameter("max_energy_rise"))?,
            )?,
            max_backtracks: self
                .max_backtracks
                .ok_or(ConfigError::MissingParameter("max_backtracks"))?,
        })
    }
}
