use super::config::ConfigError;
use crate::core::potentials::PotentialError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LbfgsError {
    #[error("Expected vectors of dimension {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Position ({position}) and gradient ({gradient}) have different lengths")]
    LengthMismatch { position: usize, gradient: usize },

    #[error("L-BFGS produced a non-finite step at iteration {iteration}")]
    NonFiniteStep { iteration: usize },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Energy evaluation failed: {source}")]
    Potential {
        #[from]
        source: PotentialError,
    },

    #[error("Optimizer step failed: {source}")]
    Step {
        #[from]
        source: LbfgsError,
    },

    #[error("Potential returned a non-finite energy ({energy}) at iteration {iteration}")]
    NonFiniteEnergy { energy: f64, iteration: usize },
}
