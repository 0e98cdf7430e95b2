use crate::core::rigidbody::TopologyError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PotentialError {
    #[error("Coordinate array of length {found} is invalid: {reason}")]
    CoordinateLength { found: usize, reason: &'static str },

    #[error("Rigid-body transform failed: {0}")]
    Topology(#[from] TopologyError),

    #[error("Energy evaluation failed: {0}")]
    Evaluation(String),
}

/// An energy/gradient oracle over a flat coordinate vector.
///
/// Implementations must be deterministic: the minimizer compares energies from
/// successive evaluations.
pub trait Potential {
    fn energy_gradient(&self, coords: &[f64]) -> Result<(f64, Vec<f64>), PotentialError>;

    fn energy(&self, coords: &[f64]) -> Result<f64, PotentialError> {
        self.energy_gradient(coords).map(|(energy, _)| energy)
    }
}

impl<P: Potential + ?Sized> Potential for &P {
    fn energy_gradient(&self, coords: &[f64]) -> Result<(f64, Vec<f64>), PotentialError> {
        (**self).energy_gradient(coords)
    }

    fn energy(&self, coords: &[f64]) -> Result<f64, PotentialError> {
        (**self).energy(coords)
    }
}

/// A potential assembled from an energy closure and an energy-gradient closure.
pub struct PotentialFunction<E, G> {
    energy_fn: E,
    energy_gradient_fn: G,
}

impl<E, G> PotentialFunction<E, G>
where
    E: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> (f64, Vec<f64>),
{
    pub fn new(energy_fn: E, energy_gradient_fn: G) -> Self {
        Self {
            energy_fn,
            energy_gradient_fn,
        }
    }
}

impl<E, G> Potential for PotentialFunction<E, G>
where
    E: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> (f64, Vec<f64>),
{
    fn energy_gradient(&self, coords: &[f64]) -> Result<(f64, Vec<f64>), PotentialError> {
        let (energy, gradient) = (self.energy_gradient_fn)(coords);
        if gradient.len() != coords.len() {
            return Err(PotentialError::Evaluation(format!(
                "gradient has length {} for {} coordinates",
                gradient.len(),
                coords.len()
            )));
        }
        Ok((energy, gradient))
    }

    fn energy(&self, coords: &[f64]) -> Result<f64, PotentialError> {
        Ok((self.energy_fn)(coords))
    }
}
