use super::traits::{Potential, PotentialError};

/// 12-6 Lennard-Jones cluster potential, summed over every pair of atoms:
/// `E = 4ε Σ_{i<j} [(σ/r)^12 - (σ/r)^6]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
}

impl Default for LennardJones {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            sigma: 1.0,
        }
    }
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64) -> Self {
        Self { epsilon, sigma }
    }

    /// Pair energy and `(dE/dr) / r` at squared separation `r2`.
    #[inline]
    fn pair(&self, r2: f64) -> (f64, f64) {
        let ir2 = self.sigma * self.sigma / r2;
        let ir6 = ir2 * ir2 * ir2;
        let ir12 = ir6 * ir6;
        let energy = 4.0 * self.epsilon * (ir12 - ir6);
        let g_over_r = 4.0 * self.epsilon * (6.0 * ir6 - 12.0 * ir12) / r2;
        (energy, g_over_r)
    }

    fn check_len(coords: &[f64]) -> Result<usize, PotentialError> {
        if coords.len() % 3 != 0 {
            return Err(PotentialError::CoordinateLength {
                found: coords.len(),
                reason: "not a multiple of 3",
            });
        }
        Ok(coords.len() / 3)
    }
}

#[inline]
fn separation(coords: &[f64], i: usize, j: usize) -> [f64; 3] {
    [
        coords[3 * i] - coords[3 * j],
        coords[3 * i + 1] - coords[3 * j + 1],
        coords[3 * i + 2] - coords[3 * j + 2],
    ]
}

impl Potential for LennardJones {
    fn energy(&self, coords: &[f64]) -> Result<f64, PotentialError> {
        let natoms = Self::check_len(coords)?;
        let mut energy = 0.0;
        for i in 0..natoms {
            for j in i + 1..natoms {
                let dr = separation(coords, i, j);
                let r2 = dr.iter().map(|x| x * x).sum();
                energy += self.pair(r2).0;
            }
        }
        Ok(energy)
    }

    fn energy_gradient(&self, coords: &[f64]) -> Result<(f64, Vec<f64>), PotentialError> {
        let natoms = Self::check_len(coords)?;
        let mut energy = 0.0;
        let mut gradient = vec![0.0; coords.len()];
        for i in 0..natoms {
            for j in i + 1..natoms {
                let dr = separation(coords, i, j);
                let r2 = dr.iter().map(|x| x * x).sum();
                let (e, g_over_r) = self.pair(r2);
                energy += e;
                for d in 0..3 {
                    gradient[3 * i + d] += g_over_r * dr[d];
                    gradient[3 * j + d] -= g_over_r * dr[d];
                }
            }
        }
        Ok((energy, gradient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::numerical::{DerivativeKind, try_gradient};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn dimer_at_minimum_has_energy_minus_epsilon_and_zero_force() {
        let r_min = 2f64.powf(1.0 / 6.0);
        let lj = LennardJones::new(2.5, 1.0);
        let (e, g) = lj.energy_gradient(&[0.0, 0.0, 0.0, r_min, 0.0, 0.0]).unwrap();
        assert!(f64_approx_equal(e, -2.5));
        assert!(g.iter().all(|x| x.abs() < 1e-9));
    }

    #[test]
    fn dimer_at_sigma_has_zero_energy() {
        let lj = LennardJones::new(1.0, 1.3);
        let e = lj.energy(&[0.0, 0.0, 0.0, 0.0, 1.3, 0.0]).unwrap();
        assert!(f64_approx_equal(e, 0.0));
    }

    #[test]
    fn energy_agrees_with_energy_gradient() {
        let coords = [0.0, 0.0, 0.0, 1.1, 0.1, 0.0, 0.4, 1.0, 0.3, -0.6, 0.5, 0.9];
        let lj = LennardJones::default();
        let e = lj.energy(&coords).unwrap();
        let (e2, _) = lj.energy_gradient(&coords).unwrap();
        assert!(f64_approx_equal(e, e2));
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let coords = [0.0, 0.0, 0.0, 1.1, 0.1, 0.0, 0.4, 1.0, 0.3, -0.6, 0.5, 0.9];
        let lj = LennardJones::default();
        let (_, analytic) = lj.energy_gradient(&coords).unwrap();
        let numeric = try_gradient(1e-5, DerivativeKind::Central5, &coords, |x| lj.energy(x)).unwrap();
        for (a, n) in analytic.iter().zip(&numeric) {
            assert!((a - n).abs() < 1e-6, "{} vs {}", a, n);
        }
    }

    #[test]
    fn gradient_sums_to_zero() {
        let coords = [0.0, 0.0, 0.0, 1.1, 0.1, 0.0, 0.4, 1.0, 0.3];
        let (_, g) = LennardJones::default().energy_gradient(&coords).unwrap();
        for d in 0..3 {
            let total: f64 = (0..3).map(|i| g[3 * i + d]).sum();
            assert!(total.abs() < 1e-10);
        }
    }

    #[test]
    fn rejects_ragged_coordinates() {
        let result = LennardJones::default().energy(&[0.0; 4]);
        assert!(matches!(result, Err(PotentialError::CoordinateLength { found: 4, .. })));
    }
}
