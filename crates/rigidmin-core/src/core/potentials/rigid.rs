use super::traits::{Potential, PotentialError};
use crate::core::rigidbody::RigidBodyTopology;
use tracing::trace;

/// Evaluates an atomistic potential as a function of rigid-body coordinates.
///
/// Coordinates are expanded with [`RigidBodyTopology::to_atomistic`] and the atomistic
/// gradient is contracted with [`RigidBodyTopology::transform_gradient`], so results do not
/// depend on how the topology assigns atoms to rows.
#[derive(Debug, Clone)]
pub struct RigidBodyPotential<'t, P> {
    topology: &'t RigidBodyTopology,
    atomistic: P,
}

impl<'t, P: Potential> RigidBodyPotential<'t, P> {
    pub fn new(topology: &'t RigidBodyTopology, atomistic: P) -> Self {
        Self {
            topology,
            atomistic,
        }
    }

    pub fn topology(&self) -> &'t RigidBodyTopology {
        self.topology
    }

    pub fn atomistic_potential(&self) -> &P {
        &self.atomistic
    }
}

impl<P: Potential> Potential for RigidBodyPotential<'_, P> {
    fn energy(&self, rigid_coords: &[f64]) -> Result<f64, PotentialError> {
        let atomistic = self.topology.to_atomistic(rigid_coords)?;
        self.atomistic.energy(&atomistic)
    }

    fn energy_gradient(&self, rigid_coords: &[f64]) -> Result<(f64, Vec<f64>), PotentialError> {
        let atomistic = self.topology.to_atomistic(rigid_coords)?;
        let (energy, atomistic_gradient) = self.atomistic.energy_gradient(&atomistic)?;
        let rigid_gradient = self
            .topology
            .transform_gradient(rigid_coords, &atomistic_gradient)?;
        trace!("Rigid-body energy evaluation: E = {:.8}", energy);
        Ok((energy, rigid_gradient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::potentials::lj::LennardJones;
    use crate::core::rigidbody::fragments::otp;
    use crate::core::rigidbody::{RigidBodyTopologyBuilder, TopologyError};
    use crate::core::utils::numerical::{DerivativeKind, try_gradient};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    const NRIGID: usize = 3;

    // Three OTP molecules far enough apart that no pair of beads overlaps.
    fn rigid_coords() -> Vec<f64> {
        vec![
            0.0, 0.0, 0.0, 0.1, 0.2, 0.3, //
            2.2, 0.3, 0.2, -0.4, 1.2, 0.6, //
            0.4, 2.1, -1.2, 2.0, -0.3, 0.9,
        ]
    }

    fn normal_topology() -> RigidBodyTopology {
        RigidBodyTopologyBuilder::new()
            .add_sites((0..NRIGID).map(|_| otp()))
            .finalize_setup(true)
            .unwrap()
    }

    fn shuffled_topology(seed: u64) -> (RigidBodyTopology, Vec<usize>) {
        let mut perm: Vec<usize> = (0..3 * NRIGID).collect();
        perm.shuffle(&mut StdRng::seed_from_u64(seed));
        let topology = RigidBodyTopologyBuilder::new()
            .add_sites(
                perm.chunks(3)
                    .map(|c| otp().with_atom_indices(c.to_vec()).unwrap()),
            )
            .finalize_setup(false)
            .unwrap();
        (topology, perm)
    }

    fn assert_arrays_almost_equal(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() <= tol * (1.0 + y.abs()), "index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn round_trip_gradient_matches_finite_differences() {
        let topology = normal_topology();
        let pot = RigidBodyPotential::new(&topology, LennardJones::default());
        let coords = rigid_coords();

        let (_, analytic) = pot.energy_gradient(&coords).unwrap();
        let numeric = try_gradient(1e-5, DerivativeKind::Central5, &coords, |c| pot.energy(c)).unwrap();

        assert_arrays_almost_equal(&analytic, &numeric, 1e-5);
    }

    #[test]
    fn energy_agrees_with_energy_gradient() {
        let topology = normal_topology();
        let pot = RigidBodyPotential::new(&topology, LennardJones::default());
        let coords = rigid_coords();
        let e = pot.energy(&coords).unwrap();
        let (e2, _) = pot.energy_gradient(&coords).unwrap();
        assert_eq!(e, e2);
    }

    #[test]
    fn shuffled_indices_give_identical_energy() {
        let normal = normal_topology();
        let (shuffled, _) = shuffled_topology(42);
        let coords = rigid_coords();

        let e_norm = RigidBodyPotential::new(&normal, LennardJones::default())
            .energy(&coords)
            .unwrap();
        let e_shuf = RigidBodyPotential::new(&shuffled, LennardJones::default())
            .energy(&coords)
            .unwrap();

        assert!((e_norm - e_shuf).abs() <= 1e-12 * e_norm.abs().max(1.0));
    }

    #[test]
    fn shuffled_indices_permute_atomistic_rows() {
        let normal = normal_topology();
        let (shuffled, perm) = shuffled_topology(42);
        let coords = rigid_coords();

        let a_norm = normal.to_atomistic(&coords).unwrap();
        let a_shuf = shuffled.to_atomistic(&coords).unwrap();

        let unpermuted: Vec<f64> = perm
            .iter()
            .flat_map(|&row| a_shuf[3 * row..3 * row + 3].iter().copied())
            .collect();
        assert_eq!(unpermuted, a_norm);
    }

    #[test]
    fn shuffled_indices_give_equal_atomistic_gradients_after_unpermuting() {
        let normal = normal_topology();
        let (shuffled, perm) = shuffled_topology(3);
        let coords = rigid_coords();
        let lj = LennardJones::default();

        let (e1, g_shuf) = lj.energy_gradient(&shuffled.to_atomistic(&coords).unwrap()).unwrap();
        let (e2, g_norm) = lj.energy_gradient(&normal.to_atomistic(&coords).unwrap()).unwrap();
        assert!((e1 - e2).abs() <= 1e-12 * e2.abs().max(1.0));

        let unpermuted: Vec<f64> = perm
            .iter()
            .flat_map(|&row| g_shuf[3 * row..3 * row + 3].iter().copied())
            .collect();
        assert_arrays_almost_equal(&unpermuted, &g_norm, 1e-10);
    }

    #[test]
    fn shuffled_indices_give_identical_rigid_gradient() {
        let normal = normal_topology();
        let (shuffled, _) = shuffled_topology(42);
        let coords = rigid_coords();

        let (_, g_norm) = RigidBodyPotential::new(&normal, LennardJones::default())
            .energy_gradient(&coords)
            .unwrap();
        let (_, g_shuf) = RigidBodyPotential::new(&shuffled, LennardJones::default())
            .energy_gradient(&coords)
            .unwrap();

        assert_arrays_almost_equal(&g_shuf, &g_norm, 1e-10);
    }

    #[test]
    fn wrong_rigid_length_surfaces_topology_error() {
        let topology = normal_topology();
        let pot = RigidBodyPotential::new(&topology, LennardJones::default());
        let result = pot.energy(&[0.0; 6]);
        assert_eq!(
            result,
            Err(PotentialError::Topology(TopologyError::CoordinateLength {
                expected: 18,
                found: 6
            }))
        );
    }
}
