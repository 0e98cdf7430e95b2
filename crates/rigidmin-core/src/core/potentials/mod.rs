//! # Potentials Module
//!
//! Energy/gradient oracles consumed by the minimizer.
//!
//! - [`Potential`] - The oracle interface: energy, or energy together with its gradient,
//!   as a function of a flat coordinate vector
//! - [`PotentialFunction`] - A potential backed by a pair of closures
//! - [`lj::LennardJones`] - The 12-6 Lennard-Jones cluster potential
//! - [`rigid::RigidBodyPotential`] - Evaluates an atomistic potential in rigid-body
//!   coordinates through a [`RigidBodyTopology`](crate::core::rigidbody::RigidBodyTopology)
//!
//! ```ignore
//! use rigidmin::core::potentials::{lj::LennardJones, rigid::RigidBodyPotential, Potential};
//!
//! let pot = RigidBodyPotential::new(&topology, LennardJones::default());
//! let (energy, rigid_gradient) = pot.energy_gradient(&rigid_coords)?;
//! ```

pub mod lj;
pub mod rigid;
mod traits;

pub use traits::{Potential, PotentialError, PotentialFunction};
