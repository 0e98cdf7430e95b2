//! # Core Module
//!
//! Stateless building blocks: rigid fragment geometry, the rigid-body coordinate
//! transform, energy/gradient oracles, and small numerical utilities.
//!
//! ## Architecture
//!
//! - **Rigid Bodies** ([`rigidbody`]) - Sites, topologies, and the angle-axis rotation math
//!   needed to expand rigid-body coordinates and contract atomistic gradients
//! - **Potentials** ([`potentials`]) - The `Potential` trait, a Lennard-Jones oracle, and the
//!   adapter that evaluates an atomistic potential in rigid-body coordinates
//! - **Utilities** ([`utils`]) - Flat-vector arithmetic and finite-difference derivatives
//!
//! ## Coordinate Conventions
//!
//! Rigid-body coordinates are stored flat, six numbers per site: the center-of-mass
//! position followed by the rotation vector `p = θ·n̂` (angle-axis), so a topology with
//! `n` sites is described by `6n` numbers. Atomistic coordinates are stored flat as well,
//! three numbers per atom, with row `i` holding the atom whose global index is `i`.

pub mod potentials;
pub mod rigidbody;
pub mod utils;
