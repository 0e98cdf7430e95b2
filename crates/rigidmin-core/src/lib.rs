//! # rigidmin Core Library
//!
//! Local minimization of molecular potential-energy landscapes in reduced rigid-body
//! coordinates, combining an exact rigid-body ↔ atomistic coordinate transform with a
//! limited-memory quasi-Newton (L-BFGS) minimizer.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Rigid fragments (`Site`), the finalized
//!   `RigidBodyTopology` that maps rigid-body coordinates to atomistic coordinates and
//!   back-propagates gradients, and the `Potential` abstraction for energy/gradient oracles.
//!
//! - **[`engine`]: The Optimizer.** The stateful L-BFGS stepper with its bounded history,
//!   configuration builders, progress reporting, and error types.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the two layers
//!   above, such as quenching a structure to its nearest local minimum.

pub mod core;
pub mod engine;
pub mod workflows;
