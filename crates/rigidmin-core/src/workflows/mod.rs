//! # Workflows Module
//!
//! Complete minimization procedures assembled from the rigid-body transform in
//! [`crate::core`] and the L-BFGS stepper in [`crate::engine`].
//!
//! - **Quench** ([`quench`]) - Relax a structure to its nearest local minimum with
//!   L-BFGS steps guarded by a backtracking energy check.

pub mod quench;
