//! # Engine Module
//!
//! The stateful optimization layer: a limited-memory BFGS stepper and the supporting
//! configuration, progress, and error types.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - L-BFGS and quench parameters, built through builders
//! - **History** ([`history`]) - Fixed-capacity ring buffer of curvature pairs
//! - **Stepper** ([`lbfgs`]) - Two-loop recursion and bounded step taking
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine error types
//!
//! The stepper is agnostic to what the coordinates mean: the same `Lbfgs` instance can
//! drive atomistic coordinates or rigid-body coordinates.

pub mod config;
pub mod error;
pub mod history;
pub mod lbfgs;
pub mod progress;
