//! Rigid fragments and the rigid-body ↔ atomistic coordinate transform.
//!
//! A [`Site`] holds the body-frame geometry of one rigid fragment and, optionally, the
//! rows of the global atomistic array its atoms occupy. Sites are collected by a
//! [`RigidBodyTopologyBuilder`] and frozen by
//! [`finalize_setup`](RigidBodyTopologyBuilder::finalize_setup) into a
//! [`RigidBodyTopology`], which performs the coordinate and gradient transforms.

mod error;
pub mod fragments;
pub mod rotation;
mod site;
mod topology;

pub use error::TopologyError;
pub use site::Site;
pub use topology::{RigidBodyTopology, RigidBodyTopologyBuilder, TransformPath};
