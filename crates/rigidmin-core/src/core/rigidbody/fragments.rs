//! Ready-made rigid fragments.

use super::site::Site;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// The three-site ortho-terphenyl (OTP) model: an isosceles triangle of Lennard-Jones
/// beads with unit nearest-neighbour separation, centered on its centroid in the xy-plane.
pub fn otp() -> Site {
    let (s, c) = (7.0 * PI / 24.0).sin_cos();
    Site::from_nonempty(vec![
        Vector3::new(0.0, -2.0 / 3.0 * s, 0.0),
        Vector3::new(c, s / 3.0, 0.0),
        Vector3::new(-c, s / 3.0, 0.0),
    ])
}
