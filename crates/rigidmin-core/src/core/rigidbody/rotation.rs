use nalgebra::{Matrix3, Rotation3, Vector3};

/// Below this rotation angle the closed-form derivative (which divides by `θ²`)
/// is replaced by its series expansion.
pub const SMALL_ANGLE: f64 = 1e-6;

/// Rotation matrix `R(p) = exp([p]×)` for the rotation vector `p = θ·n̂`.
pub fn rotation_matrix(p: &Vector3<f64>) -> Matrix3<f64> {
    Rotation3::from_scaled_axis(*p).into_inner()
}

/// The rotation matrix together with its partial derivatives `∂R/∂p_k`, `k = 0, 1, 2`.
///
/// For `θ > SMALL_ANGLE` the closed form of Gallego & Yezzi (J. Math. Imaging Vis. 51, 2015),
///
/// `∂R/∂p_k = (p_k [p]× + [p × ((I - R) e_k)]×) R / θ²`,
///
/// is used. Near the identity the derivative of the second-order expansion
/// `R ≈ I + [p]× + [p]×² / 2` is used instead, which is accurate to `O(θ²)`.
pub fn rotation_matrix_derivatives(p: &Vector3<f64>) -> (Matrix3<f64>, [Matrix3<f64>; 3]) {
    let r = rotation_matrix(p);
    let px = p.cross_matrix();
    let theta_sq = p.norm_squared();
    let mut dr = [Matrix3::zeros(); 3];

    if theta_sq.sqrt() <= SMALL_ANGLE {
        for (k, drk) in dr.iter_mut().enumerate() {
            let ek = Vector3::<f64>::ith(k, 1.0).cross_matrix();
            *drk = ek + (ek * px + px * ek) * 0.5;
        }
    } else {
        let i_minus_r = Matrix3::identity() - r;
        for (k, drk) in dr.iter_mut().enumerate() {
            let v = p.cross(&(i_minus_r * Vector3::<f64>::ith(k, 1.0)));
            *drk = (px * p[k] + v.cross_matrix()) * r / theta_sq;
        }
    }
    (r, dr)
}
