//! Lorentz boosts and rotations.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// Boost matrix into a frame moving with speed `beta` along unit `n`.
///
/// Four-vectors are ordered (E, px, py, pz). Boosting by `-beta` along the
/// same `n` is the inverse transformation.
pub fn boost_matrix(beta: f64, n: &Vector3<f64>) -> Matrix4<f64> {
    let gamma = 1.0 / (1.0 - beta * beta).sqrt();
    let gb = gamma * beta;
    let g1 = gamma - 1.0;
    let (nx, ny, nz) = (n.x, n.y, n.z);
    #[rustfmt::skip]
    let m = Matrix4::new(
        gamma, -gb * nx, -gb * ny, -gb * nz,
        -gb * nx, 1.0 + g1 * nx * nx, g1 * nx * ny, g1 * nx * nz,
        -gb * ny, g1 * ny * nx, 1.0 + g1 * ny * ny, g1 * ny * nz,
        -gb * nz, g1 * nz * nx, g1 * nz * ny, 1.0 + g1 * nz * nz,
    );
    m
}

/// Apply [`boost_matrix`] to `four_vector`.
#[inline]
pub fn lorentz_boost(four_vector: &Vector4<f64>, beta: f64, n: &Vector3<f64>) -> Vector4<f64> {
    boost_matrix(beta, n) * four_vector
}

/// Rotate about x by `theta`, then about z by `phi`.
pub fn rotate_3d(vector: &Vector3<f64>, theta: f64, phi: f64) -> Vector3<f64> {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, ct, -st, 0.0, st, ct);
    let rz = Matrix3::new(cp, -sp, 0.0, sp, cp, 0.0, 0.0, 0.0, 1.0);
    rz * (rx * vector)
}

/// Spatial part of a four-vector.
#[inline]
pub fn spatial(four_vector: &Vector4<f64>) -> Vector3<f64> {
    Vector3::new(four_vector[1], four_vector[2], four_vector[3])
}
