use airshower::core::kinematics::{lorentz_boost, rotate_3d, spatial};
use nalgebra::{Vector3, Vector4};
use proptest::prelude::*;

/// Boosting [5, 0, 0, 2] by β = 0.6 along -z gives [7.75, 0, 0, 6.25].
#[test]
fn boost_reference_values() {
    let out = lorentz_boost(&Vector4::new(5.0, 0.0, 0.0, 2.0), 0.6, &Vector3::new(0.0, 0.0, -1.0));
    for (got, want) in out.iter().zip([7.75, 0.0, 0.0, 6.25]) {
        assert!((got - want).abs() < 1e-12, "got {out:?}");
    }
}

fn unit(theta: f64, phi: f64) -> Vector3<f64> {
    Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
}

proptest! {
    /// A boost followed by the opposite boost along the same axis is the identity.
    #[test]
    fn boost_is_invertible(
        e in 1.0f64..1.0e4,
        px in -1.0e3f64..1.0e3,
        py in -1.0e3f64..1.0e3,
        pz in -1.0e3f64..1.0e3,
        beta in -0.99f64..0.99,
        theta in 0.0f64..std::f64::consts::PI,
        phi in 0.0f64..std::f64::consts::TAU,
    ) {
        let v = Vector4::new(e, px, py, pz);
        let n = unit(theta, phi);
        let back = lorentz_boost(&lorentz_boost(&v, beta, &n), -beta, &n);
        prop_assert!((back - v).norm() < 1e-9 * (1.0 + v.norm()));
    }

    /// Rotations keep the spatial length of a vector.
    #[test]
    fn rotation_is_orthogonal(
        x in -10.0f64..10.0,
        y in -10.0f64..10.0,
        z in -10.0f64..10.0,
        theta in 0.0f64..std::f64::consts::PI,
        phi in 0.0f64..std::f64::consts::TAU,
    ) {
        let v = Vector3::new(x, y, z);
        let r = rotate_3d(&v, theta, phi);
        prop_assert!((r.norm() - v.norm()).abs() < 1e-12 * (1.0 + v.norm()));
    }
}

#[test]
fn boost_along_motion_brings_particle_to_rest() {
    let m: f64 = 139.57018;
    let p = 400.0;
    let e = (m * m + p * p).sqrt();
    let n = Vector3::new(0.0, 0.6, -0.8);
    let rest = lorentz_boost(&Vector4::new(e, p * n.x, p * n.y, p * n.z), p / e, &n);
    assert!((rest[0] - m).abs() < 1e-9);
    assert!(spatial(&rest).norm() < 1e-9);
}
