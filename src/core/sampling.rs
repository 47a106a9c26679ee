//! Sampling primitives for the Monte Carlo.
//!
//! Every function draws from a caller-supplied generator so a shower seeded
//! once replays identically.

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::kinematics::rotate_3d;
use super::species::{PION_CHARGED_MASS, PION_NEUTRAL_MASS};
use crate::config::MultiplicityModel;
use crate::error::{Error, Result};

/// Rest mass of one π+ π− π0 triplet (MeV).
pub const PION_TRIPLET_MASS: f64 = 2.0 * PION_CHARGED_MASS + PION_NEUTRAL_MASS;

/// Integral spectral index of the primary flux (differential E^-2.7).
pub const SPECTRAL_INDEX: f64 = 1.7;

/// Uniform draw in `[a, b)`.
#[inline]
pub fn uniform_in_range<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    a + rng.random::<f64>() * (b - a)
}

/// Split `total` into `n` non-negative parts drawn uniformly from the simplex.
///
/// Sorts n−1 uniform cut points together with 0 and 1 and scales the gaps.
/// Normalising n independent uniforms instead would bias the parts toward
/// the centre of the simplex.
pub fn fixed_sum_split<R: Rng + ?Sized>(rng: &mut R, n: usize, total: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let mut cuts: Vec<f64> = Vec::with_capacity(n + 1);
    cuts.push(0.0);
    cuts.push(1.0);
    cuts.extend((1..n).map(|_| rng.random::<f64>()));
    cuts.sort_by(f64::total_cmp);
    let mut parts: Vec<f64> = cuts.windows(2).map(|w| total * (w[1] - w[0])).collect();
    // Last part takes the remainder so rounding does not accumulate.
    let head: f64 = parts[..n - 1].iter().sum();
    parts[n - 1] = (total - head).max(0.0);
    parts
}

/// Polar and azimuthal angles uniform in solid angle.
///
/// cos θ is uniform in `[0, 1)`, or in `[-1, 0)` when `downgoing`.
pub fn isotropic_angles<R: Rng + ?Sized>(rng: &mut R, downgoing: bool) -> (f64, f64) {
    let u: f64 = rng.random();
    let cos_theta = if downgoing { u - 1.0 } else { u };
    let phi = rng.random::<f64>() * TAU;
    (cos_theta.acos(), phi)
}

/// Uniform point in a disc of `radius` centred on the origin.
pub fn point_in_disc<R: Rng + ?Sized>(rng: &mut R, radius: f64) -> (f64, f64) {
    let r = radius * rng.random::<f64>().sqrt();
    let angle = rng.random::<f64>() * TAU;
    (r * angle.cos(), r * angle.sin())
}

/// Three momenta with the given masses, summing to zero, whose kinetic
/// energies add up to `total_ke`.
///
/// The kinetic energy is split with [`fixed_sum_split`]; splits whose momentum
/// magnitudes cannot close a triangle are redrawn, at most `retry_limit` times.
/// The closed triangle is laid in the x-z plane, rotated isotropically and
/// given a random overall sign.
///
/// Errors:
/// - `Error::InvalidParam` if `total_ke` or any mass is not finite and > 0
/// - `Error::RetryLimit` if no closing split is found
pub fn momentum_triangle<R: Rng + ?Sized>(
    rng: &mut R,
    total_ke: f64,
    masses: [f64; 3],
    retry_limit: usize,
) -> Result<[Vector3<f64>; 3]> {
    if !total_ke.is_finite() || total_ke <= 0.0 {
        return Err(Error::InvalidParam(format!(
            "momentum triangle needs positive kinetic energy, got {total_ke}"
        )));
    }
    if !masses.iter().all(|m| m.is_finite() && *m > 0.0) {
        return Err(Error::InvalidParam(
            "momentum triangle needs positive masses".into(),
        ));
    }

    let mut closing = None;
    for _ in 0..retry_limit {
        let kes = fixed_sum_split(rng, 3, total_ke);
        let p: [f64; 3] = std::array::from_fn(|i| (kes[i] * kes[i] + 2.0 * kes[i] * masses[i]).sqrt());
        if p[0] < p[1] + p[2] && p[1] < p[0] + p[2] && p[2] < p[0] + p[1] {
            closing = Some(p);
            break;
        }
    }
    let p = closing.ok_or(Error::RetryLimit {
        what: "momentum triangle",
        attempts: retry_limit,
    })?;

    // Angles from +z within the x-z plane, from the law of cosines.
    let cos_01 = ((p[0] * p[0] + p[1] * p[1] - p[2] * p[2]) / (2.0 * p[0] * p[1])).clamp(-1.0, 1.0);
    let cos_02 = ((p[0] * p[0] + p[2] * p[2] - p[1] * p[1]) / (2.0 * p[0] * p[2])).clamp(-1.0, 1.0);
    let xi = [0.0, PI - cos_01.acos(), PI + cos_02.acos()];

    let (theta, phi) = isotropic_angles(rng, false);
    let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };

    Ok(std::array::from_fn(|i| {
        let planar = Vector3::new(p[i] * xi[i].sin(), 0.0, p[i] * xi[i].cos());
        sign * rotate_3d(&planar, theta, phi)
    }))
}

/// Number of extra pion triplets produced in a collision.
///
/// Draws from a normal with mean `model.expected(lab_energy)` and variance
/// equal to the mean, truncated toward zero, redrawn until it lies in
/// `[0, total_ke / PION_TRIPLET_MASS]`. A non-positive mean gives 0. The
/// caller must keep the mean within a few standard deviations of the maximum.
///
/// Errors: `Error::RetryLimit` after `retry_limit` rejected draws.
pub fn choose_pion_multiplicity<R: Rng + ?Sized>(
    rng: &mut R,
    lab_energy: f64,
    total_ke: f64,
    model: &MultiplicityModel,
    retry_limit: usize,
) -> Result<u32> {
    let expected = model.expected(lab_energy);
    let maximum = total_ke / PION_TRIPLET_MASS;
    if !(expected > 0.0) || maximum < 0.0 {
        return Ok(0);
    }
    let normal = Normal::new(expected, expected.sqrt())
        .map_err(|e| Error::InvalidParam(format!("multiplicity distribution: {e}")))?;
    for _ in 0..retry_limit {
        let draw = normal.sample(rng).trunc();
        if draw >= 0.0 && draw <= maximum {
            return Ok(draw as u32);
        }
    }
    Err(Error::RetryLimit {
        what: "pion multiplicity",
        attempts: retry_limit,
    })
}

/// Energy from an E^-2.7 spectrum with a hard floor at `minimum`.
pub fn power_law_energy<R: Rng + ?Sized>(rng: &mut R, minimum: f64) -> f64 {
    let u: f64 = rng.random();
    let normalization = minimum.powf(SPECTRAL_INDEX);
    ((1.0 - u) / normalization).powf(-1.0 / SPECTRAL_INDEX)
}

/// Draw a distance by evaluating an inverse CDF at a uniform variate.
#[inline]
pub fn sample_distance<R, F>(rng: &mut R, inverse_cdf: F) -> f64
where
    R: Rng + ?Sized,
    F: Fn(f64) -> f64,
{
    inverse_cdf(rng.random::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let x = uniform_in_range(&mut rng, -2.0, 3.0);
            assert!((-2.0..3.0).contains(&x));
        }
    }

    #[test]
    fn fixed_sum_split_sums_exactly() {
        let mut rng = StdRng::seed_from_u64(2);
        for n in 2..8 {
            let parts = fixed_sum_split(&mut rng, n, 17.5);
            assert_eq!(parts.len(), n);
            assert!(parts.iter().all(|&x| x >= 0.0));
            assert!((parts.iter().sum::<f64>() - 17.5).abs() < 1e-12);
        }
    }

    #[test]
    fn fixed_sum_split_component_means_are_equal() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 4;
        let trials = 20_000;
        let mut sums = vec![0.0; n];
        for _ in 0..trials {
            for (s, x) in sums.iter_mut().zip(fixed_sum_split(&mut rng, n, 1.0)) {
                *s += x;
            }
        }
        for s in sums {
            let mean = s / trials as f64;
            assert!((mean - 0.25).abs() < 0.01, "component mean {mean}");
        }
    }

    #[test]
    fn downgoing_angles_point_down() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..1000 {
            let (theta, phi) = isotropic_angles(&mut rng, true);
            assert!(theta > PI / 2.0 && theta <= PI);
            assert!((0.0..TAU).contains(&phi));
        }
    }

    #[test]
    fn disc_points_inside_radius() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            let (x, y) = point_in_disc(&mut rng, 50.0);
            assert!((x * x + y * y).sqrt() <= 50.0);
        }
    }

    #[test]
    fn momentum_triangle_closes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(6);
        let masses = [PION_CHARGED_MASS, PION_CHARGED_MASS, PION_NEUTRAL_MASS];
        for _ in 0..200 {
            let [a, b, c] = momentum_triangle(&mut rng, 750.0, masses, 10_000)?;
            assert!((a + b + c).norm() < 1e-9);
            let ke: f64 = [a, b, c]
                .iter()
                .zip(masses)
                .map(|(p, m)| (m * m + p.norm_squared()).sqrt() - m)
                .sum();
            assert!((ke - 750.0).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn momentum_triangle_rejects_zero_energy() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = momentum_triangle(&mut rng, 0.0, [1.0, 1.0, 1.0], 10).unwrap_err();
        assert!(matches!(err, Error::InvalidParam(_)));
    }

    #[test]
    fn multiplicity_within_bounds() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(8);
        let model = MultiplicityModel::default();
        let total_ke = 60.0 * PION_TRIPLET_MASS;
        for _ in 0..500 {
            let m = choose_pion_multiplicity(&mut rng, 1.0e5, total_ke, &model, 10_000)?;
            assert!(m as f64 <= 60.0);
        }
        Ok(())
    }

    #[test]
    fn multiplicity_gives_up_when_window_unreachable() {
        let mut rng = StdRng::seed_from_u64(9);
        let model = MultiplicityModel::default();
        // Mean ≈ 59 with σ ≈ 7.7, but no triplet fits.
        let none_fit = choose_pion_multiplicity(&mut rng, 1.0e6, -1.0e-3, &model, 100);
        assert!(matches!(none_fit, Ok(0)));
        let err = choose_pion_multiplicity(&mut rng, 1.0e6, 10.0, &model, 100).unwrap_err();
        assert!(matches!(err, Error::RetryLimit { attempts: 100, .. }));
    }

    #[test]
    fn power_law_respects_floor() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut below_double = 0;
        for _ in 0..10_000 {
            let e = power_law_energy(&mut rng, 100.0);
            assert!(e >= 100.0);
            if e < 200.0 {
                below_double += 1;
            }
        }
        // P(E < 2 E_min) = 1 - 2^-1.7 ≈ 0.692
        let frac = below_double as f64 / 10_000.0;
        assert!((frac - 0.692).abs() < 0.02, "fraction {frac}");
    }

    #[test]
    fn sample_distance_applies_inverse_cdf() {
        let mut rng = StdRng::seed_from_u64(11);
        let d = sample_distance(&mut rng, |u| 5.0 + u);
        assert!((5.0..6.0).contains(&d));
    }
}
