//! Summaries of the muons a shower delivers to the ground.

use crate::core::Particle;

/// Kinetic-energy cut (MeV) applied when counting muons for flux estimates.
pub const MUON_COUNT_CUT: f64 = 50.0;

/// Number of muons with kinetic energy above `min_ke` (MeV).
pub fn muon_count(muons: &[Particle], min_ke: f64) -> usize {
    muons
        .iter()
        .filter(|m| m.species.is_muon() && m.kinetic_energy() > min_ke)
        .count()
}

/// Distance (m) of each muon from the shower axis in the x-y plane, keeping
/// only those strictly inside `rmax` when given.
pub fn lateral_radii(muons: &[Particle], rmax: Option<f64>) -> Vec<f64> {
    muons
        .iter()
        .map(|m| m.position.xy().norm())
        .filter(|&r| rmax.is_none_or(|max| r < max))
        .collect()
}

const PREFIXES: [(f64, &str); 9] = [
    (1e-9, "n"),
    (1e-6, "µ"),
    (1e-3, "m"),
    (1.0, ""),
    (1e3, "k"),
    (1e6, "M"),
    (1e9, "G"),
    (1e12, "T"),
    (1e15, "P"),
];

/// Express `value` (in units of `base`) with an SI prefix.
///
/// Returns the scaled value and the prefix, choosing the largest prefix that
/// keeps the scaled magnitude at or above 1. With energies in MeV and a base
/// of 1e6 (eV per MeV), `scale_value(2.5e4, 1e6)` gives `(25.0, "G")`.
pub fn scale_value(value: f64, base: f64) -> (f64, &'static str) {
    let absolute = (value * base).abs();
    if absolute == 0.0 || !absolute.is_finite() {
        return (value * base, "");
    }
    let (factor, prefix) = PREFIXES
        .iter()
        .rev()
        .find(|(factor, _)| absolute >= *factor)
        .copied()
        .unwrap_or(PREFIXES[0]);
    (value * base / factor, prefix)
}
