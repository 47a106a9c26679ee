//! Decay and collision outcomes.
//!
//! Products are built in the parent's rest frame (decays) or the
//! centre-of-momentum frame (collisions) and boosted back to the lab with the
//! velocity negated.

use log::{debug, warn};
use nalgebra::{Vector3, Vector4};
use rand::Rng;

use super::ids::IdAllocator;
use super::kinematics::{lorentz_boost, spatial};
use super::particle::Particle;
use super::sampling::{
    choose_pion_multiplicity, fixed_sum_split, isotropic_angles, momentum_triangle,
    PION_TRIPLET_MASS,
};
use super::species::Species;
use crate::config::MultiplicityModel;
use crate::error::Result;

/// Result of a decay or collision.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// The reactants were replaced by these products.
    Products(Vec<Particle>),
    /// No rule applies; the reactants are handed back unchanged.
    Unhandled(Vec<Particle>),
}

impl Reaction {
    pub fn is_handled(&self) -> bool {
        matches!(self, Reaction::Products(_))
    }

    /// The particles that replace the reactants, whichever way it went.
    pub fn into_particles(self) -> Vec<Particle> {
        match self {
            Reaction::Products(p) | Reaction::Unhandled(p) => p,
        }
    }
}

/// Branch pions, indexed the same way as the rows of [`residual_isotopes`].
const BRANCH_PIONS: [Species; 3] = [Species::PionPlus, Species::PionMinus, Species::PionZero];

/// Residual nucleus for each branch pion, conserving charge.
fn residual_isotopes(target: Species) -> Option<[Species; 3]> {
    use Species::*;
    match target {
        Nitrogen14 => Some([Carbon14, Oxygen14, Nitrogen14]),
        Oxygen16 => Some([Nitrogen16, Fluorine16, Oxygen16]),
        Argon40 => Some([Chlorine40, Potassium40, Argon40]),
        _ => None,
    }
}

/// Daughter nucleus and emitted particle of an unstable isotope.
fn isotope_decay(parent: Species) -> Option<[Species; 2]> {
    use Species::*;
    match parent {
        Carbon14 => Some([Nitrogen14, Electron]),
        Oxygen14 => Some([Nitrogen14, Positron]),
        Nitrogen16 => Some([Oxygen16, Electron]),
        Oxygen15 => Some([Nitrogen15, Positron]),
        Chlorine40 => Some([Argon40, Electron]),
        Potassium40 => Some([Calcium40, Electron]),
        Fluorine16 => Some([Oxygen15, Proton]),
        _ => None,
    }
}

/// Decay `particle` into its products.
///
/// - π± → μ± + ν, with two-body kinematics boosted to the lab
/// - μ± → e± + two neutrinos; the electron keeps the muon's energy and
///   direction, the neutrinos are left at rest
/// - unstable isotopes → daughter + e± (or p), all at rest
///
/// Anything else comes back as [`Reaction::Unhandled`].
pub fn decay<R: Rng + ?Sized>(
    particle: &Particle,
    rng: &mut R,
    ids: &IdAllocator,
) -> Result<Reaction> {
    use Species::*;
    let products = match particle.species {
        PionPlus => two_body_decay(particle, [MuonPlus, MuonNeutrino], rng, ids)?,
        PionMinus => two_body_decay(particle, [MuonMinus, MuonAntineutrino], rng, ids)?,
        MuonPlus => muon_decay(particle, [Positron, ElectronNeutrino, MuonAntineutrino], ids)?,
        MuonMinus => muon_decay(particle, [Electron, ElectronAntineutrino, MuonNeutrino], ids)?,
        other => match isotope_decay(other) {
            Some(daughters) => daughters
                .iter()
                .map(|&s| Particle::at_rest(ids.next_id(), s, particle.position))
                .collect(),
            None => {
                warn!("no decay rule for {other} (id {}), left unchanged", particle.id);
                return Ok(Reaction::Unhandled(vec![particle.clone()]));
            }
        },
    };
    Ok(Reaction::Products(products))
}

/// Rest-frame momentum of either daughter in a two-body decay.
pub fn two_body_momentum(parent: f64, first: f64, second: f64) -> f64 {
    let a = parent * parent + first * first - second * second;
    let disc = a * a - 4.0 * parent * parent * first * first;
    disc.max(0.0).sqrt() / (2.0 * parent)
}

fn two_body_decay<R: Rng + ?Sized>(
    parent: &Particle,
    daughters: [Species; 2],
    rng: &mut R,
    ids: &IdAllocator,
) -> Result<Vec<Particle>> {
    let p = two_body_momentum(parent.mass(), daughters[0].mass(), daughters[1].mass());
    let (theta, phi) = isotropic_angles(rng, false);
    let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
    let axis = sign
        * Vector3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        );

    let beta = parent.beta();
    let n = parent.direction();
    let rest = [p * axis, -p * axis];
    daughters
        .iter()
        .zip(rest)
        .map(|(&species, momentum)| {
            let lab = to_lab(species.mass(), momentum, beta, &n);
            Particle::new(ids.next_id(), species, parent.position, lab)
        })
        .collect()
}

fn muon_decay(
    muon: &Particle,
    products: [Species; 3],
    ids: &IdAllocator,
) -> Result<Vec<Particle>> {
    let [lepton, nu_a, nu_b] = products;
    let m = lepton.mass();
    let e = muon.energy();
    let p = (e * e - m * m).max(0.0).sqrt();
    Ok(vec![
        Particle::new(ids.next_id(), lepton, muon.position, p * muon.direction())?,
        Particle::at_rest(ids.next_id(), nu_a, muon.position),
        Particle::at_rest(ids.next_id(), nu_b, muon.position),
    ])
}

/// Boost a frame momentum of a particle of `mass` back to the lab.
fn to_lab(mass: f64, momentum: Vector3<f64>, beta: f64, n: &Vector3<f64>) -> Vector3<f64> {
    let energy = (mass * mass + momentum.norm_squared()).sqrt();
    let four = Vector4::new(energy, momentum.x, momentum.y, momentum.z);
    spatial(&lorentz_boost(&four, -beta, n))
}

/// Inelastic collision of `projectile` with a `target` nucleus at rest.
///
/// The projectile survives with its id. It is joined by a branch pion (π+, π−
/// or π0 with equal odds), the charge-conserving residual of the target, and
/// a number of extra π+ π− π0 triplets drawn from `model`. When the
/// centre-of-momentum energy cannot cover the base product masses, the two
/// reactants come back unchanged as products.
///
/// Errors: `Error::RetryLimit` from the multiplicity or momentum-triangle draws.
pub fn collision<R: Rng + ?Sized>(
    projectile: &Particle,
    target: &Particle,
    rng: &mut R,
    ids: &IdAllocator,
    model: &MultiplicityModel,
    retry_limit: usize,
) -> Result<Reaction> {
    let unchanged = || vec![projectile.clone(), target.clone()];
    let Some(isotopes) = residual_isotopes(target.species) else {
        warn!(
            "no collision rule for {} on {}, left unchanged",
            projectile.species, target.species
        );
        return Ok(Reaction::Unhandled(unchanged()));
    };
    if !projectile.species.is_hadronic() {
        warn!(
            "{} is not hadronic, collision with {} left unchanged",
            projectile.species, target.species
        );
        return Ok(Reaction::Unhandled(unchanged()));
    }

    let branch = rng.random_range(0..BRANCH_PIONS.len());
    let base = [projectile.species, BRANCH_PIONS[branch], isotopes[branch]];
    let base_masses = base.map(Species::mass);

    let beta = projectile.momentum_magnitude() / (projectile.energy() + target.mass());
    let n = projectile.direction();
    let com_energy = lorentz_boost(&projectile.four_momentum(), beta, &n)[0]
        + lorentz_boost(&target.four_momentum(), beta, &n)[0];

    let budget = com_energy - base_masses.iter().sum::<f64>();
    if budget <= 0.0 {
        return Ok(Reaction::Products(unchanged()));
    }

    let extra = guarded_multiplicity(rng, projectile.energy(), budget, model, retry_limit)?;
    let shares = fixed_sum_split(
        rng,
        extra as usize + 1,
        budget - extra as f64 * PION_TRIPLET_MASS,
    );

    let position = projectile.position;
    let mut products = Vec::with_capacity(3 * shares.len());
    for (group, &share) in shares.iter().enumerate() {
        let species = if group == 0 { base } else { BRANCH_PIONS };
        let masses = species.map(Species::mass);
        let momenta = momentum_triangle(rng, share, masses, retry_limit)?;
        for (k, (s, p)) in species.into_iter().zip(momenta).enumerate() {
            let id = if group == 0 && k == 0 {
                projectile.id
            } else {
                ids.next_id()
            };
            let lab = to_lab(masses[k], p, beta, &n);
            products.push(Particle::new(id, s, position, lab)?);
        }
    }
    Ok(Reaction::Products(products))
}

/// Extra triplet count, saturating at the kinematic maximum when the mean
/// lies too far above it for rejection sampling to finish.
fn guarded_multiplicity<R: Rng + ?Sized>(
    rng: &mut R,
    lab_energy: f64,
    budget: f64,
    model: &MultiplicityModel,
    retry_limit: usize,
) -> Result<u32> {
    let expected = model.expected(lab_energy);
    let maximum = budget / PION_TRIPLET_MASS;
    if !(expected > 0.0) || maximum < 1.0 {
        return Ok(0);
    }
    if expected - model.guard_sigmas * expected.sqrt() > maximum {
        debug!(
            "multiplicity saturated: expected {expected:.1}, at most {:.0} fit",
            maximum.floor()
        );
        return Ok(maximum.floor() as u32);
    }
    choose_pion_multiplicity(rng, lab_energy, budget, model, retry_limit)
}
