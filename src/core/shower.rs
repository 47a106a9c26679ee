use log::{debug, trace};
use nalgebra::Vector3;
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::atmosphere::{decay_inverse_cdf, AtmosphereModel, NO_INTERACTION_DISTANCE};
use super::ids::IdAllocator;
use super::interaction::{collision, decay, Reaction};
use super::particle::{Angles, Particle};
use super::sampling::{isotropic_angles, point_in_disc, power_law_energy, sample_distance};
use super::species::Species;
use super::step::{Outcome, Step};
use crate::config::ShowerConfig;
use crate::error::{Error, Result};

/// Below this |direction.z| a step cannot be clamped to the band edges.
const VERTICAL_EPS: f64 = 1e-12;

/// Kinetic energy of the primary (MeV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnergySpec {
    /// Draw from the E^-2.7 spectrum above `minimum`.
    PowerLaw { minimum: f64 },
    Fixed(f64),
}

impl Default for EnergySpec {
    fn default() -> Self {
        EnergySpec::PowerLaw { minimum: 100.0 }
    }
}

/// Arrival direction of the primary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Down,
    Explicit(Angles),
    /// Uniform in solid angle over the downward hemisphere.
    Isotropic,
}

/// How to build a primary particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryOptions {
    pub species: Species,
    /// Starting height (m).
    pub height: f64,
    pub energy: EnergySpec,
    pub direction: Direction,
    /// When set, the primary starts at a uniform point in a disc of this
    /// radius (m) around the z axis.
    pub lateral_radius: Option<f64>,
}

impl Default for PrimaryOptions {
    fn default() -> Self {
        Self {
            species: Species::Proton,
            height: 500_000.0,
            energy: EnergySpec::default(),
            direction: Direction::default(),
            lateral_radius: None,
        }
    }
}

/// What a finished shower produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShowerOutcome {
    /// Muons (either charge) below the floor when the loop stopped.
    pub muons: Vec<Particle>,
    /// Propagate/interact passes performed.
    pub iterations: usize,
    /// The iteration cap stopped the loop with particles still in flight.
    pub capped: bool,
    pub decays: usize,
    pub collisions: usize,
    /// Decays or collisions with no rule, passed through unchanged.
    pub unhandled: usize,
    /// Particles removed because they could neither interact nor reach a
    /// band edge (moving sideways or at rest).
    pub escaped: usize,
}

impl ShowerOutcome {
    pub fn muons(&self) -> &[Particle] {
        &self.muons
    }

    pub fn into_muons(self) -> Vec<Particle> {
        self.muons
    }
}

/// Shower evaluation context.
///
/// Owns its random stream, so separate `Shower`s can run on separate threads.
/// The id allocator may be shared between them through [`Shower::with_ids`].
#[derive(Debug)]
pub struct Shower {
    config: ShowerConfig,
    atmosphere: AtmosphereModel,
    rng: StdRng,
    ids: IdAllocator,
}

impl Shower {
    /// Validate `config` and seed the random stream from `config.seed`, or
    /// from entropy when no seed is given.
    pub fn new(config: ShowerConfig) -> Result<Self> {
        config.validate()?;
        let rng: StdRng = match config.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        let atmosphere = AtmosphereModel::new(&config.atmosphere, &config.cross_section);
        Ok(Self {
            config,
            atmosphere,
            rng,
            ids: IdAllocator::new(),
        })
    }

    /// Draw ids from a shared allocator.
    pub fn with_ids(mut self, ids: IdAllocator) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &ShowerConfig {
        &self.config
    }

    pub fn atmosphere(&self) -> &AtmosphereModel {
        &self.atmosphere
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Build a primary particle from `options`.
    ///
    /// Errors:
    /// - `Error::InvalidParam` for a non-positive spectrum minimum or a bad
    ///   lateral radius
    /// - `Error::InsufficientEnergy` for a negative fixed kinetic energy
    pub fn generate_primary(&mut self, options: &PrimaryOptions) -> Result<Particle> {
        let ke = match options.energy {
            EnergySpec::PowerLaw { minimum } => {
                if !minimum.is_finite() || minimum <= 0.0 {
                    return Err(Error::InvalidParam(format!(
                        "spectrum minimum must be finite and > 0, got {minimum}"
                    )));
                }
                power_law_energy(&mut self.rng, minimum)
            }
            EnergySpec::Fixed(ke) => ke,
        };
        let angles = match options.direction {
            Direction::Down => Angles::DOWN,
            Direction::Explicit(angles) => angles,
            Direction::Isotropic => {
                let (theta, phi) = isotropic_angles(&mut self.rng, true);
                Angles::Polar { theta, phi }
            }
        };
        let (x, y) = match options.lateral_radius {
            Some(r) if r.is_finite() && r >= 0.0 => point_in_disc(&mut self.rng, r),
            Some(r) => {
                return Err(Error::InvalidParam(format!(
                    "lateral_radius must be finite and >= 0, got {r}"
                )))
            }
            None => (0.0, 0.0),
        };
        Particle::builder(options.species)
            .position(Vector3::new(x, y, options.height))
            .kinetic_energy(ke)
            .direction(angles)
            .build(&self.ids)
    }

    /// Generate a primary from `options` and run its shower.
    pub fn run(&mut self, options: &PrimaryOptions) -> Result<ShowerOutcome> {
        let primary = self.generate_primary(options)?;
        self.generate_shower(primary)
    }

    /// Propagate `primary` and everything it produces until no propagating
    /// particle is left inside the band, or the iteration cap is reached.
    ///
    /// Errors: `Error::RetryLimit` if a collision's sampling does not converge.
    pub fn generate_shower(&mut self, primary: Particle) -> Result<ShowerOutcome> {
        let mut outcome = ShowerOutcome::default();
        let mut active = vec![primary];

        loop {
            if !active.iter().any(|p| self.in_flight(p)) {
                break;
            }
            if outcome.iterations >= self.config.max_iterations {
                outcome.capped = true;
                break;
            }
            outcome.iterations += 1;

            let mut next = Vec::with_capacity(active.len());
            for particle in active.drain(..) {
                if !self.in_flight(&particle) {
                    if self.at_ground(&particle) {
                        next.push(particle);
                    }
                    continue;
                }
                self.step_particle(particle, &mut next, &mut outcome)?;
            }
            active = next;
        }

        outcome.muons = active.into_iter().filter(|p| self.at_ground(p)).collect();
        debug!(
            "shower done: {} muons, {} iterations{}, {} decays, {} collisions, {} unhandled, {} escaped",
            outcome.muons.len(),
            outcome.iterations,
            if outcome.capped { " (capped)" } else { "" },
            outcome.decays,
            outcome.collisions,
            outcome.unhandled,
            outcome.escaped,
        );
        Ok(outcome)
    }

    /// Propagating species strictly inside the band.
    fn in_flight(&self, particle: &Particle) -> bool {
        let z = particle.position.z;
        particle.species.is_propagating() && z > self.config.floor && z < self.config.ceiling
    }

    /// Muons below the floor; the only particles kept once out of flight.
    fn at_ground(&self, particle: &Particle) -> bool {
        particle.species.is_muon() && particle.position.z < self.config.floor
    }

    /// The nearer of the decay and collision candidates, or an infinite
    /// `NoInteraction` step when neither applies.
    fn next_step(&mut self, particle: &Particle) -> Result<Step> {
        let mut nearest = Step::new(NO_INTERACTION_DISTANCE, Outcome::NoInteraction)?;

        if let Some(lifetime) = particle.lifetime() {
            let d = sample_distance(&mut self.rng, decay_inverse_cdf(lifetime, particle.beta()));
            nearest = nearest.min(Step::new(d, Outcome::Decay)?);
        }

        if particle.species.is_hadronic()
            && particle.kinetic_energy() > self.config.collision_threshold_ke
        {
            let target = self
                .atmosphere
                .sample_nucleus(&mut self.rng, particle.position, &self.ids);
            let sigma = self.atmosphere.air_cross_section(particle.energy());
            let inverse_cdf =
                self.atmosphere
                    .collision_inverse_cdf(sigma, particle.position.z, particle.zenith());
            let d = sample_distance(&mut self.rng, inverse_cdf);
            nearest = nearest.min(Step::new(d, Outcome::Collision(target))?);
        }

        Ok(nearest)
    }

    /// Move one particle and push whatever replaces it onto `next`.
    fn step_particle(
        &mut self,
        mut particle: Particle,
        next: &mut Vec<Particle>,
        outcome: &mut ShowerOutcome,
    ) -> Result<()> {
        let step = self.next_step(&particle)?;
        let mut distance = step.distance_f64();
        let mut result = step.outcome;

        let dz = particle.direction().z;
        let eps = self.config.boundary_epsilon;
        let z = particle.position.z;
        if dz < -VERTICAL_EPS {
            let to_floor = (z - self.config.floor) / -dz;
            if distance >= to_floor {
                distance = (z - self.config.floor + eps) / -dz;
                result = Outcome::NoInteraction;
            }
        } else if dz > VERTICAL_EPS {
            let to_ceiling = (self.config.ceiling - z) / dz;
            if distance >= to_ceiling {
                distance = (self.config.ceiling - z + eps) / dz;
                result = Outcome::NoInteraction;
            }
        } else if !distance.is_finite() {
            trace!("{} {} cannot leave the band, removed", particle.species, particle.id);
            outcome.escaped += 1;
            return Ok(());
        }

        particle.advance(distance);
        trace!(
            "{} {} moved {distance:.3e} m to z = {:.1} -> {result:?}",
            particle.species,
            particle.id,
            particle.position.z,
        );

        let reaction = match result {
            Outcome::NoInteraction => {
                next.push(particle);
                return Ok(());
            }
            Outcome::Decay => {
                outcome.decays += 1;
                decay(&particle, &mut self.rng, &self.ids)?
            }
            Outcome::Collision(mut target) => {
                outcome.collisions += 1;
                target.position = particle.position;
                collision(
                    &particle,
                    &target,
                    &mut self.rng,
                    &self.ids,
                    &self.config.multiplicity,
                    self.config.retry_limit,
                )?
            }
        };
        if let Reaction::Unhandled(_) = reaction {
            outcome.unhandled += 1;
        }
        next.extend(reaction.into_particles());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> ShowerConfig {
        ShowerConfig {
            seed: Some(seed),
            ..ShowerConfig::default()
        }
    }

    #[test]
    fn sub_threshold_proton_finishes_in_one_iteration() -> Result<()> {
        let mut shower = Shower::new(seeded(1))?;
        let primary = shower.generate_primary(&PrimaryOptions {
            energy: EnergySpec::Fixed(500.0),
            ..PrimaryOptions::default()
        })?;
        let out = shower.generate_shower(primary)?;
        assert_eq!(out.iterations, 1);
        assert!(out.muons().is_empty());
        assert!(!out.capped);
        assert_eq!(out.collisions + out.decays, 0);
        Ok(())
    }

    #[test]
    fn zero_iteration_cap_returns_immediately() -> Result<()> {
        let mut shower = Shower::new(ShowerConfig {
            max_iterations: 0,
            ..seeded(2)
        })?;
        let out = shower.run(&PrimaryOptions {
            energy: EnergySpec::Fixed(1.0e5),
            ..PrimaryOptions::default()
        })?;
        assert_eq!(out.iterations, 0);
        assert!(out.capped);
        assert!(out.muons.is_empty());
        Ok(())
    }

    #[test]
    fn muon_below_floor_is_reported_without_stepping() -> Result<()> {
        let mut shower = Shower::new(seeded(3))?;
        let muon = Particle::new(
            7,
            Species::MuonPlus,
            Vector3::new(0.0, 0.0, -5.0),
            Vector3::new(0.0, 0.0, -300.0),
        )?;
        let out = shower.generate_shower(muon.clone())?;
        assert_eq!(out.iterations, 0);
        assert_eq!(out.muons, vec![muon]);
        Ok(())
    }

    #[test]
    fn fast_muon_reaches_the_ground() -> Result<()> {
        // γ ≈ 1e4 gives a mean decay length of ~6600 km from 1 km up.
        let mut shower = Shower::new(seeded(4))?;
        let primary = shower.generate_primary(&PrimaryOptions {
            species: Species::MuonMinus,
            height: 1000.0,
            energy: EnergySpec::Fixed(1.0e6),
            ..PrimaryOptions::default()
        })?;
        let id = primary.id;
        let out = shower.generate_shower(primary)?;
        let muons = out.into_muons();
        assert_eq!(muons.len(), 1);
        assert_eq!(muons[0].id, id);
        assert!((muons[0].position.z + 1e-6).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn horizontal_stable_particle_escapes() -> Result<()> {
        let mut shower = Shower::new(seeded(5))?;
        let primary = shower.generate_primary(&PrimaryOptions {
            height: 1000.0,
            energy: EnergySpec::Fixed(10.0),
            direction: Direction::Explicit(Angles::Polar {
                theta: std::f64::consts::FRAC_PI_2,
                phi: 0.0,
            }),
            ..PrimaryOptions::default()
        })?;
        let out = shower.generate_shower(primary)?;
        assert_eq!(out.escaped, 1);
        assert_eq!(out.iterations, 1);
        Ok(())
    }

    #[test]
    fn upward_muon_stops_just_above_the_ceiling() -> Result<()> {
        let mut shower = Shower::new(ShowerConfig {
            ceiling: 2000.0,
            ..seeded(8)
        })?;
        let muon = Particle::new(
            9,
            Species::MuonPlus,
            Vector3::new(0.0, 0.0, 1000.0),
            Vector3::new(0.0, 0.0, 1.0e6),
        )?;

        let mut next = Vec::new();
        let mut outcome = ShowerOutcome::default();
        shower.step_particle(muon.clone(), &mut next, &mut outcome)?;
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, 9);
        assert!((next[0].position.z - (2000.0 + 1e-6)).abs() < 1e-9);
        assert_eq!(next[0].momentum, muon.momentum);
        assert_eq!(outcome.decays, 0);

        let out = shower.generate_shower(muon)?;
        assert_eq!(out.iterations, 1);
        assert_eq!(out.decays, 0);
        assert!(out.muons().is_empty());
        Ok(())
    }

    #[test]
    fn only_ground_muons_are_kept_out_of_flight() -> Result<()> {
        let shower = Shower::new(seeded(9))?;
        let down = Vector3::new(0.0, 0.0, -100.0);
        let below = Vector3::new(0.0, 0.0, -1.0);
        let above = Vector3::new(0.0, 0.0, shower.config().ceiling + 1.0);

        assert!(shower.at_ground(&Particle::new(1, Species::MuonMinus, below, down)?));
        for (species, position) in [
            (Species::MuonPlus, above),
            (Species::Proton, below),
            (Species::Electron, below),
            (Species::MuonNeutrino, Vector3::new(0.0, 0.0, 1000.0)),
            (Species::Nitrogen14, Vector3::new(0.0, 0.0, 1000.0)),
        ] {
            let particle = Particle::new(2, species, position, down)?;
            assert!(!shower.in_flight(&particle));
            assert!(!shower.at_ground(&particle), "{species} kept");
        }
        Ok(())
    }

    #[test]
    fn decay_products_out_of_flight_are_not_reported() -> Result<()> {
        // A slow π+ decays within metres; only the μ+ can come back.
        let mut shower = Shower::new(seeded(10))?;
        let pion = Particle::new(
            3,
            Species::PionPlus,
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::new(0.0, 0.0, -50.0),
        )?;
        let out = shower.generate_shower(pion)?;
        assert!(out.muons().iter().all(|m| m.species == Species::MuonPlus));
        assert!(out.muons().iter().all(|m| m.position.z < 0.0));
        Ok(())
    }

    #[test]
    fn same_seed_same_shower() -> Result<()> {
        let options = PrimaryOptions {
            energy: EnergySpec::Fixed(2.0e4),
            ..PrimaryOptions::default()
        };
        let a = Shower::new(seeded(42))?.run(&options)?;
        let b = Shower::new(seeded(42))?.run(&options)?;
        assert_eq!(a, b);
        assert!(a.collisions > 0);
        Ok(())
    }

    #[test]
    fn isotropic_primary_points_down_inside_disc() -> Result<()> {
        let mut shower = Shower::new(seeded(6))?;
        let options = PrimaryOptions {
            direction: Direction::Isotropic,
            lateral_radius: Some(1000.0),
            ..PrimaryOptions::default()
        };
        for _ in 0..100 {
            let p = shower.generate_primary(&options)?;
            assert!(p.momentum.z < 0.0);
            assert!(p.position.xy().norm() <= 1000.0);
            assert_eq!(p.position.z, 500_000.0);
            assert!(p.kinetic_energy() >= 100.0 * (1.0 - 1e-9));
        }
        Ok(())
    }

    #[test]
    fn bad_spectrum_minimum_rejected() -> Result<()> {
        let mut shower = Shower::new(seeded(7))?;
        let err = shower
            .generate_primary(&PrimaryOptions {
                energy: EnergySpec::PowerLaw { minimum: 0.0 },
                ..PrimaryOptions::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParam(_)));
        Ok(())
    }
}
