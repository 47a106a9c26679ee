use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};

use super::ids::IdAllocator;
use super::species::Species;
use crate::error::{Error, Result};

/// Direction of travel given as an angle pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Angles {
    /// Polar angle from +z and azimuth from +x toward +y (radians).
    Polar { theta: f64, phi: f64 },
    /// Zenith angle of arrival (0 = straight down) and azimuth measured from
    /// north (+y) toward east (+x).
    Sky { zenith: f64, azimuth: f64 },
}

impl Angles {
    /// Straight down.
    pub const DOWN: Angles = Angles::Polar { theta: PI, phi: 0.0 };

    /// Convert to `(theta, phi)`.
    pub fn polar(self) -> (f64, f64) {
        match self {
            Angles::Polar { theta, phi } => (theta, phi),
            Angles::Sky { zenith, azimuth } => (PI - zenith, FRAC_PI_2 - azimuth),
        }
    }

    /// Unit vector pointing along these angles.
    pub fn unit_vector(self) -> Vector3<f64> {
        let (theta, phi) = self.polar();
        Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
    }

    fn is_finite(self) -> bool {
        let (t, p) = self.polar();
        t.is_finite() && p.is_finite()
    }
}

/// A particle in the lab frame.
///
/// Fields:
/// - `id`: unique identifier (kept by a projectile that survives a collision)
/// - `species`: closed species tag; mass, charge and lifetime come from its table entry
/// - `position`: metres, z vertical (positive up)
/// - `momentum`: MeV/c
///
/// Everything else is derived on each call, since callers move particles and
/// rewrite momenta in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u64,
    pub species: Species,
    pub position: Vector3<f64>,
    pub momentum: Vector3<f64>,
}

impl Particle {
    /// Create a particle after validating that position and momentum are finite.
    pub fn new(
        id: u64,
        species: Species,
        position: Vector3<f64>,
        momentum: Vector3<f64>,
    ) -> Result<Self> {
        if !position.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !momentum.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("momentum must be finite".into()));
        }
        Ok(Self {
            id,
            species,
            position,
            momentum,
        })
    }

    /// A particle with zero momentum.
    pub fn at_rest(id: u64, species: Species, position: Vector3<f64>) -> Self {
        Self {
            id,
            species,
            position,
            momentum: Vector3::zeros(),
        }
    }

    /// Start building a particle of `species`.
    pub fn builder(species: Species) -> ParticleBuilder {
        ParticleBuilder::new(species)
    }

    /// Start building a particle from a species name.
    ///
    /// Errors: `Error::UnknownParticleType` if the name is not in the species table.
    pub fn named(name: &str) -> Result<ParticleBuilder> {
        Ok(ParticleBuilder::new(name.parse()?))
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.species.mass()
    }

    #[inline]
    pub fn charge(&self) -> i32 {
        self.species.charge()
    }

    #[inline]
    pub fn lifetime(&self) -> Option<f64> {
        self.species.lifetime()
    }

    #[inline]
    pub fn momentum_magnitude(&self) -> f64 {
        self.momentum.norm()
    }

    /// Unit vector along the momentum; zero for a particle at rest.
    pub fn direction(&self) -> Vector3<f64> {
        let p = self.momentum_magnitude();
        if p > 0.0 {
            self.momentum / p
        } else {
            Vector3::zeros()
        }
    }

    /// Total energy √(m² + |p|²) in MeV.
    #[inline]
    pub fn energy(&self) -> f64 {
        let m = self.mass();
        (m * m + self.momentum.norm_squared()).sqrt()
    }

    /// Kinetic energy E − m, computed as |p|²/(E + m) to avoid cancellation.
    pub fn kinetic_energy(&self) -> f64 {
        let p2 = self.momentum.norm_squared();
        if p2 == 0.0 {
            return 0.0;
        }
        p2 / (self.energy() + self.mass())
    }

    /// Polar angle from +z.
    pub fn theta(&self) -> f64 {
        let p = self.momentum_magnitude();
        if p > 0.0 {
            (self.momentum.z / p).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        }
    }

    /// Azimuth in [0, 2π) from +x toward +y.
    pub fn phi(&self) -> f64 {
        self.momentum.y.atan2(self.momentum.x).rem_euclid(TAU)
    }

    /// Zenith angle of arrival, π − θ.
    #[inline]
    pub fn zenith(&self) -> f64 {
        PI - self.theta()
    }

    /// Azimuth in [0, 2π) measured from north (+y) toward east (+x).
    pub fn azimuth_from_north(&self) -> f64 {
        (FRAC_PI_2 - self.phi()).rem_euclid(TAU)
    }

    /// Velocity as a fraction of c, |p|/E.
    pub fn beta(&self) -> f64 {
        let e = self.energy();
        if e > 0.0 {
            self.momentum_magnitude() / e
        } else {
            0.0
        }
    }

    /// Lorentz factor E/m (infinite for massless species).
    pub fn gamma(&self) -> f64 {
        self.energy() / self.mass()
    }

    /// Four-momentum (E, px, py, pz).
    pub fn four_momentum(&self) -> Vector4<f64> {
        Vector4::new(
            self.energy(),
            self.momentum.x,
            self.momentum.y,
            self.momentum.z,
        )
    }

    /// Move the particle `distance` metres along its direction of travel.
    pub fn advance(&mut self, distance: f64) {
        self.position += distance * self.direction();
    }
}

/// Scalar quantity that fixes |p| once a direction is known.
#[derive(Debug, Clone, Copy)]
enum Magnitude {
    Energy(f64),
    KineticEnergy(f64),
    Momentum(f64),
    Speed(f64),
}

impl Magnitude {
    fn name(self) -> &'static str {
        match self {
            Magnitude::Energy(_) => "energy",
            Magnitude::KineticEnergy(_) => "kinetic energy",
            Magnitude::Momentum(_) => "momentum magnitude",
            Magnitude::Speed(_) => "speed",
        }
    }

    /// Resolve to |p| for the given species.
    fn momentum_for(self, species: Species) -> Result<f64> {
        let m = species.mass();
        let insufficient = |requested| Error::InsufficientEnergy {
            species,
            requested,
            mass: m,
        };
        match self {
            Magnitude::Energy(e) => {
                if !e.is_finite() {
                    return Err(Error::InvalidParam("energy must be finite".into()));
                }
                if e < m {
                    return Err(insufficient(e));
                }
                Ok((e * e - m * m).max(0.0).sqrt())
            }
            Magnitude::KineticEnergy(ke) => {
                if !ke.is_finite() {
                    return Err(Error::InvalidParam("kinetic energy must be finite".into()));
                }
                if ke < 0.0 {
                    return Err(insufficient(ke + m));
                }
                Ok((ke * ke + 2.0 * ke * m).sqrt())
            }
            Magnitude::Momentum(p) => {
                if !p.is_finite() {
                    return Err(Error::InvalidParam("momentum must be finite".into()));
                }
                if p < 0.0 {
                    return Err(insufficient(p));
                }
                Ok(p)
            }
            Magnitude::Speed(beta) => {
                if !(0.0..1.0).contains(&beta) {
                    return Err(Error::InvalidParam(format!(
                        "speed must lie in [0, 1) of c, got {beta}"
                    )));
                }
                if m == 0.0 {
                    return Err(Error::InvalidParam(format!(
                        "cannot set a speed for massless {species}"
                    )));
                }
                Ok(m * beta / (1.0 - beta * beta).sqrt())
            }
        }
    }
}

/// Validating constructor for [`Particle`].
///
/// A scalar kinematic quantity (energy, kinetic energy, momentum magnitude or
/// speed) needs an [`Angles`] pair; a full momentum vector does not.
#[derive(Debug, Clone)]
pub struct ParticleBuilder {
    species: Species,
    id: Option<u64>,
    position: Vector3<f64>,
    momentum: Option<Vector3<f64>>,
    magnitude: Option<Magnitude>,
    angles: Option<Angles>,
}

impl ParticleBuilder {
    /// At the origin and at rest; `build` allocates the id unless `with_id` sets one.
    pub fn new(species: Species) -> Self {
        Self {
            species,
            id: None,
            position: Vector3::zeros(),
            momentum: None,
            magnitude: None,
            angles: None,
        }
    }

    /// Keep an existing id instead of allocating a fresh one.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Position (m).
    pub fn position(mut self, position: Vector3<f64>) -> Self {
        self.position = position;
        self
    }

    /// Full momentum vector (MeV/c); needs no direction.
    pub fn momentum(mut self, momentum: Vector3<f64>) -> Self {
        self.momentum = Some(momentum);
        self
    }

    /// Total energy (MeV).
    pub fn energy(mut self, energy: f64) -> Self {
        self.magnitude = Some(Magnitude::Energy(energy));
        self
    }

    /// Kinetic energy (MeV).
    pub fn kinetic_energy(mut self, ke: f64) -> Self {
        self.magnitude = Some(Magnitude::KineticEnergy(ke));
        self
    }

    /// |p| (MeV/c).
    pub fn momentum_magnitude(mut self, p: f64) -> Self {
        self.magnitude = Some(Magnitude::Momentum(p));
        self
    }

    /// Speed as a fraction of c.
    pub fn speed(mut self, beta: f64) -> Self {
        self.magnitude = Some(Magnitude::Speed(beta));
        self
    }

    /// Direction for a scalar quantity.
    pub fn direction(mut self, angles: Angles) -> Self {
        self.angles = Some(angles);
        self
    }

    /// Validate and build, drawing a fresh id from `ids` unless one was kept.
    ///
    /// Errors:
    /// - `Error::MissingAngle` for a scalar quantity without a direction
    /// - `Error::InsufficientEnergy` when energy is below the rest mass
    /// - `Error::InvalidParam` for non-finite inputs or conflicting momentum specs
    pub fn build(self, ids: &IdAllocator) -> Result<Particle> {
        let momentum = match (self.momentum, self.magnitude) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParam(
                    "give either a momentum vector or a scalar magnitude, not both".into(),
                ))
            }
            (Some(p), None) => p,
            (None, Some(mag)) => {
                let angles = self.angles.ok_or(Error::MissingAngle(mag.name()))?;
                if !angles.is_finite() {
                    return Err(Error::InvalidParam("angles must be finite".into()));
                }
                mag.momentum_for(self.species)? * angles.unit_vector()
            }
            (None, None) => Vector3::zeros(),
        };
        let id = self.id.unwrap_or_else(|| ids.next_id());
        Particle::new(id, self.species, self.position, momentum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::species::{MUON_MASS, PROTON_MASS};

    const TOL: f64 = 1e-9;

    #[test]
    fn new_particle_ok() -> Result<()> {
        let p = Particle::new(
            1,
            Species::Proton,
            Vector3::new(0.0, 1.0, 2.0),
            Vector3::new(0.0, 0.0, -1000.0),
        )?;
        assert_eq!(p.id, 1);
        assert_eq!(p.position, Vector3::new(0.0, 1.0, 2.0));
        assert!((p.energy() - (PROTON_MASS.powi(2) + 1.0e6).sqrt()).abs() < TOL);
        assert!((p.theta() - PI).abs() < TOL);
        assert!(p.zenith().abs() < TOL);
        Ok(())
    }

    #[test]
    fn non_finite_momentum_rejected() {
        let err = Particle::new(
            0,
            Species::Proton,
            Vector3::zeros(),
            Vector3::new(f64::NAN, 0.0, 0.0),
        )
        .unwrap_err();
        assert!(err.to_string().contains("momentum"));
    }

    #[test]
    fn kinetic_energy_and_beta() -> Result<()> {
        let ids = IdAllocator::new();
        let mu = Particle::builder(Species::MuonPlus)
            .kinetic_energy(200.0)
            .direction(Angles::DOWN)
            .build(&ids)?;
        assert!((mu.kinetic_energy() - 200.0).abs() < 1e-9);
        assert!((mu.energy() - (200.0 + MUON_MASS)).abs() < 1e-9);
        let beta = mu.beta();
        assert!(beta > 0.0 && beta < 1.0);
        assert!((mu.gamma() - 1.0 / (1.0 - beta * beta).sqrt()).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn speed_sets_momentum() -> Result<()> {
        let ids = IdAllocator::new();
        let p = Particle::builder(Species::Proton)
            .speed(0.6)
            .direction(Angles::Polar { theta: 0.0, phi: 0.0 })
            .build(&ids)?;
        assert!((p.beta() - 0.6).abs() < 1e-12);
        assert!((p.momentum.z - PROTON_MASS * 0.75).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn scalar_without_angles_is_missing_angle() {
        let ids = IdAllocator::new();
        let err = Particle::builder(Species::Proton)
            .energy(2000.0)
            .build(&ids)
            .unwrap_err();
        assert!(matches!(err, Error::MissingAngle("energy")));
    }

    #[test]
    fn energy_below_mass_rejected() {
        let ids = IdAllocator::new();
        let err = Particle::builder(Species::Proton)
            .energy(500.0)
            .direction(Angles::DOWN)
            .build(&ids)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientEnergy { .. }));
    }

    #[test]
    fn sky_angles_round_trip() -> Result<()> {
        let ids = IdAllocator::new();
        let p = Particle::builder(Species::MuonMinus)
            .momentum_magnitude(500.0)
            .direction(Angles::Sky {
                zenith: 0.3,
                azimuth: 1.2,
            })
            .build(&ids)?;
        assert!((p.zenith() - 0.3).abs() < 1e-12);
        assert!((p.azimuth_from_north() - 1.2).abs() < 1e-12);
        // Arriving from above means moving downward.
        assert!(p.momentum.z < 0.0);
        Ok(())
    }

    #[test]
    fn ids_allocated_unless_kept() -> Result<()> {
        let ids = IdAllocator::starting_at(10);
        let a = Particle::builder(Species::Neutron).build(&ids)?;
        let b = Particle::builder(Species::Neutron).with_id(3).build(&ids)?;
        assert_eq!(a.id, 10);
        assert_eq!(b.id, 3);
        assert_eq!(ids.peek(), 11);
        Ok(())
    }

    #[test]
    fn advance_moves_along_direction() -> Result<()> {
        let mut p = Particle::new(
            0,
            Species::MuonMinus,
            Vector3::new(0.0, 0.0, 100.0),
            Vector3::new(0.0, 3.0, -4.0),
        )?;
        p.advance(10.0);
        assert!((p.position - Vector3::new(0.0, 6.0, 92.0)).norm() < TOL);
        Ok(())
    }

    #[test]
    fn at_rest_has_zero_direction() {
        let p = Particle::at_rest(0, Species::Nitrogen14, Vector3::zeros());
        assert_eq!(p.direction(), Vector3::zeros());
        assert_eq!(p.beta(), 0.0);
        assert_eq!(p.kinetic_energy(), 0.0);
        assert!((p.energy() - Species::Nitrogen14.mass()).abs() < TOL);
    }
}
