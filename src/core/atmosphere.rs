use nalgebra::Vector3;
use rand::Rng;

use super::ids::IdAllocator;
use super::particle::Particle;
use super::species::Species;
use crate::config::{AtmosphereConfig, Composition, CrossSectionModel};

/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Distance returned when no interaction can happen along the path.
pub const NO_INTERACTION_DISTANCE: f64 = f64::INFINITY;

/// One millibarn in m².
const MILLIBARN: f64 = 1e-31;

/// Below this |cos(zenith)| the density along the path is taken as constant.
const HORIZONTAL_COS: f64 = 1e-9;

/// Exponential atmosphere with a fixed nucleus composition.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereModel {
    /// Number density at height 0 (m^-3).
    pub sea_level_density: f64,
    /// e-folding height (m).
    pub scale_height: f64,
    pub composition: Composition,
    pub cross_section: CrossSectionModel,
}

impl Default for AtmosphereModel {
    fn default() -> Self {
        Self::new(&AtmosphereConfig::default(), &CrossSectionModel::default())
    }
}

impl AtmosphereModel {
    pub fn new(atmosphere: &AtmosphereConfig, cross_section: &CrossSectionModel) -> Self {
        Self {
            sea_level_density: atmosphere.sea_level_density,
            scale_height: atmosphere.scale_height,
            composition: atmosphere.composition,
            cross_section: cross_section.clone(),
        }
    }

    /// Number density (m^-3) at `height` metres.
    #[inline]
    pub fn density(&self, height: f64) -> f64 {
        self.sea_level_density * (-height / self.scale_height).exp()
    }

    /// Draw a target nucleus at rest at `position`, by composition fraction.
    pub fn sample_nucleus<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        position: Vector3<f64>,
        ids: &IdAllocator,
    ) -> Particle {
        let u: f64 = rng.random();
        let c = self.composition;
        let species = if u < c.nitrogen {
            Species::Nitrogen14
        } else if u < c.nitrogen + c.oxygen {
            Species::Oxygen16
        } else {
            Species::Argon40
        };
        Particle::at_rest(ids.next_id(), species, position)
    }

    /// Hadron-air inelastic cross-section (m²) at total energy `energy` (MeV).
    pub fn air_cross_section(&self, energy: f64) -> f64 {
        let xs = &self.cross_section;
        let s = 2.0 * energy / 1000.0 * xs.s_per_gev;
        let ln_s = s.ln();
        let sigma_pp = xs.pp_constant + xs.pp_linear * ln_s + xs.pp_quadratic * ln_s * ln_s;
        (xs.nucleon_factor * sigma_pp + xs.offset_mb) * MILLIBARN
    }

    /// Inverse CDF of the distance to the next collision.
    ///
    /// Integrates `density · cross_section` along a straight path starting at
    /// `height` with zenith angle `zenith` (0 = straight down). Near-horizontal
    /// paths use the local density. Paths heading up through less column than
    /// the drawn optical depth return [`NO_INTERACTION_DISTANCE`].
    pub fn collision_inverse_cdf(
        &self,
        cross_section: f64,
        height: f64,
        zenith: f64,
    ) -> impl Fn(f64) -> f64 {
        let h = self.scale_height;
        // σ·n₀·H: interaction lengths in a vertical column from sea level up.
        let column = cross_section * self.sea_level_density * h;
        let local = cross_section * self.density(height);
        let cos_z = zenith.cos();
        move |u: f64| {
            let depth = -(-u).ln_1p();
            if depth == 0.0 {
                return 0.0;
            }
            if cos_z.abs() < HORIZONTAL_COS {
                return if local > 0.0 {
                    depth / local
                } else {
                    NO_INTERACTION_DISTANCE
                };
            }
            if cos_z > 0.0 {
                // ln(1 + x) with x = depth·cos/(σ·n(h)·H), kept in log space so
                // thin air at great heights does not underflow.
                let log_x = (depth * cos_z / column).ln() + height / h;
                let log_1p = if log_x > 36.0 {
                    log_x
                } else {
                    log_x.exp().ln_1p()
                };
                return h / cos_z * log_1p;
            }
            let arg = depth * cos_z / column * (height / h).exp();
            if !(arg > -1.0) {
                return NO_INTERACTION_DISTANCE;
            }
            h / cos_z * arg.ln_1p()
        }
    }
}

/// Inverse CDF of the lab-frame decay distance for a particle with mean
/// proper lifetime `lifetime` (s) moving at `beta`.
pub fn decay_inverse_cdf(lifetime: f64, beta: f64) -> impl Fn(f64) -> f64 {
    let one_minus_b2 = 1.0 - beta * beta;
    let length = if one_minus_b2 > 0.0 {
        beta * SPEED_OF_LIGHT * lifetime / one_minus_b2.sqrt()
    } else {
        NO_INTERACTION_DISTANCE
    };
    move |u: f64| {
        if length.is_infinite() {
            NO_INTERACTION_DISTANCE
        } else {
            -length * (-u).ln_1p()
        }
    }
}
