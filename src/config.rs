//! Configuration for shower evaluation, loadable from YAML.
//!
//! A configuration consists of:
//!
//! - [`ShowerConfig`]      – tracked band, iteration cap, thresholds, seed
//! - [`AtmosphereConfig`]  – density profile and nucleus composition
//! - [`CrossSectionModel`] – empirical hadron-air cross-section fit
//! - [`MultiplicityModel`] – empirical pion-multiplicity fit
//!
//! Every field has a default, so a file only lists what it overrides:
//!
//! ```yaml
//! floor: 0.0                # m, muons below this are reported
//! ceiling: 1.0e6            # m, particles above this are dropped
//! max_iterations: 1000
//! collision_threshold_ke: 1000.0   # MeV
//! seed: 42
//!
//! atmosphere:
//!   sea_level_density: 2.504e25    # m^-3
//!   scale_height: 8000.0           # m
//!   composition: { nitrogen: 0.78, oxygen: 0.21, argon: 0.01 }
//!
//! multiplicity:
//!   slope: 6.0
//!   offset: -24.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fractions of each target nucleus in air.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Composition {
    pub nitrogen: f64,
    pub oxygen: f64,
    pub argon: f64,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            nitrogen: 0.78,
            oxygen: 0.21,
            argon: 0.01,
        }
    }
}

/// Exponential atmosphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    /// Number density at height 0 (m^-3).
    pub sea_level_density: f64,
    /// Density e-folding height (m).
    pub scale_height: f64,
    pub composition: Composition,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            sea_level_density: 2.504e25,
            scale_height: 8000.0,
            composition: Composition::default(),
        }
    }
}

/// Hadron-air inelastic cross-section fit.
///
/// s = 2·E/1000·`s_per_gev` (GeV²),
/// σ_pp = `pp_constant` + `pp_linear`·ln s + `pp_quadratic`·ln² s (mb),
/// σ_air = `nucleon_factor`·σ_pp + `offset_mb` (mb).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossSectionModel {
    pub s_per_gev: f64,
    pub pp_constant: f64,
    pub pp_linear: f64,
    pub pp_quadratic: f64,
    pub nucleon_factor: f64,
    pub offset_mb: f64,
}

impl Default for CrossSectionModel {
    fn default() -> Self {
        Self {
            s_per_gev: 13.0,
            pp_constant: 32.4,
            pp_linear: -1.2,
            pp_quadratic: 0.21,
            nucleon_factor: 4.0,
            offset_mb: 100.0,
        }
    }
}

/// Pion multiplicity fit: expected = `slope`·ln(E_lab / MeV) + `offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplicityModel {
    pub slope: f64,
    pub offset: f64,
    /// When the mean sits more than this many standard deviations above the
    /// kinematic maximum, the multiplicity saturates at the maximum instead of
    /// being rejection-sampled.
    pub guard_sigmas: f64,
}

impl MultiplicityModel {
    /// Expected number of extra pion triplets at lab energy `lab_energy` (MeV).
    #[inline]
    pub fn expected(&self, lab_energy: f64) -> f64 {
        self.slope * lab_energy.ln() + self.offset
    }
}

impl Default for MultiplicityModel {
    fn default() -> Self {
        Self {
            slope: 6.0,
            offset: -24.0,
            guard_sigmas: 3.0,
        }
    }
}

/// Shower evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowerConfig {
    /// Lower edge of the tracked band (m).
    pub floor: f64,
    /// Upper edge of the tracked band (m).
    pub ceiling: f64,
    /// Hard cap on propagate/interact iterations.
    pub max_iterations: usize,
    /// Hadrons with less kinetic energy than this (MeV) do not collide.
    pub collision_threshold_ke: f64,
    /// Cap for every rejection-sampling loop.
    pub retry_limit: usize,
    /// Overshoot past a band edge when a step is clamped (m).
    pub boundary_epsilon: f64,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub atmosphere: AtmosphereConfig,
    pub cross_section: CrossSectionModel,
    pub multiplicity: MultiplicityModel,
}

impl Default for ShowerConfig {
    fn default() -> Self {
        Self {
            floor: 0.0,
            ceiling: 1.0e6,
            max_iterations: 1000,
            collision_threshold_ke: 1000.0,
            retry_limit: 10_000,
            boundary_epsilon: 1e-6,
            seed: None,
            atmosphere: AtmosphereConfig::default(),
            cross_section: CrossSectionModel::default(),
            multiplicity: MultiplicityModel::default(),
        }
    }
}

impl ShowerConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: ShowerConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check invariants the simulation relies on.
    ///
    /// Errors: `Error::InvalidParam` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.floor.is_finite() || !self.ceiling.is_finite() || self.floor >= self.ceiling {
            return Err(Error::InvalidParam(format!(
                "floor ({}) must be finite and below ceiling ({})",
                self.floor, self.ceiling
            )));
        }
        if !self.collision_threshold_ke.is_finite() || self.collision_threshold_ke < 0.0 {
            return Err(Error::InvalidParam(
                "collision_threshold_ke must be finite and >= 0".into(),
            ));
        }
        if self.retry_limit == 0 {
            return Err(Error::InvalidParam("retry_limit must be > 0".into()));
        }
        if !self.boundary_epsilon.is_finite() || self.boundary_epsilon <= 0.0 {
            return Err(Error::InvalidParam(
                "boundary_epsilon must be finite and > 0".into(),
            ));
        }
        let atm = &self.atmosphere;
        if !atm.sea_level_density.is_finite() || atm.sea_level_density <= 0.0 {
            return Err(Error::InvalidParam(
                "sea_level_density must be finite and > 0".into(),
            ));
        }
        if !atm.scale_height.is_finite() || atm.scale_height <= 0.0 {
            return Err(Error::InvalidParam(
                "scale_height must be finite and > 0".into(),
            ));
        }
        let c = atm.composition;
        let fractions = [c.nitrogen, c.oxygen, c.argon];
        if fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(Error::InvalidParam(
                "composition fractions must be finite and >= 0".into(),
            ));
        }
        let total: f64 = fractions.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(Error::InvalidParam(format!(
                "composition fractions must sum to 1, got {total}"
            )));
        }
        if !self.multiplicity.guard_sigmas.is_finite() || self.multiplicity.guard_sigmas < 0.0 {
            return Err(Error::InvalidParam(
                "multiplicity.guard_sigmas must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }
}
