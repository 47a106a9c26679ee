use std::cmp::Ordering;

use ordered_float::NotNan;

use super::particle::Particle;
use crate::error::{Error, Result};

/// What happens at the end of a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Move only.
    NoInteraction,
    /// Decay at the end point.
    Decay,
    /// Collide with this nucleus at the end point.
    Collision(Particle),
}

impl Outcome {
    /// Tie-break rank at equal distance: decay < collision < no interaction.
    #[inline]
    fn rank(&self) -> u8 {
        match self {
            Outcome::Decay => 0,
            Outcome::Collision(_) => 1,
            Outcome::NoInteraction => 2,
        }
    }
}

/// A candidate step: travel `distance` metres, then apply `outcome`.
///
/// Ordering is by distance, then by outcome rank, so the nearest candidate
/// is the minimum and a decay wins a tie.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub distance: NotNan<f64>,
    pub outcome: Outcome,
}

impl Step {
    /// Create a step, rejecting NaN and negative distances. Infinite
    /// distances are allowed and mean "never".
    pub fn new(distance: f64, outcome: Outcome) -> Result<Self> {
        let distance = NotNan::new(distance)
            .map_err(|_| Error::InvalidParam("step distance cannot be NaN".into()))?;
        if *distance < 0.0 {
            return Err(Error::InvalidParam(format!(
                "step distance must be >= 0, got {distance}"
            )));
        }
        Ok(Self { distance, outcome })
    }

    #[inline]
    pub fn distance_f64(&self) -> f64 {
        self.distance.into_inner()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.distance.is_finite()
    }

    #[inline]
    fn order_key(&self) -> (NotNan<f64>, u8) {
        (self.distance, self.outcome.rank())
    }
}

impl Eq for Step {}

impl Ord for Step {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
