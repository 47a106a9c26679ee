//! Shower engine: particle model, atmosphere, interactions and the
//! propagate/interact loop.

pub mod atmosphere;
pub mod ids;
pub mod interaction;
pub mod kinematics;
pub mod particle;
pub mod sampling;
pub mod shower;
pub mod species;
pub mod step;

pub use atmosphere::AtmosphereModel;
pub use ids::IdAllocator;
pub use interaction::Reaction;
pub use particle::{Angles, Particle, ParticleBuilder};
pub use shower::{Direction, EnergySpec, PrimaryOptions, Shower, ShowerOutcome};
pub use species::Species;
pub use step::{Outcome, Step};
